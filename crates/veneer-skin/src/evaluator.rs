/*
 * evaluator.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Skin evaluation engine.
//!
//! A [`Renderer`] walks part lists against a context and produces the output
//! string. Every macro goes through [`Renderer::resolve`]:
//!
//! 1. Builtins (`render`, `echo`, `for`, `if`, `set`) are special forms and
//!    bypass dispatch entirely.
//! 2. A dotted name (`site.title`) only dispatches when its parent path
//!    resolves to a map; otherwise the whole name is unresolved.
//! 3. Macros look up a macro handler by their full dotted name, then a
//!    function of that name, then plain data at that path.
//! 4. Filters look up a filter handler by name.
//! 5. Anything unresolved passes its fallback through unchanged (null for
//!    macros, the running value for filters).
//!
//! A renderer lives for one render call. It holds the call's recursion depth
//! and diagnostics; skins and contexts are only read.

use std::cell::RefCell;

use indexmap::IndexMap;

use crate::builtins::{self, Builtin};
use crate::context::SkinContext;
use crate::diagnostics::{RenderDiagnostic, RenderState};
use crate::environment::SkinEnvironment;
use crate::error::{SkinError, SkinResult};
use crate::handlers::{FilterCall, MacroCall};
use crate::node::{Element, Node, Param, SkinPart};
use crate::skin::Skin;
use crate::value::SkinValue;

/// What a node is being resolved as.
enum Dispatch {
    Macro,
    /// A filter step, carrying the running value.
    Filter(SkinValue),
}

impl Dispatch {
    /// The result of a name that resolves to nothing.
    fn fallback(self) -> SkinValue {
        match self {
            Dispatch::Macro => SkinValue::Null,
            Dispatch::Filter(value) => value,
        }
    }
}

pub(crate) struct Renderer<'a> {
    env: &'a SkinEnvironment,
    state: RefCell<RenderState>,
}

impl<'a> Renderer<'a> {
    pub(crate) fn new(env: &'a SkinEnvironment) -> Self {
        Self {
            env,
            state: RefCell::new(RenderState::new(env.config().max_depth)),
        }
    }

    /// Render the main body of `skin`, delegating to the parent's when empty.
    pub(crate) fn render_main(&self, skin: &Skin, context: &SkinContext) -> SkinResult<String> {
        match skin.get_parts(None) {
            Some(parts) => self.render_parts(skin, parts, context),
            None => Ok(String::new()),
        }
    }

    /// Render a fragment of `skin`.
    ///
    /// Inherited fragments are rendered with `skin` as the document, so their
    /// own `render` calls see the child's overrides.
    pub(crate) fn render_fragment(
        &self,
        skin: &Skin,
        name: &str,
        context: &SkinContext,
    ) -> SkinResult<String> {
        self.state.borrow_mut().enter(name)?;
        let result = self.render_fragment_unguarded(skin, name, context);
        self.state.borrow_mut().leave();
        result
    }

    fn render_fragment_unguarded(
        &self,
        skin: &Skin,
        name: &str,
        context: &SkinContext,
    ) -> SkinResult<String> {
        if let Some(parts) = skin.get_parts(Some(name)) {
            return self.render_parts(skin, parts, context);
        }

        let external = match skin.external_fragment(name) {
            Some(external) => external,
            None => {
                let loaded = self
                    .env
                    .loader()
                    .find(name, skin.origin())?
                    .ok_or_else(|| SkinError::NotFound {
                        name: name.to_string(),
                    })?;
                tracing::debug!(fragment = name, "Resolved fragment as a separate skin");
                skin.remember_external(name, loaded)
            }
        };
        self.render_main(&external, context)
    }

    /// Concatenate the rendered elements, then apply the part's filter once.
    pub(crate) fn render_parts(
        &self,
        skin: &Skin,
        parts: &SkinPart,
        context: &SkinContext,
    ) -> SkinResult<String> {
        let mut out = String::new();
        for element in &parts.elements {
            out.push_str(&self.render_one(skin, element, context)?);
        }
        match &parts.filter {
            Some(filter) => Ok(self
                .evaluate_filter_chain(skin, SkinValue::String(out), Some(filter), context)?
                .render()),
            None => Ok(out),
        }
    }

    fn render_one(&self, skin: &Skin, element: &Element, context: &SkinContext) -> SkinResult<String> {
        match element {
            Element::Text(text) => Ok(text.clone()),
            Element::Macro(node) if node.name.is_empty() => Ok(String::new()),
            Element::Macro(node) => Ok(self.evaluate_macro(skin, node, context)?.render()),
        }
    }

    /// The node's own value, piped through its filter chain.
    pub(crate) fn evaluate_macro(
        &self,
        skin: &Skin,
        node: &Node,
        context: &SkinContext,
    ) -> SkinResult<SkinValue> {
        let value = self.resolve(skin, node, context, Dispatch::Macro)?;
        self.evaluate_filter_chain(skin, value, node.filter.as_deref(), context)
    }

    /// Apply the filters from `head` on, then join a list result into one string.
    pub(crate) fn evaluate_filter_chain(
        &self,
        skin: &Skin,
        value: SkinValue,
        head: Option<&Node>,
        context: &SkinContext,
    ) -> SkinResult<SkinValue> {
        match self.apply_filters(skin, value, head, context)? {
            SkinValue::List(items) => Ok(SkinValue::String(
                items.iter().map(SkinValue::render).collect(),
            )),
            value => Ok(value),
        }
    }

    fn apply_filters(
        &self,
        skin: &Skin,
        mut value: SkinValue,
        head: Option<&Node>,
        context: &SkinContext,
    ) -> SkinResult<SkinValue> {
        let mut next = head;
        while let Some(filter) = next {
            if value.is_invisible() {
                value = SkinValue::String(String::new());
            }
            value = self.resolve(skin, filter, context, Dispatch::Filter(value))?;
            next = filter.filter.as_deref();
        }
        Ok(value)
    }

    fn resolve(
        &self,
        skin: &Skin,
        node: &Node,
        context: &SkinContext,
        dispatch: Dispatch,
    ) -> SkinResult<SkinValue> {
        if let Some(builtin) = Builtin::from_name(&node.name) {
            return builtins::evaluate(builtin, self, skin, node, context);
        }

        let path: Vec<&str> = node.name.split('.').collect();
        let this = match path.split_last() {
            Some((_, parents)) if !parents.is_empty() => match context.get_path(parents) {
                Some(owner @ SkinValue::Map(_)) => Some(owner),
                _ => return Ok(dispatch.fallback()),
            },
            _ => None,
        };
        let handlers = context.handlers();

        match dispatch {
            Dispatch::Macro => {
                let handler = handlers
                    .macro_handler(&node.name)
                    .or_else(|| handlers.function(&node.name));
                if let Some(handler) = handler {
                    tracing::trace!(name = %node.name, "Dispatching macro");
                    let call = MacroCall {
                        node,
                        context,
                        this,
                        skin,
                        renderer: self,
                    };
                    return handler(&call);
                }
                Ok(context.get_path(&path).cloned().unwrap_or_default())
            }
            Dispatch::Filter(value) => match handlers.filter_handler(&node.name) {
                Some(handler) => {
                    tracing::trace!(name = %node.name, "Dispatching filter");
                    let call = FilterCall {
                        node,
                        context,
                        this,
                        skin,
                        renderer: self,
                    };
                    handler(value, &call)
                }
                None => Ok(value),
            },
        }
    }

    /// Evaluate a macro parameter.
    ///
    /// Nested tags are resolved as macros; their filter chains are not run.
    /// Lists and maps are evaluated element-wise; other literals are returned
    /// as they are.
    pub(crate) fn evaluate_param(
        &self,
        skin: &Skin,
        param: &Param,
        context: &SkinContext,
    ) -> SkinResult<SkinValue> {
        match param {
            Param::Node(node) => self.resolve(skin, node, context, Dispatch::Macro),
            Param::List(items) => items
                .iter()
                .map(|item| self.evaluate_param(skin, item, context))
                .collect::<SkinResult<Vec<_>>>()
                .map(SkinValue::List),
            Param::Map(entries) => entries
                .iter()
                .map(|(key, item)| Ok((key.clone(), self.evaluate_param(skin, item, context)?)))
                .collect::<SkinResult<IndexMap<_, _>>>()
                .map(SkinValue::Map),
            literal => Ok(literal.literal_value()),
        }
    }

    /// Record a malformed builtin and return the text rendered in its place.
    pub(crate) fn malformed(&self, skin: &Skin, macro_name: &str, message: &str) -> SkinValue {
        let diagnostic = RenderDiagnostic {
            macro_name: macro_name.to_string(),
            message: message.to_string(),
            origin: skin.origin().map(|o| o.display().to_string()),
        };
        tracing::warn!("{}", diagnostic);
        let text = diagnostic.inline_text();
        self.state.borrow_mut().diagnostics.add(diagnostic);
        SkinValue::String(text)
    }

    pub(crate) fn into_diagnostics(self) -> Vec<RenderDiagnostic> {
        self.state.into_inner().diagnostics.into_diagnostics()
    }
}
