/*
 * handlers.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Macro, filter and function handlers.
//!
//! A skin tag `<% name %>` dispatches to the macro registered under `name`,
//! a filter step `| name` to the filter registered under `name`. Plain
//! functions are callable values: they are invoked like macros, but only when
//! no dedicated macro exists. Names are full dotted paths (`site.title`).

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::context::SkinContext;
use crate::error::SkinResult;
use crate::evaluator::Renderer;
use crate::node::Node;
use crate::skin::Skin;
use crate::value::SkinValue;

/// Signature of macros and functions.
pub type MacroFn = dyn Fn(&MacroCall<'_>) -> SkinResult<SkinValue> + Send + Sync;

/// Signature of filters: the running value plus the filter invocation.
pub type FilterFn = dyn Fn(SkinValue, &FilterCall<'_>) -> SkinResult<SkinValue> + Send + Sync;

/// A macro invocation, as seen by a macro handler.
pub struct MacroCall<'a> {
    /// The macro tag being evaluated.
    pub node: &'a Node,
    /// The context the tag is evaluated in.
    pub context: &'a SkinContext,
    /// The object owning the handler (`site` for `site.title`), if any.
    pub this: Option<&'a SkinValue>,
    /// The document being rendered.
    pub skin: &'a Skin,
    pub(crate) renderer: &'a Renderer<'a>,
}

/// A filter invocation, as seen by a filter handler.
pub struct FilterCall<'a> {
    /// The filter node, carrying the filter's own parameters.
    pub node: &'a Node,
    pub context: &'a SkinContext,
    pub this: Option<&'a SkinValue>,
    pub skin: &'a Skin,
    pub(crate) renderer: &'a Renderer<'a>,
}

impl MacroCall<'_> {
    /// Evaluate the positional parameter at `index` (null when absent).
    pub fn param(&self, index: usize) -> SkinResult<SkinValue> {
        evaluate_param(self.renderer, self.skin, self.node, self.context, None, Some(index))
    }

    /// Evaluate a parameter by name, falling back to a position.
    pub fn named(&self, name: &str, index: Option<usize>) -> SkinResult<SkinValue> {
        evaluate_param(self.renderer, self.skin, self.node, self.context, Some(name), index)
    }

    /// Render a fragment of the current document.
    pub fn render_fragment(&self, name: &str) -> SkinResult<String> {
        self.renderer.render_fragment(self.skin, name, self.context)
    }

    /// Render a fragment of the current document in another context.
    pub fn render_fragment_with(&self, name: &str, context: &SkinContext) -> SkinResult<String> {
        self.renderer.render_fragment(self.skin, name, context)
    }
}

impl FilterCall<'_> {
    /// Evaluate the filter argument at `index` (null when absent).
    pub fn arg(&self, index: usize) -> SkinResult<SkinValue> {
        evaluate_param(self.renderer, self.skin, self.node, self.context, None, Some(index))
    }

    /// Evaluate a filter argument by name, falling back to a position.
    pub fn named(&self, name: &str, index: Option<usize>) -> SkinResult<SkinValue> {
        evaluate_param(self.renderer, self.skin, self.node, self.context, Some(name), index)
    }
}

fn evaluate_param(
    renderer: &Renderer<'_>,
    skin: &Skin,
    node: &Node,
    context: &SkinContext,
    name: Option<&str>,
    index: Option<usize>,
) -> SkinResult<SkinValue> {
    let param = match name {
        Some(name) => node.parameter(name, index),
        None => index.and_then(|i| node.parameters.get(i)),
    };
    match param {
        Some(param) => renderer.evaluate_param(skin, param, context),
        None => Ok(SkinValue::Null),
    }
}

/// Handlers by kind and dotted name.
#[derive(Clone, Default)]
pub struct HandlerTable {
    macros: HashMap<String, Arc<MacroFn>>,
    filters: HashMap<String, Arc<FilterFn>>,
    functions: HashMap<String, Arc<MacroFn>>,
}

impl HandlerTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a macro for `<% name ... %>`.
    pub fn register_macro<F>(&mut self, name: impl Into<String>, f: F) -> &mut Self
    where
        F: Fn(&MacroCall<'_>) -> SkinResult<SkinValue> + Send + Sync + 'static,
    {
        self.macros.insert(name.into(), Arc::new(f));
        self
    }

    /// Register a filter for `| name ...`.
    pub fn register_filter<F>(&mut self, name: impl Into<String>, f: F) -> &mut Self
    where
        F: Fn(SkinValue, &FilterCall<'_>) -> SkinResult<SkinValue> + Send + Sync + 'static,
    {
        self.filters.insert(name.into(), Arc::new(f));
        self
    }

    /// Register a callable value. Macros of the same name take precedence.
    pub fn register_function<F>(&mut self, name: impl Into<String>, f: F) -> &mut Self
    where
        F: Fn(&MacroCall<'_>) -> SkinResult<SkinValue> + Send + Sync + 'static,
    {
        self.functions.insert(name.into(), Arc::new(f));
        self
    }

    pub fn macro_handler(&self, name: &str) -> Option<&Arc<MacroFn>> {
        self.macros.get(name)
    }

    pub fn filter_handler(&self, name: &str) -> Option<&Arc<FilterFn>> {
        self.filters.get(name)
    }

    pub fn function(&self, name: &str) -> Option<&Arc<MacroFn>> {
        self.functions.get(name)
    }

    pub fn is_empty(&self) -> bool {
        self.macros.is_empty() && self.filters.is_empty() && self.functions.is_empty()
    }

    /// A table holding this table's handlers overlaid with `overlay`'s.
    ///
    /// Entries of `overlay` win on name clashes.
    pub fn merged(&self, overlay: &HandlerTable) -> HandlerTable {
        let mut merged = self.clone();
        merged.extend(overlay);
        merged
    }

    /// Copy every handler of `other` into this table, replacing clashes.
    pub fn extend(&mut self, other: &HandlerTable) {
        self.macros
            .extend(other.macros.iter().map(|(k, v)| (k.clone(), Arc::clone(v))));
        self.filters
            .extend(other.filters.iter().map(|(k, v)| (k.clone(), Arc::clone(v))));
        self.functions
            .extend(other.functions.iter().map(|(k, v)| (k.clone(), Arc::clone(v))));
    }
}

impl fmt::Debug for HandlerTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerTable")
            .field("macros", &sorted_names(&self.macros))
            .field("filters", &sorted_names(&self.filters))
            .field("functions", &sorted_names(&self.functions))
            .finish()
    }
}

fn sorted_names<V>(map: &HashMap<String, V>) -> Vec<&str> {
    let mut names: Vec<&str> = map.keys().map(String::as_str).collect();
    names.sort_unstable();
    names
}
