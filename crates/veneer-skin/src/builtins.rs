/*
 * builtins.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Builtin control forms.
//!
//! ```text
//! <% render name %>
//! <% echo a <% b %> separator=", " wrap=["<i>", "</i>"] %>
//! <% for x in <% xs %> [and y in <% ys %>] body... x-separator=", " %>
//! <% if [not] <% cond %> [or|and ...] body... %>
//! <% set {key: <% value %>} body... %>
//! ```
//!
//! Builtins are matched by exact name before any context lookup, so a context
//! cannot override them. A malformed `for`, `if` or `set` does not fail the
//! render: it yields an inline error message and a diagnostic.

use crate::context::SkinContext;
use crate::error::SkinResult;
use crate::evaluator::Renderer;
use crate::node::{Node, Param};
use crate::skin::Skin;
use crate::value::SkinValue;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    Render,
    Echo,
    For,
    If,
    Set,
}

impl Builtin {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "render" => Some(Builtin::Render),
            "echo" => Some(Builtin::Echo),
            "for" => Some(Builtin::For),
            "if" => Some(Builtin::If),
            "set" => Some(Builtin::Set),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Builtin::Render => "render",
            Builtin::Echo => "echo",
            Builtin::For => "for",
            Builtin::If => "if",
            Builtin::Set => "set",
        }
    }
}

pub(crate) fn evaluate(
    builtin: Builtin,
    renderer: &Renderer<'_>,
    skin: &Skin,
    node: &Node,
    context: &SkinContext,
) -> SkinResult<SkinValue> {
    match builtin {
        Builtin::Render => render(renderer, skin, node, context),
        Builtin::Echo => echo(renderer, skin, node, context),
        Builtin::For => for_in(renderer, skin, node, context),
        Builtin::If => if_chain(renderer, skin, node, &node.parameters, context, false),
        Builtin::Set => set(renderer, skin, node, context),
    }
}

fn render(renderer: &Renderer<'_>, skin: &Skin, node: &Node, context: &SkinContext) -> SkinResult<SkinValue> {
    let Some(param) = node.parameters.first() else {
        return Ok(SkinValue::String(String::new()));
    };
    let name = renderer.evaluate_param(skin, param, context)?;
    if name.is_invisible() {
        return Ok(SkinValue::String(String::new()));
    }
    renderer
        .render_fragment(skin, &name.render(), context)
        .map(SkinValue::String)
}

fn echo(renderer: &Renderer<'_>, skin: &Skin, node: &Node, context: &SkinContext) -> SkinResult<SkinValue> {
    let wrap = wrapper(renderer, skin, node.named_parameter("wrap"), context)?;
    let separator = match node.named_parameter("separator") {
        Some(param) => renderer.evaluate_param(skin, param, context)?.render(),
        None => " ".to_string(),
    };

    let mut items = Vec::with_capacity(node.parameters.len());
    for param in &node.parameters {
        let value = renderer.evaluate_param(skin, param, context)?;
        items.push(apply_wrap(&wrap, value.render()));
    }
    Ok(SkinValue::String(items.join(&separator)))
}

fn for_in(renderer: &Renderer<'_>, skin: &Skin, node: &Node, context: &SkinContext) -> SkinResult<SkinValue> {
    const LABEL: &str = "for-in";

    let params = &node.parameters;
    if params.len() < 4 {
        return Ok(renderer.malformed(skin, LABEL, "not enough parameters"));
    }
    if !params[1].is_keyword("in") {
        return Ok(renderer.malformed(skin, LABEL, "expected 'in' as second parameter"));
    }
    let Some(var) = params[0].as_text() else {
        return Ok(renderer.malformed(skin, LABEL, "loop variable must be a name"));
    };
    let Some(mut body) = node.sub_macro(3) else {
        return Ok(renderer.malformed(skin, LABEL, "loop body must be a macro"));
    };
    // `for x in xs and y in ys ...` nests a second loop
    if body.name == "and" {
        body.name = Builtin::For.name().to_string();
    }

    let list = renderer.evaluate_param(skin, &params[2], context)?;
    let wrap = wrapper(renderer, skin, loop_option(node, var, "wrap"), context)?;
    let separator = match loop_option(node, var, "separator") {
        Some(param) => renderer.evaluate_param(skin, param, context)?.render(),
        None => String::new(),
    };

    let mut items = Vec::new();
    for (index, item) in list.iterate() {
        let mut scope = context.child();
        scope.insert(var, item);
        scope.insert("index", index);
        let value = renderer.evaluate_macro(skin, &body, &scope)?;
        if !value.is_invisible() {
            items.push(apply_wrap(&wrap, value.render()));
        }
    }
    Ok(SkinValue::String(items.join(&separator)))
}

/// `<var>-<option>` if present, else the plain `<option>`.
fn loop_option<'n>(node: &'n Node, var: &str, option: &str) -> Option<&'n Param> {
    node.named_parameter(&format!("{}-{}", var, option))
        .or_else(|| node.named_parameter(option))
}

/// Evaluate an `if` chain starting at `params`.
///
/// With `bypass` set the leading condition is taken as satisfied without
/// being evaluated; an `or` sets it for the rest of the chain once a
/// condition has held.
fn if_chain(
    renderer: &Renderer<'_>,
    skin: &Skin,
    node: &Node,
    params: &[Param],
    context: &SkinContext,
    bypass: bool,
) -> SkinResult<SkinValue> {
    const LABEL: &str = "if";

    let negate = params.first().is_some_and(|p| p.is_keyword("not"));
    let first = usize::from(negate);
    if params.len() < first + 2 {
        return Ok(renderer.malformed(skin, LABEL, "not enough parameters"));
    }

    let condition = bypass || {
        let value = renderer.evaluate_param(skin, &params[first], context)?;
        value.is_truthy() != negate
    };

    let next = &params[first + 1];
    if next.is_keyword("or") {
        return if_chain(renderer, skin, node, &params[first + 2..], context, condition);
    }
    if !condition {
        return Ok(SkinValue::String(String::new()));
    }
    if next.is_keyword("and") {
        return if_chain(renderer, skin, node, &params[first + 2..], context, false);
    }

    match Node::from_params(&params[first + 1..], &node.named) {
        Some(body) => renderer.evaluate_macro(skin, &body, context),
        None => Ok(renderer.malformed(skin, LABEL, "body must be a macro")),
    }
}

fn set(renderer: &Renderer<'_>, skin: &Skin, node: &Node, context: &SkinContext) -> SkinResult<SkinValue> {
    const LABEL: &str = "set";

    let params = &node.parameters;
    if params.len() < 2 {
        return Ok(renderer.malformed(skin, LABEL, "not enough parameters"));
    }
    let Param::Map(bindings) = &params[0] else {
        return Ok(renderer.malformed(skin, LABEL, "first parameter must be a map"));
    };
    let Some(body) = node.sub_macro(1) else {
        return Ok(renderer.malformed(skin, LABEL, "body must be a macro"));
    };

    let mut scope = context.child();
    for (key, param) in bindings {
        // Values see the enclosing scope, not each other
        scope.insert(key.as_str(), renderer.evaluate_param(skin, param, context)?);
    }
    renderer.evaluate_macro(skin, &body, &scope)
}

fn wrapper(
    renderer: &Renderer<'_>,
    skin: &Skin,
    param: Option<&Param>,
    context: &SkinContext,
) -> SkinResult<Option<(String, String)>> {
    let Some(param) = param else {
        return Ok(None);
    };
    match renderer.evaluate_param(skin, param, context)? {
        SkinValue::List(items) if items.len() == 2 => {
            Ok(Some((items[0].render(), items[1].render())))
        }
        _ => Ok(None),
    }
}

fn apply_wrap(wrap: &Option<(String, String)>, text: String) -> String {
    match wrap {
        Some((prefix, suffix)) => format!("{prefix}{text}{suffix}"),
        None => text,
    }
}
