/*
 * stdlib.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Standard filters.
//!
//! These are registered as environment globals. A context registering a
//! filter of the same name shadows the standard one for its render calls.

use crate::error::SkinResult;
use crate::handlers::{FilterCall, HandlerTable};
use crate::value::SkinValue;

/// The table of standard filters.
pub fn standard_filters() -> HandlerTable {
    let mut table = HandlerTable::new();
    table
        .register_filter("uppercase", |v, _| Ok(SkinValue::String(v.render().to_uppercase())))
        .register_filter("lowercase", |v, _| Ok(SkinValue::String(v.render().to_lowercase())))
        .register_filter("trim", |v, _| Ok(SkinValue::String(v.render().trim().to_string())))
        .register_filter("length", |v, _| Ok(length(&v)))
        .register_filter("first", |v, _| Ok(first(v)))
        .register_filter("last", |v, _| Ok(last(v)))
        .register_filter("reverse", |v, _| Ok(reverse(v)))
        .register_filter("escape_html", |v, _| Ok(SkinValue::String(escape_html(&v.render()))))
        .register_filter("default", default)
        .register_filter("join", join);
    table
}

fn length(value: &SkinValue) -> SkinValue {
    let len = match value {
        SkinValue::List(items) => items.len(),
        SkinValue::Map(map) => map.len(),
        SkinValue::Null => 0,
        other => other.render().chars().count(),
    };
    SkinValue::Int(i64::try_from(len).unwrap_or(i64::MAX))
}

fn first(value: SkinValue) -> SkinValue {
    match value {
        SkinValue::List(items) => items.into_iter().next().unwrap_or_default(),
        SkinValue::String(s) => s.chars().next().map(char_value).unwrap_or_default(),
        other => other,
    }
}

fn last(value: SkinValue) -> SkinValue {
    match value {
        SkinValue::List(mut items) => items.pop().unwrap_or_default(),
        SkinValue::String(s) => s.chars().next_back().map(char_value).unwrap_or_default(),
        other => other,
    }
}

fn char_value(c: char) -> SkinValue {
    SkinValue::String(c.to_string())
}

fn reverse(value: SkinValue) -> SkinValue {
    match value {
        SkinValue::List(mut items) => {
            items.reverse();
            SkinValue::List(items)
        }
        SkinValue::String(s) => SkinValue::String(s.chars().rev().collect()),
        other => other,
    }
}

/// Escape the characters that are significant in HTML text and attributes.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

/// `| default fallback`: the fallback for empty values.
fn default(value: SkinValue, call: &FilterCall<'_>) -> SkinResult<SkinValue> {
    if value.is_invisible() {
        call.arg(0)
    } else {
        Ok(value)
    }
}

/// `| join [separator]`: join list items, rendered.
fn join(value: SkinValue, call: &FilterCall<'_>) -> SkinResult<SkinValue> {
    match value {
        SkinValue::List(items) => {
            let separator = call.arg(0)?.render();
            let rendered: Vec<String> = items.iter().map(SkinValue::render).collect();
            Ok(SkinValue::String(rendered.join(&separator)))
        }
        other => Ok(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::SkinContext;
    use crate::environment::SkinEnvironment;
    use crate::resolver::MemoryResolver;
    use serde_json::json;
    use std::sync::Arc;

    fn render(source: &str, data: serde_json::Value) -> String {
        let env = SkinEnvironment::new(Arc::new(MemoryResolver::new()));
        let skin = env.load_source(source).unwrap();
        env.render(&skin, &SkinContext::from_json(data).unwrap())
            .unwrap()
    }

    #[test]
    fn test_case_and_trim() {
        let data = json!({"s": "  Hello  "});
        assert_eq!(render("<% s | trim | uppercase %>", data.clone()), "HELLO");
        assert_eq!(render("<% s | trim | lowercase %>", data), "hello");
    }

    #[test]
    fn test_list_filters() {
        let data = json!({"xs": ["a", "b", "c"]});
        assert_eq!(render("<% xs | length %>", data.clone()), "3");
        assert_eq!(render("<% xs | first %>", data.clone()), "a");
        assert_eq!(render("<% xs | last %>", data.clone()), "c");
        assert_eq!(render("<% xs | reverse %>", data.clone()), "cba");
        assert_eq!(render("<% xs | join ', ' %>", data.clone()), "a, b, c");
        assert_eq!(render("<% xs | reverse | join '-' %>", data), "c-b-a");
    }

    #[test]
    fn test_string_filters() {
        let data = json!({"s": "héllo"});
        assert_eq!(render("<% s | length %>", data.clone()), "5");
        assert_eq!(render("<% s | first %>", data.clone()), "h");
        assert_eq!(render("<% s | last %>", data.clone()), "o");
        assert_eq!(render("<% s | reverse %>", data), "olléh");
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(
            render("<% s | escape_html %>", json!({"s": "<a href=\"x\">Tom & 'Jerry'</a>"})),
            "&lt;a href=&quot;x&quot;&gt;Tom &amp; &#39;Jerry&#39;&lt;/a&gt;"
        );
    }

    #[test]
    fn test_default() {
        assert_eq!(render("<% missing | default none %>", json!({})), "none");
        assert_eq!(render("<% s | default none %>", json!({"s": ""})), "none");
        assert_eq!(render("<% s | default none %>", json!({"s": "x"})), "x");
        assert_eq!(
            render("<% missing | default <% other %> %>", json!({"other": "O"})),
            "O"
        );
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(render("<% missing | length %>", json!({})), "0");
        assert_eq!(render("[<% missing | uppercase %>]", json!({})), "[]");
    }

    #[test]
    fn test_context_shadows_standard_filter() {
        let env = SkinEnvironment::new(Arc::new(MemoryResolver::new()));
        let skin = env.load_source("<% s | uppercase %>").unwrap();
        let mut ctx = SkinContext::from_json(json!({"s": "abc"})).unwrap();
        assert_eq!(env.render(&skin, &ctx).unwrap(), "ABC");

        ctx.register_filter("uppercase", |_, _| Ok(SkinValue::from("mine")));
        assert_eq!(env.render(&skin, &ctx).unwrap(), "mine");
    }
}
