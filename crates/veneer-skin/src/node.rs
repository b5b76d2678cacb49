/*
 * node.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Skin node model.
//!
//! The tokenizer produces a flat stream of literal text and macro [`Node`]s.
//! The loader groups them into [`SkinPart`]s. Nothing here is mutated after
//! loading; rendering only reads these structures.

use indexmap::IndexMap;

use crate::value::SkinValue;

/// A macro tag: `<% name param ... key=value | filter ... %>`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Node {
    /// Macro name, possibly a dotted path (`site.title`).
    pub name: String,
    /// Positional parameters in source order.
    pub parameters: Vec<Param>,
    /// Named parameters (`key=value`), in source order.
    pub named: IndexMap<String, Param>,
    /// Next node of the filter chain (`| filter`).
    pub filter: Option<Box<Node>>,
}

/// A macro parameter: a literal token or a nested macro tag.
#[derive(Debug, Clone, PartialEq)]
pub enum Param {
    /// Bare word or quoted string.
    Text(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Null,
    /// `[a, b, ...]`
    List(Vec<Param>),
    /// `{key: value, ...}`
    Map(Vec<(String, Param)>),
    /// Nested tag `<% ... %>`, evaluated at render time.
    Node(Node),
}

impl Node {
    /// Create a node with no parameters or filters.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Append a positional parameter.
    pub fn with_param(mut self, param: impl Into<Param>) -> Self {
        self.parameters.push(param.into());
        self
    }

    /// Add a named parameter.
    pub fn with_named(mut self, name: impl Into<String>, param: impl Into<Param>) -> Self {
        self.named.insert(name.into(), param.into());
        self
    }

    /// Append a filter to the end of this node's filter chain.
    pub fn with_filter(mut self, filter: Node) -> Self {
        append_filter(&mut self.filter, filter);
        self
    }

    /// Look up a parameter by name, falling back to a positional index.
    pub fn parameter(&self, name: &str, index: Option<usize>) -> Option<&Param> {
        self.named
            .get(name)
            .or_else(|| index.and_then(|i| self.parameters.get(i)))
    }

    /// Look up a named parameter only.
    pub fn named_parameter(&self, name: &str) -> Option<&Param> {
        self.named.get(name)
    }

    /// The filters chained after this node, leftmost first.
    pub fn filters(&self) -> impl Iterator<Item = &Node> {
        std::iter::successors(self.filter.as_deref(), |f| f.filter.as_deref())
    }

    /// Build the macro formed by the parameters from `start` on.
    ///
    /// `<% for x in xs render item %>` has the body `<% render item %>` at
    /// index 3. The sub-macro keeps this node's named parameters but never
    /// its filter chain, which applies to the enclosing macro's result.
    pub fn sub_macro(&self, start: usize) -> Option<Node> {
        Node::from_params(self.parameters.get(start..)?, &self.named)
    }

    /// Build a macro whose name is `params[0]` and whose parameters are the rest.
    pub(crate) fn from_params(params: &[Param], named: &IndexMap<String, Param>) -> Option<Node> {
        let (head, rest) = params.split_first()?;
        match head {
            Param::Text(name) => Some(Node {
                name: name.clone(),
                parameters: rest.to_vec(),
                named: named.clone(),
                filter: None,
            }),
            Param::Node(node) => Some(node.clone()),
            _ => None,
        }
    }
}

fn append_filter(slot: &mut Option<Box<Node>>, filter: Node) {
    match slot {
        Some(next) => append_filter(&mut next.filter, filter),
        None => *slot = Some(Box::new(filter)),
    }
}

impl Param {
    /// The text of a bare word or quoted string.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Param::Text(s) => Some(s),
            _ => None,
        }
    }

    /// True if this is the literal token `keyword` (`in`, `not`, `or`, `and`).
    pub fn is_keyword(&self, keyword: &str) -> bool {
        self.as_text() == Some(keyword)
    }

    /// The value of a literal parameter. Nested nodes have no literal value.
    pub fn literal_value(&self) -> SkinValue {
        match self {
            Param::Text(s) => SkinValue::String(s.clone()),
            Param::Int(n) => SkinValue::Int(*n),
            Param::Float(f) => SkinValue::Float(*f),
            Param::Bool(b) => SkinValue::Bool(*b),
            Param::Null | Param::Node(_) => SkinValue::Null,
            Param::List(items) => SkinValue::List(items.iter().map(Param::literal_value).collect()),
            Param::Map(entries) => SkinValue::Map(
                entries
                    .iter()
                    .map(|(k, v)| (k.clone(), v.literal_value()))
                    .collect(),
            ),
        }
    }
}

impl From<&str> for Param {
    fn from(s: &str) -> Self {
        Param::Text(s.to_string())
    }
}

impl From<String> for Param {
    fn from(s: String) -> Self {
        Param::Text(s)
    }
}

impl From<i64> for Param {
    fn from(n: i64) -> Self {
        Param::Int(n)
    }
}

impl From<Node> for Param {
    fn from(node: Node) -> Self {
        Param::Node(node)
    }
}

/// One element of a part list: literal text or a macro.
#[derive(Debug, Clone, PartialEq)]
pub enum Element {
    Text(String),
    Macro(Node),
}

/// An ordered part list, optionally post-processed by a filter chain.
///
/// The filter is only set on fragments declared as
/// `<% subskin name | filter %>`; it receives the concatenated output of the
/// whole part list, once.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SkinPart {
    pub elements: Vec<Element>,
    pub filter: Option<Node>,
}

impl SkinPart {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_filter(filter: Option<Node>) -> Self {
        Self {
            elements: Vec::new(),
            filter,
        }
    }

    pub fn push(&mut self, element: Element) {
        self.elements.push(element);
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Drop a single trailing whitespace-only text element.
    ///
    /// Returns true if an element was removed.
    pub fn trim_trailing_whitespace(&mut self) -> bool {
        match self.elements.last() {
            Some(Element::Text(text)) if text.trim().is_empty() => {
                self.elements.pop();
                true
            }
            _ => false,
        }
    }
}
