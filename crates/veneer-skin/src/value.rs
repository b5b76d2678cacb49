/*
 * value.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Skin values.
//!
//! [`SkinValue`] is the data half of a render context: everything a macro
//! returns, a filter receives, or a loop iterates over. Handlers live in the
//! [`HandlerTable`](crate::handlers::HandlerTable), not in values.

use indexmap::IndexMap;

use crate::error::{SkinError, SkinResult};

/// A value that can be used in skin evaluation.
#[derive(Debug, Clone, PartialEq)]
pub enum SkinValue {
    /// A null/missing value. Unresolved names evaluate to this.
    Null,

    /// A boolean value.
    Bool(bool),

    /// An integer value.
    Int(i64),

    /// A floating point value.
    Float(f64),

    /// A string value.
    String(String),

    /// A list of values.
    List(Vec<SkinValue>),

    /// A map of string keys to values, in insertion order.
    Map(IndexMap<String, SkinValue>),
}

impl SkinValue {
    /// Check if this value is "truthy" for `if` evaluation.
    ///
    /// - `false`, zero, NaN, the empty string and null are falsy
    /// - Empty lists and empty maps are falsy
    /// - Everything else is truthy (including the string "false")
    pub fn is_truthy(&self) -> bool {
        match self {
            SkinValue::Null => false,
            SkinValue::Bool(b) => *b,
            SkinValue::Int(n) => *n != 0,
            SkinValue::Float(f) => *f != 0.0 && !f.is_nan(),
            SkinValue::String(s) => !s.is_empty(),
            SkinValue::List(items) => !items.is_empty(),
            SkinValue::Map(m) => !m.is_empty(),
        }
    }

    /// Null or the empty string. Filters never observe such values.
    pub fn is_invisible(&self) -> bool {
        match self {
            SkinValue::Null => true,
            SkinValue::String(s) => s.is_empty(),
            _ => false,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, SkinValue::Null)
    }

    /// Borrow the string content of a `String` value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            SkinValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Get a nested field by path.
    ///
    /// For example, `get_path(&["site", "title"])` on a map containing
    /// `{"site": {"title": "Home"}}` returns the title value. Lookup stops at
    /// a missing segment or a null intermediate segment.
    pub fn get_path(&self, path: &[&str]) -> Option<&SkinValue> {
        let Some((first, rest)) = path.split_first() else {
            return Some(self);
        };

        match self {
            SkinValue::Map(m) => match m.get(*first) {
                Some(SkinValue::Null) if !rest.is_empty() => None,
                Some(v) => v.get_path(rest),
                None => None,
            },
            _ => None,
        }
    }

    /// Render this value as a string for output.
    ///
    /// - String: returned as-is
    /// - Bool: "true" or "false"
    /// - Int/Float: decimal form, integral floats without a fraction
    /// - List: concatenation of rendered elements, no separator
    /// - Map, Null: ""
    pub fn render(&self) -> String {
        match self {
            SkinValue::String(s) => s.clone(),
            SkinValue::Bool(b) => b.to_string(),
            SkinValue::Int(n) => n.to_string(),
            SkinValue::Float(f) => render_float(*f),
            SkinValue::List(items) => items.iter().map(|v| v.render()).collect(),
            SkinValue::Map(_) | SkinValue::Null => String::new(),
        }
    }

    /// The `(index, item)` pairs a `for` loop visits.
    ///
    /// Lists yield their positions, maps yield their keys. A truthy scalar
    /// is iterated once; null and other falsy scalars not at all.
    pub fn iterate(&self) -> Vec<(SkinValue, SkinValue)> {
        match self {
            SkinValue::List(items) => items
                .iter()
                .enumerate()
                .map(|(i, item)| (SkinValue::Int(i as i64), item.clone()))
                .collect(),
            SkinValue::Map(m) => m
                .iter()
                .map(|(k, v)| (SkinValue::String(k.clone()), v.clone()))
                .collect(),
            v if v.is_truthy() => vec![(SkinValue::Int(0), v.clone())],
            _ => Vec::new(),
        }
    }

    /// Convert a JSON document.
    pub fn from_json(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => SkinValue::Null,
            serde_json::Value::Bool(b) => SkinValue::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => SkinValue::Int(i),
                None => SkinValue::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => SkinValue::String(s),
            serde_json::Value::Array(items) => {
                SkinValue::List(items.into_iter().map(SkinValue::from_json).collect())
            }
            serde_json::Value::Object(map) => SkinValue::Map(
                map.into_iter()
                    .map(|(k, v)| (k, SkinValue::from_json(v)))
                    .collect(),
            ),
        }
    }

    /// Convert a YAML document. Mapping keys must be scalars.
    pub fn from_yaml(value: serde_yaml::Value) -> SkinResult<Self> {
        Ok(match value {
            serde_yaml::Value::Null => SkinValue::Null,
            serde_yaml::Value::Bool(b) => SkinValue::Bool(b),
            serde_yaml::Value::Number(n) => match n.as_i64() {
                Some(i) => SkinValue::Int(i),
                None => SkinValue::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_yaml::Value::String(s) => SkinValue::String(s),
            serde_yaml::Value::Sequence(items) => SkinValue::List(
                items
                    .into_iter()
                    .map(SkinValue::from_yaml)
                    .collect::<SkinResult<_>>()?,
            ),
            serde_yaml::Value::Mapping(mapping) => {
                let mut map = IndexMap::with_capacity(mapping.len());
                for (key, value) in mapping {
                    let key = match SkinValue::from_yaml(key)? {
                        SkinValue::Map(_) | SkinValue::List(_) => {
                            return Err(SkinError::InvalidData {
                                message: "mapping keys must be scalars".to_string(),
                            });
                        }
                        scalar => scalar.render(),
                    };
                    map.insert(key, SkinValue::from_yaml(value)?);
                }
                SkinValue::Map(map)
            }
            serde_yaml::Value::Tagged(tagged) => SkinValue::from_yaml(tagged.value)?,
        })
    }
}

fn render_float(f: f64) -> String {
    if f.is_finite() && f.fract() == 0.0 && f.abs() < 1e15 {
        format!("{}", f as i64)
    } else {
        f.to_string()
    }
}

impl Default for SkinValue {
    fn default() -> Self {
        SkinValue::Null
    }
}

impl From<&str> for SkinValue {
    fn from(s: &str) -> Self {
        SkinValue::String(s.to_string())
    }
}

impl From<String> for SkinValue {
    fn from(s: String) -> Self {
        SkinValue::String(s)
    }
}

impl From<bool> for SkinValue {
    fn from(b: bool) -> Self {
        SkinValue::Bool(b)
    }
}

impl From<i64> for SkinValue {
    fn from(n: i64) -> Self {
        SkinValue::Int(n)
    }
}

impl From<i32> for SkinValue {
    fn from(n: i32) -> Self {
        SkinValue::Int(i64::from(n))
    }
}

impl From<f64> for SkinValue {
    fn from(f: f64) -> Self {
        SkinValue::Float(f)
    }
}

impl<T: Into<SkinValue>> From<Vec<T>> for SkinValue {
    fn from(items: Vec<T>) -> Self {
        SkinValue::List(items.into_iter().map(Into::into).collect())
    }
}

impl From<IndexMap<String, SkinValue>> for SkinValue {
    fn from(map: IndexMap<String, SkinValue>) -> Self {
        SkinValue::Map(map)
    }
}

impl From<serde_json::Value> for SkinValue {
    fn from(value: serde_json::Value) -> Self {
        SkinValue::from_json(value)
    }
}
