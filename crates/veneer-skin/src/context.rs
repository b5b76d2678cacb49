/*
 * context.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Render contexts.
//!
//! A [`SkinContext`] is the caller-owned environment a render call is
//! evaluated against: variable bindings plus a [`HandlerTable`]. The engine
//! never mutates a caller's context. Loops and `set` evaluate their bodies in
//! a [`child`](SkinContext::child) that shadows the parent's bindings.

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{SkinError, SkinResult};
use crate::handlers::{FilterCall, HandlerTable, MacroCall};
use crate::value::SkinValue;

/// Variable bindings at one scope level.
#[derive(Debug, Clone, Default)]
struct Scope {
    variables: HashMap<String, SkinValue>,
    parent: Option<Arc<Scope>>,
}

impl Scope {
    fn get(&self, key: &str) -> Option<&SkinValue> {
        self.variables
            .get(key)
            .or_else(|| self.parent.as_ref().and_then(|p| p.get(key)))
    }
}

/// A context for skin evaluation containing variable bindings and handlers.
///
/// Cloning is cheap: scopes and handlers are shared.
#[derive(Debug, Clone, Default)]
pub struct SkinContext {
    scope: Arc<Scope>,
    handlers: Arc<HandlerTable>,
}

impl SkinContext {
    /// Create a new empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a context from a JSON object; each top-level key becomes a variable.
    pub fn from_json(value: serde_json::Value) -> SkinResult<Self> {
        Self::from_value(SkinValue::from_json(value))
    }

    /// Build a context from YAML source whose root is a mapping.
    pub fn from_yaml(source: &str) -> SkinResult<Self> {
        let yaml: serde_yaml::Value =
            serde_yaml::from_str(source).map_err(|e| SkinError::InvalidData {
                message: e.to_string(),
            })?;
        Self::from_value(SkinValue::from_yaml(yaml)?)
    }

    /// Build a context from a map value.
    pub fn from_value(value: SkinValue) -> SkinResult<Self> {
        match value {
            SkinValue::Map(map) => {
                let mut ctx = Self::new();
                for (key, value) in map {
                    ctx.insert(key, value);
                }
                Ok(ctx)
            }
            SkinValue::Null => Ok(Self::new()),
            other => Err(SkinError::InvalidData {
                message: format!("context data must be a map, got {:?}", other),
            }),
        }
    }

    /// Insert a variable at this scope level.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<SkinValue>) {
        Arc::make_mut(&mut self.scope)
            .variables
            .insert(key.into(), value.into());
    }

    /// Get a variable from the context, checking parent scopes.
    pub fn get(&self, key: &str) -> Option<&SkinValue> {
        self.scope.get(key)
    }

    /// Get a variable by path (e.g., `["site", "title"]`).
    ///
    /// Lookup stops at a missing segment or a null intermediate segment.
    pub fn get_path(&self, path: &[&str]) -> Option<&SkinValue> {
        let (first, rest) = path.split_first()?;
        match self.get(first) {
            Some(SkinValue::Null) if !rest.is_empty() => None,
            Some(v) => v.get_path(rest),
            None => None,
        }
    }

    /// Create a child context for a nested scope (e.g., loop iteration).
    ///
    /// The child sees the parent's variables and handlers; bindings inserted
    /// into the child never reach the parent.
    pub fn child(&self) -> SkinContext {
        SkinContext {
            scope: Arc::new(Scope {
                variables: HashMap::new(),
                parent: Some(Arc::clone(&self.scope)),
            }),
            handlers: Arc::clone(&self.handlers),
        }
    }

    /// The handlers visible in this context.
    pub fn handlers(&self) -> &HandlerTable {
        &self.handlers
    }

    /// Mutable access to this context's handlers.
    pub fn handlers_mut(&mut self) -> &mut HandlerTable {
        Arc::make_mut(&mut self.handlers)
    }

    /// Same bindings, different handlers.
    pub fn with_handlers(&self, handlers: HandlerTable) -> SkinContext {
        SkinContext {
            scope: Arc::clone(&self.scope),
            handlers: Arc::new(handlers),
        }
    }

    /// Register a macro for `<% name %>` in this context.
    pub fn register_macro<F>(&mut self, name: impl Into<String>, f: F) -> &mut Self
    where
        F: Fn(&MacroCall<'_>) -> SkinResult<SkinValue> + Send + Sync + 'static,
    {
        self.handlers_mut().register_macro(name, f);
        self
    }

    /// Register a filter for `| name` in this context.
    pub fn register_filter<F>(&mut self, name: impl Into<String>, f: F) -> &mut Self
    where
        F: Fn(SkinValue, &FilterCall<'_>) -> SkinResult<SkinValue> + Send + Sync + 'static,
    {
        self.handlers_mut().register_filter(name, f);
        self
    }

    /// Register a callable value in this context.
    pub fn register_function<F>(&mut self, name: impl Into<String>, f: F) -> &mut Self
    where
        F: Fn(&MacroCall<'_>) -> SkinResult<SkinValue> + Send + Sync + 'static,
    {
        self.handlers_mut().register_function(name, f);
        self
    }
}
