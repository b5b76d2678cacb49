/*
 * diagnostics.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Render state and diagnostics.
//!
//! This module provides [`RenderState`], which is carried through one render
//! call to support:
//!
//! 1. **Diagnostics**: Collect malformed-builtin warnings alongside the inline error text
//! 2. **State tracking**: Fragment nesting depth for recursion protection

use std::fmt;

use serde::Serialize;

use crate::error::{SkinError, SkinResult};

/// A problem found while rendering that did not stop the render.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderDiagnostic {
    /// The builtin that reported the problem (e.g., "for-in").
    pub macro_name: String,
    /// What went wrong.
    pub message: String,
    /// Origin of the skin being rendered, when it has one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub origin: Option<String>,
}

impl RenderDiagnostic {
    /// The text embedded into the output in place of the macro's result.
    pub fn inline_text(&self) -> String {
        format!("[Error in {} macro: {}]", self.macro_name, self.message)
    }
}

impl fmt::Display for RenderDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.origin {
            Some(origin) => write!(f, "{}: {} macro: {}", origin, self.macro_name, self.message),
            None => write!(f, "{} macro: {}", self.macro_name, self.message),
        }
    }
}

/// Collector for diagnostic messages during rendering.
#[derive(Debug, Default)]
pub struct DiagnosticCollector {
    diagnostics: Vec<RenderDiagnostic>,
}

impl DiagnosticCollector {
    /// Create a new empty diagnostic collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a diagnostic message.
    pub fn add(&mut self, diagnostic: RenderDiagnostic) {
        self.diagnostics.push(diagnostic);
    }

    /// Get a reference to the collected diagnostics.
    pub fn diagnostics(&self) -> &[RenderDiagnostic] {
        &self.diagnostics
    }

    /// Consume the collector and return the diagnostics in report order.
    pub fn into_diagnostics(self) -> Vec<RenderDiagnostic> {
        self.diagnostics
    }

    /// Check if the collector is empty.
    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }
}

/// Mutable state of a single render call.
#[derive(Debug)]
pub struct RenderState {
    /// Diagnostic collector for malformed builtins.
    pub diagnostics: DiagnosticCollector,

    /// Current fragment nesting depth.
    pub depth: usize,

    /// Maximum fragment nesting depth before error.
    pub max_depth: usize,
}

impl RenderState {
    pub fn new(max_depth: usize) -> Self {
        Self {
            diagnostics: DiagnosticCollector::new(),
            depth: 0,
            max_depth,
        }
    }

    /// Enter a nested fragment render.
    pub fn enter(&mut self, name: &str) -> SkinResult<()> {
        if self.depth >= self.max_depth {
            return Err(SkinError::RecursionLimit {
                name: name.to_string(),
                max_depth: self.max_depth,
            });
        }
        self.depth += 1;
        Ok(())
    }

    /// Leave a nested fragment render.
    pub fn leave(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }
}

/// The result of a render call that also reports diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderOutput {
    pub text: String,
    pub diagnostics: Vec<RenderDiagnostic>,
}
