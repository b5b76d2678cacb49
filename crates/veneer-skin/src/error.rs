/*
 * error.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Error types for skin loading and rendering.
//!
//! Only document-level failures are errors. Malformed builtin invocations are
//! rendered inline and reported as diagnostics instead.

use thiserror::Error;

/// Errors that can occur while loading or rendering skins.
#[derive(Debug, Error)]
pub enum SkinError {
    /// Error tokenizing skin source.
    #[error("Parse error in {origin}: {message}")]
    ParseError { origin: String, message: String },

    /// A referenced skin (extends target or external fragment) does not exist.
    #[error("Skin not found: {name}")]
    NotFound { name: String },

    /// The `extends` chain is deeper than the configured limit.
    #[error("Recursive extends detected (depth > {max_depth}): {name}")]
    RecursiveExtends { name: String, max_depth: usize },

    /// Nested fragment rendering is deeper than the configured limit.
    #[error("Render depth exceeded (depth > {max_depth}) while rendering '{name}'")]
    RecursionLimit { name: String, max_depth: usize },

    /// A context macro, filter or function failed.
    #[error("Error in handler '{name}': {message}")]
    Handler { name: String, message: String },

    /// Context data could not be converted into skin values.
    #[error("Invalid context data: {message}")]
    InvalidData { message: String },

    /// Engine configuration could not be read.
    #[error("Invalid configuration: {message}")]
    Config { message: String },

    /// I/O error (e.g., reading a skin file).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl SkinError {
    /// Build a [`SkinError::Handler`] for a failing context handler.
    pub fn handler(name: impl Into<String>, message: impl Into<String>) -> Self {
        SkinError::Handler {
            name: name.into(),
            message: message.into(),
        }
    }
}

/// Result type for skin operations.
pub type SkinResult<T> = Result<T, SkinError>;
