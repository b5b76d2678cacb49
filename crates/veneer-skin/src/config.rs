/*
 * config.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Engine configuration.
//!
//! ```toml
//! cache = true
//! max-depth = 50
//! search-paths = ["skins", "/usr/share/veneer/skins"]
//! default-extension = "html"
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{SkinError, SkinResult};

/// Default bound on `extends` chains and nested fragment rendering.
pub const DEFAULT_MAX_DEPTH: usize = 50;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct EngineConfig {
    /// Keep loaded skins in the process-wide cache.
    pub cache: bool,

    /// Maximum `extends` chain length and fragment nesting depth.
    pub max_depth: usize,

    /// Global lookup roots for non-relative references. Empty means the
    /// current directory.
    pub search_paths: Vec<PathBuf>,

    /// Extension appended to references without one when the referring skin
    /// has none either.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_extension: Option<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            cache: true,
            max_depth: DEFAULT_MAX_DEPTH,
            search_paths: Vec::new(),
            default_extension: None,
        }
    }
}

impl EngineConfig {
    pub fn from_toml_str(source: &str) -> SkinResult<Self> {
        toml::from_str(source).map_err(|e| SkinError::Config {
            message: e.to_string(),
        })
    }

    /// Read a TOML configuration file. Relative search paths are taken
    /// relative to the file's directory.
    pub fn from_file(path: &Path) -> SkinResult<Self> {
        let source = std::fs::read_to_string(path)?;
        let mut config = Self::from_toml_str(&source).map_err(|e| match e {
            SkinError::Config { message } => SkinError::Config {
                message: format!("{}: {}", path.display(), message),
            },
            other => other,
        })?;
        if let Some(dir) = path.parent() {
            for search_path in &mut config.search_paths {
                if search_path.is_relative() {
                    *search_path = dir.join(&*search_path);
                }
            }
        }
        Ok(config)
    }
}
