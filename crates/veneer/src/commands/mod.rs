/*
 * mod.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Command implementations for the veneer CLI
//!
//! Each command module handles the CLI interface and delegates to
//! veneer-skin for loading and rendering.

pub mod inspect;
pub mod render;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use veneer_skin::{EngineConfig, SkinContext, SkinEnvironment};

/// Build the environment a command loads skins through.
///
/// Search paths from `--skin-dir` come before those in the configuration
/// file. With no search path at all, the skin's own directory is used.
pub(crate) fn environment(
    skin: &Path,
    config: Option<&Path>,
    skin_dirs: &[PathBuf],
    no_cache: bool,
) -> Result<SkinEnvironment> {
    let mut engine_config = match config {
        Some(path) => EngineConfig::from_file(path)
            .with_context(|| format!("Failed to read configuration {}", path.display()))?,
        None => EngineConfig::default(),
    };

    let mut search_paths = skin_dirs.to_vec();
    search_paths.append(&mut engine_config.search_paths);
    if search_paths.is_empty() {
        let dir = skin
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map_or_else(|| PathBuf::from("."), Path::to_path_buf);
        search_paths.push(dir);
    }
    engine_config.search_paths = search_paths;

    if engine_config.default_extension.is_none() {
        engine_config.default_extension = skin
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_string);
    }
    if no_cache {
        engine_config.cache = false;
    }

    tracing::debug!(
        search_paths = ?engine_config.search_paths,
        cache = engine_config.cache,
        max_depth = engine_config.max_depth,
        "Engine configuration"
    );
    Ok(SkinEnvironment::from_config(engine_config))
}

/// Read a context from a JSON or YAML data file, chosen by extension.
pub(crate) fn load_data(path: &Path) -> Result<SkinContext> {
    let source = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read data file {}", path.display()))?;

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    let context = match extension.as_deref() {
        Some("json") => {
            let value: serde_json::Value = serde_json::from_str(&source)
                .with_context(|| format!("Invalid JSON in {}", path.display()))?;
            SkinContext::from_json(value)?
        }
        Some("yaml" | "yml") => SkinContext::from_yaml(&source)
            .with_context(|| format!("Invalid YAML in {}", path.display()))?,
        _ => bail!(
            "Unsupported data file {}: expected .json, .yaml or .yml",
            path.display()
        ),
    };
    Ok(context)
}
