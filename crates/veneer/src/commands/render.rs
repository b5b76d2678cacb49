/*
 * render.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Render command implementation
 */

//! Render command implementation.
//!
//! Loads one skin file, builds the context from an optional data file and
//! writes the rendered main body (or a single fragment) to stdout or a file.
//! Malformed builtins do not fail the command; they are reported as warnings.

use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use veneer_skin::SkinContext;

/// Arguments for the render command
#[derive(Debug)]
pub struct RenderArgs {
    pub skin: PathBuf,
    pub data: Option<PathBuf>,
    pub fragment: Option<String>,
    pub skin_dirs: Vec<PathBuf>,
    pub config: Option<PathBuf>,
    pub no_cache: bool,
    pub output: Option<PathBuf>,
}

/// Execute the render command
pub fn execute(args: RenderArgs) -> Result<()> {
    let env = super::environment(
        &args.skin,
        args.config.as_deref(),
        &args.skin_dirs,
        args.no_cache,
    )?;

    let skin = env
        .load_file(&args.skin)
        .with_context(|| format!("Failed to load skin {}", args.skin.display()))?;
    debug!(skin = %args.skin.display(), "Loaded skin");

    let context = match &args.data {
        Some(path) => super::load_data(path)?,
        None => SkinContext::new(),
    };

    let rendered = match &args.fragment {
        Some(name) => env
            .render_fragment_with_diagnostics(&skin, name, &context)
            .with_context(|| format!("Failed to render fragment '{name}'"))?,
        None => env
            .render_with_diagnostics(&skin, &context)
            .with_context(|| format!("Failed to render {}", args.skin.display()))?,
    };

    for diagnostic in &rendered.diagnostics {
        warn!("{diagnostic}");
    }

    match &args.output {
        Some(path) => {
            std::fs::write(path, &rendered.text)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            info!(output = %path.display(), "Rendered");
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout
                .write_all(rendered.text.as_bytes())
                .context("Failed to write to stdout")?;
            stdout.flush()?;
        }
    }

    Ok(())
}
