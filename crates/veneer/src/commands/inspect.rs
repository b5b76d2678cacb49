/*
 * inspect.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Inspect command: print a skin's inheritance chain and fragment names.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use serde_json::json;

use veneer_skin::Skin;

/// Arguments for the inspect command
#[derive(Debug)]
pub struct InspectArgs {
    pub skin: PathBuf,
    pub skin_dirs: Vec<PathBuf>,
    pub config: Option<PathBuf>,
    pub json: bool,
}

pub fn execute(args: InspectArgs) -> Result<()> {
    let env = super::environment(&args.skin, args.config.as_deref(), &args.skin_dirs, false)?;
    let skin = env
        .load_file(&args.skin)
        .with_context(|| format!("Failed to load skin {}", args.skin.display()))?;

    let origin = display_origin(&skin);
    let parents: Vec<String> = ancestors(&skin).map(|s| display_origin(s)).collect();
    let fragments: Vec<&str> = skin.fragment_names().collect();

    if args.json {
        let report = json!({
            "origin": origin,
            "parents": parents,
            "fragments": fragments,
            "main_elements": skin.main().elements.len(),
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("origin: {origin}");
    for parent in &parents {
        println!("parent: {parent}");
    }
    for fragment in &fragments {
        println!("fragment: {fragment}");
    }
    Ok(())
}

fn ancestors(skin: &Arc<Skin>) -> impl Iterator<Item = &Arc<Skin>> {
    std::iter::successors(skin.parent(), |s| s.parent())
}

fn display_origin(skin: &Skin) -> String {
    skin.origin()
        .map_or_else(|| "<string>".to_string(), |o| o.display().to_string())
}
