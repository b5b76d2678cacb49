/*
 * main.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Veneer CLI - Main entry point

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser)]
#[command(name = "veneer")]
#[command(version)]
#[command(about = "Render skin templates", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a skin against a JSON or YAML data file
    Render {
        /// Skin file to render
        skin: PathBuf,

        /// Context data (.json, .yaml or .yml)
        #[arg(short = 'd', long)]
        data: Option<PathBuf>,

        /// Render only this fragment
        #[arg(short = 'f', long)]
        fragment: Option<String>,

        /// Directory searched for non-relative skin references (repeatable)
        #[arg(short = 's', long = "skin-dir")]
        skin_dirs: Vec<PathBuf>,

        /// Engine configuration file (TOML)
        #[arg(short = 'c', long)]
        config: Option<PathBuf>,

        /// Do not cache loaded skins
        #[arg(long)]
        no_cache: bool,

        /// Write output to FILE instead of stdout
        #[arg(short = 'o', long)]
        output: Option<PathBuf>,
    },

    /// Show a skin's inheritance chain and fragments
    Inspect {
        /// Skin file to inspect
        skin: PathBuf,

        /// Directory searched for non-relative skin references (repeatable)
        #[arg(short = 's', long = "skin-dir")]
        skin_dirs: Vec<PathBuf>,

        /// Engine configuration file (TOML)
        #[arg(short = 'c', long)]
        config: Option<PathBuf>,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "veneer=info,veneer_skin=error".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Render {
            skin,
            data,
            fragment,
            skin_dirs,
            config,
            no_cache,
            output,
        } => commands::render::execute(commands::render::RenderArgs {
            skin,
            data,
            fragment,
            skin_dirs,
            config,
            no_cache,
            output,
        }),
        Commands::Inspect {
            skin,
            skin_dirs,
            config,
            json,
        } => commands::inspect::execute(commands::inspect::InspectArgs {
            skin,
            skin_dirs,
            config,
            json,
        }),
    }
}
