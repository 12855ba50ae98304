// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 canvasflow contributors

//! canvasflow - Pipeline Canvas Controller
//!
//! Validate, upgrade and query pipeline flow documents.

use clap::Parser;
use miette::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use canvasflow::cli::{load_config, Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_env("CANVASFLOW_LOG")
                .or_else(|_| EnvFilter::try_from_default_env())
                .unwrap_or_else(|_| "canvasflow=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let cli = Cli::parse();

    // Change to specified directory if provided
    if let Some(ref dir) = cli.directory {
        std::env::set_current_dir(dir).map_err(|e| {
            miette::miette!("Failed to change to directory '{}': {}", dir.display(), e)
        })?;
    }

    let config = load_config(cli.config.as_deref())?;

    // Dispatch to command handlers
    match cli.command {
        Commands::Validate { files } => canvasflow::cli::validate::run(files, cli.verbose).await,
        Commands::Upgrade {
            file,
            output,
            format,
        } => canvasflow::cli::upgrade::run(file, output, format, config, cli.verbose).await,
        Commands::Graph {
            file,
            pipeline,
            format,
        } => canvasflow::cli::graph::run(file, pipeline, format, config, cli.verbose).await,
        Commands::Branch {
            file,
            nodes,
            pipeline,
            direction,
        } => {
            canvasflow::cli::branch::run(file, nodes, pipeline, direction, config, cli.verbose)
                .await
        }
        Commands::Info { file } => canvasflow::cli::info::run(file, config, cli.verbose).await,
        Commands::Palette { file } => {
            canvasflow::cli::palette::run(file, config, cli.verbose).await
        }
        Commands::Watch { file, debounce } => {
            canvasflow::cli::watch::run(file, debounce, cli.verbose).await
        }
    }
}
