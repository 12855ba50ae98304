// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 canvasflow contributors

//! CLI command definitions and handlers
//!
//! Defines the command-line interface for canvasflow.

pub mod branch;
pub mod graph;
pub mod info;
pub mod palette;
pub mod upgrade;
pub mod validate;
pub mod watch;

use clap::{Parser, Subcommand};
use miette::Result;
use std::path::{Path, PathBuf};

use crate::config::CanvasConfig;
use crate::controller::CanvasController;
use crate::graph::{GraphFormat, TraversalDirection};
use crate::model::{read_document, DocumentFormat};

/// Pipeline canvas controller
///
/// Inspect, check and upgrade pipeline flow documents.
#[derive(Parser, Debug)]
#[clap(
    name = "canvasflow",
    version,
    about = "Pipeline flow documents: validation, upgrades and graph queries",
    long_about = None,
    after_help = "Examples:\n\
        canvasflow validate flows/*.json          Check documents\n\
        canvasflow upgrade old.json -o new.json   Write the latest schema version\n\
        canvasflow graph flow.json -f mermaid     Render the primary pipeline\n\
        canvasflow branch flow.json --node n1     Show the branch through a node\n\n\
        See 'canvasflow <command> --help' for more information on a specific command."
)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[clap(short, long, global = true)]
    pub verbose: bool,

    /// Change to directory before executing
    #[clap(short = 'C', long, global = true, value_name = "DIR")]
    pub directory: Option<PathBuf>,

    /// Canvas configuration file (defaults to .canvasflow.toml when present)
    #[clap(long, global = true, value_name = "TOML")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Load, upgrade and integrity-check pipeline flow documents
    Validate {
        /// Files or glob patterns
        #[clap(required = true)]
        files: Vec<String>,
    },

    /// Write a document at the latest schema version
    Upgrade {
        /// Document to upgrade
        file: PathBuf,

        /// Output file (default: stdout)
        #[clap(short, long)]
        output: Option<PathBuf>,

        /// Output format: json or yaml (default: from the output extension, else json)
        #[clap(short, long)]
        format: Option<DocumentFormat>,
    },

    /// Show a pipeline as a graph
    Graph {
        /// Pipeline flow document
        file: PathBuf,

        /// Pipeline to render (default: the primary pipeline)
        #[clap(short, long)]
        pipeline: Option<String>,

        /// Output format: text, dot or mermaid
        #[clap(short, long, default_value = "text")]
        format: GraphFormat,
    },

    /// List the nodes upstream, downstream or on the branch of given nodes
    Branch {
        /// Pipeline flow document
        file: PathBuf,

        /// Node ids to start from
        #[clap(short, long = "node", required = true)]
        nodes: Vec<String>,

        /// Pipeline holding the nodes (default: the primary pipeline)
        #[clap(short, long)]
        pipeline: Option<String>,

        /// Which way to follow links: upstream, downstream or both
        #[clap(short, long, default_value = "both")]
        direction: TraversalDirection,
    },

    /// Show the pipeline hierarchy and object counts
    Info {
        /// Pipeline flow document
        file: PathBuf,
    },

    /// List the categories and node templates of a palette
    Palette {
        /// Palette document
        file: PathBuf,
    },

    /// Watch mode - revalidate a document on change
    Watch {
        /// Pipeline flow document
        file: PathBuf,

        /// Debounce delay in milliseconds
        #[clap(long, default_value = "500")]
        debounce: u64,
    },
}

/// Configuration from `--config`, or `.canvasflow.toml` in the working
/// directory, or defaults
pub fn load_config(path: Option<&Path>) -> Result<CanvasConfig> {
    let config = match path {
        Some(path) => CanvasConfig::from_file(path)?,
        None => {
            let cwd = std::env::current_dir()
                .map_err(|e| miette::miette!("Failed to get current directory: {}", e))?;
            CanvasConfig::discover(&cwd)?
        }
    };
    Ok(config)
}

/// A controller holding the document at `path`, plus its integrity warnings
pub fn load_flow(path: &Path, config: CanvasConfig) -> Result<(CanvasController, Vec<String>)> {
    let doc = read_document(path)?;
    let mut canvas = CanvasController::with_config(config);
    let warnings = canvas.set_pipeline_flow(doc)?;
    Ok((canvas, warnings))
}

/// The requested pipeline, or the primary one
pub(crate) fn pipeline_or_primary(
    canvas: &CanvasController,
    pipeline: Option<String>,
) -> Result<String> {
    let pipeline_id = pipeline.unwrap_or_else(|| canvas.get_primary_pipeline_id().to_string());
    if canvas.get_pipeline(&pipeline_id).is_none() {
        return Err(miette::miette!(
            "Pipeline '{}' not found\n\nRun 'canvasflow info <file>' to list pipelines.",
            pipeline_id
        ));
    }
    Ok(pipeline_id)
}
