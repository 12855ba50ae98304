// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 canvasflow contributors

//! Graph command - render a pipeline as a graph

use miette::Result;
use std::path::PathBuf;

use super::{load_flow, pipeline_or_primary};
use crate::config::CanvasConfig;
use crate::graph::{render, GraphFormat};

/// Run the graph command
pub async fn run(
    file: PathBuf,
    pipeline: Option<String>,
    format: GraphFormat,
    config: CanvasConfig,
    _verbose: bool,
) -> Result<()> {
    let (canvas, _) = load_flow(&file, config)?;
    let pipeline_id = pipeline_or_primary(&canvas, pipeline)?;

    if let Some(pipeline) = canvas.get_pipeline(&pipeline_id) {
        println!("{}", render(pipeline, format));
    }

    Ok(())
}
