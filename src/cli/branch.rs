// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 canvasflow contributors

//! Branch command - list the nodes reached from a set of nodes

use colored::Colorize;
use miette::Result;
use std::path::PathBuf;

use super::{load_flow, pipeline_or_primary};
use crate::config::CanvasConfig;
use crate::graph::TraversalDirection;

/// Run the branch command
pub async fn run(
    file: PathBuf,
    nodes: Vec<String>,
    pipeline: Option<String>,
    direction: TraversalDirection,
    config: CanvasConfig,
    verbose: bool,
) -> Result<()> {
    let (canvas, _) = load_flow(&file, config)?;
    let pipeline_id = pipeline_or_primary(&canvas, pipeline)?;

    if let Some(missing) = nodes.iter().find(|id| canvas.get_node(&pipeline_id, id).is_none()) {
        return Err(miette::miette!(
            "Node '{}' not found in pipeline '{}'",
            missing,
            pipeline_id
        ));
    }

    let found = match direction {
        TraversalDirection::Upstream => canvas.get_upstream_nodes(&pipeline_id, &nodes),
        TraversalDirection::Downstream => canvas.get_downstream_nodes(&pipeline_id, &nodes),
        TraversalDirection::Both => canvas.get_branch_nodes(&pipeline_id, &nodes),
    };

    if verbose {
        println!(
            "{}",
            format!("{} node(s) in pipeline '{}'", found.len(), pipeline_id).dimmed()
        );
    }
    for id in &found {
        let label = canvas
            .get_node(&pipeline_id, id)
            .map(|n| n.label.as_str())
            .unwrap_or_default();
        let marker = if nodes.contains(id) { "●".cyan() } else { "•".normal() };
        println!("  {} {} {}", marker, id, label.dimmed());
    }

    Ok(())
}
