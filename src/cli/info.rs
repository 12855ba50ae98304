// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 canvasflow contributors

//! Info command - pipeline hierarchy and object counts

use colored::Colorize;
use miette::Result;
use std::path::PathBuf;

use super::load_flow;
use crate::config::CanvasConfig;
use crate::controller::CanvasController;
use crate::graph::SubflowGraph;

/// Run the info command
pub async fn run(file: PathBuf, config: CanvasConfig, verbose: bool) -> Result<()> {
    let (canvas, warnings) = load_flow(&file, config)?;
    let info = canvas.get_canvas_info();
    let hierarchy = SubflowGraph::build(info);

    println!("{}", format!("Pipeline flow {}", info.id).bold());
    println!("{}", "═".repeat(40));

    print_pipeline(&canvas, &hierarchy, canvas.get_primary_pipeline_id(), None, 0);

    let orphans = hierarchy.orphans();
    if !orphans.is_empty() {
        println!();
        println!("{}:", "Unreferenced pipelines".yellow().bold());
        for id in &orphans {
            print_pipeline(&canvas, &hierarchy, id, None, 1);
        }
    }

    if !hierarchy.unresolved().is_empty() {
        println!();
        println!("{}:", "External pipelines".bold());
        for (parent, missing) in hierarchy.unresolved() {
            let url = canvas
                .get_node(&parent.pipeline_id, &parent.supernode_id)
                .and_then(|n| n.subflow.as_ref())
                .and_then(|s| s.url.as_deref())
                .unwrap_or("no url");
            println!("  {} {} {}", "→".blue(), missing, url.dimmed());
        }
    }

    let messages = canvas.get_flow_messages();
    if !messages.is_empty() {
        println!();
        println!("{}:", "Node messages".bold());
        for m in &messages {
            println!(
                "  {} {}/{}: {}",
                "•".yellow(),
                m.pipeline_id,
                m.node_id,
                m.message.text
            );
        }
    }

    if verbose && !warnings.is_empty() {
        println!();
        println!("{}:", "Warnings".yellow().bold());
        for warning in &warnings {
            println!("  {} {}", "⚠".yellow(), warning);
        }
    }

    Ok(())
}

fn print_pipeline(
    canvas: &CanvasController,
    hierarchy: &SubflowGraph,
    pipeline_id: &str,
    supernode: Option<&str>,
    depth: usize,
) {
    let Some(pipeline) = canvas.get_pipeline(pipeline_id) else {
        return;
    };
    let indent = "  ".repeat(depth);
    let via = supernode
        .map(|s| format!(" via {}", s))
        .unwrap_or_default();

    println!(
        "{}{} {}{}",
        indent,
        pipeline_id.cyan(),
        format!(
            "({} nodes, {} comments, {} links)",
            pipeline.nodes.len(),
            pipeline.comments.len(),
            pipeline.links.len()
        )
        .dimmed(),
        via.dimmed()
    );

    for (supernode_id, child) in hierarchy.children(pipeline_id) {
        print_pipeline(canvas, hierarchy, &child, Some(&supernode_id), depth + 1);
    }
}
