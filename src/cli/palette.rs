// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 canvasflow contributors

//! Palette command - list categories and node templates

use colored::Colorize;
use miette::Result;
use std::path::PathBuf;

use crate::config::CanvasConfig;
use crate::controller::CanvasController;
use crate::model::read_document;

/// Run the palette command
pub async fn run(file: PathBuf, config: CanvasConfig, verbose: bool) -> Result<()> {
    let mut canvas = CanvasController::with_config(config);
    canvas.set_pipeline_flow_palette(read_document(&file)?)?;
    let palette = canvas.get_palette_data();

    println!("{}", format!("Palette (version {})", palette.version).bold());
    if palette.is_empty() {
        println!("  {}", "No categories".dimmed());
    }

    for category in &palette.categories {
        println!();
        println!(
            "{} {}",
            category.label.as_deref().unwrap_or(&category.id).bold(),
            format!("({} node types)", category.node_types.len()).dimmed()
        );
        if category.node_types.is_empty() {
            if let Some(text) = &category.empty_text {
                println!("  {}", text.dimmed());
            }
        }

        for template in &category.node_types {
            let node = canvas.convert_node_template(template);
            let op = node.op.as_deref().unwrap_or("-");
            println!("  {} {} {}", "•".blue(), node.label, op.cyan());
            if verbose {
                if let Some(description) = &node.description {
                    println!("      {}", description.dimmed());
                }
                println!(
                    "      {}",
                    format!(
                        "{} input(s), {} output(s)",
                        node.inputs.len(),
                        node.outputs.len()
                    )
                    .dimmed()
                );
            }
        }
    }

    Ok(())
}
