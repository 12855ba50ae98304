// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 canvasflow contributors

//! Upgrade command - rewrite a document at the latest schema version

use colored::Colorize;
use miette::Result;
use std::path::PathBuf;

use crate::config::CanvasConfig;
use crate::controller::CanvasController;
use crate::errors::CanvasError;
use crate::model::{detect_version, read_document, render_document, DocumentFormat};

/// Run the upgrade command
pub async fn run(
    file: PathBuf,
    output: Option<PathBuf>,
    format: Option<DocumentFormat>,
    config: CanvasConfig,
    verbose: bool,
) -> Result<()> {
    let doc = read_document(&file)?;
    let from_version = detect_version(&doc)?;
    let mut canvas = CanvasController::with_config(config);
    let warnings = canvas.set_pipeline_flow(doc)?;
    let flow = canvas.get_pipeline_flow();

    let format = format
        .or_else(|| output.as_deref().map(DocumentFormat::from_path))
        .unwrap_or_default();
    let text = render_document(&flow, format)?;

    match output {
        Some(path) => {
            std::fs::write(&path, text).map_err(|e| CanvasError::FileWriteError {
                path: path.clone(),
                error: e.to_string(),
            })?;
            println!(
                "{} {} (version {} → {})",
                "Upgraded".green().bold(),
                path.display(),
                from_version,
                flow.version
            );
            if verbose {
                for warning in &warnings {
                    println!("  {} {}", "⚠".yellow(), warning);
                }
            }
        }
        None => {
            for warning in &warnings {
                eprintln!("{} {}", "warning:".yellow(), warning);
            }
            println!("{}", text);
        }
    }

    Ok(())
}
