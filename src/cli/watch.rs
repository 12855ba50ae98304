// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 canvasflow contributors

//! Watch command - revalidate a document on change

use colored::Colorize;
use miette::Result;
use notify::{RecursiveMode, Watcher};
use notify_debouncer_mini::{new_debouncer, DebouncedEventKind};
use std::path::{Path, PathBuf};
use std::sync::mpsc::channel;
use std::time::Duration;

use super::validate::validate_file;

/// Run the watch command
pub async fn run(file: PathBuf, debounce_ms: u64, verbose: bool) -> Result<()> {
    if !file.exists() {
        return Err(miette::miette!(
            "Document not found: {}\n\n\
             Pass -C <dir> to run from a different directory.",
            file.display()
        ));
    }

    println!("{}", "Starting watch mode...".bold());
    println!("Watching {} (debounce: {}ms)", file.display(), debounce_ms);
    println!("Press {} to exit.", "Ctrl+C".cyan());
    println!();

    let (tx, rx) = channel();

    let mut debouncer = new_debouncer(Duration::from_millis(debounce_ms), tx)
        .map_err(|e| miette::miette!("Failed to create file watcher: {}", e))?;

    // Editors often replace the file, so watch its directory
    let dir = file
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    debouncer
        .watcher()
        .watch(dir, RecursiveMode::NonRecursive)
        .map_err(|e| miette::miette!("Failed to start watching: {}", e))?;

    check(&file, verbose);

    let name = file.file_name().map(|n| n.to_os_string());
    loop {
        match rx.recv() {
            Ok(Ok(events)) => {
                let changed = events
                    .iter()
                    .filter(|e| matches!(e.kind, DebouncedEventKind::Any))
                    .any(|e| e.path.file_name().map(|n| n.to_os_string()) == name);

                if changed {
                    println!();
                    println!("{}", "─".repeat(50).dimmed());
                    println!("{}: {}", "Change detected".yellow(), file.display());
                    println!();
                    check(&file, verbose);
                }
            }
            Ok(Err(e)) => {
                eprintln!("{}: {:?}", "Watch error".red(), e);
            }
            Err(e) => {
                // Channel closed
                eprintln!("{}: {}", "Channel error".red(), e);
                break;
            }
        }
    }

    Ok(())
}

fn check(file: &Path, verbose: bool) {
    let start = std::time::Instant::now();

    match validate_file(file) {
        Ok(report) if report.is_valid() => {
            println!(
                "{} ({:.2}s)",
                "Document is valid".green(),
                start.elapsed().as_secs_f64()
            );
            if verbose {
                for warning in &report.warnings {
                    println!("  {} {}", "⚠".yellow(), warning);
                }
            }
        }
        Ok(report) => {
            println!("{}", "Document is invalid".red());
            for error in &report.errors {
                println!("  {} {}", "✗".red(), error);
            }
        }
        Err(e) => {
            eprintln!("{}: {}", "Failed to load document".red(), e);
        }
    }
}
