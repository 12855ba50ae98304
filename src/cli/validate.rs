// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 canvasflow contributors

//! Validate command - check pipeline flow documents

use colored::Colorize;
use miette::Result;
use std::path::{Path, PathBuf};

use crate::errors::{CanvasError, CanvasResult};
use crate::model::{flow_to_canvas, read_document, upgrade_flow, FlowValidator, ValidationReport};

/// Run the validate command
pub async fn run(patterns: Vec<String>, verbose: bool) -> Result<()> {
    println!("{}", "Validating pipeline flows...".bold());
    println!();

    let files = expand_patterns(&patterns)?;
    let mut failed = 0;

    for file in &files {
        match validate_file(file) {
            Ok(report) => {
                if report.is_valid() {
                    println!("  {} {}", "✓".green(), file.display());
                } else {
                    failed += 1;
                    println!("  {} {}", "✗".red(), file.display());
                    for error in &report.errors {
                        print_error(error);
                    }
                }
                for warning in &report.warnings {
                    println!("      {} {}", "⚠".yellow(), warning);
                }
            }
            Err(e) => {
                failed += 1;
                println!("  {} {}", "✗".red(), file.display());
                print_error(&e);
            }
        }
    }

    if verbose {
        println!();
        println!("{}", format!("Checked {} file(s)", files.len()).dimmed());
    }
    println!();

    if failed > 0 {
        Err(miette::miette!("{} of {} document(s) failed validation", failed, files.len()))
    } else {
        println!("{}", "All documents are valid!".green().bold());
        Ok(())
    }
}

/// Every file named by the patterns; plain paths that do not exist are kept
/// so the missing file is reported
fn expand_patterns(patterns: &[String]) -> CanvasResult<Vec<PathBuf>> {
    let mut files = Vec::new();
    for pattern in patterns {
        let matched: Vec<PathBuf> = glob::glob(pattern)?.filter_map(|entry| entry.ok()).collect();
        if matched.is_empty() {
            files.push(PathBuf::from(pattern));
        } else {
            files.extend(matched);
        }
    }
    Ok(files)
}

/// Load, upgrade and check one document
pub fn validate_file(path: &Path) -> CanvasResult<ValidationReport> {
    let doc = read_document(path)?;
    let loaded = flow_to_canvas(upgrade_flow(doc)?)?;
    Ok(FlowValidator::validate(&loaded.info))
}

fn print_error(error: &CanvasError) {
    println!("      {} {}", "error:".red(), error);
    if let Some(suggestion) = error.suggestion() {
        for line in suggestion.to_string().lines() {
            println!("      {}", line.dimmed());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_validate_file_reports_cycle() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(
            file,
            r#"{{"doc_type": "pipeline", "version": "3.0", "id": "f", "primary_pipeline": "a",
               "pipelines": [
                 {{"id": "a", "nodes": [
                   {{"id": "s1", "type": "super_node", "subflow_ref": {{"pipeline_id_ref": "b"}}}}
                 ]}},
                 {{"id": "b", "nodes": [
                   {{"id": "s2", "type": "super_node", "subflow_ref": {{"pipeline_id_ref": "a"}}}}
                 ]}}
               ]}}"#
        )
        .unwrap();

        let report = validate_file(file.path()).unwrap();
        assert!(!report.is_valid());
        assert!(matches!(report.errors[0], CanvasError::CircularSubflow { .. }));
    }

    #[test]
    fn test_missing_file_is_kept() {
        let files = expand_patterns(&["does-not-exist.json".to_string()]).unwrap();
        assert_eq!(files, vec![PathBuf::from("does-not-exist.json")]);
        assert!(validate_file(&files[0]).is_err());
    }

    #[test]
    fn test_run_fails_on_bad_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, "{ not json").unwrap();

        let result = tokio_test::block_on(run(vec![path.display().to_string()], false));
        assert!(result.is_err());
    }
}
