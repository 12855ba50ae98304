// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 canvasflow contributors

//! Error recovery suggestions
//!
//! Provides actionable suggestions for repairing pipeline flow documents.

use crate::model::ObjectKind;

/// A recovery suggestion with concrete steps
#[derive(Debug, Clone)]
pub struct RecoverySuggestion {
    /// Brief description of what to do
    pub action: String,
    /// Detailed steps
    pub steps: Vec<String>,
    /// Commands to run
    pub commands: Vec<String>,
}

impl RecoverySuggestion {
    /// Suggest breaking a supernode reference cycle
    pub fn fix_circular_subflow(pipelines: &[String]) -> Self {
        Self {
            action: "Remove the circular supernode reference".into(),
            steps: vec![
                format!("Detected cycle: {}", pipelines.join(" → ")),
                "Each supernode's subflow_ref must point to a pipeline nested below it".into(),
                "Change or remove the subflow_ref that points back up the hierarchy".into(),
            ],
            commands: vec![
                "# Inspect the pipeline hierarchy:".into(),
                "canvasflow info <flow.json>".into(),
            ],
        }
    }

    /// Suggest resolving a pipeline shared by several supernodes
    pub fn fix_ambiguous_subflow(pipeline_id: &str, supernodes: &[String]) -> Self {
        Self {
            action: format!("Give pipeline '{}' a single owning supernode", pipeline_id),
            steps: vec![
                format!("Supernodes sharing it: {}", supernodes.join(", ")),
                "Duplicate the pipeline under a new id for every extra supernode".into(),
            ],
            commands: vec![],
        }
    }

    /// Suggest re-exporting a document written by a newer tool
    pub fn downgrade_document(version: &str, latest: u32) -> Self {
        Self {
            action: format!("Convert the version {} document to version {}", version, latest),
            steps: vec![
                "The document was written by a newer schema than this build understands".into(),
                "Re-export it from the tool that produced it using an older schema".into(),
            ],
            commands: vec![],
        }
    }

    /// Suggest fixing malformed JSON
    pub fn fix_json_syntax() -> Self {
        Self {
            action: "Fix JSON syntax".into(),
            steps: vec![
                "Check for common JSON issues:".into(),
                "  • Trailing commas after the last element".into(),
                "  • Unquoted keys".into(),
                "  • Comments (not allowed in JSON)".into(),
            ],
            commands: vec![
                "# Validate the document:".into(),
                "canvasflow validate <flow.json>".into(),
            ],
        }
    }

    /// Suggest renaming a duplicated object id
    pub fn rename_duplicate(kind: ObjectKind, id: &str) -> Self {
        Self {
            action: format!("Rename the duplicated {} '{}'", kind, id),
            steps: vec![
                "Object ids must be unique within a pipeline".into(),
                "Links referencing the renamed object must be updated too".into(),
            ],
            commands: vec![],
        }
    }

    /// Suggest creating or locating a missing document
    pub fn locate_document(path: &str) -> Self {
        Self {
            action: format!("Provide the document '{}'", path),
            steps: vec![
                "The path does not exist relative to the working directory".into(),
                "Use -C <dir> to run from a different directory".into(),
            ],
            commands: vec![],
        }
    }
}

impl std::fmt::Display for RecoverySuggestion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "→ {}", self.action)?;

        for step in &self.steps {
            writeln!(f, "  {}", step)?;
        }

        if !self.commands.is_empty() {
            writeln!(f)?;
            for cmd in &self.commands {
                writeln!(f, "  {}", cmd)?;
            }
        }

        Ok(())
    }
}
