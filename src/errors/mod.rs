// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 canvasflow contributors

//! Error types for the canvas controller
//!
//! Every failure the controller can report falls into one of three
//! categories: the document is malformed (schema), a referenced object does
//! not exist (not found), or the request is not allowed in the current state
//! (invalid operation). Mutations return these as values and never leave
//! partially applied state behind.

mod recovery;

pub use recovery::RecoverySuggestion;

use miette::Diagnostic;
use std::path::PathBuf;
use thiserror::Error;

use crate::model::ObjectKind;

/// Result type for canvasflow operations
pub type CanvasResult<T> = Result<T, CanvasError>;

/// Coarse classification of a [`CanvasError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Schema,
    NotFound,
    InvalidOperation,
    Io,
}

/// Main error type for canvasflow
#[derive(Error, Debug, Diagnostic)]
pub enum CanvasError {
    // ─────────────────────────────────────────────────────────────────────────
    // Schema Errors
    // ─────────────────────────────────────────────────────────────────────────
    #[error("Invalid document: {reason}")]
    #[diagnostic(code(canvasflow::schema_error))]
    Schema {
        reason: String,
        #[help]
        help: Option<String>,
    },

    #[error("Unsupported {doc} version '{version}' (latest supported: {latest})")]
    #[diagnostic(
        code(canvasflow::unsupported_version),
        help("Upgrade canvasflow or re-export the document with an older schema")
    )]
    UnsupportedVersion {
        doc: &'static str,
        version: String,
        latest: u32,
    },

    #[error("Duplicate {kind} id '{id}' in pipeline '{pipeline_id}'")]
    #[diagnostic(
        code(canvasflow::duplicate_id),
        help("Object ids must be unique within their pipeline")
    )]
    DuplicateId {
        kind: ObjectKind,
        id: String,
        pipeline_id: String,
    },

    #[error("Supernode references form a cycle: {}", .pipelines.join(" → "))]
    #[diagnostic(
        code(canvasflow::circular_subflow),
        help("A supernode must never contain the pipeline it belongs to")
    )]
    CircularSubflow { pipelines: Vec<String> },

    #[error("Pipeline '{pipeline_id}' is referenced by more than one supernode")]
    #[diagnostic(
        code(canvasflow::ambiguous_subflow),
        help("Each pipeline may be the subflow of at most one supernode")
    )]
    AmbiguousSubflow {
        pipeline_id: String,
        supernodes: Vec<String>,
    },

    #[error("Link '{link_id}' in pipeline '{pipeline_id}' references missing {endpoint}")]
    #[diagnostic(
        code(canvasflow::dangling_link),
        help("Links must connect objects in the same pipeline as the link")
    )]
    DanglingLink {
        link_id: String,
        pipeline_id: String,
        endpoint: String,
    },

    // ─────────────────────────────────────────────────────────────────────────
    // Not Found Errors
    // ─────────────────────────────────────────────────────────────────────────
    #[error("{kind} '{id}' not found in pipeline '{pipeline_id}'")]
    #[diagnostic(code(canvasflow::not_found))]
    NotFound {
        kind: ObjectKind,
        id: String,
        pipeline_id: String,
    },

    #[error("Pipeline '{id}' not found")]
    #[diagnostic(code(canvasflow::pipeline_not_found))]
    PipelineNotFound { id: String },

    // ─────────────────────────────────────────────────────────────────────────
    // Invalid Operation Errors
    // ─────────────────────────────────────────────────────────────────────────
    #[error("Cannot {operation}: {reason}")]
    #[diagnostic(code(canvasflow::invalid_operation))]
    InvalidOperation { operation: String, reason: String },

    #[error("Edit '{edit_type}' was vetoed by the before-edit handler")]
    #[diagnostic(code(canvasflow::edit_vetoed))]
    EditVetoed { edit_type: String },

    #[error("A command is already being committed")]
    #[diagnostic(
        code(canvasflow::command_in_progress),
        help("Commands cannot be issued from callbacks invoked while a command applies")
    )]
    CommandInProgress,

    #[error("Editing is disabled for this canvas")]
    #[diagnostic(
        code(canvasflow::editing_disabled),
        help("Enable `editing_actions` and clear the read-only/locked state tag")
    )]
    EditingDisabled,

    // ─────────────────────────────────────────────────────────────────────────
    // IO/System Errors
    // ─────────────────────────────────────────────────────────────────────────
    #[error("File not found: {path}")]
    #[diagnostic(code(canvasflow::file_not_found))]
    FileNotFound {
        path: PathBuf,
        #[help]
        help: Option<String>,
    },

    #[error("Failed to read file '{path}': {error}")]
    #[diagnostic(code(canvasflow::file_read_error))]
    FileReadError { path: PathBuf, error: String },

    #[error("Failed to write file '{path}': {error}")]
    #[diagnostic(code(canvasflow::file_write_error))]
    FileWriteError { path: PathBuf, error: String },

    #[error("IO error: {message}")]
    #[diagnostic(code(canvasflow::io_error))]
    Io { message: String },

    #[error("JSON parsing error: {message}")]
    #[diagnostic(code(canvasflow::json_error))]
    Json { message: String },

    #[error("YAML parsing error: {message}")]
    #[diagnostic(code(canvasflow::yaml_error))]
    Yaml { message: String },

    #[error("TOML parsing error: {message}")]
    #[diagnostic(code(canvasflow::toml_error))]
    Toml { message: String },

    #[error("Glob pattern error: {message}")]
    #[diagnostic(code(canvasflow::glob_error))]
    GlobPattern { message: String },
}

impl From<std::io::Error> for CanvasError {
    fn from(e: std::io::Error) -> Self {
        Self::Io { message: e.to_string() }
    }
}

impl From<serde_json::Error> for CanvasError {
    fn from(e: serde_json::Error) -> Self {
        Self::Json { message: e.to_string() }
    }
}

impl From<serde_yaml::Error> for CanvasError {
    fn from(e: serde_yaml::Error) -> Self {
        Self::Yaml { message: e.to_string() }
    }
}

impl From<toml::de::Error> for CanvasError {
    fn from(e: toml::de::Error) -> Self {
        Self::Toml { message: e.to_string() }
    }
}

impl From<glob::PatternError> for CanvasError {
    fn from(e: glob::PatternError) -> Self {
        Self::GlobPattern { message: e.to_string() }
    }
}

impl CanvasError {
    /// Create a schema error without help text
    pub fn schema(reason: impl Into<String>) -> Self {
        Self::Schema {
            reason: reason.into(),
            help: None,
        }
    }

    /// Create a schema error that names the missing field
    pub fn missing_field(field: &str, context: &str) -> Self {
        Self::Schema {
            reason: format!("{} is missing required field '{}'", context, field),
            help: Some(format!("Add '{}' to the {}", field, context)),
        }
    }

    /// Create an object-not-found error
    pub fn not_found(kind: ObjectKind, id: &str, pipeline_id: &str) -> Self {
        Self::NotFound {
            kind,
            id: id.to_string(),
            pipeline_id: pipeline_id.to_string(),
        }
    }

    /// Create an invalid-operation error
    pub fn invalid(operation: &str, reason: impl Into<String>) -> Self {
        Self::InvalidOperation {
            operation: operation.to_string(),
            reason: reason.into(),
        }
    }

    /// Which of the documented failure categories this error belongs to
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Schema { .. }
            | Self::UnsupportedVersion { .. }
            | Self::DuplicateId { .. }
            | Self::CircularSubflow { .. }
            | Self::AmbiguousSubflow { .. }
            | Self::DanglingLink { .. }
            | Self::Json { .. }
            | Self::Yaml { .. }
            | Self::Toml { .. } => ErrorCategory::Schema,
            Self::NotFound { .. } | Self::PipelineNotFound { .. } => ErrorCategory::NotFound,
            Self::InvalidOperation { .. }
            | Self::EditVetoed { .. }
            | Self::CommandInProgress
            | Self::EditingDisabled => ErrorCategory::InvalidOperation,
            Self::FileNotFound { .. }
            | Self::FileReadError { .. }
            | Self::FileWriteError { .. }
            | Self::Io { .. }
            | Self::GlobPattern { .. } => ErrorCategory::Io,
        }
    }

    /// Recovery advice for the CLI, if any applies
    pub fn suggestion(&self) -> Option<RecoverySuggestion> {
        match self {
            Self::CircularSubflow { pipelines } => {
                Some(RecoverySuggestion::fix_circular_subflow(pipelines))
            }
            Self::AmbiguousSubflow {
                pipeline_id,
                supernodes,
            } => Some(RecoverySuggestion::fix_ambiguous_subflow(pipeline_id, supernodes)),
            Self::UnsupportedVersion { version, latest, .. } => {
                Some(RecoverySuggestion::downgrade_document(version, *latest))
            }
            Self::Json { .. } => Some(RecoverySuggestion::fix_json_syntax()),
            Self::DuplicateId { kind, id, .. } => {
                Some(RecoverySuggestion::rename_duplicate(*kind, id))
            }
            Self::FileNotFound { path, .. } => Some(RecoverySuggestion::locate_document(
                &path.display().to_string(),
            )),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_categories() {
        assert_eq!(CanvasError::schema("bad").category(), ErrorCategory::Schema);
        assert_eq!(
            CanvasError::not_found(ObjectKind::Node, "n1", "p1").category(),
            ErrorCategory::NotFound
        );
        assert_eq!(
            CanvasError::CommandInProgress.category(),
            ErrorCategory::InvalidOperation
        );
    }

    #[test]
    fn test_display_names_object() {
        let err = CanvasError::not_found(ObjectKind::Comment, "c9", "main");
        assert_eq!(err.to_string(), "comment 'c9' not found in pipeline 'main'");
    }

    #[test]
    fn test_cycle_has_suggestion() {
        let err = CanvasError::CircularSubflow {
            pipelines: vec!["a".into(), "b".into(), "a".into()],
        };
        let suggestion = err.suggestion().unwrap();
        assert!(suggestion.steps[0].contains("a → b → a"));
    }
}
