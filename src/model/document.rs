// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 canvasflow contributors

//! Reading and writing documents as JSON or YAML

use serde::Serialize;
use serde_json::Value;
use std::path::Path;

use crate::errors::{CanvasError, CanvasResult};

/// On-disk encoding of a flow or palette document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DocumentFormat {
    #[default]
    Json,
    Yaml,
}

impl DocumentFormat {
    /// Guess the format from a file extension, defaulting to JSON
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("yaml") | Some("yml") => Self::Yaml,
            _ => Self::Json,
        }
    }
}

impl std::str::FromStr for DocumentFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "yaml" | "yml" => Ok(Self::Yaml),
            _ => Err(format!("Unknown document format: {}", s)),
        }
    }
}

/// Parse document text into an untyped value
pub fn parse_document(text: &str, format: DocumentFormat) -> CanvasResult<Value> {
    match format {
        DocumentFormat::Json => Ok(serde_json::from_str(text)?),
        DocumentFormat::Yaml => Ok(serde_yaml::from_str(text)?),
    }
}

/// Read and parse a document file
pub fn read_document(path: &Path) -> CanvasResult<Value> {
    if !path.exists() {
        return Err(CanvasError::FileNotFound {
            path: path.to_path_buf(),
            help: Some("Check the path, or pass -C to change directory first".into()),
        });
    }

    let text = std::fs::read_to_string(path).map_err(|e| CanvasError::FileReadError {
        path: path.to_path_buf(),
        error: e.to_string(),
    })?;

    parse_document(&text, DocumentFormat::from_path(path))
}

/// Render any serializable document in the given format
pub fn render_document<T: Serialize>(doc: &T, format: DocumentFormat) -> CanvasResult<String> {
    match format {
        DocumentFormat::Json => Ok(serde_json::to_string_pretty(doc)?),
        DocumentFormat::Yaml => Ok(serde_yaml::to_string(doc)?),
    }
}
