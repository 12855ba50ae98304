// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 canvasflow contributors

//! Saved zoom values, keyed by flow and pipeline

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::ZoomTransform;
use crate::errors::{CanvasError, CanvasResult};

/// Save/load boundary for zoom values kept outside the document
pub trait ZoomStore {
    fn load(&self, flow_id: &str, pipeline_id: &str) -> Option<ZoomTransform>;

    fn save(&mut self, flow_id: &str, pipeline_id: &str, zoom: ZoomTransform) -> CanvasResult<()>;

    /// Forget every saved value
    fn clear(&mut self) -> CanvasResult<()>;
}

fn store_key(flow_id: &str, pipeline_id: &str) -> String {
    format!("{}.{}", flow_id, pipeline_id)
}

/// In-process store
#[derive(Debug, Default)]
pub struct MemoryZoomStore {
    values: HashMap<String, ZoomTransform>,
}

impl MemoryZoomStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ZoomStore for MemoryZoomStore {
    fn load(&self, flow_id: &str, pipeline_id: &str) -> Option<ZoomTransform> {
        self.values.get(&store_key(flow_id, pipeline_id)).copied()
    }

    fn save(&mut self, flow_id: &str, pipeline_id: &str, zoom: ZoomTransform) -> CanvasResult<()> {
        self.values.insert(store_key(flow_id, pipeline_id), zoom);
        Ok(())
    }

    fn clear(&mut self) -> CanvasResult<()> {
        self.values.clear();
        Ok(())
    }
}

/// Store backed by a JSON file
#[derive(Debug)]
pub struct FileZoomStore {
    path: PathBuf,
    values: HashMap<String, ZoomTransform>,
}

impl FileZoomStore {
    /// Open a store at `path`; a missing or unreadable file starts empty
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let values = std::fs::read_to_string(&path)
            .ok()
            .and_then(|text| serde_json::from_str(&text).ok())
            .unwrap_or_default();
        Self { path, values }
    }

    /// Store in the platform data directory
    pub fn default_location() -> Option<Self> {
        let dirs = directories::ProjectDirs::from("org", "canvasflow", "canvasflow")?;
        Some(Self::open(dirs.data_dir().join("zoom.json")))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self) -> CanvasResult<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| CanvasError::FileWriteError {
                path: parent.to_path_buf(),
                error: e.to_string(),
            })?;
        }
        let text = serde_json::to_string_pretty(&self.values)?;
        std::fs::write(&self.path, text).map_err(|e| CanvasError::FileWriteError {
            path: self.path.clone(),
            error: e.to_string(),
        })?;
        debug!(path = %self.path.display(), entries = self.values.len(), "Saved zoom values");
        Ok(())
    }
}

impl ZoomStore for FileZoomStore {
    fn load(&self, flow_id: &str, pipeline_id: &str) -> Option<ZoomTransform> {
        self.values.get(&store_key(flow_id, pipeline_id)).copied()
    }

    fn save(&mut self, flow_id: &str, pipeline_id: &str, zoom: ZoomTransform) -> CanvasResult<()> {
        self.values.insert(store_key(flow_id, pipeline_id), zoom);
        self.persist()
    }

    fn clear(&mut self) -> CanvasResult<()> {
        self.values.clear();
        self.persist()
    }
}
