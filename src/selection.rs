// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 canvasflow contributors

//! Selection state: an ordered set of object ids in one pipeline

use serde::{Deserialize, Serialize};

/// Currently selected objects. Never spans more than one pipeline.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionSet {
    pipeline_id: Option<String>,
    ids: Vec<String>,
}

impl SelectionSet {
    /// Replace the whole selection. Duplicate ids are dropped.
    pub fn replace(&mut self, pipeline_id: &str, ids: impl IntoIterator<Item = String>) {
        let mut unique = Vec::new();
        for id in ids {
            if !unique.contains(&id) {
                unique.push(id);
            }
        }

        if unique.is_empty() {
            self.clear();
        } else {
            self.pipeline_id = Some(pipeline_id.to_string());
            self.ids = unique;
        }
    }

    pub fn clear(&mut self) {
        self.pipeline_id = None;
        self.ids.clear();
    }

    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    /// Ids selected in `pipeline_id`; empty for any other pipeline
    pub fn ids_in(&self, pipeline_id: &str) -> &[String] {
        if self.pipeline_id.as_deref() == Some(pipeline_id) {
            &self.ids
        } else {
            &[]
        }
    }

    pub fn pipeline_id(&self) -> Option<&str> {
        self.pipeline_id.as_deref()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn contains(&self, pipeline_id: &str, id: &str) -> bool {
        self.ids_in(pipeline_id).iter().any(|s| s == id)
    }

    /// Drop ids that no longer pass `exists`; returns true if anything went
    pub fn retain(&mut self, mut exists: impl FnMut(&str, &str) -> bool) -> bool {
        let Some(pipeline_id) = self.pipeline_id.clone() else {
            return false;
        };
        let before = self.ids.len();
        self.ids.retain(|id| exists(&pipeline_id, id));
        if self.ids.is_empty() {
            self.pipeline_id = None;
        }
        self.ids.len() != before
    }
}
