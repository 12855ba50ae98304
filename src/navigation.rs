// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 canvasflow contributors

//! Breadcrumb stack for supernode navigation

use serde::{Deserialize, Serialize};

/// One level of the navigation stack
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Breadcrumb {
    pub pipeline_id: String,

    /// Supernode that led here; `None` for the primary pipeline
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supernode_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_pipeline_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    /// Origin URL when the pipeline belongs to an external flow
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_url: Option<String>,
}

impl Breadcrumb {
    pub fn primary(pipeline_id: impl Into<String>) -> Self {
        Self {
            pipeline_id: pipeline_id.into(),
            supernode_id: None,
            parent_pipeline_id: None,
            label: None,
            external_url: None,
        }
    }
}

/// Ordered path from the primary pipeline to the displayed one.
/// Always holds at least the primary entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Breadcrumbs {
    stack: Vec<Breadcrumb>,
}

impl Breadcrumbs {
    pub fn new(primary_pipeline_id: impl Into<String>) -> Self {
        Self {
            stack: vec![Breadcrumb::primary(primary_pipeline_id)],
        }
    }

    pub fn as_slice(&self) -> &[Breadcrumb] {
        &self.stack
    }

    pub fn current(&self) -> &Breadcrumb {
        // the stack is never empty
        &self.stack[self.stack.len() - 1]
    }

    pub fn current_pipeline_id(&self) -> &str {
        &self.current().pipeline_id
    }

    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    pub fn position(&self, pipeline_id: &str) -> Option<usize> {
        self.stack.iter().position(|b| b.pipeline_id == pipeline_id)
    }

    pub fn contains(&self, pipeline_id: &str) -> bool {
        self.position(pipeline_id).is_some()
    }

    pub fn push(&mut self, crumb: Breadcrumb) {
        self.stack.push(crumb);
    }

    /// Pop one level; false when already at the primary pipeline
    pub fn pop(&mut self) -> bool {
        if self.stack.len() > 1 {
            self.stack.pop();
            true
        } else {
            false
        }
    }

    /// Pop back to the entry for `pipeline_id`
    pub fn truncate_to(&mut self, pipeline_id: &str) -> bool {
        match self.position(pipeline_id) {
            Some(pos) => {
                self.stack.truncate(pos + 1);
                true
            }
            None => false,
        }
    }

    /// Cut the stack at the first entry that fails `exists`
    pub fn retain_prefix(&mut self, mut exists: impl FnMut(&Breadcrumb) -> bool) -> bool {
        let keep = self
            .stack
            .iter()
            .skip(1)
            .position(|b| !exists(b))
            .map(|pos| pos + 1);
        match keep {
            Some(len) => {
                self.stack.truncate(len);
                true
            }
            None => false,
        }
    }

    /// Reset to the primary pipeline only
    pub fn reset(&mut self, primary_pipeline_id: &str) {
        self.stack = vec![Breadcrumb::primary(primary_pipeline_id)];
    }
}
