// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 canvasflow contributors

//! Edit actions and the undo/redo command stack
//!
//! Every recorded mutation is described by an [`EditActionData`] before it is
//! applied. The before-edit handler may rewrite or veto that description;
//! the finished [`Command`] keeps per-pipeline snapshots so undo and redo
//! restore exactly what the edit changed.

mod stack;

pub use stack::{diff_pipelines, Command, CommandPhase, CommandStack, PipelineDelta};

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::config::LinkDirection;
use crate::model::{CanvasComment, CanvasLink, CanvasNode, Position, Size};

/// The closed set of edit actions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EditType {
    CreateNode,
    CreateComment,
    MoveObjects,
    ResizeObjects,
    LinkNodes,
    LinkComment,
    EditComment,
    DeleteSelectedObjects,
    CreateSuperNode,
    ExpandSuperNodeInPlace,
    CollapseSuperNodeInPlace,
    ArrangeLayout,
    DisplaySubPipeline,
    DisplayPreviousPipeline,
    Undo,
    Redo,
}

impl EditType {
    /// Whether the edit is pushed onto the undo stack
    pub fn is_undoable(&self) -> bool {
        !matches!(
            self,
            Self::DisplaySubPipeline | Self::DisplayPreviousPipeline | Self::Undo | Self::Redo
        )
    }

    /// Default text for undo/redo menu entries
    pub fn default_label(&self) -> &'static str {
        match self {
            Self::CreateNode => "Create node",
            Self::CreateComment => "Create comment",
            Self::MoveObjects => "Move objects",
            Self::ResizeObjects => "Resize objects",
            Self::LinkNodes => "Link nodes",
            Self::LinkComment => "Link comment",
            Self::EditComment => "Edit comment",
            Self::DeleteSelectedObjects => "Delete objects",
            Self::CreateSuperNode => "Create supernode",
            Self::ExpandSuperNodeInPlace => "Expand supernode",
            Self::CollapseSuperNodeInPlace => "Collapse supernode",
            Self::ArrangeLayout => "Arrange layout",
            Self::DisplaySubPipeline => "Open pipeline",
            Self::DisplayPreviousPipeline => "Close pipeline",
            Self::Undo => "Undo",
            Self::Redo => "Redo",
        }
    }
}

impl std::fmt::Display for EditType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let value = serde_json::to_value(self).map_err(|_| std::fmt::Error)?;
        write!(f, "{}", value.as_str().unwrap_or_default())
    }
}

/// Where an edit was initiated; informational only
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EditSource {
    ContextMenu,
    Toolbar,
    Keyboard,
    #[default]
    Canvas,
}

/// What an edit does, with everything needed to apply it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "editType", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum EditPayload {
    CreateNode {
        node: CanvasNode,
    },
    CreateComment {
        comment: CanvasComment,
    },
    /// Offset applied to every listed node, comment and detached link end
    MoveObjects {
        object_ids: Vec<String>,
        dx: f64,
        dy: f64,
    },
    ResizeObjects {
        sizes: HashMap<String, Size>,
    },
    LinkNodes {
        links: Vec<CanvasLink>,
    },
    LinkComment {
        links: Vec<CanvasLink>,
    },
    EditComment {
        comment_id: String,
        content: String,
    },
    DeleteSelectedObjects {
        object_ids: Vec<String>,
    },
    CreateSuperNode {
        object_ids: Vec<String>,
        supernode_id: String,
        subflow_pipeline_id: String,
    },
    ExpandSuperNodeInPlace {
        supernode_id: String,
    },
    CollapseSuperNodeInPlace {
        supernode_id: String,
    },
    ArrangeLayout {
        direction: LinkDirection,
        positions: HashMap<String, Position>,
    },
    DisplaySubPipeline {
        target_pipeline_id: String,
        supernode_id: Option<String>,
    },
    DisplayPreviousPipeline,
    Undo {
        label: Option<String>,
    },
    Redo {
        label: Option<String>,
    },
}

/// Description of one edit action as seen by the edit handlers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditActionData {
    pub edit_source: EditSource,
    pub pipeline_id: String,
    #[serde(flatten)]
    pub payload: EditPayload,
}

impl EditActionData {
    pub fn new(pipeline_id: impl Into<String>, payload: EditPayload) -> Self {
        Self {
            edit_source: EditSource::default(),
            pipeline_id: pipeline_id.into(),
            payload,
        }
    }

    pub fn with_source(mut self, source: EditSource) -> Self {
        self.edit_source = source;
        self
    }

    pub fn edit_type(&self) -> EditType {
        match &self.payload {
            EditPayload::CreateNode { .. } => EditType::CreateNode,
            EditPayload::CreateComment { .. } => EditType::CreateComment,
            EditPayload::MoveObjects { .. } => EditType::MoveObjects,
            EditPayload::ResizeObjects { .. } => EditType::ResizeObjects,
            EditPayload::LinkNodes { .. } => EditType::LinkNodes,
            EditPayload::LinkComment { .. } => EditType::LinkComment,
            EditPayload::EditComment { .. } => EditType::EditComment,
            EditPayload::DeleteSelectedObjects { .. } => EditType::DeleteSelectedObjects,
            EditPayload::CreateSuperNode { .. } => EditType::CreateSuperNode,
            EditPayload::ExpandSuperNodeInPlace { .. } => EditType::ExpandSuperNodeInPlace,
            EditPayload::CollapseSuperNodeInPlace { .. } => EditType::CollapseSuperNodeInPlace,
            EditPayload::ArrangeLayout { .. } => EditType::ArrangeLayout,
            EditPayload::DisplaySubPipeline { .. } => EditType::DisplaySubPipeline,
            EditPayload::DisplayPreviousPipeline => EditType::DisplayPreviousPipeline,
            EditPayload::Undo { .. } => EditType::Undo,
            EditPayload::Redo { .. } => EditType::Redo,
        }
    }

    /// Ids of the objects the edit acts on
    pub fn object_ids(&self) -> Vec<String> {
        match &self.payload {
            EditPayload::CreateNode { node } => vec![node.id.clone()],
            EditPayload::CreateComment { comment } => vec![comment.id.clone()],
            EditPayload::MoveObjects { object_ids, .. }
            | EditPayload::DeleteSelectedObjects { object_ids }
            | EditPayload::CreateSuperNode { object_ids, .. } => object_ids.clone(),
            EditPayload::ResizeObjects { sizes } => {
                let mut ids: Vec<String> = sizes.keys().cloned().collect();
                ids.sort();
                ids
            }
            EditPayload::LinkNodes { links } | EditPayload::LinkComment { links } => {
                links.iter().map(|l| l.id.clone()).collect()
            }
            EditPayload::EditComment { comment_id, .. } => vec![comment_id.clone()],
            EditPayload::ExpandSuperNodeInPlace { supernode_id }
            | EditPayload::CollapseSuperNodeInPlace { supernode_id } => vec![supernode_id.clone()],
            EditPayload::ArrangeLayout { positions, .. } => {
                let mut ids: Vec<String> = positions.keys().cloned().collect();
                ids.sort();
                ids
            }
            EditPayload::DisplaySubPipeline { supernode_id, .. } => {
                supernode_id.iter().cloned().collect()
            }
            EditPayload::DisplayPreviousPipeline
            | EditPayload::Undo { .. }
            | EditPayload::Redo { .. } => Vec::new(),
        }
    }
}
