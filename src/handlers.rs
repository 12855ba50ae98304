// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 canvasflow contributors

//! Callback boundary between the controller and its host
//!
//! Every method has a default, so a host implements only the hooks it cares
//! about. Hooks that receive `&mut CanvasController` may call back into it
//! before the outer call returns.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

use crate::commands::EditActionData;
use crate::config::LinkDirection;
use crate::controller::CanvasController;
use crate::model::{CanvasPipeline, ObjectKind, Position};
use crate::selection::SelectionSet;

/// One context menu entry. Entries without an action are dividers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuItem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default)]
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub submenu: Vec<MenuItem>,
}

impl MenuItem {
    pub fn action(action: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            action: Some(action.into()),
            label: Some(label.into()),
            enabled: true,
            submenu: Vec::new(),
        }
    }

    pub fn divider() -> Self {
        Self {
            action: None,
            label: None,
            enabled: false,
            submenu: Vec::new(),
        }
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    pub fn is_divider(&self) -> bool {
        self.action.is_none()
    }
}

/// What a context menu was requested for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ContextMenuTarget {
    Canvas,
    Node,
    Comment,
    Link,
    Port,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextMenuSource {
    #[serde(rename = "type")]
    pub target: ContextMenuTarget,
    pub pipeline_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_object_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port_id: Option<String>,
    #[serde(default)]
    pub selected_object_ids: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ClickType {
    SingleClick,
    DoubleClick,
    ContextMenu,
}

/// A click on the canvas or one of its objects
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClickSource {
    pub click_type: ClickType,
    /// `None` for a click on empty canvas
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object_kind: Option<ObjectKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub pipeline_id: String,
    /// Extend the selection instead of replacing it
    #[serde(default)]
    pub extend: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecorationSource {
    pub pipeline_id: String,
    pub object_id: String,
    pub decoration_id: String,
}

/// What a tooltip is being shown for
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum TooltipSource {
    Node {
        pipeline_id: String,
        node_id: String,
    },
    Port {
        pipeline_id: String,
        node_id: String,
        port_id: String,
    },
    Link {
        pipeline_id: String,
        link_id: String,
    },
    Decoration {
        pipeline_id: String,
        object_id: String,
        decoration_id: String,
    },
}

/// Old and new selection, passed to the selection hook
#[derive(Debug, Clone, PartialEq)]
pub struct SelectionChange {
    pub previous: SelectionSet,
    pub current: SelectionSet,
}

/// Host callbacks
pub trait CanvasHandlers {
    /// Final menu for a context menu request; receives the default menu
    fn context_menu(
        &mut self,
        _source: &ContextMenuSource,
        default_menu: Vec<MenuItem>,
    ) -> Vec<MenuItem> {
        default_menu
    }

    /// Runs before an edit applies. Return a rewritten edit, or `None` to
    /// cancel it.
    fn before_edit_action(
        &mut self,
        _canvas: &mut CanvasController,
        data: EditActionData,
    ) -> Option<EditActionData> {
        Some(data)
    }

    /// Runs after an edit applied
    fn edit_action(&mut self, _canvas: &mut CanvasController, _data: &EditActionData) {}

    fn click_action(&mut self, _canvas: &mut CanvasController, _source: &ClickSource) {}

    fn decoration_action(&mut self, _canvas: &mut CanvasController, _source: &DecorationSource) {}

    /// New node positions for an automatic layout, or `None` to leave the
    /// pipeline as it is
    fn layout(
        &mut self,
        _pipeline: &CanvasPipeline,
        _direction: LinkDirection,
    ) -> Option<HashMap<String, Position>> {
        None
    }

    fn tooltip(&mut self, _source: &TooltipSource, default_text: Option<String>) -> Option<String> {
        default_text
    }

    fn generate_id(&mut self) -> String {
        uuid::Uuid::new_v4().to_string()
    }

    fn selection_changed(&mut self, _change: &SelectionChange) {}

    /// Text for undo/redo entries
    fn action_label(&mut self, _data: &EditActionData, default_label: String) -> String {
        default_label
    }

    /// Fetch an external pipeline flow document by URL
    fn load_external_flow(&mut self, _url: &str) -> Option<Value> {
        None
    }
}

/// Handlers that keep every default
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultHandlers;

impl CanvasHandlers for DefaultHandlers {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_ids_are_unique() {
        let mut handlers = DefaultHandlers;
        let a = handlers.generate_id();
        let b = handlers.generate_id();
        assert_ne!(a, b);
        assert_eq!(a.len(), 36);
    }

    #[test]
    fn test_tooltip_source_shape() {
        let source = TooltipSource::Port {
            pipeline_id: "main".into(),
            node_id: "n1".into(),
            port_id: "inPort".into(),
        };
        let value = serde_json::to_value(&source).unwrap();
        assert_eq!(value["type"], "port");
        assert_eq!(value["portId"], "inPort");
    }

    #[test]
    fn test_menu_divider() {
        assert!(MenuItem::divider().is_divider());
        assert!(!MenuItem::action("undo", "Undo").is_divider());
        assert!(!MenuItem::action("undo", "Undo").disabled().enabled);
    }
}
