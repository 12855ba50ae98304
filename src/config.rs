// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 canvasflow contributors

//! Canvas configuration
//!
//! Loaded from `.canvasflow.toml` or built in code. Every field has a
//! default, so an empty file is a valid configuration.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::errors::{CanvasError, CanvasResult};
use crate::model::Position;
use crate::zoom::ZoomLimits;

/// Default configuration file name
pub const CONFIG_FILE_NAME: &str = ".canvasflow.toml";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InteractionType {
    #[default]
    Mouse,
    Trackpad,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeFormatType {
    #[default]
    Horizontal,
    Vertical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkType {
    #[default]
    Curve,
    Elbow,
    Straight,
}

/// Direction data flows along links; also the hint passed to layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkDirection {
    #[default]
    LeftRight,
    TopBottom,
    BottomTop,
}

impl std::str::FromStr for LinkDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "left_right" | "lr" => Ok(Self::LeftRight),
            "top_bottom" | "tb" => Ok(Self::TopBottom),
            "bottom_top" | "bt" => Ok(Self::BottomTop),
            _ => Err(format!("Unknown link direction: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkSelection {
    #[default]
    None,
    LinkOnly,
    Handles,
    Detachable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SnapToGrid {
    #[default]
    None,
    During,
    After,
}

/// Where zoom values are kept between sessions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SaveZoom {
    #[default]
    None,
    LocalStorage,
    PipelineFlow,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StateTag {
    #[default]
    None,
    ReadOnly,
    Locked,
}

/// Complete canvas configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CanvasConfig {
    pub interaction_type: InteractionType,
    pub node_format_type: NodeFormatType,
    pub link_type: LinkType,
    pub link_direction: LinkDirection,
    pub link_selection: LinkSelection,
    pub snap_to_grid_type: SnapToGrid,
    pub snap_to_grid_x: f64,
    pub snap_to_grid_y: f64,
    pub save_zoom: SaveZoom,
    pub editing_actions: bool,
    pub state_tag: StateTag,

    /// Allow supernodes whose subflows come from separate documents
    pub external_pipeline_flows: bool,
    pub assoc_link_creation: bool,
    /// Allow creating a supernode from nodes that are not connected
    pub create_supernode_non_contiguous: bool,

    pub node_width: f64,
    pub node_height: f64,
    pub zoom: ZoomLimits,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            interaction_type: InteractionType::default(),
            node_format_type: NodeFormatType::default(),
            link_type: LinkType::default(),
            link_direction: LinkDirection::default(),
            link_selection: LinkSelection::default(),
            snap_to_grid_type: SnapToGrid::default(),
            snap_to_grid_x: 25.0,
            snap_to_grid_y: 25.0,
            save_zoom: SaveZoom::default(),
            editing_actions: true,
            state_tag: StateTag::default(),
            external_pipeline_flows: true,
            assoc_link_creation: false,
            create_supernode_non_contiguous: false,
            node_width: 70.0,
            node_height: 75.0,
            zoom: ZoomLimits::default(),
        }
    }
}

impl CanvasConfig {
    /// Load from a TOML file
    pub fn from_file(path: &Path) -> CanvasResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| CanvasError::FileReadError {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        Self::from_toml(&content)
    }

    pub fn from_toml(text: &str) -> CanvasResult<Self> {
        toml::from_str(text).map_err(Into::into)
    }

    /// Load `.canvasflow.toml` from `dir` when present, else defaults
    pub fn discover(dir: &Path) -> CanvasResult<Self> {
        let path = dir.join(CONFIG_FILE_NAME);
        if path.exists() {
            Self::from_file(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Whether recorded edits, undo and redo are permitted
    pub fn editing_allowed(&self) -> bool {
        self.editing_actions && self.state_tag == StateTag::None
    }

    pub fn detachable_links(&self) -> bool {
        self.link_selection == LinkSelection::Detachable
    }

    /// Round a position to the grid when snapping is enabled
    pub fn snap(&self, position: Position) -> Position {
        if self.snap_to_grid_type == SnapToGrid::None {
            return position;
        }
        let snap = |v: f64, step: f64| if step > 0.0 { (v / step).round() * step } else { v };
        Position::new(
            snap(position.x, self.snap_to_grid_x),
            snap(position.y, self.snap_to_grid_y),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_toml_is_default() {
        assert_eq!(CanvasConfig::from_toml("").unwrap(), CanvasConfig::default());
    }

    #[test]
    fn test_parse_toml() {
        let config = CanvasConfig::from_toml(
            r#"
            link_selection = "detachable"
            state_tag = "read_only"
            snap_to_grid_type = "after"
            snap_to_grid_x = 10.0

            [zoom]
            max_scale = 4.0
            "#,
        )
        .unwrap();

        assert!(config.detachable_links());
        assert!(!config.editing_allowed());
        assert_eq!(config.zoom.max_scale, 4.0);
        assert_eq!(config.zoom.min_scale, 0.2);
        assert_eq!(config.snap(Position::new(14.0, 13.0)), Position::new(10.0, 25.0));
    }

    #[test]
    fn test_snap_disabled_by_default() {
        let config = CanvasConfig::default();
        assert_eq!(config.snap(Position::new(14.0, 13.0)), Position::new(14.0, 13.0));
    }

    #[test]
    fn test_discover_without_file() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(CanvasConfig::discover(dir.path()).unwrap(), CanvasConfig::default());
    }
}
