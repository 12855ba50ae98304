// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 canvasflow contributors

//! Pipeline-flow document structures (schema version 3)
//!
//! These types mirror the serialized document exactly. Every level carries a
//! flattened `extra` map so fields this crate does not understand survive a
//! load/save cycle untouched.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::styles::StyleSpec;
use crate::zoom::ZoomTransform;

/// Unknown fields preserved verbatim
pub type Opaque = serde_json::Map<String, Value>;

/// Latest pipeline-flow schema version this crate reads and writes
pub const LATEST_FLOW_VERSION: u32 = 3;

/// Schema URL written into every serialized document
pub const FLOW_SCHEMA_URL: &str =
    "http://api.dataplatform.ibm.com/schemas/common-pipeline/pipeline-flow/pipeline-flow-v3-schema.json";

/// Document type marker for pipeline flows
pub const FLOW_DOC_TYPE: &str = "pipeline";

/// A complete pipeline-flow document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineFlow {
    pub doc_type: String,

    pub version: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub json_schema: Option<String>,

    pub id: String,

    pub primary_pipeline: String,

    pub pipelines: Vec<FlowPipeline>,

    #[serde(flatten)]
    pub extra: Opaque,
}

impl PipelineFlow {
    /// Find a pipeline by id
    pub fn pipeline(&self, id: &str) -> Option<&FlowPipeline> {
        self.pipelines.iter().find(|p| p.id == id)
    }
}

/// One pipeline inside a flow document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowPipeline {
    pub id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub runtime_ref: Option<String>,

    #[serde(default)]
    pub nodes: Vec<FlowNode>,

    #[serde(default, skip_serializing_if = "PipelineAppData::is_empty")]
    pub app_data: PipelineAppData,

    #[serde(flatten)]
    pub extra: Opaque,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PipelineAppData {
    #[serde(default, skip_serializing_if = "PipelineUiData::is_empty")]
    pub ui_data: PipelineUiData,

    #[serde(flatten)]
    pub extra: Opaque,
}

impl PipelineAppData {
    pub fn is_empty(&self) -> bool {
        self.ui_data.is_empty() && self.extra.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PipelineUiData {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub comments: Vec<FlowComment>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub detached_links: Vec<FlowDetachedLink>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zoom: Option<ZoomTransform>,

    #[serde(flatten)]
    pub extra: Opaque,
}

impl PipelineUiData {
    pub fn is_empty(&self) -> bool {
        self.comments.is_empty()
            && self.detached_links.is_empty()
            && self.zoom.is_none()
            && self.extra.is_empty()
    }
}

/// A node as stored in the document (also the palette template shape)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowNode {
    pub id: String,

    #[serde(rename = "type")]
    pub node_type: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub op: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub inputs: Vec<FlowPort>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub outputs: Vec<FlowPort>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subflow_ref: Option<FlowSubflowRef>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<Value>,

    #[serde(default, skip_serializing_if = "NodeAppData::is_empty")]
    pub app_data: NodeAppData,

    #[serde(flatten)]
    pub extra: Opaque,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowSubflowRef {
    pub pipeline_id_ref: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    #[serde(flatten)]
    pub extra: Opaque,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeAppData {
    #[serde(default)]
    pub ui_data: NodeUiData,

    #[serde(flatten)]
    pub extra: Opaque,
}

impl NodeAppData {
    pub fn is_empty(&self) -> bool {
        self.ui_data == NodeUiData::default() && self.extra.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeUiData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x_pos: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y_pos: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resize_width: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resize_height: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<StyleSpec>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub decorations: Vec<Decoration>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub messages: Vec<NodeMessage>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub associations: Vec<FlowAssociation>,

    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_expanded: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ui_parameters: Option<Value>,

    #[serde(flatten)]
    pub extra: Opaque,
}

/// An input or output port
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowPort {
    pub id: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub links: Vec<FlowPortLink>,

    #[serde(default, skip_serializing_if = "PortAppData::is_empty")]
    pub app_data: PortAppData,

    #[serde(flatten)]
    pub extra: Opaque,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PortAppData {
    #[serde(default)]
    pub ui_data: PortUiData,

    #[serde(flatten)]
    pub extra: Opaque,
}

impl PortAppData {
    pub fn is_empty(&self) -> bool {
        self.ui_data == PortUiData::default() && self.extra.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PortUiData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cardinality: Option<Cardinality>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class_name: Option<String>,

    #[serde(flatten)]
    pub extra: Opaque,
}

/// A data link stored on its target input port
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowPortLink {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    pub node_id_ref: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port_id_ref: Option<String>,

    #[serde(default, skip_serializing_if = "LinkAppData::is_empty")]
    pub app_data: LinkAppData,

    #[serde(flatten)]
    pub extra: Opaque,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LinkAppData {
    #[serde(default)]
    pub ui_data: LinkUiData,

    #[serde(flatten)]
    pub extra: Opaque,
}

impl LinkAppData {
    pub fn is_empty(&self) -> bool {
        self.ui_data == LinkUiData::default() && self.extra.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LinkUiData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<StyleSpec>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub decorations: Vec<Decoration>,

    #[serde(flatten)]
    pub extra: Opaque,
}

/// An association link stored on its source node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowAssociation {
    pub id: String,

    pub node_ref: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<StyleSpec>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub decorations: Vec<Decoration>,

    #[serde(flatten)]
    pub extra: Opaque,
}

/// A comment and its links to nodes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowComment {
    pub id: String,

    #[serde(default)]
    pub x_pos: f64,

    #[serde(default)]
    pub y_pos: f64,

    #[serde(default = "default_comment_width")]
    pub width: f64,

    #[serde(default = "default_comment_height")]
    pub height: f64,

    #[serde(default)]
    pub content: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<StyleSpec>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub associated_id_refs: Vec<FlowCommentRef>,

    #[serde(flatten)]
    pub extra: Opaque,
}

pub(crate) fn default_comment_width() -> f64 {
    175.0
}

pub(crate) fn default_comment_height() -> f64 {
    42.0
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowCommentRef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    pub node_ref: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<StyleSpec>,

    #[serde(flatten)]
    pub extra: Opaque,
}

/// A data link with at least one endpoint anchored to a canvas position
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowDetachedLink {
    pub id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub src_node_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub src_port_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub src_pos: Option<Position>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trg_node_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trg_port_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trg_pos: Option<Position>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<StyleSpec>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub decorations: Vec<Decoration>,

    #[serde(flatten)]
    pub extra: Opaque,
}

/// A point on the canvas
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn offset(self, dx: f64, dy: f64) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }
}

/// How many links a port accepts; `max < 0` means unbounded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cardinality {
    pub min: u32,
    pub max: i32,
}

impl Default for Cardinality {
    fn default() -> Self {
        Self { min: 0, max: 1 }
    }
}

impl Cardinality {
    pub fn unbounded() -> Self {
        Self { min: 0, max: -1 }
    }

    /// Whether one more link fits on a port that already has `count`
    pub fn accepts(&self, count: usize) -> bool {
        self.max < 0 || count < self.max as usize
    }
}

/// Visual annotation attached to a node or link
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Decoration {
    pub id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x_pos: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y_pos: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tooltip: Option<String>,

    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub hotspot: bool,

    /// Temporary decorations are never written to the document
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub temporary: bool,

    #[serde(flatten)]
    pub extra: Opaque,
}

/// Severity of a node validation message
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageType {
    Info,
    Warning,
    Error,
}

impl std::fmt::Display for MessageType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Info => write!(f, "info"),
            Self::Warning => write!(f, "warning"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// Validation annotation on a node, keyed by the control it refers to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeMessage {
    pub id_ref: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation_id: Option<String>,

    #[serde(rename = "type")]
    pub message_type: MessageType,

    pub text: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_unknown_fields_survive() {
        let value = json!({
            "id": "n1",
            "type": "execution_node",
            "op": "filter",
            "custom_field": {"nested": true},
            "app_data": {
                "ui_data": {"label": "Filter", "x_pos": 10.0, "y_pos": 20.0, "vendor": 7},
                "runtime_hint": "fast"
            }
        });

        let node: FlowNode = serde_json::from_value(value.clone()).unwrap();
        assert_eq!(node.extra["custom_field"], json!({"nested": true}));
        assert_eq!(node.app_data.ui_data.extra["vendor"], json!(7));
        assert_eq!(node.app_data.extra["runtime_hint"], json!("fast"));

        assert_eq!(serde_json::to_value(&node).unwrap(), value);
    }

    #[test]
    fn test_temporary_decoration_flag_omitted_when_false() {
        let decoration = Decoration {
            id: "d1".into(),
            label: Some("3 rows".into()),
            ..Default::default()
        };
        let value = serde_json::to_value(&decoration).unwrap();
        assert_eq!(value, json!({"id": "d1", "label": "3 rows"}));
    }

    #[test]
    fn test_cardinality_accepts() {
        assert!(Cardinality::default().accepts(0));
        assert!(!Cardinality::default().accepts(1));
        assert!(Cardinality::unbounded().accepts(1000));
    }

    #[test]
    fn test_message_types_order_by_severity() {
        assert!(MessageType::Error > MessageType::Warning);
        assert!(MessageType::Warning > MessageType::Info);
    }
}
