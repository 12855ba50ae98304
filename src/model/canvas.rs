// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 canvasflow contributors

//! In-memory canvas structures
//!
//! The controller mutates these directly. Links are flattened into one list
//! per pipeline (the document nests them in ports, nodes and comments) so
//! that every link kind can be indexed and traversed uniformly.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::flow::{Cardinality, Decoration, NodeMessage, Opaque, Position};
use crate::zoom::ZoomTransform;

/// The kinds of object a pipeline holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectKind {
    Node,
    Comment,
    Link,
    Port,
    Decoration,
    Pipeline,
}

impl std::fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Node => write!(f, "node"),
            Self::Comment => write!(f, "comment"),
            Self::Link => write!(f, "link"),
            Self::Port => write!(f, "port"),
            Self::Decoration => write!(f, "decoration"),
            Self::Pipeline => write!(f, "pipeline"),
        }
    }
}

/// Unknown document fields carried by an object, per nesting level
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Extras {
    #[serde(default, skip_serializing_if = "Opaque::is_empty")]
    pub object: Opaque,
    #[serde(default, skip_serializing_if = "Opaque::is_empty")]
    pub app_data: Opaque,
    #[serde(default, skip_serializing_if = "Opaque::is_empty")]
    pub ui_data: Opaque,
}

/// The type tag of a node
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Execution,
    Supernode,
    BindingEntry,
    BindingExit,
    Model,
    Other(String),
}

impl NodeKind {
    /// Parse the document's `type` field
    pub fn from_flow_type(value: &str) -> Self {
        match value {
            "execution_node" => Self::Execution,
            "super_node" => Self::Supernode,
            "binding_entry_node" => Self::BindingEntry,
            "binding_exit_node" => Self::BindingExit,
            "model_node" => Self::Model,
            other => Self::Other(other.to_string()),
        }
    }

    /// The document's `type` field for this kind
    pub fn as_flow_type(&self) -> &str {
        match self {
            Self::Execution => "execution_node",
            Self::Supernode => "super_node",
            Self::BindingEntry => "binding_entry_node",
            Self::BindingExit => "binding_exit_node",
            Self::Model => "model_node",
            Self::Other(other) => other,
        }
    }
}

/// Reference from a supernode to the pipeline it contains
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubflowRef {
    pub pipeline_id: String,
    /// Set when the pipeline lives in a separately loaded flow document
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Opaque::is_empty")]
    pub extra: Opaque,
}

/// Document fields that were absent when an object was read and were
/// filled with defaults. Saving leaves them out while they keep that value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImpliedFields {
    pub id: bool,
    pub label: bool,
    pub x_pos: bool,
    pub y_pos: bool,
}

/// An input or output port on a node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Port {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// `None` when the document gives no cardinality
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cardinality: Option<Cardinality>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class_name: Option<String>,
    #[serde(default)]
    pub extras: Extras,
}

impl Port {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: None,
            cardinality: None,
            class_name: None,
            extras: Extras::default(),
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_cardinality(mut self, cardinality: Cardinality) -> Self {
        self.cardinality = Some(cardinality);
        self
    }

    pub fn cardinality_or_default(&self) -> Cardinality {
        self.cardinality.unwrap_or_default()
    }
}

/// Explicit node or comment dimensions
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

/// A node on the canvas
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanvasNode {
    pub id: String,
    pub kind: NodeKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub op: Option<String>,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    pub position: Position,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<Size>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class_name: Option<String>,
    #[serde(default)]
    pub inputs: Vec<Port>,
    #[serde(default)]
    pub outputs: Vec<Port>,
    #[serde(default)]
    pub decorations: Vec<Decoration>,
    #[serde(default)]
    pub messages: Vec<NodeMessage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ui_parameters: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subflow: Option<SubflowRef>,
    #[serde(default)]
    pub expanded_in_place: bool,
    #[serde(default)]
    pub extras: Extras,
    #[serde(skip)]
    pub implied: ImpliedFields,
}

impl CanvasNode {
    /// Create a bare node of the given kind
    pub fn new(id: impl Into<String>, kind: NodeKind, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind,
            op: None,
            label: label.into(),
            description: None,
            image: None,
            position: Position::default(),
            size: None,
            class_name: None,
            inputs: Vec::new(),
            outputs: Vec::new(),
            decorations: Vec::new(),
            messages: Vec::new(),
            parameters: None,
            ui_parameters: None,
            subflow: None,
            expanded_in_place: false,
            extras: Extras::default(),
            implied: ImpliedFields::default(),
        }
    }

    /// Create an execution node with one input and one output port
    pub fn execution(id: impl Into<String>, label: impl Into<String>) -> Self {
        let mut node = Self::new(id, NodeKind::Execution, label);
        node.inputs.push(Port::new("inPort").with_label("Input Port"));
        node.outputs.push(Port::new("outPort").with_label("Output Port"));
        node
    }

    /// Create a supernode containing `pipeline_id`
    pub fn supernode(
        id: impl Into<String>,
        label: impl Into<String>,
        pipeline_id: impl Into<String>,
    ) -> Self {
        let mut node = Self::new(id, NodeKind::Supernode, label);
        node.subflow = Some(SubflowRef {
            pipeline_id: pipeline_id.into(),
            url: None,
            extra: Opaque::new(),
        });
        node
    }

    pub fn at(mut self, x: f64, y: f64) -> Self {
        self.position = Position::new(x, y);
        self
    }

    pub fn is_supernode(&self) -> bool {
        self.kind == NodeKind::Supernode
    }

    /// The pipeline this supernode contains, if any
    pub fn subflow_pipeline_id(&self) -> Option<&str> {
        if self.is_supernode() {
            self.subflow.as_ref().map(|s| s.pipeline_id.as_str())
        } else {
            None
        }
    }

    pub fn input_port(&self, port_id: &str) -> Option<&Port> {
        self.inputs.iter().find(|p| p.id == port_id)
    }

    pub fn output_port(&self, port_id: &str) -> Option<&Port> {
        self.outputs.iter().find(|p| p.id == port_id)
    }

    /// First input port, used when a link names no target port
    pub fn default_input_port(&self) -> Option<&str> {
        self.inputs.first().map(|p| p.id.as_str())
    }

    /// First output port, used when a link names no source port
    pub fn default_output_port(&self) -> Option<&str> {
        self.outputs.first().map(|p| p.id.as_str())
    }
}

/// A free-text comment on the canvas
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanvasComment {
    pub id: String,
    pub content: String,
    pub position: Position,
    pub width: f64,
    pub height: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class_name: Option<String>,
    #[serde(default)]
    pub extras: Extras,
}

impl CanvasComment {
    pub fn new(id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            content: content.into(),
            position: Position::default(),
            width: super::flow::default_comment_width(),
            height: super::flow::default_comment_height(),
            class_name: None,
            extras: Extras::default(),
        }
    }

    pub fn at(mut self, x: f64, y: f64) -> Self {
        self.position = Position::new(x, y);
        self
    }
}

/// What a link connects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LinkKind {
    /// Node output port to node input port
    NodeLink,
    /// Node to node, without ports
    AssociationLink,
    /// Comment to node
    CommentLink,
}

/// One end of a link
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LinkEnd {
    Object {
        id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        port: Option<String>,
    },
    Detached(Position),
}

impl LinkEnd {
    pub fn object(id: impl Into<String>) -> Self {
        Self::Object {
            id: id.into(),
            port: None,
        }
    }

    pub fn port(id: impl Into<String>, port: impl Into<String>) -> Self {
        Self::Object {
            id: id.into(),
            port: Some(port.into()),
        }
    }

    /// The object this end is attached to
    pub fn object_id(&self) -> Option<&str> {
        match self {
            Self::Object { id, .. } => Some(id),
            Self::Detached(_) => None,
        }
    }

    pub fn port_id(&self) -> Option<&str> {
        match self {
            Self::Object { port, .. } => port.as_deref(),
            Self::Detached(_) => None,
        }
    }

    pub fn is_detached(&self) -> bool {
        matches!(self, Self::Detached(_))
    }
}

/// A link between two objects of the same pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanvasLink {
    pub id: String,
    pub kind: LinkKind,
    pub src: LinkEnd,
    pub trg: LinkEnd,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class_name: Option<String>,
    #[serde(default)]
    pub decorations: Vec<Decoration>,
    #[serde(default)]
    pub extras: Extras,
    #[serde(skip)]
    pub implied: ImpliedFields,
}

impl CanvasLink {
    pub fn new(id: impl Into<String>, kind: LinkKind, src: LinkEnd, trg: LinkEnd) -> Self {
        Self {
            id: id.into(),
            kind,
            src,
            trg,
            class_name: None,
            decorations: Vec::new(),
            extras: Extras::default(),
            implied: ImpliedFields::default(),
        }
    }

    /// Whether either end is attached to `object_id`
    pub fn touches(&self, object_id: &str) -> bool {
        self.src.object_id() == Some(object_id) || self.trg.object_id() == Some(object_id)
    }

    /// A data link with both ends attached to nodes
    pub fn is_attached_node_link(&self) -> bool {
        self.kind == LinkKind::NodeLink && !self.src.is_detached() && !self.trg.is_detached()
    }
}

/// A pipeline: one graph of nodes, comments and links
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanvasPipeline {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub runtime_ref: Option<String>,
    #[serde(default)]
    pub nodes: Vec<CanvasNode>,
    #[serde(default)]
    pub comments: Vec<CanvasComment>,
    #[serde(default)]
    pub links: Vec<CanvasLink>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zoom: Option<ZoomTransform>,
    /// Origin URL when the pipeline came from an external flow
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_url: Option<String>,
    #[serde(default)]
    pub extras: Extras,
}

impl CanvasPipeline {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            runtime_ref: None,
            nodes: Vec::new(),
            comments: Vec::new(),
            links: Vec::new(),
            zoom: None,
            external_url: None,
            extras: Extras::default(),
        }
    }

    pub fn is_external(&self) -> bool {
        self.external_url.is_some()
    }

    pub fn node(&self, id: &str) -> Option<&CanvasNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn node_mut(&mut self, id: &str) -> Option<&mut CanvasNode> {
        self.nodes.iter_mut().find(|n| n.id == id)
    }

    pub fn comment(&self, id: &str) -> Option<&CanvasComment> {
        self.comments.iter().find(|c| c.id == id)
    }

    pub fn comment_mut(&mut self, id: &str) -> Option<&mut CanvasComment> {
        self.comments.iter_mut().find(|c| c.id == id)
    }

    pub fn link(&self, id: &str) -> Option<&CanvasLink> {
        self.links.iter().find(|l| l.id == id)
    }

    pub fn link_mut(&mut self, id: &str) -> Option<&mut CanvasLink> {
        self.links.iter_mut().find(|l| l.id == id)
    }

    /// What kind of object `id` names in this pipeline
    pub fn object_kind(&self, id: &str) -> Option<ObjectKind> {
        if self.node(id).is_some() {
            Some(ObjectKind::Node)
        } else if self.comment(id).is_some() {
            Some(ObjectKind::Comment)
        } else if self.link(id).is_some() {
            Some(ObjectKind::Link)
        } else {
            None
        }
    }

    pub fn contains_object(&self, id: &str) -> bool {
        self.object_kind(id).is_some()
    }

    /// All supernodes of this pipeline
    pub fn supernodes(&self) -> impl Iterator<Item = &CanvasNode> {
        self.nodes.iter().filter(|n| n.is_supernode())
    }

    /// Ids of links attached to `object_id`
    pub fn links_touching(&self, object_id: &str) -> Vec<String> {
        self.links
            .iter()
            .filter(|l| l.touches(object_id))
            .map(|l| l.id.clone())
            .collect()
    }

    /// Remove objects by id together with every link attached to them.
    /// Returns the ids actually removed.
    pub fn remove_objects(&mut self, ids: &[String]) -> Vec<String> {
        let mut removed = Vec::new();

        self.nodes.retain(|n| {
            let keep = !ids.contains(&n.id);
            if !keep {
                removed.push(n.id.clone());
            }
            keep
        });
        self.comments.retain(|c| {
            let keep = !ids.contains(&c.id);
            if !keep {
                removed.push(c.id.clone());
            }
            keep
        });

        let gone: Vec<String> = removed.clone();
        self.links.retain(|l| {
            let keep = !ids.contains(&l.id) && !gone.iter().any(|g| l.touches(g));
            if !keep {
                removed.push(l.id.clone());
            }
            keep
        });

        removed
    }

    /// Count links already attached to a node port
    pub fn port_link_count(&self, node_id: &str, port_id: &str, input: bool) -> usize {
        self.links
            .iter()
            .filter(|l| l.kind == LinkKind::NodeLink)
            .filter(|l| {
                let end = if input { &l.trg } else { &l.src };
                end.object_id() == Some(node_id) && end.port_id() == Some(port_id)
            })
            .count()
    }
}

/// The complete loaded model: local pipelines plus any external ones
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanvasInfo {
    pub id: String,
    pub primary_pipeline: String,
    pub pipelines: Vec<CanvasPipeline>,
    /// Unknown top-level document fields
    #[serde(default)]
    pub extra: Opaque,
}

impl CanvasInfo {
    /// An empty model with a single primary pipeline
    pub fn empty(flow_id: impl Into<String>, primary_id: impl Into<String>) -> Self {
        let primary_id = primary_id.into();
        Self {
            id: flow_id.into(),
            primary_pipeline: primary_id.clone(),
            pipelines: vec![CanvasPipeline::new(primary_id)],
            extra: Opaque::new(),
        }
    }

    pub fn pipeline(&self, id: &str) -> Option<&CanvasPipeline> {
        self.pipelines.iter().find(|p| p.id == id)
    }

    pub fn pipeline_mut(&mut self, id: &str) -> Option<&mut CanvasPipeline> {
        self.pipelines.iter_mut().find(|p| p.id == id)
    }

    pub fn primary(&self) -> Option<&CanvasPipeline> {
        self.pipeline(&self.primary_pipeline)
    }

    pub fn contains_pipeline(&self, id: &str) -> bool {
        self.pipeline(id).is_some()
    }

    pub fn pipeline_ids(&self) -> Vec<String> {
        self.pipelines.iter().map(|p| p.id.clone()).collect()
    }

    /// Replace a pipeline, or append it when it does not exist yet
    pub fn upsert_pipeline(&mut self, pipeline: CanvasPipeline) {
        match self.pipeline_mut(&pipeline.id) {
            Some(existing) => *existing = pipeline,
            None => self.pipelines.push(pipeline),
        }
    }

    pub fn remove_pipeline(&mut self, id: &str) -> Option<CanvasPipeline> {
        let idx = self.pipelines.iter().position(|p| p.id == id)?;
        Some(self.pipelines.remove(idx))
    }
}
