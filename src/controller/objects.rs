// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 canvasflow contributors

//! Nodes, comments and object-level operations

use serde_json::Value;
use std::collections::HashSet;
use tracing::debug;

use super::{CanvasController, PipelineObjectIds};
use crate::errors::{CanvasError, CanvasResult};
use crate::graph::SubflowGraph;
use crate::model::{
    flow_node_to_canvas, CanvasComment, CanvasNode, Decoration, FlowNode, LinkEnd, NodeMessage,
    ObjectKind, Port, Position, Size,
};
use crate::styles::{StyleEntry, StyleKey, StyleSpec};

/// Node attributes to change; `None` leaves an attribute as it is
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeProperties {
    pub label: Option<String>,
    pub description: Option<String>,
    pub image: Option<String>,
    pub op: Option<String>,
    pub position: Option<Position>,
    pub size: Option<Size>,
    pub class_name: Option<String>,
    pub parameters: Option<Value>,
    pub ui_parameters: Option<Value>,
    pub messages: Option<Vec<NodeMessage>>,
    pub decorations: Option<Vec<Decoration>>,
}

impl NodeProperties {
    fn apply(self, node: &mut CanvasNode) {
        if let Some(label) = self.label {
            node.label = label;
        }
        if let Some(description) = self.description {
            node.description = Some(description);
        }
        if let Some(image) = self.image {
            node.image = Some(image);
        }
        if let Some(op) = self.op {
            node.op = Some(op);
        }
        if let Some(position) = self.position {
            node.position = position;
        }
        if let Some(size) = self.size {
            node.size = Some(size);
        }
        if let Some(class_name) = self.class_name {
            node.class_name = Some(class_name);
        }
        if let Some(parameters) = self.parameters {
            node.parameters = Some(parameters);
        }
        if let Some(ui_parameters) = self.ui_parameters {
            node.ui_parameters = Some(ui_parameters);
        }
        if let Some(messages) = self.messages {
            node.messages = messages;
        }
        if let Some(decorations) = self.decorations {
            node.decorations = decorations;
        }
    }
}

/// Comment attributes to change
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommentProperties {
    pub content: Option<String>,
    pub position: Option<Position>,
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub class_name: Option<String>,
}

impl CommentProperties {
    fn apply(self, comment: &mut CanvasComment) {
        if let Some(content) = self.content {
            comment.content = content;
        }
        if let Some(position) = self.position {
            comment.position = position;
        }
        if let Some(width) = self.width {
            comment.width = width;
        }
        if let Some(height) = self.height {
            comment.height = height;
        }
        if let Some(class_name) = self.class_name {
            comment.class_name = Some(class_name);
        }
    }
}

/// Decorations for one node or link of a multi-decoration call
#[derive(Debug, Clone, PartialEq)]
pub struct DecorationEntry {
    pub pipeline_id: String,
    pub object_id: String,
    pub decorations: Vec<Decoration>,
}

impl CanvasController {
    // ─────────────────────────────────────────────────────────────────────────
    // Generic accessors
    // ─────────────────────────────────────────────────────────────────────────

    pub(crate) fn update_node(
        &mut self,
        pipeline_id: &str,
        node_id: &str,
        f: impl FnOnce(&mut CanvasNode),
    ) -> CanvasResult<()> {
        let node = self
            .pipeline_mut_or_err(pipeline_id)?
            .node_mut(node_id)
            .ok_or_else(|| CanvasError::not_found(ObjectKind::Node, node_id, pipeline_id))?;
        f(node);
        Ok(())
    }

    pub(crate) fn update_comment(
        &mut self,
        pipeline_id: &str,
        comment_id: &str,
        f: impl FnOnce(&mut CanvasComment),
    ) -> CanvasResult<()> {
        let comment = self
            .pipeline_mut_or_err(pipeline_id)?
            .comment_mut(comment_id)
            .ok_or_else(|| CanvasError::not_found(ObjectKind::Comment, comment_id, pipeline_id))?;
        f(comment);
        Ok(())
    }

    /// Fail unless every id names an object of one of `kinds`
    pub(crate) fn require_objects(
        &self,
        pipeline_id: &str,
        ids: &[String],
        kinds: &[ObjectKind],
    ) -> CanvasResult<()> {
        let pipeline = self.pipeline_or_err(pipeline_id)?;
        for id in ids {
            match pipeline.object_kind(id) {
                Some(kind) if kinds.contains(&kind) => {}
                _ => return Err(CanvasError::not_found(kinds[0], id, pipeline_id)),
            }
        }
        Ok(())
    }

    pub(crate) fn apply_styles(
        &mut self,
        targets: &PipelineObjectIds,
        spec: &StyleSpec,
        temporary: bool,
        kinds: &[ObjectKind],
    ) -> CanvasResult<()> {
        for (pipeline_id, ids) in targets {
            self.require_objects(pipeline_id, ids, kinds)?;
        }
        for (pipeline_id, ids) in targets {
            for id in ids {
                self.styles
                    .set(StyleKey::new(pipeline_id, id), spec.clone(), temporary);
            }
        }
        Ok(())
    }

    pub(crate) fn apply_multi_styles(
        &mut self,
        entries: &[StyleEntry],
        temporary: bool,
        kinds: &[ObjectKind],
    ) -> CanvasResult<()> {
        for entry in entries {
            let ids = std::slice::from_ref(&entry.object_id);
            self.require_objects(&entry.pipeline_id, ids, kinds)?;
        }
        for entry in entries {
            self.styles.set(entry.key(), entry.style.clone(), temporary);
        }
        Ok(())
    }

    pub(crate) fn style_of(
        &self,
        pipeline_id: &str,
        object_id: &str,
        temporary: bool,
    ) -> StyleSpec {
        self.styles
            .get(&StyleKey::new(pipeline_id, object_id), temporary)
            .cloned()
            .unwrap_or_default()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Objects
    // ─────────────────────────────────────────────────────────────────────────

    /// Offset nodes, comments and the detached ends of listed links
    pub fn move_objects(
        &mut self,
        pipeline_id: &str,
        object_ids: &[String],
        dx: f64,
        dy: f64,
    ) -> CanvasResult<()> {
        self.log_api("move_objects", (pipeline_id, object_ids, dx, dy));
        self.move_objects_inner(pipeline_id, object_ids, dx, dy)
    }

    pub(crate) fn move_objects_inner(
        &mut self,
        pipeline_id: &str,
        object_ids: &[String],
        dx: f64,
        dy: f64,
    ) -> CanvasResult<()> {
        self.require_objects(
            pipeline_id,
            object_ids,
            &[ObjectKind::Node, ObjectKind::Comment, ObjectKind::Link],
        )?;

        let config = self.config.clone();
        let pipeline = self.pipeline_mut_or_err(pipeline_id)?;
        for node in pipeline.nodes.iter_mut().filter(|n| object_ids.contains(&n.id)) {
            node.position = config.snap(node.position.offset(dx, dy));
        }
        for comment in pipeline
            .comments
            .iter_mut()
            .filter(|c| object_ids.contains(&c.id))
        {
            comment.position = config.snap(comment.position.offset(dx, dy));
        }
        for link in pipeline.links.iter_mut().filter(|l| object_ids.contains(&l.id)) {
            for end in [&mut link.src, &mut link.trg] {
                if let LinkEnd::Detached(pos) = end {
                    *pos = pos.offset(dx, dy);
                }
            }
        }
        Ok(())
    }

    /// Delete objects and every link attached to them. Deleting a supernode
    /// also deletes the pipelines nested inside it. Returns the removed ids.
    pub fn delete_objects(
        &mut self,
        pipeline_id: &str,
        object_ids: &[String],
    ) -> CanvasResult<Vec<String>> {
        self.log_api("delete_objects", (pipeline_id, object_ids));
        self.delete_objects_inner(pipeline_id, object_ids)
    }

    pub(crate) fn delete_objects_inner(
        &mut self,
        pipeline_id: &str,
        object_ids: &[String],
    ) -> CanvasResult<Vec<String>> {
        self.require_objects(
            pipeline_id,
            object_ids,
            &[ObjectKind::Node, ObjectKind::Comment, ObjectKind::Link],
        )?;

        // Local pipelines nested below deleted supernodes go with them
        let hierarchy = SubflowGraph::build(&self.info);
        let mut nested = Vec::new();
        if let Some(pipeline) = self.info.pipeline(pipeline_id) {
            for node in pipeline.supernodes().filter(|n| object_ids.contains(&n.id)) {
                if let Some(child) = node.subflow_pipeline_id() {
                    nested.push(child.to_string());
                    nested.extend(hierarchy.descendants(child));
                }
            }
        }

        let removed = self.pipeline_mut_or_err(pipeline_id)?.remove_objects(object_ids);
        for child in &nested {
            if self.is_pipeline_external(child) {
                continue;
            }
            self.info.remove_pipeline(child);
            self.styles.remove_pipeline(child);
            self.zooms.remove(child);
        }
        debug!(
            "Deleted {} object(s) and {} nested pipeline(s) from '{}'",
            removed.len(),
            nested.len(),
            pipeline_id
        );

        self.styles.remove_objects(pipeline_id, &removed);
        self.prune_stale_state();
        Ok(removed)
    }

    /// Remove every link attached to the given nodes or comments
    pub fn disconnect_objects(
        &mut self,
        pipeline_id: &str,
        object_ids: &[String],
    ) -> CanvasResult<Vec<String>> {
        self.log_api("disconnect_objects", (pipeline_id, object_ids));
        self.require_objects(pipeline_id, object_ids, &[ObjectKind::Node, ObjectKind::Comment])?;

        let pipeline = self.pipeline_or_err(pipeline_id)?;
        let links: Vec<String> = pipeline
            .links
            .iter()
            .filter(|l| object_ids.iter().any(|id| l.touches(id)))
            .map(|l| l.id.clone())
            .collect();
        self.delete_objects_inner(pipeline_id, &links)
    }

    pub fn delete_object(
        &mut self,
        pipeline_id: &str,
        object_id: &str,
    ) -> CanvasResult<Vec<String>> {
        self.delete_objects(pipeline_id, &[object_id.to_string()])
    }

    pub fn set_objects_style(
        &mut self,
        targets: &PipelineObjectIds,
        spec: StyleSpec,
        temporary: bool,
    ) -> CanvasResult<()> {
        self.log_api("set_objects_style", (targets, temporary));
        self.apply_styles(targets, &spec, temporary, &[ObjectKind::Node, ObjectKind::Comment])
    }

    pub fn set_objects_multi_style(
        &mut self,
        entries: &[StyleEntry],
        temporary: bool,
    ) -> CanvasResult<()> {
        self.log_api("set_objects_multi_style", (entries.len(), temporary));
        self.apply_multi_styles(entries, temporary, &[ObjectKind::Node, ObjectKind::Comment])
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Nodes
    // ─────────────────────────────────────────────────────────────────────────

    pub fn get_nodes(&self, pipeline_id: &str) -> &[CanvasNode] {
        self.info
            .pipeline(pipeline_id)
            .map(|p| p.nodes.as_slice())
            .unwrap_or_default()
    }

    pub fn get_node(&self, pipeline_id: &str, node_id: &str) -> Option<&CanvasNode> {
        self.info.pipeline(pipeline_id)?.node(node_id)
    }

    /// Build a node from a palette template with a fresh id. The node is not
    /// added to the pipeline.
    pub fn create_node(
        &mut self,
        template: &FlowNode,
        position: Position,
        pipeline_id: &str,
    ) -> CanvasResult<CanvasNode> {
        self.pipeline_or_err(pipeline_id)?;

        let mut node = flow_node_to_canvas(template.clone());
        node.id = self.generate_id();
        node.position = self.config.snap(position);
        Ok(node)
    }

    /// Add a node without recording it for undo
    pub fn add_node(&mut self, node: CanvasNode, pipeline_id: &str) -> CanvasResult<()> {
        self.log_api("add_node", (&node.id, pipeline_id));
        self.add_node_inner(node, pipeline_id)
    }

    pub(crate) fn add_node_inner(
        &mut self,
        mut node: CanvasNode,
        pipeline_id: &str,
    ) -> CanvasResult<()> {
        let pipeline = self.pipeline_or_err(pipeline_id)?;
        if pipeline.contains_object(&node.id) {
            return Err(CanvasError::DuplicateId {
                kind: ObjectKind::Node,
                id: node.id,
                pipeline_id: pipeline_id.to_string(),
            });
        }
        for ports in [&node.inputs, &node.outputs] {
            let mut seen = HashSet::new();
            if let Some(dup) = ports.iter().find(|p| !seen.insert(p.id.as_str())) {
                return Err(CanvasError::DuplicateId {
                    kind: ObjectKind::Port,
                    id: format!("{}/{}", node.id, dup.id),
                    pipeline_id: pipeline_id.to_string(),
                });
            }
        }

        if let Some(child) = node.subflow_pipeline_id() {
            let hierarchy = SubflowGraph::build(&self.info);
            let holders = hierarchy.holders(child);
            if !holders.is_empty() {
                let mut supernodes: Vec<String> =
                    holders.iter().map(|h| h.supernode_id.clone()).collect();
                supernodes.push(node.id.clone());
                return Err(CanvasError::AmbiguousSubflow {
                    pipeline_id: child.to_string(),
                    supernodes,
                });
            }
            let ancestors = hierarchy.ancestors(pipeline_id);
            if let Some(pos) = ancestors.iter().position(|p| p == child) {
                let mut pipelines = ancestors[pos..].to_vec();
                pipelines.push(child.to_string());
                return Err(CanvasError::CircularSubflow { pipelines });
            }
        }

        node.position = self.config.snap(node.position);
        self.pipeline_mut_or_err(pipeline_id)?.nodes.push(node);
        Ok(())
    }

    pub fn delete_node(&mut self, pipeline_id: &str, node_id: &str) -> CanvasResult<Vec<String>> {
        self.require_objects(pipeline_id, &[node_id.to_string()], &[ObjectKind::Node])?;
        self.delete_objects(pipeline_id, &[node_id.to_string()])
    }

    /// Set several node attributes at once
    pub fn set_node_properties(
        &mut self,
        pipeline_id: &str,
        node_id: &str,
        properties: NodeProperties,
    ) -> CanvasResult<()> {
        self.log_api("set_node_properties", (pipeline_id, node_id, &properties));
        self.update_node(pipeline_id, node_id, |node| properties.apply(node))
    }

    pub fn set_node_parameters(
        &mut self,
        pipeline_id: &str,
        node_id: &str,
        parameters: Value,
    ) -> CanvasResult<()> {
        self.set_node_properties(
            pipeline_id,
            node_id,
            NodeProperties {
                parameters: Some(parameters),
                ..NodeProperties::default()
            },
        )
    }

    pub fn set_node_ui_parameters(
        &mut self,
        pipeline_id: &str,
        node_id: &str,
        ui_parameters: Value,
    ) -> CanvasResult<()> {
        self.set_node_properties(
            pipeline_id,
            node_id,
            NodeProperties {
                ui_parameters: Some(ui_parameters),
                ..NodeProperties::default()
            },
        )
    }

    pub fn set_node_messages(
        &mut self,
        pipeline_id: &str,
        node_id: &str,
        messages: Vec<NodeMessage>,
    ) -> CanvasResult<()> {
        self.set_node_properties(
            pipeline_id,
            node_id,
            NodeProperties {
                messages: Some(messages),
                ..NodeProperties::default()
            },
        )
    }

    /// Add a message, replacing one with the same `id_ref`
    pub fn set_node_message(
        &mut self,
        pipeline_id: &str,
        node_id: &str,
        message: NodeMessage,
    ) -> CanvasResult<()> {
        self.update_node(pipeline_id, node_id, |node| {
            match node.messages.iter_mut().find(|m| m.id_ref == message.id_ref) {
                Some(existing) => *existing = message,
                None => node.messages.push(message),
            }
        })
    }

    pub fn set_node_label(
        &mut self,
        pipeline_id: &str,
        node_id: &str,
        label: impl Into<String>,
    ) -> CanvasResult<()> {
        self.set_node_properties(
            pipeline_id,
            node_id,
            NodeProperties {
                label: Some(label.into()),
                ..NodeProperties::default()
            },
        )
    }

    pub fn set_nodes_class_name(
        &mut self,
        targets: &PipelineObjectIds,
        class_name: &str,
    ) -> CanvasResult<()> {
        for (pipeline_id, ids) in targets {
            self.require_objects(pipeline_id, ids, &[ObjectKind::Node])?;
        }
        for (pipeline_id, ids) in targets {
            for id in ids {
                self.update_node(pipeline_id, id, |node| {
                    node.class_name = Some(class_name.to_string())
                })?;
            }
        }
        Ok(())
    }

    pub fn set_node_decorations(
        &mut self,
        pipeline_id: &str,
        node_id: &str,
        decorations: Vec<Decoration>,
    ) -> CanvasResult<()> {
        self.set_node_properties(
            pipeline_id,
            node_id,
            NodeProperties {
                decorations: Some(decorations),
                ..NodeProperties::default()
            },
        )
    }

    pub fn set_nodes_multi_decorations(&mut self, entries: &[DecorationEntry]) -> CanvasResult<()> {
        for entry in entries {
            self.require_objects(
                &entry.pipeline_id,
                std::slice::from_ref(&entry.object_id),
                &[ObjectKind::Node],
            )?;
        }
        for entry in entries {
            let decorations = entry.decorations.clone();
            self.update_node(&entry.pipeline_id, &entry.object_id, |node| {
                node.decorations = decorations
            })?;
        }
        Ok(())
    }

    /// Replace the input ports. Links attached to ports that disappear are
    /// removed.
    pub fn set_node_input_ports(
        &mut self,
        pipeline_id: &str,
        node_id: &str,
        ports: Vec<Port>,
    ) -> CanvasResult<()> {
        self.replace_ports(pipeline_id, node_id, ports, true)
    }

    pub fn set_node_output_ports(
        &mut self,
        pipeline_id: &str,
        node_id: &str,
        ports: Vec<Port>,
    ) -> CanvasResult<()> {
        self.replace_ports(pipeline_id, node_id, ports, false)
    }

    fn replace_ports(
        &mut self,
        pipeline_id: &str,
        node_id: &str,
        ports: Vec<Port>,
        input: bool,
    ) -> CanvasResult<()> {
        self.log_api("replace_ports", (pipeline_id, node_id, input));
        let kept: HashSet<String> = ports.iter().map(|p| p.id.clone()).collect();
        self.update_node(pipeline_id, node_id, |node| {
            if input {
                node.inputs = ports;
            } else {
                node.outputs = ports;
            }
        })?;

        let pipeline = self.pipeline_or_err(pipeline_id)?;
        let orphaned: Vec<String> = pipeline
            .links
            .iter()
            .filter(|l| {
                let end = if input { &l.trg } else { &l.src };
                end.object_id() == Some(node_id)
                    && end.port_id().map_or(false, |p| !kept.contains(p))
            })
            .map(|l| l.id.clone())
            .collect();
        if !orphaned.is_empty() {
            self.delete_objects_inner(pipeline_id, &orphaned)?;
        }
        Ok(())
    }

    pub fn set_input_port_label(
        &mut self,
        pipeline_id: &str,
        node_id: &str,
        port_id: &str,
        label: &str,
    ) -> CanvasResult<()> {
        self.set_port_label(pipeline_id, node_id, port_id, label, true)
    }

    pub fn set_output_port_label(
        &mut self,
        pipeline_id: &str,
        node_id: &str,
        port_id: &str,
        label: &str,
    ) -> CanvasResult<()> {
        self.set_port_label(pipeline_id, node_id, port_id, label, false)
    }

    fn set_port_label(
        &mut self,
        pipeline_id: &str,
        node_id: &str,
        port_id: &str,
        label: &str,
        input: bool,
    ) -> CanvasResult<()> {
        let exists = self.get_node(pipeline_id, node_id).map(|n| {
            let port = if input {
                n.input_port(port_id)
            } else {
                n.output_port(port_id)
            };
            port.is_some()
        });
        match exists {
            None => Err(CanvasError::not_found(ObjectKind::Node, node_id, pipeline_id)),
            Some(false) => Err(CanvasError::not_found(
                ObjectKind::Port,
                &format!("{}/{}", node_id, port_id),
                pipeline_id,
            )),
            Some(true) => self.update_node(pipeline_id, node_id, |node| {
                let ports = if input { &mut node.inputs } else { &mut node.outputs };
                if let Some(port) = ports.iter_mut().find(|p| p.id == port_id) {
                    port.label = Some(label.to_string());
                }
            }),
        }
    }

    pub fn get_node_ui_parameters(&self, pipeline_id: &str, node_id: &str) -> Option<&Value> {
        self.get_node(pipeline_id, node_id)?.ui_parameters.as_ref()
    }

    pub fn get_supernodes(&self, pipeline_id: &str) -> Vec<&CanvasNode> {
        self.info
            .pipeline(pipeline_id)
            .map(|p| p.supernodes().collect())
            .unwrap_or_default()
    }

    /// The supernode whose subflow is `pipeline_id`, with the pipeline that
    /// holds it
    pub fn get_supernode_obj_referencing(&self, pipeline_id: &str) -> Option<(&str, &CanvasNode)> {
        self.info.pipelines.iter().find_map(|p| {
            p.supernodes()
                .find(|n| n.subflow_pipeline_id() == Some(pipeline_id))
                .map(|n| (p.id.as_str(), n))
        })
    }

    pub fn get_node_messages(&self, pipeline_id: &str, node_id: &str) -> &[NodeMessage] {
        self.get_node(pipeline_id, node_id)
            .map(|n| n.messages.as_slice())
            .unwrap_or_default()
    }

    pub fn get_node_message(
        &self,
        pipeline_id: &str,
        node_id: &str,
        id_ref: &str,
    ) -> Option<&NodeMessage> {
        self.get_node(pipeline_id, node_id)?
            .messages
            .iter()
            .find(|m| m.id_ref == id_ref)
    }

    pub fn get_node_input_ports(&self, pipeline_id: &str, node_id: &str) -> &[Port] {
        self.get_node(pipeline_id, node_id)
            .map(|n| n.inputs.as_slice())
            .unwrap_or_default()
    }

    pub fn get_node_output_ports(&self, pipeline_id: &str, node_id: &str) -> &[Port] {
        self.get_node(pipeline_id, node_id)
            .map(|n| n.outputs.as_slice())
            .unwrap_or_default()
    }

    pub fn get_node_decorations(&self, pipeline_id: &str, node_id: &str) -> &[Decoration] {
        self.get_node(pipeline_id, node_id)
            .map(|n| n.decorations.as_slice())
            .unwrap_or_default()
    }

    pub fn get_node_class_name(&self, pipeline_id: &str, node_id: &str) -> Option<&str> {
        self.get_node(pipeline_id, node_id)?.class_name.as_deref()
    }

    /// Style of one layer; empty when none is set
    pub fn get_node_style(&self, pipeline_id: &str, node_id: &str, temporary: bool) -> StyleSpec {
        self.style_of(pipeline_id, node_id, temporary)
    }

    pub fn is_supernode_expanded_in_place(&self, pipeline_id: &str, node_id: &str) -> bool {
        self.get_node(pipeline_id, node_id)
            .map_or(false, |n| n.is_supernode() && n.expanded_in_place)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Comments
    // ─────────────────────────────────────────────────────────────────────────

    pub fn get_comments(&self, pipeline_id: &str) -> &[CanvasComment] {
        self.info
            .pipeline(pipeline_id)
            .map(|p| p.comments.as_slice())
            .unwrap_or_default()
    }

    pub fn get_comment(&self, pipeline_id: &str, comment_id: &str) -> Option<&CanvasComment> {
        self.info.pipeline(pipeline_id)?.comment(comment_id)
    }

    /// Build an empty comment with a fresh id. It is not added.
    pub fn create_comment(
        &mut self,
        position: Position,
        pipeline_id: &str,
    ) -> CanvasResult<CanvasComment> {
        self.pipeline_or_err(pipeline_id)?;
        let id = self.generate_id();
        let position = self.config.snap(position);
        Ok(CanvasComment::new(id, "").at(position.x, position.y))
    }

    pub fn add_comment(&mut self, comment: CanvasComment, pipeline_id: &str) -> CanvasResult<()> {
        self.log_api("add_comment", (&comment.id, pipeline_id));
        self.add_comment_inner(comment, pipeline_id)
    }

    pub(crate) fn add_comment_inner(
        &mut self,
        mut comment: CanvasComment,
        pipeline_id: &str,
    ) -> CanvasResult<()> {
        if self.pipeline_or_err(pipeline_id)?.contains_object(&comment.id) {
            return Err(CanvasError::DuplicateId {
                kind: ObjectKind::Comment,
                id: comment.id,
                pipeline_id: pipeline_id.to_string(),
            });
        }
        comment.position = self.config.snap(comment.position);
        self.pipeline_mut_or_err(pipeline_id)?.comments.push(comment);
        Ok(())
    }

    /// Change a comment's text without recording it for undo
    pub fn edit_comment(
        &mut self,
        pipeline_id: &str,
        comment_id: &str,
        content: impl Into<String>,
    ) -> CanvasResult<()> {
        let content = content.into();
        self.update_comment(pipeline_id, comment_id, |comment| comment.content = content)
    }

    pub fn set_comment_properties(
        &mut self,
        pipeline_id: &str,
        comment_id: &str,
        properties: CommentProperties,
    ) -> CanvasResult<()> {
        self.log_api("set_comment_properties", (pipeline_id, comment_id, &properties));
        self.update_comment(pipeline_id, comment_id, |comment| properties.apply(comment))
    }

    pub fn set_comments_class_name(
        &mut self,
        targets: &PipelineObjectIds,
        class_name: &str,
    ) -> CanvasResult<()> {
        for (pipeline_id, ids) in targets {
            self.require_objects(pipeline_id, ids, &[ObjectKind::Comment])?;
        }
        for (pipeline_id, ids) in targets {
            for id in ids {
                self.update_comment(pipeline_id, id, |c| {
                    c.class_name = Some(class_name.to_string())
                })?;
            }
        }
        Ok(())
    }

    pub fn delete_comment(
        &mut self,
        pipeline_id: &str,
        comment_id: &str,
    ) -> CanvasResult<Vec<String>> {
        self.require_objects(pipeline_id, &[comment_id.to_string()], &[ObjectKind::Comment])?;
        self.delete_objects(pipeline_id, &[comment_id.to_string()])
    }

    pub fn get_comment_class_name(&self, pipeline_id: &str, comment_id: &str) -> Option<&str> {
        self.get_comment(pipeline_id, comment_id)?.class_name.as_deref()
    }

    pub fn get_comment_style(
        &self,
        pipeline_id: &str,
        comment_id: &str,
        temporary: bool,
    ) -> StyleSpec {
        self.style_of(pipeline_id, comment_id, temporary)
    }
}
