// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 canvasflow contributors

//! Recorded edits, undo and redo
//!
//! Every `*_command` method builds an [`EditActionData`] and hands it to
//! [`CanvasController::execute_edit`], which runs the before-edit handler,
//! applies the edit against a snapshot, records the pipeline deltas and
//! finally notifies the edit handler.

use std::collections::{HashMap, HashSet};
use tracing::{debug, info, warn};

use super::CanvasController;
use crate::commands::{diff_pipelines, Command, CommandPhase, EditActionData, EditPayload};
use crate::config::LinkDirection;
use crate::errors::{CanvasError, CanvasResult};
use crate::graph::PipelineIndex;
use crate::model::{
    CanvasComment, CanvasLink, CanvasNode, CanvasPipeline, LinkEnd, LinkKind, NodeKind, ObjectKind,
    Port, Position, Size,
};
use crate::selection::SelectionSet;

/// Offset of binding nodes from the node they connect to
const BINDING_OFFSET: f64 = 150.0;

impl CanvasController {
    /// Perform an edit described by `data`, as a host UI would. Undo and
    /// redo requests are routed to [`undo`](Self::undo) and
    /// [`redo`](Self::redo).
    pub fn edit_action(&mut self, data: EditActionData) -> CanvasResult<()> {
        match data.payload {
            EditPayload::Undo { .. } => self.undo().map(|_| ()),
            EditPayload::Redo { .. } => self.redo().map(|_| ()),
            _ => self.execute_edit(data),
        }
    }

    pub(crate) fn execute_edit(&mut self, data: EditActionData) -> CanvasResult<()> {
        let requested = data.edit_type();
        self.log_api("execute_edit", &data);

        if requested.is_undoable() && !self.config.editing_allowed() {
            return Err(CanvasError::EditingDisabled);
        }
        if self.stack.phase() == CommandPhase::Committing {
            return Err(CanvasError::CommandInProgress);
        }

        let outer = self.stack.enter(CommandPhase::Recording);
        let approved = self.with_handlers(|h, canvas| h.before_edit_action(canvas, data));
        let Some(data) = approved else {
            self.stack.enter(outer);
            warn!("Edit '{}' vetoed by handler", requested);
            return Err(CanvasError::EditVetoed {
                edit_type: requested.to_string(),
            });
        };

        let edit_type = data.edit_type();
        if edit_type.is_undoable() && !self.config.editing_allowed() {
            self.stack.enter(outer);
            return Err(CanvasError::EditingDisabled);
        }

        let snapshot = self.info.pipelines.clone();
        let styles_before = self.styles.clone();
        let selection_before = self.selection.clone();

        self.stack.enter(CommandPhase::Committing);
        let result = self.apply_edit(&data);
        self.stack.enter(outer);

        if let Err(e) = result {
            self.info.pipelines = snapshot;
            self.styles = styles_before;
            self.selection = selection_before;
            self.drop_orphaned_external_flows();
            debug!("Edit '{}' failed: {}", edit_type, e);
            return Err(e);
        }

        if edit_type.is_undoable() {
            let deltas = diff_pipelines(&snapshot, &self.info.pipelines);
            let style_deltas = self.styles.permanent_changes(&styles_before);
            let default_label = edit_type.default_label().to_string();
            let label = self.with_handlers(|h, _| h.action_label(&data, default_label));
            debug!("Recorded '{}' touching {} pipeline(s)", label, deltas.len());
            self.stack.push(Command {
                data: data.clone(),
                label,
                deltas,
                style_deltas,
                selection_before,
                selection_after: self.selection.clone(),
            });
        }

        self.with_handlers(|h, canvas| h.edit_action(canvas, &data));
        Ok(())
    }

    fn apply_edit(&mut self, data: &EditActionData) -> CanvasResult<()> {
        let pipeline_id = data.pipeline_id.as_str();

        match &data.payload {
            EditPayload::CreateNode { node } => self.add_node_inner(node.clone(), pipeline_id),
            EditPayload::CreateComment { comment } => {
                self.add_comment_inner(comment.clone(), pipeline_id)
            }
            EditPayload::MoveObjects { object_ids, dx, dy } => {
                self.move_objects_inner(pipeline_id, object_ids, *dx, *dy)
            }
            EditPayload::ResizeObjects { sizes } => self.resize_objects(pipeline_id, sizes),
            EditPayload::LinkNodes { links } | EditPayload::LinkComment { links } => {
                self.add_links_inner(pipeline_id, links.clone())
            }
            EditPayload::EditComment { comment_id, content } => {
                self.update_comment(pipeline_id, comment_id, |c| c.content = content.clone())
            }
            EditPayload::DeleteSelectedObjects { object_ids } => {
                self.delete_objects_inner(pipeline_id, object_ids)?;
                self.update_selection(SelectionSet::default());
                Ok(())
            }
            EditPayload::CreateSuperNode {
                object_ids,
                supernode_id,
                subflow_pipeline_id,
            } => self.create_supernode_inner(
                pipeline_id,
                object_ids,
                supernode_id,
                subflow_pipeline_id,
            ),
            EditPayload::ExpandSuperNodeInPlace { supernode_id } => {
                self.set_expanded_in_place(pipeline_id, supernode_id, true)
            }
            EditPayload::CollapseSuperNodeInPlace { supernode_id } => {
                self.set_expanded_in_place(pipeline_id, supernode_id, false)
            }
            EditPayload::ArrangeLayout { positions, .. } => {
                let ids: Vec<String> = positions.keys().cloned().collect();
                self.require_objects(pipeline_id, &ids, &[ObjectKind::Node])?;
                let pipeline = self.pipeline_mut_or_err(pipeline_id)?;
                for node in &mut pipeline.nodes {
                    if let Some(position) = positions.get(&node.id) {
                        node.position = *position;
                    }
                }
                Ok(())
            }
            EditPayload::DisplaySubPipeline {
                target_pipeline_id,
                supernode_id,
            } => self.navigate_to(target_pipeline_id, supernode_id.as_deref()),
            EditPayload::DisplayPreviousPipeline => {
                self.navigate_back();
                Ok(())
            }
            EditPayload::Undo { .. } | EditPayload::Redo { .. } => Err(CanvasError::invalid(
                "apply edit",
                "undo and redo are not edits of the model",
            )),
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Commands
    // ─────────────────────────────────────────────────────────────────────────

    /// Add a node as an undoable edit. The selection is left unchanged.
    pub fn create_node_command(&mut self, node: CanvasNode, pipeline_id: &str) -> CanvasResult<()> {
        self.execute_edit(EditActionData::new(pipeline_id, EditPayload::CreateNode { node }))
    }

    pub fn create_comment_command(
        &mut self,
        comment: CanvasComment,
        pipeline_id: &str,
    ) -> CanvasResult<()> {
        self.execute_edit(EditActionData::new(
            pipeline_id,
            EditPayload::CreateComment { comment },
        ))
    }

    pub fn edit_comment_command(
        &mut self,
        pipeline_id: &str,
        comment_id: &str,
        content: impl Into<String>,
    ) -> CanvasResult<()> {
        self.execute_edit(EditActionData::new(
            pipeline_id,
            EditPayload::EditComment {
                comment_id: comment_id.to_string(),
                content: content.into(),
            },
        ))
    }

    pub fn link_nodes_command(
        &mut self,
        pipeline_id: &str,
        links: Vec<CanvasLink>,
    ) -> CanvasResult<()> {
        if let Some(link) = links.iter().find(|l| l.kind == LinkKind::CommentLink) {
            return Err(CanvasError::invalid(
                "link nodes",
                format!("'{}' is a comment link", link.id),
            ));
        }
        self.execute_edit(EditActionData::new(pipeline_id, EditPayload::LinkNodes { links }))
    }

    pub fn link_comment_command(
        &mut self,
        pipeline_id: &str,
        links: Vec<CanvasLink>,
    ) -> CanvasResult<()> {
        if let Some(link) = links.iter().find(|l| l.kind != LinkKind::CommentLink) {
            return Err(CanvasError::invalid(
                "link comment",
                format!("'{}' is not a comment link", link.id),
            ));
        }
        self.execute_edit(EditActionData::new(pipeline_id, EditPayload::LinkComment { links }))
    }

    pub fn move_objects_command(
        &mut self,
        pipeline_id: &str,
        object_ids: Vec<String>,
        dx: f64,
        dy: f64,
    ) -> CanvasResult<()> {
        self.execute_edit(EditActionData::new(
            pipeline_id,
            EditPayload::MoveObjects { object_ids, dx, dy },
        ))
    }

    pub fn resize_objects_command(
        &mut self,
        pipeline_id: &str,
        sizes: HashMap<String, Size>,
    ) -> CanvasResult<()> {
        self.execute_edit(EditActionData::new(pipeline_id, EditPayload::ResizeObjects { sizes }))
    }

    pub fn expand_supernode_in_place_command(
        &mut self,
        pipeline_id: &str,
        supernode_id: &str,
    ) -> CanvasResult<()> {
        self.execute_edit(EditActionData::new(
            pipeline_id,
            EditPayload::ExpandSuperNodeInPlace {
                supernode_id: supernode_id.to_string(),
            },
        ))
    }

    pub fn collapse_supernode_in_place_command(
        &mut self,
        pipeline_id: &str,
        supernode_id: &str,
    ) -> CanvasResult<()> {
        self.execute_edit(EditActionData::new(
            pipeline_id,
            EditPayload::CollapseSuperNodeInPlace {
                supernode_id: supernode_id.to_string(),
            },
        ))
    }

    /// Move the given nodes and comments into a new pipeline held by a new
    /// supernode. Links crossing the boundary are rerouted through binding
    /// nodes. Returns the supernode id.
    pub fn create_supernode_command(
        &mut self,
        pipeline_id: &str,
        object_ids: Vec<String>,
    ) -> CanvasResult<String> {
        self.check_supernode_candidates(pipeline_id, &object_ids)?;

        let supernode_id = self.generate_id();
        let subflow_pipeline_id = self.generate_id();
        self.execute_edit(EditActionData::new(
            pipeline_id,
            EditPayload::CreateSuperNode {
                object_ids,
                supernode_id: supernode_id.clone(),
                subflow_pipeline_id,
            },
        ))?;
        Ok(supernode_id)
    }

    /// Ask the layout handler for new positions and apply them as one
    /// undoable edit. Returns false when the handler offers no layout.
    pub fn auto_layout(
        &mut self,
        pipeline_id: &str,
        direction: Option<LinkDirection>,
    ) -> CanvasResult<bool> {
        let direction = direction.unwrap_or(self.config.link_direction);
        let pipeline = self.pipeline_or_err(pipeline_id)?.clone();

        let Some(positions) = self.with_handlers(|h, _| h.layout(&pipeline, direction)) else {
            debug!("Layout handler returned no positions for '{}'", pipeline_id);
            return Ok(false);
        };
        self.execute_edit(EditActionData::new(
            pipeline_id,
            EditPayload::ArrangeLayout { direction, positions },
        ))?;
        Ok(true)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Undo / redo
    // ─────────────────────────────────────────────────────────────────────────

    /// Revert the latest command. Returns false when there is none.
    pub fn undo(&mut self) -> CanvasResult<bool> {
        self.step_history(false)
    }

    /// Reapply the latest undone command. Returns false when there is none.
    pub fn redo(&mut self) -> CanvasResult<bool> {
        self.step_history(true)
    }

    pub fn can_undo(&self) -> bool {
        self.config.editing_allowed() && self.stack.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.config.editing_allowed() && self.stack.can_redo()
    }

    pub fn get_undo_label(&self) -> Option<String> {
        self.stack.undo_label().map(str::to_string)
    }

    pub fn get_redo_label(&self) -> Option<String> {
        self.stack.redo_label().map(str::to_string)
    }

    fn step_history(&mut self, forward: bool) -> CanvasResult<bool> {
        self.log_api(if forward { "redo" } else { "undo" }, ());

        if !self.config.editing_allowed() {
            return Err(CanvasError::EditingDisabled);
        }
        if self.stack.phase() == CommandPhase::Committing {
            return Err(CanvasError::CommandInProgress);
        }

        let label = if forward {
            self.stack.redo_label()
        } else {
            self.stack.undo_label()
        };
        let Some(label) = label.map(str::to_string) else {
            return Ok(false);
        };
        let payload = if forward {
            EditPayload::Redo { label: Some(label) }
        } else {
            EditPayload::Undo { label: Some(label) }
        };
        let data = EditActionData::new(self.get_current_pipeline_id(), payload);
        let requested = data.edit_type();

        let outer = self.stack.enter(CommandPhase::Recording);
        let approved = self.with_handlers(|h, canvas| h.before_edit_action(canvas, data));
        let Some(data) = approved else {
            self.stack.enter(outer);
            warn!("'{}' vetoed by handler", requested);
            return Err(CanvasError::EditVetoed {
                edit_type: requested.to_string(),
            });
        };

        self.stack.enter(CommandPhase::Committing);
        let popped = if forward {
            self.stack.pop_redo()
        } else {
            self.stack.pop_undo()
        };
        let restored = popped.map(|command| {
            let selection = if forward {
                command.replay(&mut self.info, &mut self.styles);
                command.selection_after.clone()
            } else {
                command.revert(&mut self.info, &mut self.styles);
                command.selection_before.clone()
            };
            info!("{} '{}'", if forward { "Redid" } else { "Undid" }, command.label);
            if forward {
                self.stack.push_undo(command);
            } else {
                self.stack.push_redo(command);
            }
            selection
        });
        self.stack.enter(outer);

        let Some(selection) = restored else {
            return Ok(false);
        };
        self.update_selection(selection);
        self.prune_stale_state();

        self.with_handlers(|h, canvas| h.edit_action(canvas, &data));
        Ok(true)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Edit bodies
    // ─────────────────────────────────────────────────────────────────────────

    fn resize_objects(
        &mut self,
        pipeline_id: &str,
        sizes: &HashMap<String, Size>,
    ) -> CanvasResult<()> {
        let ids: Vec<String> = sizes.keys().cloned().collect();
        self.require_objects(pipeline_id, &ids, &[ObjectKind::Node, ObjectKind::Comment])?;

        let pipeline = self.pipeline_mut_or_err(pipeline_id)?;
        for node in &mut pipeline.nodes {
            if let Some(size) = sizes.get(&node.id) {
                node.size = Some(*size);
            }
        }
        for comment in &mut pipeline.comments {
            if let Some(size) = sizes.get(&comment.id) {
                comment.width = size.width;
                comment.height = size.height;
            }
        }
        Ok(())
    }

    fn set_expanded_in_place(
        &mut self,
        pipeline_id: &str,
        supernode_id: &str,
        expanded: bool,
    ) -> CanvasResult<()> {
        let is_supernode = self
            .get_node(pipeline_id, supernode_id)
            .map(|n| n.is_supernode());
        match is_supernode {
            None => Err(CanvasError::not_found(ObjectKind::Node, supernode_id, pipeline_id)),
            Some(false) => Err(CanvasError::invalid(
                "expand supernode",
                format!("'{}' is not a supernode", supernode_id),
            )),
            Some(true) => self.update_node(pipeline_id, supernode_id, |n| {
                n.expanded_in_place = expanded
            }),
        }
    }

    fn check_supernode_candidates(
        &self,
        pipeline_id: &str,
        object_ids: &[String],
    ) -> CanvasResult<()> {
        self.require_objects(pipeline_id, object_ids, &[ObjectKind::Node, ObjectKind::Comment])?;
        let pipeline = self.pipeline_or_err(pipeline_id)?;

        let node_ids: Vec<String> = object_ids
            .iter()
            .filter(|id| pipeline.node(id).is_some())
            .cloned()
            .collect();
        if node_ids.is_empty() {
            return Err(CanvasError::invalid("create supernode", "no nodes given"));
        }
        if !self.config.create_supernode_non_contiguous
            && !PipelineIndex::build(pipeline).is_contiguous(&node_ids)
        {
            return Err(CanvasError::invalid(
                "create supernode",
                "the nodes are not connected to each other",
            ));
        }
        Ok(())
    }

    fn create_supernode_inner(
        &mut self,
        pipeline_id: &str,
        object_ids: &[String],
        supernode_id: &str,
        subflow_id: &str,
    ) -> CanvasResult<()> {
        self.check_supernode_candidates(pipeline_id, object_ids)?;
        if self.info.contains_pipeline(subflow_id) {
            return Err(CanvasError::DuplicateId {
                kind: ObjectKind::Pipeline,
                id: subflow_id.to_string(),
                pipeline_id: pipeline_id.to_string(),
            });
        }

        let parent = self.pipeline_or_err(pipeline_id)?;
        if parent.contains_object(supernode_id) {
            return Err(CanvasError::DuplicateId {
                kind: ObjectKind::Node,
                id: supernode_id.to_string(),
                pipeline_id: pipeline_id.to_string(),
            });
        }

        let inside: HashSet<&str> = object_ids.iter().map(String::as_str).collect();
        let is_inside = |end: &LinkEnd| end.object_id().map_or(false, |id| inside.contains(id));

        let mut sub = CanvasPipeline::new(subflow_id);
        sub.runtime_ref = parent.runtime_ref.clone();
        sub.nodes = parent
            .nodes
            .iter()
            .filter(|n| inside.contains(n.id.as_str()))
            .cloned()
            .collect();
        sub.comments = parent
            .comments
            .iter()
            .filter(|c| inside.contains(c.id.as_str()))
            .cloned()
            .collect();

        let mut incoming: Vec<(LinkEnd, Vec<CanvasLink>)> = Vec::new();
        let mut outgoing: Vec<(LinkEnd, Vec<CanvasLink>)> = Vec::new();
        let mut dropped = Vec::new();
        let mut rerouted: HashSet<String> = HashSet::new();

        for link in &parent.links {
            let src_in = is_inside(&link.src);
            let trg_in = is_inside(&link.trg);
            let detached = link.src.is_detached() || link.trg.is_detached();

            match (src_in, trg_in) {
                (false, false) => continue,
                (true, true) => sub.links.push(link.clone()),
                _ if detached => sub.links.push(link.clone()),
                (false, true) if link.is_attached_node_link() => {
                    group_by_end(&mut incoming, &link.trg, link.clone());
                    rerouted.insert(link.id.clone());
                }
                (true, false) if link.is_attached_node_link() => {
                    group_by_end(&mut outgoing, &link.src, link.clone());
                    rerouted.insert(link.id.clone());
                }
                _ => dropped.push(link.id.clone()),
            }
        }

        let mut supernode = CanvasNode::supernode(supernode_id, "Supernode", subflow_id);
        supernode.position = Position::new(
            sub.nodes.iter().map(|n| n.position.x).fold(f64::INFINITY, f64::min),
            sub.nodes.iter().map(|n| n.position.y).fold(f64::INFINITY, f64::min),
        );

        let moved_links: Vec<String> = sub.links.iter().map(|l| l.id.clone()).collect();
        let moved_objects: Vec<String> = object_ids.to_vec();

        // Binding nodes and their links need fresh ids
        let mut parent_links = Vec::new();
        for (inner_end, links) in incoming {
            let port_id = self.generate_id();
            let inner_link_id = self.generate_id();
            let (label, position, port) = binding_details(&sub, &inner_end, true);

            let mut entry = CanvasNode::new(&port_id, NodeKind::BindingEntry, &label);
            entry.position = position.offset(-BINDING_OFFSET, 0.0);
            entry.outputs.push(Port::new("outPort"));
            sub.nodes.push(entry);
            sub.links.push(CanvasLink::new(
                inner_link_id,
                LinkKind::NodeLink,
                LinkEnd::port(&port_id, "outPort"),
                inner_end,
            ));

            supernode.inputs.push(Port {
                id: port_id.clone(),
                label: Some(label),
                ..port
            });
            for mut link in links {
                link.trg = LinkEnd::port(supernode_id, &port_id);
                parent_links.push(link);
            }
        }
        for (inner_end, links) in outgoing {
            let port_id = self.generate_id();
            let inner_link_id = self.generate_id();
            let (label, position, port) = binding_details(&sub, &inner_end, false);

            let mut exit = CanvasNode::new(&port_id, NodeKind::BindingExit, &label);
            exit.position = position.offset(BINDING_OFFSET, 0.0);
            exit.inputs.push(Port::new("inPort"));
            sub.nodes.push(exit);
            sub.links.push(CanvasLink::new(
                inner_link_id,
                LinkKind::NodeLink,
                inner_end,
                LinkEnd::port(&port_id, "inPort"),
            ));

            supernode.outputs.push(Port {
                id: port_id.clone(),
                label: Some(label),
                ..port
            });
            for mut link in links {
                link.src = LinkEnd::port(supernode_id, &port_id);
                parent_links.push(link);
            }
        }

        let parent = self.pipeline_mut_or_err(pipeline_id)?;
        parent.nodes.retain(|n| !inside.contains(n.id.as_str()));
        parent.comments.retain(|c| !inside.contains(c.id.as_str()));
        parent.links.retain(|l| {
            !moved_links.contains(&l.id) && !rerouted.contains(&l.id) && !dropped.contains(&l.id)
        });
        parent.links.extend(parent_links);
        parent.nodes.push(supernode);
        self.info.pipelines.push(sub);

        let mut moved = moved_objects;
        moved.extend(moved_links);
        self.styles.move_objects(pipeline_id, subflow_id, &moved);
        self.styles.remove_objects(pipeline_id, &dropped);

        let mut selection = SelectionSet::default();
        selection.replace(pipeline_id, vec![supernode_id.to_string()]);
        self.update_selection(selection);

        info!(
            "Created supernode '{}' holding pipeline '{}'",
            supernode_id, subflow_id
        );
        Ok(())
    }
}

fn group_by_end(groups: &mut Vec<(LinkEnd, Vec<CanvasLink>)>, end: &LinkEnd, link: CanvasLink) {
    match groups.iter_mut().find(|(e, _)| e == end) {
        Some((_, links)) => links.push(link),
        None => groups.push((end.clone(), vec![link])),
    }
}

/// Label, anchor position and port template for the binding node that
/// stands in for `end` inside a new subflow
fn binding_details(sub: &CanvasPipeline, end: &LinkEnd, input: bool) -> (String, Position, Port) {
    let node = end.object_id().and_then(|id| sub.node(id));
    let port = node.and_then(|n| {
        let port_id = end.port_id()?;
        if input {
            n.input_port(port_id)
        } else {
            n.output_port(port_id)
        }
    });

    let label = match (node, port.and_then(|p| p.label.as_deref())) {
        (Some(n), Some(port_label)) => format!("{} {}", n.label, port_label),
        (Some(n), None) => n.label.clone(),
        (None, _) => String::new(),
    };
    let position = node.map(|n| n.position).unwrap_or_default();
    let template = port
        .cloned()
        .unwrap_or_else(|| Port::new(end.port_id().unwrap_or_default()));
    (label, position, template)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StateTag;
    use crate::controller::tests::chain_flow;
    use crate::handlers::CanvasHandlers;

    fn loaded() -> CanvasController {
        let mut canvas = CanvasController::new();
        canvas.set_pipeline_flow(chain_flow()).unwrap();
        canvas
    }

    fn ids(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_undo_create_node_restores_selection() {
        let mut canvas = loaded();
        canvas.set_selections(ids(&["a"]), None).unwrap();

        canvas
            .create_node_command(CanvasNode::execution("x", "X").at(10.0, 10.0), "main")
            .unwrap();
        canvas.set_selections(ids(&["x"]), None).unwrap();
        assert_eq!(canvas.get_undo_label().as_deref(), Some("Create node"));

        assert!(canvas.undo().unwrap());
        assert!(canvas.get_node("main", "x").is_none());
        assert_eq!(canvas.get_nodes("main").len(), 3);
        assert_eq!(canvas.get_selected_object_ids(), ids(&["a"]));

        assert!(canvas.redo().unwrap());
        assert!(canvas.get_node("main", "x").is_some());
        assert!(!canvas.redo().unwrap());
    }

    #[test]
    fn test_failed_edit_changes_nothing() {
        let mut canvas = loaded();
        let err = canvas
            .create_node_command(CanvasNode::execution("a", "dup"), "main")
            .unwrap_err();

        assert!(matches!(err, CanvasError::DuplicateId { .. }));
        assert!(!canvas.can_undo());
        assert_eq!(canvas.get_node("main", "a").unwrap().label, "A");
    }

    #[test]
    fn test_editing_disabled() {
        let mut canvas = loaded();
        canvas.config.state_tag = StateTag::Locked;

        let err = canvas
            .move_objects_command("main", ids(&["a"]), 5.0, 5.0)
            .unwrap_err();
        assert!(matches!(err, CanvasError::EditingDisabled));
        assert!(matches!(canvas.undo().unwrap_err(), CanvasError::EditingDisabled));
    }

    #[test]
    fn test_command_during_commit_is_rejected() {
        let mut canvas = loaded();
        canvas.stack.enter(CommandPhase::Committing);

        let err = canvas
            .move_objects_command("main", ids(&["a"]), 5.0, 5.0)
            .unwrap_err();
        assert!(matches!(err, CanvasError::CommandInProgress));
    }

    struct Veto;

    impl CanvasHandlers for Veto {
        fn before_edit_action(
            &mut self,
            _canvas: &mut CanvasController,
            data: EditActionData,
        ) -> Option<EditActionData> {
            match data.payload {
                EditPayload::MoveObjects { .. } => None,
                _ => Some(data),
            }
        }
    }

    #[test]
    fn test_veto_leaves_model_untouched() {
        let mut canvas = loaded();
        canvas.set_handlers(Veto);

        let err = canvas
            .move_objects_command("main", ids(&["a"]), 5.0, 5.0)
            .unwrap_err();
        assert!(matches!(err, CanvasError::EditVetoed { .. }));
        assert_eq!(canvas.get_node("main", "a").unwrap().position, Position::new(0.0, 0.0));
        assert!(!canvas.can_undo());
    }

    /// Records a comment before every node creation
    struct Nested;

    impl CanvasHandlers for Nested {
        fn before_edit_action(
            &mut self,
            canvas: &mut CanvasController,
            data: EditActionData,
        ) -> Option<EditActionData> {
            if let EditPayload::CreateNode { node } = &data.payload {
                let comment = CanvasComment::new(format!("note-{}", node.id), "auto");
                canvas.create_comment_command(comment, &data.pipeline_id).ok()?;
            }
            Some(data)
        }
    }

    #[test]
    fn test_nested_command_is_recorded_first() {
        let mut canvas = loaded();
        canvas.set_handlers(Nested);

        canvas
            .create_node_command(CanvasNode::execution("x", "X"), "main")
            .unwrap();
        assert_eq!(canvas.stack.undo_len(), 2);
        assert_eq!(canvas.get_undo_label().as_deref(), Some("Create node"));

        canvas.undo().unwrap();
        assert!(canvas.get_comment("main", "note-x").is_some());
        canvas.undo().unwrap();
        assert!(canvas.get_comment("main", "note-x").is_none());
    }

    #[test]
    fn test_create_supernode_reroutes_links() {
        let mut canvas = loaded();
        let supernode_id = canvas.create_supernode_command("main", ids(&["b"])).unwrap();

        let main = canvas.get_pipeline("main").unwrap();
        let supernode = main.node(&supernode_id).unwrap();
        assert!(supernode.is_supernode());
        assert_eq!(supernode.inputs.len(), 1);
        assert_eq!(supernode.outputs.len(), 1);
        assert!(main.node("b").is_none());

        let ab = main.link("ab").unwrap();
        assert_eq!(ab.trg.object_id(), Some(supernode_id.as_str()));
        assert_eq!(canvas.get_upstream_nodes("main", &ids(&["c"])).len(), 3);

        let sub_id = supernode.subflow_pipeline_id().unwrap().to_string();
        let sub = canvas.get_pipeline(&sub_id).unwrap();
        assert_eq!(sub.nodes.len(), 3);
        assert_eq!(sub.links.len(), 2);
        assert_eq!(
            canvas.get_ancestor_pipeline_ids(&sub_id),
            vec!["main".to_string(), sub_id.clone()]
        );
        assert_eq!(canvas.get_selected_object_ids(), vec![supernode_id.clone()]);

        canvas.undo().unwrap();
        assert!(canvas.get_pipeline(&sub_id).is_none());
        assert!(canvas.get_node("main", "b").is_some());
    }

    #[test]
    fn test_non_contiguous_supernode_rejected() {
        let mut canvas = loaded();
        let err = canvas.create_supernode_command("main", ids(&["a", "c"])).unwrap_err();
        assert!(matches!(err, CanvasError::InvalidOperation { .. }));

        canvas.config.create_supernode_non_contiguous = true;
        assert!(canvas.create_supernode_command("main", ids(&["a", "c"])).is_ok());
    }

    struct Grid;

    impl CanvasHandlers for Grid {
        fn layout(
            &mut self,
            pipeline: &CanvasPipeline,
            _direction: LinkDirection,
        ) -> Option<HashMap<String, Position>> {
            Some(
                pipeline
                    .nodes
                    .iter()
                    .enumerate()
                    .map(|(i, n)| (n.id.clone(), Position::new(0.0, i as f64 * 100.0)))
                    .collect(),
            )
        }
    }

    #[test]
    fn test_auto_layout_uses_handler() {
        let mut canvas = loaded();
        assert!(!canvas.auto_layout("main", None).unwrap());

        canvas.set_handlers(Grid);
        assert!(canvas.auto_layout("main", Some(LinkDirection::TopBottom)).unwrap());
        assert_eq!(canvas.get_node("main", "c").unwrap().position, Position::new(0.0, 200.0));
        assert_eq!(canvas.get_undo_label().as_deref(), Some("Arrange layout"));
    }

    #[test]
    fn test_expand_in_place() {
        let mut canvas = loaded();
        let supernode_id = canvas.create_supernode_command("main", ids(&["b"])).unwrap();

        canvas.expand_supernode_in_place_command("main", &supernode_id).unwrap();
        assert!(canvas.is_supernode_expanded_in_place("main", &supernode_id));
        canvas.collapse_supernode_in_place_command("main", &supernode_id).unwrap();
        assert!(!canvas.is_supernode_expanded_in_place("main", &supernode_id));

        assert!(canvas.expand_supernode_in_place_command("main", "a").is_err());
    }
}
