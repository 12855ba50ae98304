// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 canvasflow contributors

//! Selection operations

use tracing::debug;

use super::CanvasController;
use crate::commands::{EditActionData, EditPayload};
use crate::errors::{CanvasError, CanvasResult};
use crate::graph::PipelineIndex;
use crate::handlers::SelectionChange;
use crate::model::{CanvasComment, CanvasLink, CanvasNode, ObjectKind};
use crate::selection::SelectionSet;

impl CanvasController {
    /// Replace the selection. `pipeline_id` defaults to the displayed
    /// pipeline; selecting in one pipeline clears any other.
    pub fn set_selections(
        &mut self,
        ids: Vec<String>,
        pipeline_id: Option<&str>,
    ) -> CanvasResult<()> {
        let pipeline_id = pipeline_id
            .map(str::to_string)
            .unwrap_or_else(|| self.get_current_pipeline_id());
        self.log_api("set_selections", (&ids, &pipeline_id));

        let pipeline = self.pipeline_or_err(&pipeline_id)?;
        if let Some(missing) = ids.iter().find(|id| !pipeline.contains_object(id)) {
            return Err(CanvasError::not_found(ObjectKind::Node, missing, &pipeline_id));
        }

        let mut selection = SelectionSet::default();
        selection.replace(&pipeline_id, ids);
        self.update_selection(selection);
        Ok(())
    }

    pub fn clear_selections(&mut self) {
        self.update_selection(SelectionSet::default());
    }

    /// Select every node and comment of the displayed pipeline
    pub fn select_all(&mut self) {
        let pipeline_id = self.get_current_pipeline_id();
        let ids: Vec<String> = match self.info.pipeline(&pipeline_id) {
            Some(p) => p
                .nodes
                .iter()
                .map(|n| n.id.clone())
                .chain(p.comments.iter().map(|c| c.id.clone()))
                .collect(),
            None => Vec::new(),
        };

        let mut selection = SelectionSet::default();
        selection.replace(&pipeline_id, ids);
        self.update_selection(selection);
    }

    /// Install a new selection and tell the host when it differs
    pub(crate) fn update_selection(&mut self, selection: SelectionSet) {
        if selection == self.selection {
            return;
        }
        let previous = std::mem::replace(&mut self.selection, selection);
        debug!("Selection now {} object(s)", self.selection.ids().len());

        let change = SelectionChange {
            previous,
            current: self.selection.clone(),
        };
        self.with_handlers(|h, _| h.selection_changed(&change));
    }

    pub fn get_selected_object_ids(&self) -> Vec<String> {
        self.selection.ids().to_vec()
    }

    pub fn get_selected_pipeline_id(&self) -> Option<&str> {
        self.selection.pipeline_id()
    }

    pub fn get_selected_nodes(&self) -> Vec<&CanvasNode> {
        self.selected_pipeline()
            .map(|p| self.selection.ids().iter().filter_map(|id| p.node(id)).collect())
            .unwrap_or_default()
    }

    pub fn get_selected_comments(&self) -> Vec<&CanvasComment> {
        self.selected_pipeline()
            .map(|p| self.selection.ids().iter().filter_map(|id| p.comment(id)).collect())
            .unwrap_or_default()
    }

    pub fn get_selected_links(&self) -> Vec<&CanvasLink> {
        self.selected_pipeline()
            .map(|p| self.selection.ids().iter().filter_map(|id| p.link(id)).collect())
            .unwrap_or_default()
    }

    fn selected_pipeline(&self) -> Option<&crate::model::CanvasPipeline> {
        self.info.pipeline(self.selection.pipeline_id()?)
    }

    /// Delete the selected objects as one undoable edit, then clear the
    /// selection. Does nothing when the selection is empty.
    pub fn delete_selected_objects(&mut self) -> CanvasResult<()> {
        let Some(pipeline_id) = self.selection.pipeline_id().map(str::to_string) else {
            return Ok(());
        };
        let object_ids = self.get_selected_object_ids();
        self.execute_edit(EditActionData::new(
            pipeline_id,
            EditPayload::DeleteSelectedObjects { object_ids },
        ))
    }

    /// Whether the selected nodes form one connected group
    pub fn are_selected_nodes_contiguous(&self) -> bool {
        let Some(pipeline) = self.selected_pipeline() else {
            return false;
        };
        let nodes: Vec<String> = self.get_selected_nodes().iter().map(|n| n.id.clone()).collect();
        PipelineIndex::build(pipeline).is_contiguous(&nodes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::tests::chain_flow;
    use crate::handlers::CanvasHandlers;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn loaded() -> CanvasController {
        let mut canvas = CanvasController::new();
        canvas.set_pipeline_flow(chain_flow()).unwrap();
        canvas
    }

    fn ids(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_defaults_to_current_pipeline() {
        let mut canvas = loaded();
        canvas.set_selections(ids(&["a", "ab"]), None).unwrap();

        assert_eq!(canvas.get_selected_pipeline_id(), Some("main"));
        assert_eq!(canvas.get_selected_nodes().len(), 1);
        assert_eq!(canvas.get_selected_links().len(), 1);
    }

    #[test]
    fn test_unknown_id_rejected() {
        let mut canvas = loaded();
        canvas.set_selections(ids(&["a"]), None).unwrap();
        assert!(canvas.set_selections(ids(&["ghost"]), None).is_err());
        assert_eq!(canvas.get_selected_object_ids(), ids(&["a"]));
    }

    #[test]
    fn test_contiguity() {
        let mut canvas = loaded();
        canvas.set_selections(ids(&["a", "b"]), None).unwrap();
        assert!(canvas.are_selected_nodes_contiguous());

        canvas.set_selections(ids(&["a", "c"]), None).unwrap();
        assert!(!canvas.are_selected_nodes_contiguous());

        canvas.clear_selections();
        assert!(!canvas.are_selected_nodes_contiguous());
    }

    #[test]
    fn test_select_all_and_delete() {
        let mut canvas = loaded();
        canvas.select_all();
        assert_eq!(canvas.get_selected_object_ids().len(), 3);

        canvas.delete_selected_objects().unwrap();
        assert!(canvas.get_nodes("main").is_empty());
        assert!(canvas.get_selected_object_ids().is_empty());
        assert!(canvas.can_undo());
    }

    struct Recorder(Rc<RefCell<Vec<usize>>>);

    impl CanvasHandlers for Recorder {
        fn selection_changed(&mut self, change: &SelectionChange) {
            self.0.borrow_mut().push(change.current.ids().len());
        }
    }

    #[test]
    fn test_selection_hook_fires_on_change_only() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut canvas = loaded();
        canvas.set_handlers(Recorder(seen.clone()));

        canvas.set_selections(ids(&["a", "b"]), None).unwrap();
        canvas.set_selections(ids(&["a", "b"]), None).unwrap();
        canvas.clear_selections();

        assert_eq!(*seen.borrow(), vec![2, 0]);
    }
}
