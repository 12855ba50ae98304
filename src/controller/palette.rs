// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 canvasflow contributors

//! Palette operations

use serde_json::Value;
use tracing::info;

use super::CanvasController;
use crate::errors::{CanvasError, CanvasResult};
use crate::model::{
    flow_node_to_canvas, upgrade_palette, CanvasNode, FlowNode, PaletteCategory, PaletteData,
};

impl CanvasController {
    /// Replace the palette, upgrading older palette documents first
    pub fn set_pipeline_flow_palette(&mut self, doc: Value) -> CanvasResult<()> {
        self.log_api("set_pipeline_flow_palette", ());
        let palette = upgrade_palette(doc)?;
        info!("Palette loaded with {} categories", palette.categories.len());
        self.palette = palette;
        Ok(())
    }

    pub fn clear_palette_data(&mut self) {
        self.palette = PaletteData::default();
    }

    pub fn get_palette_data(&self) -> &PaletteData {
        &self.palette
    }

    pub fn set_category_loading_text(
        &mut self,
        category_id: &str,
        text: Option<String>,
    ) -> CanvasResult<()> {
        self.category_mut(category_id)?.loading_text = text;
        Ok(())
    }

    pub fn set_category_empty_text(
        &mut self,
        category_id: &str,
        text: Option<String>,
    ) -> CanvasResult<()> {
        self.category_mut(category_id)?.empty_text = text;
        Ok(())
    }

    fn category_mut(&mut self, category_id: &str) -> CanvasResult<&mut PaletteCategory> {
        self.palette
            .category_mut(category_id)
            .ok_or_else(|| {
                CanvasError::invalid("palette", format!("no category '{}'", category_id))
            })
    }

    /// Add a template to a category, creating the category when needed
    pub fn add_node_type_to_palette(
        &mut self,
        template: FlowNode,
        category_id: &str,
        category_label: Option<String>,
    ) {
        self.log_api("add_node_type_to_palette", (&template.id, category_id));
        self.palette.add_node_type(template, category_id, category_label);
    }

    /// Remove templates by id. Returns how many were removed.
    pub fn remove_nodes_from_palette(&mut self, ids: &[String]) -> usize {
        self.palette.remove_node_types(ids)
    }

    pub fn get_palette_node(&self, op: &str) -> Option<&FlowNode> {
        self.palette.node_by_op(op)
    }

    pub fn get_palette_node_by_id(&self, id: &str) -> Option<&FlowNode> {
        self.palette.node_by_id(id)
    }

    pub fn get_category_for_node(&self, op: &str) -> Option<&PaletteCategory> {
        self.palette.category_for_op(op)
    }

    /// The canvas form of a palette template, keeping the template's id
    pub fn convert_node_template(&self, template: &FlowNode) -> CanvasNode {
        flow_node_to_canvas(template.clone())
    }

    pub fn open_palette(&mut self) {
        self.palette_open = true;
    }

    pub fn close_palette(&mut self) {
        self.palette_open = false;
    }

    pub fn is_palette_open(&self) -> bool {
        self.palette_open
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn palette_v1() -> Value {
        json!({
            "categories": [{
                "category": "io",
                "label": "Input/Output",
                "nodetypes": [{"id": "reader", "type": "execution_node", "op": "read_csv",
                               "label": "Read CSV", "outputs": [{"id": "out"}]}]
            }]
        })
    }

    #[test]
    fn test_palette_upgraded_and_queried() {
        let mut canvas = CanvasController::new();
        canvas.set_pipeline_flow_palette(palette_v1()).unwrap();

        assert_eq!(canvas.get_palette_data().version, "3.0");
        assert_eq!(canvas.get_palette_node("read_csv").unwrap().id, "reader");
        assert_eq!(canvas.get_category_for_node("read_csv").unwrap().id, "io");

        let template = canvas.get_palette_node_by_id("reader").unwrap().clone();
        let node = canvas.convert_node_template(&template);
        assert_eq!(node.op.as_deref(), Some("read_csv"));
        assert_eq!(node.outputs.len(), 1);
    }

    #[test]
    fn test_category_texts_and_removal() {
        let mut canvas = CanvasController::new();
        canvas.set_pipeline_flow_palette(palette_v1()).unwrap();

        canvas.set_category_loading_text("io", Some("Loading...".into())).unwrap();
        assert!(canvas.set_category_empty_text("missing", None).is_err());
        assert_eq!(
            canvas.get_palette_data().category("io").unwrap().loading_text.as_deref(),
            Some("Loading...")
        );

        assert_eq!(canvas.remove_nodes_from_palette(&["reader".into()]), 1);
        assert!(canvas.get_palette_node("read_csv").is_none());

        canvas.clear_palette_data();
        assert!(canvas.get_palette_data().is_empty());
    }

    #[test]
    fn test_open_close() {
        let mut canvas = CanvasController::new();
        assert!(!canvas.is_palette_open());
        canvas.open_palette();
        assert!(canvas.is_palette_open());
        canvas.close_palette();
        assert!(!canvas.is_palette_open());
    }
}
