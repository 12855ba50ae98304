// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 canvasflow contributors

//! Palette document: node templates grouped into categories

use serde::{Deserialize, Serialize};

use super::flow::{FlowNode, Opaque};

/// Latest palette schema version
pub const LATEST_PALETTE_VERSION: u32 = 3;

/// A palette of node templates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaletteData {
    pub version: String,

    #[serde(default)]
    pub categories: Vec<PaletteCategory>,

    #[serde(flatten)]
    pub extra: Opaque,
}

impl Default for PaletteData {
    fn default() -> Self {
        Self {
            version: format!("{}.0", LATEST_PALETTE_VERSION),
            categories: Vec::new(),
            extra: Opaque::new(),
        }
    }
}

/// One palette category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaletteCategory {
    pub id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,

    /// Shown while templates for this category are still being fetched
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loading_text: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub empty_text: Option<String>,

    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_open: bool,

    #[serde(default)]
    pub node_types: Vec<FlowNode>,

    #[serde(flatten)]
    pub extra: Opaque,
}

impl PaletteCategory {
    pub fn new(id: impl Into<String>, label: Option<String>) -> Self {
        Self {
            id: id.into(),
            label,
            description: None,
            image: None,
            loading_text: None,
            empty_text: None,
            is_open: false,
            node_types: Vec::new(),
            extra: Opaque::new(),
        }
    }
}

impl PaletteData {
    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    pub fn category(&self, id: &str) -> Option<&PaletteCategory> {
        self.categories.iter().find(|c| c.id == id)
    }

    pub fn category_mut(&mut self, id: &str) -> Option<&mut PaletteCategory> {
        self.categories.iter_mut().find(|c| c.id == id)
    }

    /// First template with the given operation
    pub fn node_by_op(&self, op: &str) -> Option<&FlowNode> {
        self.templates().find(|t| t.op.as_deref() == Some(op))
    }

    pub fn node_by_id(&self, id: &str) -> Option<&FlowNode> {
        self.templates().find(|t| t.id == id)
    }

    /// Category holding the first template with the given operation
    pub fn category_for_op(&self, op: &str) -> Option<&PaletteCategory> {
        self.categories
            .iter()
            .find(|c| c.node_types.iter().any(|t| t.op.as_deref() == Some(op)))
    }

    /// Append a template, creating the category when it does not exist
    pub fn add_node_type(
        &mut self,
        template: FlowNode,
        category_id: &str,
        category_label: Option<String>,
    ) {
        match self.category_mut(category_id) {
            Some(category) => category.node_types.push(template),
            None => {
                let mut category = PaletteCategory::new(category_id, category_label);
                category.node_types.push(template);
                self.categories.push(category);
            }
        }
    }

    /// Remove templates by id from every category. Returns how many went.
    pub fn remove_node_types(&mut self, ids: &[String]) -> usize {
        let mut removed = 0;
        for category in &mut self.categories {
            let before = category.node_types.len();
            category.node_types.retain(|t| !ids.contains(&t.id));
            removed += before - category.node_types.len();
        }
        removed
    }

    fn templates(&self) -> impl Iterator<Item = &FlowNode> {
        self.categories.iter().flat_map(|c| c.node_types.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn template(id: &str, op: &str) -> FlowNode {
        serde_json::from_value(json!({"id": id, "type": "execution_node", "op": op})).unwrap()
    }

    #[test]
    fn test_add_creates_category() {
        let mut palette = PaletteData::default();
        palette.add_node_type(template("t1", "filter"), "transform", Some("Transform".into()));
        palette.add_node_type(template("t2", "sort"), "transform", None);

        assert_eq!(palette.categories.len(), 1);
        assert_eq!(palette.categories[0].node_types.len(), 2);
        assert_eq!(palette.categories[0].label.as_deref(), Some("Transform"));
    }

    #[test]
    fn test_lookup_and_remove() {
        let mut palette = PaletteData::default();
        palette.add_node_type(template("t1", "filter"), "transform", None);
        palette.add_node_type(template("t2", "read"), "io", None);

        assert_eq!(palette.node_by_op("read").unwrap().id, "t2");
        assert_eq!(palette.category_for_op("filter").unwrap().id, "transform");
        assert!(palette.node_by_id("t1").is_some());

        assert_eq!(palette.remove_node_types(&["t1".into()]), 1);
        assert!(palette.node_by_id("t1").is_none());
    }
}
