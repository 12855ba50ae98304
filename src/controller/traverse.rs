// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 canvasflow contributors

//! Branch queries and highlighting

use std::collections::HashSet;

use super::CanvasController;
use crate::errors::CanvasResult;
use crate::graph::{in_pipeline_order, PipelineIndex, TraversalDirection};
use crate::styles::StyleKey;

/// Objects styled by a highlight call
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Highlight {
    /// Highlighted nodes in pipeline order
    pub nodes: Vec<String>,
    /// Data links running between highlighted nodes
    pub links: Vec<String>,
}

impl CanvasController {
    fn traverse(
        &self,
        pipeline_id: &str,
        node_ids: &[String],
        direction: TraversalDirection,
    ) -> Vec<String> {
        let Some(pipeline) = self.info.pipeline(pipeline_id) else {
            return Vec::new();
        };
        let found = PipelineIndex::build(pipeline).traverse(node_ids, direction);
        in_pipeline_order(pipeline, &found)
    }

    /// Seeds plus every node upstream or downstream of them
    pub fn get_branch_nodes(&self, pipeline_id: &str, node_ids: &[String]) -> Vec<String> {
        self.traverse(pipeline_id, node_ids, TraversalDirection::Both)
    }

    /// Seeds plus every node feeding into them
    pub fn get_upstream_nodes(&self, pipeline_id: &str, node_ids: &[String]) -> Vec<String> {
        self.traverse(pipeline_id, node_ids, TraversalDirection::Upstream)
    }

    /// Seeds plus every node they feed
    pub fn get_downstream_nodes(&self, pipeline_id: &str, node_ids: &[String]) -> Vec<String> {
        self.traverse(pipeline_id, node_ids, TraversalDirection::Downstream)
    }

    pub fn highlight_branch(
        &mut self,
        pipeline_id: &str,
        node_ids: &[String],
    ) -> CanvasResult<Highlight> {
        self.highlight(pipeline_id, node_ids, TraversalDirection::Both)
    }

    pub fn highlight_upstream(
        &mut self,
        pipeline_id: &str,
        node_ids: &[String],
    ) -> CanvasResult<Highlight> {
        self.highlight(pipeline_id, node_ids, TraversalDirection::Upstream)
    }

    pub fn highlight_downstream(
        &mut self,
        pipeline_id: &str,
        node_ids: &[String],
    ) -> CanvasResult<Highlight> {
        self.highlight(pipeline_id, node_ids, TraversalDirection::Downstream)
    }

    /// Replace the pipeline's temporary styles: the traversed nodes and the
    /// links between them get the highlight style, everything else is
    /// subdued
    fn highlight(
        &mut self,
        pipeline_id: &str,
        node_ids: &[String],
        direction: TraversalDirection,
    ) -> CanvasResult<Highlight> {
        self.log_api("highlight", (pipeline_id, node_ids, direction));
        let pipeline = self.pipeline_or_err(pipeline_id)?;

        let index = PipelineIndex::build(pipeline);
        let found = index.traverse(node_ids, direction);
        let links: HashSet<String> = index.links_between(&found).into_iter().collect();
        let result = Highlight {
            nodes: in_pipeline_order(pipeline, &found),
            links: pipeline
                .links
                .iter()
                .filter(|l| links.contains(&l.id))
                .map(|l| l.id.clone())
                .collect(),
        };

        let node_ids: Vec<String> = pipeline.nodes.iter().map(|n| n.id.clone()).collect();
        let comment_ids: Vec<String> = pipeline.comments.iter().map(|c| c.id.clone()).collect();
        let link_ids: Vec<String> = pipeline.links.iter().map(|l| l.id.clone()).collect();

        self.styles.remove_all_in_pipeline(pipeline_id, true);
        let styles = self.highlight.clone();
        for id in node_ids.iter().chain(&comment_ids) {
            let spec = if found.contains(id) { &styles.node } else { &styles.subdued_node };
            self.styles.set(StyleKey::new(pipeline_id, id), spec.clone(), true);
        }
        for id in &link_ids {
            let spec = if links.contains(id) { &styles.link } else { &styles.subdued_link };
            self.styles.set(StyleKey::new(pipeline_id, id), spec.clone(), true);
        }

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::tests::chain_flow;

    fn loaded() -> CanvasController {
        let mut canvas = CanvasController::new();
        canvas.set_pipeline_flow(chain_flow()).unwrap();
        canvas
    }

    fn ids(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_branch_is_union_with_seeds() {
        let canvas = loaded();
        let seeds = ids(&["b"]);
        let branch: HashSet<String> = canvas.get_branch_nodes("main", &seeds).into_iter().collect();
        let mut union: HashSet<String> =
            canvas.get_upstream_nodes("main", &seeds).into_iter().collect();
        union.extend(canvas.get_downstream_nodes("main", &seeds));
        union.extend(seeds);

        assert_eq!(branch, union);
        assert_eq!(canvas.get_branch_nodes("main", &ids(&["c", "a"])), ids(&["a", "b", "c"]));
    }

    #[test]
    fn test_highlight_styles_result_and_subdues_rest() {
        let mut canvas = loaded();
        let result = canvas.highlight_upstream("main", &ids(&["b"])).unwrap();

        assert_eq!(result.nodes, ids(&["a", "b"]));
        assert_eq!(result.links, ids(&["ab"]));
        let highlight = canvas.highlight.clone();
        assert_eq!(canvas.get_node_style("main", "a", true), highlight.node);
        assert_eq!(canvas.get_node_style("main", "c", true), highlight.subdued_node);
        assert_eq!(canvas.get_link_style("main", "bc", true), highlight.subdued_link);
        assert!(canvas.get_node_style("main", "a", false).is_empty());
    }

    #[test]
    fn test_highlight_unknown_pipeline() {
        let mut canvas = loaded();
        assert!(canvas.highlight_branch("nowhere", &ids(&["a"])).is_err());
        assert!(canvas.get_branch_nodes("nowhere", &ids(&["a"])).is_empty());
    }
}
