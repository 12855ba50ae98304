// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 canvasflow contributors

//! Supernode hierarchy
//!
//! Pipelines form a graph through supernode subflow references: an edge runs
//! from the pipeline holding a supernode to the pipeline it contains. A valid
//! document makes this a forest rooted at the primary pipeline, with every
//! pipeline referenced by at most one supernode.

use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::{Bfs, EdgeRef};
use std::collections::{HashMap, HashSet};

use crate::errors::{CanvasError, CanvasResult};
use crate::model::CanvasInfo;

/// Where a pipeline sits in the hierarchy
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubflowParent {
    pub pipeline_id: String,
    pub supernode_id: String,
}

/// Graph of pipelines connected by supernode references
pub struct SubflowGraph {
    primary: String,
    graph: DiGraph<String, String>,
    id_to_index: HashMap<String, NodeIndex>,
    referencing: HashMap<String, Vec<SubflowParent>>,
    unresolved: Vec<(SubflowParent, String)>,
}

impl SubflowGraph {
    /// Build the hierarchy for every pipeline in `info`
    pub fn build(info: &CanvasInfo) -> Self {
        let mut graph = DiGraph::new();
        let mut id_to_index = HashMap::new();

        for pipeline in &info.pipelines {
            let idx = graph.add_node(pipeline.id.clone());
            id_to_index.entry(pipeline.id.clone()).or_insert(idx);
        }

        let mut referencing: HashMap<String, Vec<SubflowParent>> = HashMap::new();
        let mut unresolved = Vec::new();

        for pipeline in &info.pipelines {
            for supernode in pipeline.supernodes() {
                let Some(child) = supernode.subflow_pipeline_id() else {
                    continue;
                };
                let parent = SubflowParent {
                    pipeline_id: pipeline.id.clone(),
                    supernode_id: supernode.id.clone(),
                };

                match id_to_index.get(child) {
                    Some(&child_idx) => {
                        let parent_idx = id_to_index[&pipeline.id];
                        graph.add_edge(parent_idx, child_idx, supernode.id.clone());
                        referencing.entry(child.to_string()).or_default().push(parent);
                    }
                    None => unresolved.push((parent, child.to_string())),
                }
            }
        }

        Self {
            primary: info.primary_pipeline.clone(),
            graph,
            id_to_index,
            referencing,
            unresolved,
        }
    }

    /// Reject shared subflows and reference cycles
    pub fn validate(&self) -> CanvasResult<()> {
        let mut shared: Vec<(&String, &Vec<SubflowParent>)> = self
            .referencing
            .iter()
            .filter(|(_, parents)| parents.len() > 1)
            .collect();
        shared.sort_by(|a, b| a.0.cmp(b.0));

        if let Some((pipeline_id, parents)) = shared.first() {
            return Err(CanvasError::AmbiguousSubflow {
                pipeline_id: pipeline_id.to_string(),
                supernodes: parents.iter().map(|p| p.supernode_id.clone()).collect(),
            });
        }

        match toposort(&self.graph, None) {
            Ok(_) => Ok(()),
            Err(cycle) => Err(CanvasError::CircularSubflow {
                pipelines: self.find_cycle_members(cycle.node_id()),
            }),
        }
    }

    /// Walk from `start` along edges until it is reached again
    fn find_cycle_members(&self, start: NodeIndex) -> Vec<String> {
        let mut path = vec![start];
        let mut on_path: HashSet<NodeIndex> = HashSet::from([start]);
        let mut visited: HashSet<NodeIndex> = HashSet::new();

        if self.cycle_path(start, start, &mut path, &mut on_path, &mut visited) {
            path.iter().map(|&i| self.graph[i].clone()).collect()
        } else {
            vec![self.graph[start].clone()]
        }
    }

    fn cycle_path(
        &self,
        start: NodeIndex,
        current: NodeIndex,
        path: &mut Vec<NodeIndex>,
        on_path: &mut HashSet<NodeIndex>,
        visited: &mut HashSet<NodeIndex>,
    ) -> bool {
        for next in self.graph.neighbors(current) {
            if next == start {
                path.push(start);
                return true;
            }
            if on_path.contains(&next) || !visited.insert(next) {
                continue;
            }
            path.push(next);
            on_path.insert(next);
            if self.cycle_path(start, next, path, on_path, visited) {
                return true;
            }
            on_path.remove(&next);
            path.pop();
        }
        false
    }

    /// The supernode (and its pipeline) that contains `pipeline_id`
    pub fn parent_of(&self, pipeline_id: &str) -> Option<&SubflowParent> {
        self.referencing.get(pipeline_id).and_then(|p| p.first())
    }

    /// Pipeline ids from the primary pipeline down to `pipeline_id` inclusive.
    /// Empty when the pipeline is unknown.
    pub fn ancestors(&self, pipeline_id: &str) -> Vec<String> {
        if !self.id_to_index.contains_key(pipeline_id) {
            return Vec::new();
        }

        let mut chain = vec![pipeline_id.to_string()];
        let mut seen: HashSet<&str> = HashSet::from([pipeline_id]);
        let mut current = pipeline_id;

        while let Some(parent) = self.parent_of(current) {
            if !seen.insert(parent.pipeline_id.as_str()) {
                break;
            }
            chain.push(parent.pipeline_id.clone());
            current = parent.pipeline_id.as_str();
        }

        chain.reverse();
        chain
    }

    /// Whether `pipeline_id` is nested, at any depth, below `ancestor_id`
    pub fn is_descendant(&self, pipeline_id: &str, ancestor_id: &str) -> bool {
        pipeline_id != ancestor_id && self.ancestors(pipeline_id).iter().any(|p| p == ancestor_id)
    }

    /// Direct children of a pipeline with the supernodes that hold them
    pub fn children(&self, pipeline_id: &str) -> Vec<(String, String)> {
        let Some(&idx) = self.id_to_index.get(pipeline_id) else {
            return Vec::new();
        };
        let mut children: Vec<(String, String)> = self
            .graph
            .edges(idx)
            .map(|e| (e.weight().clone(), self.graph[e.target()].clone()))
            .collect();
        children.sort();
        children
    }

    /// Every pipeline nested below `pipeline_id`, excluding itself
    pub fn descendants(&self, pipeline_id: &str) -> Vec<String> {
        let Some(&idx) = self.id_to_index.get(pipeline_id) else {
            return Vec::new();
        };

        let mut found = Vec::new();
        let mut bfs = Bfs::new(&self.graph, idx);
        while let Some(next) = bfs.next(&self.graph) {
            if next != idx {
                found.push(self.graph[next].clone());
            }
        }
        found
    }

    /// Pipelines that are neither primary nor referenced by any supernode
    pub fn orphans(&self) -> Vec<String> {
        let mut orphans: Vec<String> = self
            .id_to_index
            .keys()
            .filter(|id| **id != self.primary && !self.referencing.contains_key(*id))
            .cloned()
            .collect();
        orphans.sort();
        orphans
    }

    /// Supernode references whose target pipeline is not loaded, as
    /// `(holder, missing pipeline id)`
    pub fn unresolved(&self) -> &[(SubflowParent, String)] {
        &self.unresolved
    }

    /// Every supernode referencing `pipeline_id`, loaded or not
    pub fn holders(&self, pipeline_id: &str) -> Vec<&SubflowParent> {
        self.referencing
            .get(pipeline_id)
            .into_iter()
            .flatten()
            .chain(
                self.unresolved
                    .iter()
                    .filter(|(_, missing)| missing == pipeline_id)
                    .map(|(parent, _)| parent),
            )
            .collect()
    }

    /// Depth of a pipeline below the primary (primary is 0)
    pub fn depth(&self, pipeline_id: &str) -> usize {
        self.ancestors(pipeline_id).len().saturating_sub(1)
    }
}
