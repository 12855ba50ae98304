// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 canvasflow contributors

//! Data-link adjacency index for one pipeline
//!
//! Built on demand from the pipeline's attached node links. Traversals are
//! breadth-first with a visited set, so they terminate on cyclic graphs and
//! run in time linear in nodes plus links.

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::{Bfs, EdgeRef, IntoNeighbors, Reversed, VisitMap, Visitable};
use std::collections::{HashMap, HashSet};

use crate::model::CanvasPipeline;

/// Which way a traversal follows links
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraversalDirection {
    Upstream,
    Downstream,
    Both,
}

impl std::str::FromStr for TraversalDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "upstream" | "up" => Ok(Self::Upstream),
            "downstream" | "down" => Ok(Self::Downstream),
            "both" | "branch" => Ok(Self::Both),
            _ => Err(format!("Unknown direction: {}", s)),
        }
    }
}

/// Node graph of a pipeline, one edge per attached data link
pub struct PipelineIndex {
    graph: DiGraph<String, String>,
    id_to_index: HashMap<String, NodeIndex>,
}

impl PipelineIndex {
    /// Index the nodes and attached data links of a pipeline
    pub fn build(pipeline: &CanvasPipeline) -> Self {
        let mut graph = DiGraph::with_capacity(pipeline.nodes.len(), pipeline.links.len());
        let mut id_to_index = HashMap::with_capacity(pipeline.nodes.len());

        for node in &pipeline.nodes {
            let idx = graph.add_node(node.id.clone());
            id_to_index.insert(node.id.clone(), idx);
        }

        for link in pipeline.links.iter().filter(|l| l.is_attached_node_link()) {
            let (Some(src), Some(trg)) = (link.src.object_id(), link.trg.object_id()) else {
                continue;
            };
            if let (Some(&from), Some(&to)) = (id_to_index.get(src), id_to_index.get(trg)) {
                graph.add_edge(from, to, link.id.clone());
            }
        }

        Self { graph, id_to_index }
    }

    /// Number of indexed nodes
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn contains(&self, node_id: &str) -> bool {
        self.id_to_index.contains_key(node_id)
    }

    fn seeds(&self, node_ids: &[String]) -> Vec<NodeIndex> {
        node_ids
            .iter()
            .filter_map(|id| self.id_to_index.get(id).copied())
            .collect()
    }

    /// Seeds plus every node that feeds into them. Unknown seeds are ignored.
    pub fn upstream(&self, node_ids: &[String]) -> HashSet<String> {
        self.reach(Reversed(&self.graph), self.seeds(node_ids))
    }

    /// Seeds plus every node they feed into. Unknown seeds are ignored.
    pub fn downstream(&self, node_ids: &[String]) -> HashSet<String> {
        self.reach(&self.graph, self.seeds(node_ids))
    }

    /// One breadth-first walk started from all seeds at once, sharing a
    /// single visited map
    fn reach<G>(&self, graph: G, seeds: Vec<NodeIndex>) -> HashSet<String>
    where
        G: IntoNeighbors<NodeId = NodeIndex> + Visitable<NodeId = NodeIndex>,
    {
        let mut found = HashSet::new();
        let mut seeds = seeds.into_iter();
        let Some(first) = seeds.next() else {
            return found;
        };

        let mut bfs = Bfs::new(graph, first);
        for seed in seeds {
            if bfs.discovered.visit(seed) {
                bfs.stack.push_back(seed);
            }
        }
        while let Some(next) = bfs.next(graph) {
            found.insert(self.graph[next].clone());
        }
        found
    }

    /// Union of upstream and downstream sets
    pub fn branch(&self, node_ids: &[String]) -> HashSet<String> {
        let mut found = self.upstream(node_ids);
        found.extend(self.downstream(node_ids));
        found
    }

    pub fn traverse(&self, node_ids: &[String], direction: TraversalDirection) -> HashSet<String> {
        match direction {
            TraversalDirection::Upstream => self.upstream(node_ids),
            TraversalDirection::Downstream => self.downstream(node_ids),
            TraversalDirection::Both => self.branch(node_ids),
        }
    }

    /// Ids of data links whose both ends are in `node_ids`
    pub fn links_between(&self, node_ids: &HashSet<String>) -> Vec<String> {
        self.graph
            .edge_references()
            .filter(|e| {
                node_ids.contains(&self.graph[e.source()])
                    && node_ids.contains(&self.graph[e.target()])
            })
            .map(|e| e.weight().clone())
            .collect()
    }

    /// Whether the nodes form one connected piece when link direction is
    /// ignored. False for an empty set; ids that are not nodes are skipped.
    pub fn is_contiguous(&self, node_ids: &[String]) -> bool {
        let members: HashSet<NodeIndex> = self.seeds(node_ids).into_iter().collect();
        let Some(&start) = members.iter().next() else {
            return false;
        };

        let mut reached = HashSet::from([start]);
        let mut queue = vec![start];
        while let Some(current) = queue.pop() {
            for next in self.graph.neighbors_undirected(current) {
                if members.contains(&next) && reached.insert(next) {
                    queue.push(next);
                }
            }
        }
        reached.len() == members.len()
    }

    /// Ids of the nodes directly feeding `node_id`
    pub fn predecessors(&self, node_id: &str) -> Vec<String> {
        self.neighbors(node_id, petgraph::Direction::Incoming)
    }

    /// Ids of the nodes `node_id` feeds directly
    pub fn successors(&self, node_id: &str) -> Vec<String> {
        self.neighbors(node_id, petgraph::Direction::Outgoing)
    }

    fn neighbors(&self, node_id: &str, direction: petgraph::Direction) -> Vec<String> {
        let Some(&idx) = self.id_to_index.get(node_id) else {
            return Vec::new();
        };
        let mut ids: Vec<String> = self
            .graph
            .neighbors_directed(idx, direction)
            .map(|n| self.graph[n].clone())
            .collect();
        ids.sort();
        ids.dedup();
        ids
    }

    /// Node ids in topological order, or `None` when links form a cycle
    pub fn topological_order(&self) -> Option<Vec<String>> {
        petgraph::algo::toposort(&self.graph, None)
            .ok()
            .map(|order| order.into_iter().map(|n| self.graph[n].clone()).collect())
    }

    /// All `(source, target, link id)` edges
    pub fn edges(&self) -> impl Iterator<Item = (&str, &str, &str)> {
        self.graph.edge_references().map(|e| {
            (
                self.graph[e.source()].as_str(),
                self.graph[e.target()].as_str(),
                e.weight().as_str(),
            )
        })
    }
}

/// Restrict a node-id set to the pipeline's node order
pub fn in_pipeline_order(pipeline: &CanvasPipeline, ids: &HashSet<String>) -> Vec<String> {
    pipeline
        .nodes
        .iter()
        .filter(|n| ids.contains(&n.id))
        .map(|n| n.id.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CanvasLink, CanvasNode, LinkEnd, LinkKind, Position};

    fn link(p: &mut CanvasPipeline, from: &str, to: &str) {
        p.links.push(CanvasLink::new(
            format!("{}-{}", from, to),
            LinkKind::NodeLink,
            LinkEnd::port(from, "outPort"),
            LinkEnd::port(to, "inPort"),
        ));
    }

    /// a → b → c, d → c, e isolated
    fn sample() -> CanvasPipeline {
        let mut p = CanvasPipeline::new("p");
        for id in ["a", "b", "c", "d", "e"] {
            p.nodes.push(CanvasNode::execution(id, id.to_uppercase()));
        }
        link(&mut p, "a", "b");
        link(&mut p, "b", "c");
        link(&mut p, "d", "c");
        p
    }

    fn ids(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_upstream_and_downstream() {
        let p = sample();
        let index = PipelineIndex::build(&p);

        let up = in_pipeline_order(&p, &index.upstream(&ids(&["c"])));
        assert_eq!(up, vec!["a", "b", "c", "d"]);

        let down = in_pipeline_order(&p, &index.downstream(&ids(&["a"])));
        assert_eq!(down, vec!["a", "b", "c"]);

        let alone = in_pipeline_order(&p, &index.upstream(&ids(&["a"])));
        assert_eq!(alone, vec!["a"]);
    }

    #[test]
    fn test_branch_is_union() {
        let p = sample();
        let index = PipelineIndex::build(&p);
        let seeds = ids(&["b"]);

        let mut expected = index.upstream(&seeds);
        expected.extend(index.downstream(&seeds));
        assert_eq!(index.branch(&seeds), expected);
        assert!(index.branch(&seeds).contains("b"));
    }

    #[test]
    fn test_cycles_terminate() {
        let mut p = sample();
        link(&mut p, "c", "a");
        let index = PipelineIndex::build(&p);

        assert_eq!(index.downstream(&ids(&["a"])).len(), 3);
        assert!(index.topological_order().is_none());
    }

    #[test]
    fn test_many_seeds_stay_linear() {
        let count = 20_000;
        let mut p = CanvasPipeline::new("long");
        for i in 0..count {
            p.nodes.push(CanvasNode::execution(format!("n{}", i), "N"));
        }
        for i in 1..count {
            link(&mut p, &format!("n{}", i - 1), &format!("n{}", i));
        }
        let index = PipelineIndex::build(&p);
        let seeds: Vec<String> = (0..count).rev().map(|i| format!("n{}", i)).collect();

        let started = std::time::Instant::now();
        assert_eq!(index.downstream(&seeds).len(), count);
        assert_eq!(index.upstream(&seeds).len(), count);
        assert_eq!(index.downstream(&ids(&["n19990", "n5", "missing"])).len(), count - 5);
        assert!(started.elapsed() < std::time::Duration::from_secs(5));
    }

    #[test]
    fn test_detached_links_ignored() {
        let mut p = sample();
        p.links.push(CanvasLink::new(
            "loose",
            LinkKind::NodeLink,
            LinkEnd::port("e", "outPort"),
            LinkEnd::Detached(Position::new(5.0, 5.0)),
        ));
        let index = PipelineIndex::build(&p);
        assert_eq!(index.downstream(&ids(&["e"])).len(), 1);
    }

    #[test]
    fn test_contiguity() {
        let p = sample();
        let index = PipelineIndex::build(&p);

        assert!(index.is_contiguous(&ids(&["a", "b", "c", "d"])));
        assert!(index.is_contiguous(&ids(&["a"])));
        assert!(!index.is_contiguous(&ids(&["a", "c"])));
        assert!(!index.is_contiguous(&ids(&["a", "e"])));
        assert!(!index.is_contiguous(&[]));
    }

    #[test]
    fn test_links_between() {
        let p = sample();
        let index = PipelineIndex::build(&p);
        let set: HashSet<String> = ids(&["a", "b", "c"]).into_iter().collect();

        let mut links = index.links_between(&set);
        links.sort();
        assert_eq!(links, vec!["a-b", "b-c"]);
    }
}
