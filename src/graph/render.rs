// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 canvasflow contributors

//! Text, DOT and Mermaid renderings of a pipeline's data-link graph

use std::fmt::Write;

use super::index::PipelineIndex;
use crate::model::{CanvasPipeline, NodeKind};

/// Graph output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraphFormat {
    Text,
    Dot,
    Mermaid,
}

impl std::str::FromStr for GraphFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "dot" => Ok(Self::Dot),
            "mermaid" => Ok(Self::Mermaid),
            _ => Err(format!("Unknown graph format: {}", s)),
        }
    }
}

/// Render a pipeline in the requested format
pub fn render(pipeline: &CanvasPipeline, format: GraphFormat) -> String {
    let index = PipelineIndex::build(pipeline);
    match format {
        GraphFormat::Text => to_text(pipeline, &index),
        GraphFormat::Dot => to_dot(pipeline, &index),
        GraphFormat::Mermaid => to_mermaid(pipeline, &index),
    }
}

/// Mermaid ids must be plain identifiers
fn mermaid_id(id: &str) -> String {
    id.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect()
}

fn escape(label: &str) -> String {
    label.replace('"', "\\\"")
}

pub fn to_mermaid(pipeline: &CanvasPipeline, index: &PipelineIndex) -> String {
    let mut out = String::from("graph LR\n");

    for node in &pipeline.nodes {
        let id = mermaid_id(&node.id);
        let label = escape(&node.label);
        let _ = match node.kind {
            NodeKind::Supernode => writeln!(out, "    {}[[\"{}\"]]", id, label),
            _ => writeln!(out, "    {}[\"{}\"]", id, label),
        };
    }

    for (from, to, _) in index.edges() {
        let _ = writeln!(out, "    {} --> {}", mermaid_id(from), mermaid_id(to));
    }

    out
}

pub fn to_dot(pipeline: &CanvasPipeline, index: &PipelineIndex) -> String {
    let mut out = format!("digraph \"{}\" {{\n", escape(&pipeline.id));
    out.push_str("    rankdir=LR;\n");
    out.push_str("    node [shape=box, style=rounded];\n\n");

    for node in &pipeline.nodes {
        let shape = if node.is_supernode() { ", shape=box3d" } else { "" };
        let _ = writeln!(
            out,
            "    \"{}\" [label=\"{}\"{}];",
            escape(&node.id),
            escape(&node.label),
            shape
        );
    }
    if !pipeline.nodes.is_empty() {
        out.push('\n');
    }

    for (from, to, link) in index.edges() {
        let _ = writeln!(
            out,
            "    \"{}\" -> \"{}\" [id=\"{}\"];",
            escape(from),
            escape(to),
            escape(link)
        );
    }

    out.push_str("}\n");
    out
}

/// Nodes in execution order with their inputs, falling back to document
/// order when links form a cycle
pub fn to_text(pipeline: &CanvasPipeline, index: &PipelineIndex) -> String {
    let order = index
        .topological_order()
        .unwrap_or_else(|| pipeline.nodes.iter().map(|n| n.id.clone()).collect());

    let mut out = String::new();
    for (i, id) in order.iter().enumerate() {
        let Some(node) = pipeline.node(id) else {
            continue;
        };
        let _ = write!(out, "{}. {} ({})", i + 1, node.label, node.kind.as_flow_type());

        let inputs = index.predecessors(id);
        if !inputs.is_empty() {
            let _ = write!(out, " [from: {}]", inputs.join(", "));
        }
        if let Some(child) = node.subflow_pipeline_id() {
            let _ = write!(out, " [subflow: {}]", child);
        }
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CanvasLink, CanvasNode, LinkEnd, LinkKind};

    fn pipeline() -> CanvasPipeline {
        let mut p = CanvasPipeline::new("main");
        p.nodes.push(CanvasNode::execution("read-1", "Read"));
        p.nodes.push(CanvasNode::supernode("sub", "Group", "child"));
        p.links.push(CanvasLink::new(
            "l1",
            LinkKind::NodeLink,
            LinkEnd::port("read-1", "outPort"),
            LinkEnd::port("sub", "in"),
        ));
        p
    }

    #[test]
    fn test_mermaid_output() {
        let out = render(&pipeline(), GraphFormat::Mermaid);
        insta::assert_snapshot!(out, @r###"
        graph LR
            read_1["Read"]
            sub[["Group"]]
            read_1 --> sub
        "###);
    }

    #[test]
    fn test_dot_output() {
        let out = render(&pipeline(), GraphFormat::Dot);
        assert!(out.starts_with("digraph \"main\" {"));
        assert!(out.contains("\"sub\" [label=\"Group\", shape=box3d];"));
        assert!(out.contains("\"read-1\" -> \"sub\" [id=\"l1\"];"));
    }

    #[test]
    fn test_text_output() {
        let out = render(&pipeline(), GraphFormat::Text);
        assert_eq!(
            out,
            "1. Read (execution_node)\n2. Group (super_node) [from: read-1] [subflow: child]\n"
        );
    }
}
