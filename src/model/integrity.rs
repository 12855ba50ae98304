// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 canvasflow contributors

//! Integrity checks for a loaded model
//!
//! Runs after conversion and before a document replaces the current model.
//! Errors make the load fail; warnings are reported but accepted.

use std::collections::HashSet;

use super::canvas::{CanvasInfo, CanvasLink, CanvasPipeline, LinkEnd, LinkKind, ObjectKind};
use crate::errors::{CanvasError, CanvasResult};
use crate::graph::SubflowGraph;

/// Model integrity validator
pub struct FlowValidator;

impl FlowValidator {
    /// Check every invariant a loaded model must satisfy
    pub fn validate(info: &CanvasInfo) -> ValidationReport {
        let mut report = ValidationReport::new();

        // Pipeline ids are unique across the whole model
        let mut seen = HashSet::new();
        for pipeline in &info.pipelines {
            if !seen.insert(pipeline.id.as_str()) {
                report.add_error(CanvasError::DuplicateId {
                    kind: ObjectKind::Pipeline,
                    id: pipeline.id.clone(),
                    pipeline_id: pipeline.id.clone(),
                });
            }
        }

        if !info.contains_pipeline(&info.primary_pipeline) {
            report.add_error(CanvasError::Schema {
                reason: format!("primary pipeline '{}' is not defined", info.primary_pipeline),
                help: Some("Set primary_pipeline to the id of one of the pipelines".into()),
            });
        }

        for pipeline in &info.pipelines {
            Self::validate_pipeline(pipeline, &mut report);
        }

        let hierarchy = SubflowGraph::build(info);
        if let Err(e) = hierarchy.validate() {
            report.add_error(e);
        }

        for orphan in hierarchy.orphans() {
            report.add_warning(&format!(
                "Pipeline '{}' is not referenced by any supernode",
                orphan
            ));
        }
        for (parent, missing) in hierarchy.unresolved() {
            report.add_warning(&format!(
                "Supernode '{}' in pipeline '{}' references pipeline '{}' which is not loaded",
                parent.supernode_id, parent.pipeline_id, missing
            ));
        }

        report
    }

    /// Validate and return the warnings, or the first error
    pub fn check(info: &CanvasInfo) -> CanvasResult<Vec<String>> {
        Self::validate(info).into_result()
    }

    fn validate_pipeline(pipeline: &CanvasPipeline, report: &mut ValidationReport) {
        let pid = &pipeline.id;
        let mut ids = HashSet::new();

        let objects = pipeline
            .nodes
            .iter()
            .map(|n| (ObjectKind::Node, &n.id))
            .chain(pipeline.comments.iter().map(|c| (ObjectKind::Comment, &c.id)))
            .chain(pipeline.links.iter().map(|l| (ObjectKind::Link, &l.id)));

        for (kind, id) in objects {
            if !ids.insert(id.as_str()) {
                report.add_error(CanvasError::DuplicateId {
                    kind,
                    id: id.clone(),
                    pipeline_id: pid.clone(),
                });
            }
        }

        for node in &pipeline.nodes {
            for ports in [&node.inputs, &node.outputs] {
                let mut port_ids = HashSet::new();
                for port in ports {
                    if !port_ids.insert(port.id.as_str()) {
                        report.add_error(CanvasError::DuplicateId {
                            kind: ObjectKind::Port,
                            id: format!("{}/{}", node.id, port.id),
                            pipeline_id: pid.clone(),
                        });
                    }
                }
            }
        }

        for link in &pipeline.links {
            if let Some(endpoint) = Self::dangling_endpoint(pipeline, link) {
                report.add_error(CanvasError::DanglingLink {
                    link_id: link.id.clone(),
                    pipeline_id: pid.clone(),
                    endpoint,
                });
            }
        }
    }

    /// Describe the first endpoint of `link` that does not resolve
    fn dangling_endpoint(pipeline: &CanvasPipeline, link: &CanvasLink) -> Option<String> {
        let (src_kind, trg_kind) = match link.kind {
            LinkKind::NodeLink | LinkKind::AssociationLink => (ObjectKind::Node, ObjectKind::Node),
            LinkKind::CommentLink => (ObjectKind::Comment, ObjectKind::Node),
        };

        for (role, end, kind, input) in [
            ("source", &link.src, src_kind, false),
            ("target", &link.trg, trg_kind, true),
        ] {
            let LinkEnd::Object { id, port } = end else {
                if link.kind != LinkKind::NodeLink {
                    return Some(format!("{} position (only data links may detach)", role));
                }
                continue;
            };

            let resolved = match kind {
                ObjectKind::Comment => pipeline.comment(id).is_some(),
                _ => pipeline.node(id).is_some(),
            };
            if !resolved {
                return Some(format!("{} {} '{}'", role, kind, id));
            }

            if let (LinkKind::NodeLink, Some(port)) = (link.kind, port) {
                let node = pipeline.node(id)?;
                let found = if input {
                    node.input_port(port).is_some()
                } else {
                    node.output_port(port).is_some()
                };
                if !found {
                    return Some(format!("{} port '{}' on node '{}'", role, port, id));
                }
            }
        }
        None
    }
}

/// Result of model validation
#[derive(Debug, Default)]
pub struct ValidationReport {
    pub errors: Vec<CanvasError>,
    pub warnings: Vec<String>,
}

impl ValidationReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_error(&mut self, error: CanvasError) {
        self.errors.push(error);
    }

    pub fn add_warning(&mut self, message: &str) {
        self.warnings.push(message.to_string());
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    /// The warnings when valid, otherwise the first error
    pub fn into_result(self) -> CanvasResult<Vec<String>> {
        match self.errors.into_iter().next() {
            Some(error) => Err(error),
            None => Ok(self.warnings),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CanvasComment, CanvasNode, CanvasPipeline, Port};

    fn base() -> CanvasInfo {
        let mut info = CanvasInfo::empty("flow", "main");
        let main = info.pipeline_mut("main").unwrap();
        main.nodes.push(CanvasNode::execution("a", "A"));
        main.nodes.push(CanvasNode::execution("b", "B"));
        main.links.push(CanvasLink::new(
            "a-b",
            LinkKind::NodeLink,
            LinkEnd::port("a", "outPort"),
            LinkEnd::port("b", "inPort"),
        ));
        info
    }

    #[test]
    fn test_valid_model() {
        let report = FlowValidator::validate(&base());
        assert!(report.is_valid());
        assert!(!report.has_warnings());
    }

    #[test]
    fn test_duplicate_object_ids() {
        let mut info = base();
        info.pipeline_mut("main")
            .unwrap()
            .comments
            .push(CanvasComment::new("a", "clashes with node a"));

        let err = FlowValidator::check(&info).unwrap_err();
        assert!(matches!(
            err,
            CanvasError::DuplicateId { kind: ObjectKind::Comment, .. }
        ));
    }

    #[test]
    fn test_duplicate_port_ids() {
        let mut info = base();
        let node = info.pipeline_mut("main").unwrap().node_mut("a").unwrap();
        node.outputs.push(Port::new("outPort"));

        let report = FlowValidator::validate(&info);
        assert!(report
            .errors
            .iter()
            .any(|e| matches!(e, CanvasError::DuplicateId { kind: ObjectKind::Port, .. })));
    }

    #[test]
    fn test_dangling_link() {
        let mut info = base();
        info.pipeline_mut("main").unwrap().links.push(CanvasLink::new(
            "bad",
            LinkKind::NodeLink,
            LinkEnd::port("a", "outPort"),
            LinkEnd::port("ghost", "inPort"),
        ));

        match FlowValidator::check(&info) {
            Err(CanvasError::DanglingLink { link_id, endpoint, .. }) => {
                assert_eq!(link_id, "bad");
                assert!(endpoint.contains("ghost"));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_link_to_other_pipeline_is_dangling() {
        let mut info = base();
        let mut other = CanvasPipeline::new("other");
        other.nodes.push(CanvasNode::execution("x", "X"));
        info.pipelines.push(other);
        info.pipeline_mut("main")
            .unwrap()
            .nodes
            .push(CanvasNode::supernode("s", "S", "other"));
        info.pipeline_mut("main").unwrap().links.push(CanvasLink::new(
            "cross",
            LinkKind::AssociationLink,
            LinkEnd::object("a"),
            LinkEnd::object("x"),
        ));

        assert!(matches!(
            FlowValidator::check(&info),
            Err(CanvasError::DanglingLink { .. })
        ));
    }

    #[test]
    fn test_missing_primary() {
        let mut info = base();
        info.primary_pipeline = "nowhere".into();
        assert!(!FlowValidator::validate(&info).is_valid());
    }

    #[test]
    fn test_orphan_warning() {
        let mut info = base();
        info.pipelines.push(CanvasPipeline::new("floating"));

        let warnings = FlowValidator::check(&info).unwrap();
        assert!(warnings[0].contains("floating"));
    }
}
