// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 canvasflow contributors

//! Link operations

use super::{CanvasController, DecorationEntry, PipelineObjectIds};
use crate::errors::{CanvasError, CanvasResult};
use crate::model::{CanvasLink, CanvasPipeline, Decoration, LinkEnd, LinkKind, ObjectKind};
use crate::styles::{StyleEntry, StyleSpec};

/// Link attributes to change
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LinkProperties {
    pub class_name: Option<String>,
    pub decorations: Option<Vec<Decoration>>,
}

/// Which end of a link
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum End {
    Source,
    Target,
}

impl End {
    fn describe(&self, what: &str, id: &str) -> String {
        match self {
            Self::Source => format!("source {} '{}'", what, id),
            Self::Target => format!("target {} '{}'", what, id),
        }
    }
}

impl CanvasController {
    pub fn get_link(&self, pipeline_id: &str, link_id: &str) -> Option<&CanvasLink> {
        self.info.pipeline(pipeline_id)?.link(link_id)
    }

    pub fn get_links(&self, pipeline_id: &str) -> &[CanvasLink] {
        self.info
            .pipeline(pipeline_id)
            .map(|p| p.links.as_slice())
            .unwrap_or_default()
    }

    pub(crate) fn update_link(
        &mut self,
        pipeline_id: &str,
        link_id: &str,
        f: impl FnOnce(&mut CanvasLink),
    ) -> CanvasResult<()> {
        let link = self
            .pipeline_mut_or_err(pipeline_id)?
            .link_mut(link_id)
            .ok_or_else(|| CanvasError::not_found(ObjectKind::Link, link_id, pipeline_id))?;
        f(link);
        Ok(())
    }

    pub fn set_link_properties(
        &mut self,
        pipeline_id: &str,
        link_id: &str,
        properties: LinkProperties,
    ) -> CanvasResult<()> {
        self.log_api("set_link_properties", (pipeline_id, link_id, &properties));
        self.update_link(pipeline_id, link_id, |link| {
            if let Some(class_name) = properties.class_name {
                link.class_name = Some(class_name);
            }
            if let Some(decorations) = properties.decorations {
                link.decorations = decorations;
            }
        })
    }

    /// Reattach the source end of a data link
    pub fn set_node_data_link_src_info(
        &mut self,
        pipeline_id: &str,
        link_id: &str,
        node_id: &str,
        port_id: Option<&str>,
    ) -> CanvasResult<()> {
        self.reattach(pipeline_id, link_id, node_id, port_id, End::Source)
    }

    /// Reattach the target end of a data link
    pub fn set_node_data_link_trg_info(
        &mut self,
        pipeline_id: &str,
        link_id: &str,
        node_id: &str,
        port_id: Option<&str>,
    ) -> CanvasResult<()> {
        self.reattach(pipeline_id, link_id, node_id, port_id, End::Target)
    }

    fn reattach(
        &mut self,
        pipeline_id: &str,
        link_id: &str,
        node_id: &str,
        port_id: Option<&str>,
        end: End,
    ) -> CanvasResult<()> {
        let pipeline = self.pipeline_or_err(pipeline_id)?;
        let mut link = pipeline
            .link(link_id)
            .cloned()
            .ok_or_else(|| CanvasError::not_found(ObjectKind::Link, link_id, pipeline_id))?;
        if link.kind != LinkKind::NodeLink {
            return Err(CanvasError::invalid(
                "reattach link",
                format!("'{}' is not a data link", link_id),
            ));
        }

        let node = pipeline
            .node(node_id)
            .ok_or_else(|| CanvasError::not_found(ObjectKind::Node, node_id, pipeline_id))?;
        let port = match (end, port_id) {
            (_, Some(port)) => Some(port.to_string()),
            (End::Source, None) => node.default_output_port().map(str::to_string),
            (End::Target, None) => node.default_input_port().map(str::to_string),
        };
        let new_end = LinkEnd::Object {
            id: node_id.to_string(),
            port,
        };
        match end {
            End::Source => link.src = new_end,
            End::Target => link.trg = new_end,
        }

        let others: Vec<CanvasLink> = pipeline
            .links
            .iter()
            .filter(|l| l.id != link_id)
            .cloned()
            .collect();
        let mut without = pipeline.clone();
        without.links = others;
        self.check_link(&without, &link, &[])?;

        self.update_link(pipeline_id, link_id, |existing| *existing = link)
    }

    /// The data link between two node ports. Absent ports mean the node's
    /// default port.
    pub fn get_node_data_link_from_info(
        &self,
        pipeline_id: &str,
        src_node_id: &str,
        src_port_id: Option<&str>,
        trg_node_id: &str,
        trg_port_id: Option<&str>,
    ) -> Option<&CanvasLink> {
        let pipeline = self.info.pipeline(pipeline_id)?;
        let src_port = src_port_id.or_else(|| pipeline.node(src_node_id)?.default_output_port());
        let trg_port = trg_port_id.or_else(|| pipeline.node(trg_node_id)?.default_input_port());

        pipeline.links.iter().find(|l| {
            l.kind == LinkKind::NodeLink
                && l.src.object_id() == Some(src_node_id)
                && l.trg.object_id() == Some(trg_node_id)
                && l.src.port_id() == src_port
                && l.trg.port_id() == trg_port
        })
    }

    pub fn get_comment_link_from_info(
        &self,
        pipeline_id: &str,
        comment_id: &str,
        node_id: &str,
    ) -> Option<&CanvasLink> {
        self.find_object_link(pipeline_id, LinkKind::CommentLink, comment_id, node_id)
    }

    pub fn get_node_assoc_link_from_info(
        &self,
        pipeline_id: &str,
        src_node_id: &str,
        trg_node_id: &str,
    ) -> Option<&CanvasLink> {
        self.find_object_link(pipeline_id, LinkKind::AssociationLink, src_node_id, trg_node_id)
    }

    fn find_object_link(
        &self,
        pipeline_id: &str,
        kind: LinkKind,
        src: &str,
        trg: &str,
    ) -> Option<&CanvasLink> {
        self.info.pipeline(pipeline_id)?.links.iter().find(|l| {
            l.kind == kind && l.src.object_id() == Some(src) && l.trg.object_id() == Some(trg)
        })
    }

    /// Add links without recording them for undo
    pub fn add_links(&mut self, pipeline_id: &str, links: Vec<CanvasLink>) -> CanvasResult<()> {
        self.log_api("add_links", (pipeline_id, links.len()));
        self.add_links_inner(pipeline_id, links)
    }

    pub(crate) fn add_links_inner(
        &mut self,
        pipeline_id: &str,
        links: Vec<CanvasLink>,
    ) -> CanvasResult<()> {
        let pipeline = self.pipeline_or_err(pipeline_id)?;
        for (i, link) in links.iter().enumerate() {
            self.check_link(pipeline, link, &links[..i])?;
        }
        self.pipeline_mut_or_err(pipeline_id)?.links.extend(links);
        Ok(())
    }

    /// Validate a link about to join `pipeline` after `pending`
    pub(crate) fn check_link(
        &self,
        pipeline: &CanvasPipeline,
        link: &CanvasLink,
        pending: &[CanvasLink],
    ) -> CanvasResult<()> {
        if pipeline.contains_object(&link.id) || pending.iter().any(|l| l.id == link.id) {
            return Err(CanvasError::DuplicateId {
                kind: ObjectKind::Link,
                id: link.id.clone(),
                pipeline_id: pipeline.id.clone(),
            });
        }

        let dangling = |endpoint: String| CanvasError::DanglingLink {
            link_id: link.id.clone(),
            pipeline_id: pipeline.id.clone(),
            endpoint,
        };

        match link.kind {
            LinkKind::NodeLink => {
                if link.src.is_detached() && link.trg.is_detached() {
                    return Err(CanvasError::invalid(
                        "add link",
                        format!("link '{}' has no attached end", link.id),
                    ));
                }
                if (link.src.is_detached() || link.trg.is_detached())
                    && !self.config.detachable_links()
                {
                    return Err(CanvasError::invalid(
                        "add link",
                        "detached links require link_selection = \"detachable\"",
                    ));
                }
                for (end, side) in [(&link.src, End::Source), (&link.trg, End::Target)] {
                    let LinkEnd::Object { id, port } = end else {
                        continue;
                    };
                    let node = pipeline
                        .node(id)
                        .ok_or_else(|| dangling(side.describe("node", id)))?;
                    if let Some(port) = port {
                        let found = match side {
                            End::Source => node.output_port(port),
                            End::Target => node.input_port(port),
                        };
                        if found.is_none() {
                            let port_ref = format!("{}/{}", id, port);
                            return Err(dangling(side.describe("port", &port_ref)));
                        }
                    }
                }
            }
            LinkKind::AssociationLink | LinkKind::CommentLink => {
                let (Some(src), Some(trg)) = (link.src.object_id(), link.trg.object_id()) else {
                    return Err(CanvasError::invalid(
                        "add link",
                        format!("only data links may have detached ends ('{}')", link.id),
                    ));
                };
                let src_ok = if link.kind == LinkKind::CommentLink {
                    pipeline.comment(src).is_some()
                } else {
                    pipeline.node(src).is_some()
                };
                if !src_ok {
                    let what = if link.kind == LinkKind::CommentLink { "comment" } else { "node" };
                    return Err(dangling(End::Source.describe(what, src)));
                }
                if pipeline.node(trg).is_none() {
                    return Err(dangling(End::Target.describe("node", trg)));
                }
            }
        }
        Ok(())
    }

    pub fn delete_link(&mut self, pipeline_id: &str, link_id: &str) -> CanvasResult<()> {
        self.require_objects(pipeline_id, &[link_id.to_string()], &[ObjectKind::Link])?;
        self.delete_objects(pipeline_id, &[link_id.to_string()])?;
        Ok(())
    }

    /// Build links from every source to every target with fresh ids.
    /// Self links, duplicates and links a port's cardinality does not allow
    /// are skipped. The links are not added.
    pub fn create_node_links(
        &mut self,
        pipeline_id: &str,
        sources: &[LinkEnd],
        targets: &[LinkEnd],
        kind: LinkKind,
    ) -> CanvasResult<Vec<CanvasLink>> {
        if kind == LinkKind::CommentLink {
            return Err(CanvasError::invalid(
                "create node links",
                "use create_comment_links for comment links",
            ));
        }

        let mut planned: Vec<(LinkEnd, LinkEnd)> = Vec::new();
        {
            let pipeline = self.pipeline_or_err(pipeline_id)?;
            for src in sources {
                for trg in targets {
                    let (Some(src_id), Some(trg_id)) = (src.object_id(), trg.object_id()) else {
                        continue;
                    };
                    let missing =
                        |id: &str| CanvasError::not_found(ObjectKind::Node, id, pipeline_id);
                    let src_node = pipeline.node(src_id).ok_or_else(|| missing(src_id))?;
                    let trg_node = pipeline.node(trg_id).ok_or_else(|| missing(trg_id))?;
                    if src_id == trg_id {
                        continue;
                    }

                    if kind == LinkKind::AssociationLink {
                        let exists = self
                            .get_node_assoc_link_from_info(pipeline_id, src_id, trg_id)
                            .or_else(|| {
                                self.get_node_assoc_link_from_info(pipeline_id, trg_id, src_id)
                            })
                            .is_some();
                        let queued = planned.iter().any(|(s, t)| {
                            (s.object_id() == Some(src_id) && t.object_id() == Some(trg_id))
                                || (s.object_id() == Some(trg_id) && t.object_id() == Some(src_id))
                        });
                        if !exists && !queued {
                            planned.push((LinkEnd::object(src_id), LinkEnd::object(trg_id)));
                        }
                        continue;
                    }

                    let Some(src_port) = src.port_id().or_else(|| src_node.default_output_port())
                    else {
                        continue;
                    };
                    let Some(trg_port) = trg.port_id().or_else(|| trg_node.default_input_port())
                    else {
                        continue;
                    };
                    let (Some(out_port), Some(in_port)) =
                        (src_node.output_port(src_port), trg_node.input_port(trg_port))
                    else {
                        continue;
                    };

                    let candidate = (
                        LinkEnd::port(src_id, src_port),
                        LinkEnd::port(trg_id, trg_port),
                    );
                    let exists = self
                        .get_node_data_link_from_info(
                            pipeline_id,
                            src_id,
                            Some(src_port),
                            trg_id,
                            Some(trg_port),
                        )
                        .is_some();
                    if exists || planned.contains(&candidate) {
                        continue;
                    }

                    let queued_out = planned.iter().filter(|(s, _)| *s == candidate.0).count();
                    let queued_in = planned.iter().filter(|(_, t)| *t == candidate.1).count();
                    let out_count = pipeline.port_link_count(src_id, src_port, false) + queued_out;
                    let in_count = pipeline.port_link_count(trg_id, trg_port, true) + queued_in;
                    if out_port.cardinality_or_default().accepts(out_count)
                        && in_port.cardinality_or_default().accepts(in_count)
                    {
                        planned.push(candidate);
                    }
                }
            }
        }

        let mut links = Vec::with_capacity(planned.len());
        for (src, trg) in planned {
            let id = self.generate_id();
            links.push(CanvasLink::new(id, kind, src, trg));
        }
        Ok(links)
    }

    /// Build one comment link per comment/node pair that is not linked yet
    pub fn create_comment_links(
        &mut self,
        pipeline_id: &str,
        comment_ids: &[String],
        node_ids: &[String],
    ) -> CanvasResult<Vec<CanvasLink>> {
        self.require_objects(pipeline_id, comment_ids, &[ObjectKind::Comment])?;
        self.require_objects(pipeline_id, node_ids, &[ObjectKind::Node])?;

        let mut pairs = Vec::new();
        for comment_id in comment_ids {
            for node_id in node_ids {
                let pair = (comment_id.clone(), node_id.clone());
                if self.get_comment_link_from_info(pipeline_id, comment_id, node_id).is_none()
                    && !pairs.contains(&pair)
                {
                    pairs.push(pair);
                }
            }
        }

        let mut links = Vec::with_capacity(pairs.len());
        for (comment_id, node_id) in pairs {
            let id = self.generate_id();
            links.push(CanvasLink::new(
                id,
                LinkKind::CommentLink,
                LinkEnd::object(comment_id),
                LinkEnd::object(node_id),
            ));
        }
        Ok(links)
    }

    pub fn set_links_class_name(
        &mut self,
        targets: &PipelineObjectIds,
        class_name: &str,
    ) -> CanvasResult<()> {
        for (pipeline_id, ids) in targets {
            self.require_objects(pipeline_id, ids, &[ObjectKind::Link])?;
        }
        for (pipeline_id, ids) in targets {
            for id in ids {
                self.update_link(pipeline_id, id, |l| l.class_name = Some(class_name.to_string()))?;
            }
        }
        Ok(())
    }

    pub fn set_links_style(
        &mut self,
        targets: &PipelineObjectIds,
        spec: StyleSpec,
        temporary: bool,
    ) -> CanvasResult<()> {
        self.log_api("set_links_style", (targets, temporary));
        self.apply_styles(targets, &spec, temporary, &[ObjectKind::Link])
    }

    pub fn set_links_multi_style(
        &mut self,
        entries: &[StyleEntry],
        temporary: bool,
    ) -> CanvasResult<()> {
        self.apply_multi_styles(entries, temporary, &[ObjectKind::Link])
    }

    pub fn get_link_class_name(&self, pipeline_id: &str, link_id: &str) -> Option<&str> {
        self.get_link(pipeline_id, link_id)?.class_name.as_deref()
    }

    pub fn get_link_style(&self, pipeline_id: &str, link_id: &str, temporary: bool) -> StyleSpec {
        self.style_of(pipeline_id, link_id, temporary)
    }

    pub fn set_link_decorations(
        &mut self,
        pipeline_id: &str,
        link_id: &str,
        decorations: Vec<Decoration>,
    ) -> CanvasResult<()> {
        self.update_link(pipeline_id, link_id, |l| l.decorations = decorations)
    }

    pub fn set_links_multi_decorations(&mut self, entries: &[DecorationEntry]) -> CanvasResult<()> {
        for entry in entries {
            self.require_objects(
                &entry.pipeline_id,
                std::slice::from_ref(&entry.object_id),
                &[ObjectKind::Link],
            )?;
        }
        for entry in entries {
            let decorations = entry.decorations.clone();
            self.update_link(&entry.pipeline_id, &entry.object_id, |l| {
                l.decorations = decorations
            })?;
        }
        Ok(())
    }

    pub fn get_link_decorations(&self, pipeline_id: &str, link_id: &str) -> &[Decoration] {
        self.get_link(pipeline_id, link_id)
            .map(|l| l.decorations.as_slice())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LinkSelection;
    use crate::controller::tests::chain_flow;
    use crate::model::{Cardinality, Port, Position};

    fn loaded() -> CanvasController {
        let mut canvas = CanvasController::new();
        canvas.set_pipeline_flow(chain_flow()).unwrap();
        canvas
    }

    #[test]
    fn test_lookup_by_info_uses_default_ports() {
        let canvas = loaded();
        let link = canvas
            .get_node_data_link_from_info("main", "a", None, "b", None)
            .unwrap();
        assert_eq!(link.id, "ab");
        assert!(canvas.get_node_data_link_from_info("main", "a", None, "c", None).is_none());
    }

    #[test]
    fn test_create_node_links_skips_existing_and_full_ports() {
        let mut canvas = loaded();

        // a->b exists; a/out has cardinality 1 and is taken
        let links = canvas
            .create_node_links(
                "main",
                &[LinkEnd::object("a")],
                &[LinkEnd::object("b"), LinkEnd::object("c")],
                LinkKind::NodeLink,
            )
            .unwrap();
        assert!(links.is_empty());

        canvas
            .set_node_output_ports(
                "main",
                "a",
                vec![Port::new("out").with_cardinality(Cardinality::unbounded())],
            )
            .unwrap();
        canvas
            .set_node_input_ports(
                "main",
                "c",
                vec![Port::new("in").with_cardinality(Cardinality::unbounded())],
            )
            .unwrap();
        let links = canvas
            .create_node_links(
                "main",
                &[LinkEnd::object("a")],
                &[LinkEnd::object("c")],
                LinkKind::NodeLink,
            )
            .unwrap();
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].trg, LinkEnd::port("c", "in"));
    }

    #[test]
    fn test_add_links_rejects_dangling_and_detached() {
        let mut canvas = loaded();
        let ghost = CanvasLink::new(
            "x",
            LinkKind::NodeLink,
            LinkEnd::port("a", "out"),
            LinkEnd::port("ghost", "in"),
        );
        assert!(matches!(
            canvas.add_links("main", vec![ghost]).unwrap_err(),
            CanvasError::DanglingLink { .. }
        ));

        let detached = CanvasLink::new(
            "d",
            LinkKind::NodeLink,
            LinkEnd::port("a", "out"),
            LinkEnd::Detached(Position::new(10.0, 10.0)),
        );
        assert!(canvas.add_links("main", vec![detached.clone()]).is_err());

        canvas.config.link_selection = LinkSelection::Detachable;
        canvas.add_links("main", vec![detached]).unwrap();
        assert!(canvas.get_link("main", "d").is_some());
    }

    #[test]
    fn test_reattach_target() {
        let mut canvas = loaded();
        canvas.set_node_data_link_trg_info("main", "ab", "c", None).unwrap();

        let link = canvas.get_link("main", "ab").unwrap();
        assert_eq!(link.trg, LinkEnd::port("c", "in"));
        assert!(canvas.set_node_data_link_src_info("main", "ab", "ghost", None).is_err());
    }

    #[test]
    fn test_comment_links() {
        let mut canvas = loaded();
        let comment = canvas.create_comment(Position::new(0.0, 0.0), "main").unwrap();
        let comment_id = comment.id.clone();
        canvas.add_comment(comment, "main").unwrap();

        let nodes = vec!["a".to_string(), "b".to_string()];
        let links = canvas
            .create_comment_links("main", &[comment_id.clone()], &nodes)
            .unwrap();
        assert_eq!(links.len(), 2);
        canvas.add_links("main", links).unwrap();

        assert!(canvas.get_comment_link_from_info("main", &comment_id, "a").is_some());
        let again = canvas
            .create_comment_links("main", &[comment_id], &nodes)
            .unwrap();
        assert!(again.is_empty());
    }
}
