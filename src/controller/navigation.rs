// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 canvasflow contributors

//! Supernode navigation and external pipeline flows

use serde_json::Value;
use tracing::{debug, info};

use super::{CanvasController, ExternalFlow};
use crate::commands::{EditActionData, EditPayload};
use crate::errors::{CanvasError, CanvasResult};
use crate::graph::SubflowGraph;
use crate::model::{flow_to_canvas, upgrade_flow, FlowValidator, LoadedFlow, ObjectKind};
use crate::navigation::Breadcrumb;

impl CanvasController {
    /// Path from the primary pipeline to the displayed one
    pub fn get_breadcrumbs(&self) -> &[Breadcrumb] {
        self.breadcrumbs.as_slice()
    }

    pub fn get_current_breadcrumb(&self) -> &Breadcrumb {
        self.breadcrumbs.current()
    }

    /// Display `pipeline_id` full-page. External pipelines that are not
    /// loaded yet are fetched through the host's loader.
    pub fn display_sub_pipeline(&mut self, pipeline_id: &str) -> CanvasResult<()> {
        let current = self.get_current_pipeline_id();
        self.execute_edit(EditActionData::new(
            current,
            EditPayload::DisplaySubPipeline {
                target_pipeline_id: pipeline_id.to_string(),
                supernode_id: None,
            },
        ))
    }

    /// Display the pipeline held by a supernode of the displayed pipeline
    pub fn display_sub_pipeline_for_supernode(
        &mut self,
        supernode_id: &str,
        pipeline_id: &str,
    ) -> CanvasResult<()> {
        if pipeline_id != self.get_current_pipeline_id() {
            return Err(CanvasError::invalid(
                "display sub-pipeline",
                format!("pipeline '{}' is not the displayed pipeline", pipeline_id),
            ));
        }
        let node = self
            .get_node(pipeline_id, supernode_id)
            .ok_or_else(|| CanvasError::not_found(ObjectKind::Node, supernode_id, pipeline_id))?;
        let target = node.subflow_pipeline_id().map(str::to_string).ok_or_else(|| {
            CanvasError::invalid(
                "display sub-pipeline",
                format!("'{}' is not a supernode", supernode_id),
            )
        })?;

        self.execute_edit(EditActionData::new(
            pipeline_id,
            EditPayload::DisplaySubPipeline {
                target_pipeline_id: target,
                supernode_id: Some(supernode_id.to_string()),
            },
        ))
    }

    /// Go up one level. Returns false at the primary pipeline.
    pub fn display_previous_pipeline(&mut self) -> CanvasResult<bool> {
        if self.breadcrumbs.depth() <= 1 {
            return Ok(false);
        }
        let current = self.get_current_pipeline_id();
        self.execute_edit(EditActionData::new(current, EditPayload::DisplayPreviousPipeline))?;
        Ok(true)
    }

    pub(crate) fn navigate_to(
        &mut self,
        target: &str,
        supernode_id: Option<&str>,
    ) -> CanvasResult<()> {
        if target == self.get_current_pipeline_id() {
            return Err(CanvasError::invalid(
                "display sub-pipeline",
                format!("pipeline '{}' is already displayed", target),
            ));
        }
        if !self.info.contains_pipeline(target) {
            self.fetch_external(target)?;
        }

        let graph = SubflowGraph::build(&self.info);
        let chain = graph.ancestors(target);
        if chain.first().map(String::as_str) != Some(self.info.primary_pipeline.as_str()) {
            return Err(CanvasError::invalid(
                "display sub-pipeline",
                format!("pipeline '{}' is not reachable from the primary pipeline", target),
            ));
        }
        if let Some(supernode_id) = supernode_id {
            let holder = graph.parent_of(target).map(|p| p.supernode_id.as_str());
            if holder != Some(supernode_id) {
                return Err(CanvasError::invalid(
                    "display sub-pipeline",
                    format!("supernode '{}' does not hold pipeline '{}'", supernode_id, target),
                ));
            }
        }

        self.breadcrumbs.reset(&self.info.primary_pipeline);
        for pipeline_id in chain.iter().skip(1) {
            let parent = graph.parent_of(pipeline_id);
            let label = parent.and_then(|p| {
                self.info
                    .pipeline(&p.pipeline_id)
                    .and_then(|pl| pl.node(&p.supernode_id))
                    .map(|n| n.label.clone())
            });
            self.breadcrumbs.push(Breadcrumb {
                pipeline_id: pipeline_id.clone(),
                supernode_id: parent.map(|p| p.supernode_id.clone()),
                parent_pipeline_id: parent.map(|p| p.pipeline_id.clone()),
                label,
                external_url: self
                    .info
                    .pipeline(pipeline_id)
                    .and_then(|p| p.external_url.clone()),
            });
        }

        info!("Displaying pipeline '{}'", target);
        Ok(())
    }

    pub(crate) fn navigate_back(&mut self) {
        if self.breadcrumbs.pop() {
            debug!("Back to pipeline '{}'", self.breadcrumbs.current_pipeline_id());
        }
    }

    /// Load the external flow that provides `pipeline_id` via the URL on the
    /// supernode referencing it
    fn fetch_external(&mut self, pipeline_id: &str) -> CanvasResult<()> {
        let graph = SubflowGraph::build(&self.info);
        let url = graph
            .unresolved()
            .iter()
            .filter(|(_, missing)| missing == pipeline_id)
            .find_map(|(parent, _)| {
                self.info
                    .pipeline(&parent.pipeline_id)?
                    .node(&parent.supernode_id)?
                    .subflow
                    .as_ref()?
                    .url
                    .clone()
            })
            .ok_or_else(|| CanvasError::PipelineNotFound {
                id: pipeline_id.to_string(),
            })?;

        let doc = self
            .with_handlers(|h, _| h.load_external_flow(&url))
            .ok_or_else(|| {
                CanvasError::invalid("display sub-pipeline", format!("could not load '{}'", url))
            })?;
        self.load_external_pipeline_flow(&url, doc)?;

        if !self.info.contains_pipeline(pipeline_id) {
            return Err(CanvasError::invalid(
                "display sub-pipeline",
                format!("'{}' does not provide pipeline '{}'", url, pipeline_id),
            ));
        }
        Ok(())
    }

    /// Add the pipelines of an external flow document, replacing any loaded
    /// earlier from the same URL. Returns integrity warnings.
    pub fn load_external_pipeline_flow(
        &mut self,
        url: &str,
        doc: Value,
    ) -> CanvasResult<Vec<String>> {
        self.log_api("load_external_pipeline_flow", url);

        if !self.config.external_pipeline_flows {
            return Err(CanvasError::invalid(
                "load external flow",
                "external pipeline flows are disabled",
            ));
        }

        let LoadedFlow { info: external, styles } = flow_to_canvas(upgrade_flow(doc)?)?;
        let warnings = FlowValidator::check(&external)?;

        let previous = self
            .external_flows
            .get(url)
            .map(|f| f.pipeline_ids.clone())
            .unwrap_or_default();
        if let Some(clash) = external
            .pipelines
            .iter()
            .find(|p| self.info.contains_pipeline(&p.id) && !previous.contains(&p.id))
        {
            return Err(CanvasError::DuplicateId {
                kind: ObjectKind::Pipeline,
                id: clash.id.clone(),
                pipeline_id: url.to_string(),
            });
        }

        let mut combined = self.info.clone();
        combined.pipelines.retain(|p| !previous.contains(&p.id));
        let pipeline_ids: Vec<String> = external.pipelines.iter().map(|p| p.id.clone()).collect();
        for mut pipeline in external.pipelines {
            pipeline.external_url = Some(url.to_string());
            combined.pipelines.push(pipeline);
        }
        SubflowGraph::build(&combined).validate()?;

        self.info = combined;
        for id in &previous {
            self.styles.remove_pipeline(id);
            self.zooms.remove(id);
        }
        for (key, spec) in styles {
            self.styles.set(key, spec, false);
        }

        info!(
            "Loaded external flow '{}' from {} with {} pipeline(s)",
            external.id,
            url,
            pipeline_ids.len()
        );
        self.external_flows.insert(
            url.to_string(),
            ExternalFlow {
                flow_id: external.id,
                primary_pipeline: external.primary_pipeline,
                pipeline_ids,
            },
        );
        self.prune_stale_state();
        Ok(warnings)
    }

    /// Forget external flows whose pipelines are gone from the model
    pub(crate) fn drop_orphaned_external_flows(&mut self) {
        let info = &self.info;
        self.external_flows
            .retain(|_, flow| flow.pipeline_ids.iter().all(|id| info.contains_pipeline(id)));
    }
}
