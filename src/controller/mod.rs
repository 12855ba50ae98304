// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 canvasflow contributors

//! The canvas controller
//!
//! [`CanvasController`] owns the loaded pipelines and every piece of state
//! layered over them: styles, selection, breadcrumbs, the command stack,
//! notifications, palette, panels and zoom. All methods run synchronously;
//! mutations take `&mut self` and either apply completely or return an error
//! with nothing changed.
//!
//! The API is split over several files by concern; this one holds the
//! document-level operations.

mod edits;
mod links;
mod navigation;
mod objects;
mod palette;
mod selection;
mod traverse;
mod view;

pub use links::LinkProperties;
pub use objects::{CommentProperties, DecorationEntry, NodeProperties};
pub use traverse::Highlight;
pub use view::PanelState;

use serde_json::Value;
use std::collections::HashMap;
use tracing::{debug, info, warn};

use crate::commands::CommandStack;
use crate::config::{CanvasConfig, SaveZoom};
use crate::errors::{CanvasError, CanvasResult};
use crate::graph::SubflowGraph;
use crate::handlers::{CanvasHandlers, DefaultHandlers};
use crate::model::{
    canvas_to_flow, flow_to_canvas, pipelines_to_flow, upgrade_flow, CanvasInfo, CanvasPipeline,
    FlowValidator, LoadedFlow, MessageType, NodeMessage, PaletteData, PipelineFlow,
};
use crate::navigation::Breadcrumbs;
use crate::notifications::NotificationCenter;
use crate::selection::SelectionSet;
use crate::styles::{HighlightStyles, StyleKey, StyleLayers, StyleSpec};
use crate::zoom::{MemoryZoomStore, ZoomStore, ZoomTransform};

/// Object ids grouped by the pipeline that owns them
pub type PipelineObjectIds = HashMap<String, Vec<String>>;

/// Bookkeeping for a flow loaded from a separate document
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ExternalFlow {
    pub flow_id: String,
    pub primary_pipeline: String,
    pub pipeline_ids: Vec<String>,
}

/// A node message together with where it was found
#[derive(Debug, Clone, PartialEq)]
pub struct FlowMessage {
    pub pipeline_id: String,
    pub node_id: String,
    pub message: NodeMessage,
}

/// Controller for one canvas
pub struct CanvasController {
    pub(crate) config: CanvasConfig,
    pub(crate) info: CanvasInfo,
    pub(crate) external_flows: HashMap<String, ExternalFlow>,
    pub(crate) styles: StyleLayers,
    pub(crate) highlight: HighlightStyles,
    pub(crate) selection: SelectionSet,
    pub(crate) breadcrumbs: Breadcrumbs,
    pub(crate) stack: CommandStack,
    pub(crate) notifications: NotificationCenter,
    pub(crate) palette: PaletteData,
    pub(crate) palette_open: bool,
    pub(crate) panels: PanelState,
    pub(crate) zooms: HashMap<String, ZoomTransform>,
    pub(crate) zoom_store: Box<dyn ZoomStore>,
    handlers: Option<Box<dyn CanvasHandlers>>,
    logging: bool,
}

impl Default for CanvasController {
    fn default() -> Self {
        Self::new()
    }
}

impl CanvasController {
    pub fn new() -> Self {
        Self::with_config(CanvasConfig::default())
    }

    pub fn with_config(config: CanvasConfig) -> Self {
        let mut handlers = DefaultHandlers;
        let info = CanvasInfo::empty(handlers.generate_id(), handlers.generate_id());
        let breadcrumbs = Breadcrumbs::new(&info.primary_pipeline);

        Self {
            config,
            info,
            external_flows: HashMap::new(),
            styles: StyleLayers::default(),
            highlight: HighlightStyles::default(),
            selection: SelectionSet::default(),
            breadcrumbs,
            stack: CommandStack::new(),
            notifications: NotificationCenter::default(),
            palette: PaletteData::default(),
            palette_open: false,
            panels: PanelState::default(),
            zooms: HashMap::new(),
            zoom_store: Box::new(MemoryZoomStore::new()),
            handlers: None,
            logging: false,
        }
    }

    pub fn config(&self) -> &CanvasConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: CanvasConfig) {
        self.config = config;
    }

    /// Install host callbacks, replacing any set before
    pub fn set_handlers(&mut self, handlers: impl CanvasHandlers + 'static) {
        self.handlers = Some(Box::new(handlers));
    }

    /// Where zoom values go when `save_zoom` is `LocalStorage`
    pub fn set_zoom_store(&mut self, store: Box<dyn ZoomStore>) {
        self.zoom_store = store;
    }

    /// Run `f` with the installed handlers. Calls made from inside a
    /// handler back into the controller see the default handlers.
    pub(crate) fn with_handlers<R>(
        &mut self,
        f: impl FnOnce(&mut dyn CanvasHandlers, &mut Self) -> R,
    ) -> R {
        let mut handlers: Box<dyn CanvasHandlers> = self
            .handlers
            .take()
            .unwrap_or_else(|| Box::new(DefaultHandlers));
        let result = f(handlers.as_mut(), self);
        if self.handlers.is_none() {
            self.handlers = Some(handlers);
        }
        result
    }

    pub(crate) fn generate_id(&mut self) -> String {
        self.with_handlers(|h, _| h.generate_id())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Logging
    // ─────────────────────────────────────────────────────────────────────────

    pub fn get_logging_state(&self) -> bool {
        self.logging
    }

    pub fn set_logging_state(&mut self, enabled: bool) {
        self.logging = enabled;
    }

    pub(crate) fn log_api(&self, operation: &str, detail: impl std::fmt::Debug) {
        if self.logging {
            debug!(target: "canvasflow::api", "{} {:?}", operation, detail);
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Pipeline flow
    // ─────────────────────────────────────────────────────────────────────────

    /// Replace the whole model with `doc`, upgrading it to the latest schema
    /// first. Returns integrity warnings. On error nothing changes.
    pub fn set_pipeline_flow(&mut self, doc: Value) -> CanvasResult<Vec<String>> {
        self.log_api("set_pipeline_flow", ());

        let LoadedFlow { info, styles } = flow_to_canvas(upgrade_flow(doc)?)?;
        let warnings = FlowValidator::check(&info)?;

        info!(
            "Loaded pipeline flow '{}' with {} pipeline(s)",
            info.id,
            info.pipelines.len()
        );
        for warning in &warnings {
            warn!("{}", warning);
        }

        self.breadcrumbs.reset(&info.primary_pipeline);
        self.info = info;
        self.external_flows.clear();
        self.styles = StyleLayers::default();
        for (key, spec) in styles {
            self.styles.set(key, spec, false);
        }
        self.selection.clear();
        self.stack.clear();
        self.zooms.clear();

        Ok(warnings)
    }

    /// The model serialized at the latest schema version, permanent styles
    /// only, external pipelines excluded
    pub fn get_pipeline_flow(&self) -> PipelineFlow {
        canvas_to_flow(&self.info, &self.styles)
    }

    /// Reset to a single empty primary pipeline
    pub fn clear_pipeline_flow(&mut self) {
        self.log_api("clear_pipeline_flow", ());

        let flow_id = self.generate_id();
        let primary = self.generate_id();
        self.breadcrumbs.reset(&primary);
        self.info = CanvasInfo::empty(flow_id, primary);
        self.external_flows.clear();
        self.styles = StyleLayers::default();
        self.selection.clear();
        self.stack.clear();
        self.zooms.clear();
    }

    pub fn get_pipeline_flow_id(&self) -> &str {
        &self.info.id
    }

    pub fn get_primary_pipeline_id(&self) -> &str {
        &self.info.primary_pipeline
    }

    /// The live structures, local and external pipelines alike
    pub fn get_canvas_info(&self) -> &CanvasInfo {
        &self.info
    }

    /// The external flow previously loaded from `url`
    pub fn get_external_pipeline_flow(&self, url: &str) -> Option<PipelineFlow> {
        let flow = self.external_flows.get(url)?;
        let pipelines = self
            .info
            .pipelines
            .iter()
            .filter(|p| p.external_url.as_deref() == Some(url));
        Some(pipelines_to_flow(
            &flow.flow_id,
            &flow.primary_pipeline,
            pipelines,
            &self.styles,
        ))
    }

    /// Chain of pipeline ids from the primary pipeline down to
    /// `pipeline_id`, inclusive. Empty for an unknown pipeline.
    pub fn get_ancestor_pipeline_ids(&self, pipeline_id: &str) -> Vec<String> {
        SubflowGraph::build(&self.info).ancestors(pipeline_id)
    }

    /// Clear one style layer everywhere
    pub fn remove_all_styles(&mut self, temporary: bool) {
        self.log_api("remove_all_styles", temporary);
        self.styles.remove_all(temporary);
    }

    /// Style given to everything outside a highlighted branch
    pub fn set_subdue_style(&mut self, spec: StyleSpec) {
        self.highlight.set_subdue(spec);
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Pipelines
    // ─────────────────────────────────────────────────────────────────────────

    pub fn get_pipeline(&self, pipeline_id: &str) -> Option<&CanvasPipeline> {
        self.info.pipeline(pipeline_id)
    }

    /// The pipeline shown full-page
    pub fn get_current_pipeline_id(&self) -> String {
        self.breadcrumbs.current_pipeline_id().to_string()
    }

    pub fn is_pipeline_external(&self, pipeline_id: &str) -> bool {
        self.info
            .pipeline(pipeline_id)
            .map_or(false, |p| p.is_external())
    }

    /// Every node message in every local pipeline
    pub fn get_flow_messages(&self) -> Vec<FlowMessage> {
        self.info
            .pipelines
            .iter()
            .filter(|p| !p.is_external())
            .flat_map(|p| {
                p.nodes.iter().flat_map(move |n| {
                    n.messages.iter().map(move |m| FlowMessage {
                        pipeline_id: p.id.clone(),
                        node_id: n.id.clone(),
                        message: m.clone(),
                    })
                })
            })
            .collect()
    }

    /// True when no node carries a message of one of `types`
    pub fn is_flow_valid(&self, types: &[MessageType]) -> bool {
        !self
            .get_flow_messages()
            .iter()
            .any(|m| types.contains(&m.message.message_type))
    }

    pub(crate) fn pipeline_or_err(&self, pipeline_id: &str) -> CanvasResult<&CanvasPipeline> {
        self.info
            .pipeline(pipeline_id)
            .ok_or_else(|| CanvasError::PipelineNotFound {
                id: pipeline_id.to_string(),
            })
    }

    pub(crate) fn pipeline_mut_or_err(
        &mut self,
        pipeline_id: &str,
    ) -> CanvasResult<&mut CanvasPipeline> {
        self.info
            .pipeline_mut(pipeline_id)
            .ok_or_else(|| CanvasError::PipelineNotFound {
                id: pipeline_id.to_string(),
            })
    }

    /// Drop selection, style, zoom and breadcrumb state that refers to
    /// pipelines or objects no longer in the model
    pub(crate) fn prune_stale_state(&mut self) {
        let info = &self.info;

        self.breadcrumbs
            .retain_prefix(|crumb| info.contains_pipeline(&crumb.pipeline_id));
        self.styles.retain(|key: &StyleKey| {
            info.pipeline(&key.pipeline_id)
                .map_or(false, |p| p.contains_object(&key.object_id))
        });
        self.zooms.retain(|id, _| info.contains_pipeline(id));

        let mut selection = self.selection.clone();
        let changed = selection.retain(|pid, id| {
            info.pipeline(pid).map_or(false, |p| p.contains_object(id))
        });
        if changed {
            self.update_selection(selection);
        }
    }

    pub(crate) fn saves_zoom_in_flow(&self) -> bool {
        self.config.save_zoom == SaveZoom::PipelineFlow
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CanvasNode, NodeMessage};
    use serde_json::json;

    pub(crate) fn chain_flow() -> Value {
        json!({
            "doc_type": "pipeline",
            "version": "3.0",
            "id": "flow",
            "primary_pipeline": "main",
            "pipelines": [{
                "id": "main",
                "nodes": [
                    {"id": "a", "type": "execution_node", "outputs": [{"id": "out"}],
                     "app_data": {"ui_data": {"label": "A", "x_pos": 0.0, "y_pos": 0.0}}},
                    {"id": "b", "type": "execution_node",
                     "inputs": [{"id": "in", "links": [
                         {"id": "ab", "node_id_ref": "a", "port_id_ref": "out"}
                     ]}],
                     "outputs": [{"id": "out"}],
                     "app_data": {"ui_data": {"label": "B", "x_pos": 100.0, "y_pos": 0.0}}},
                    {"id": "c", "type": "execution_node",
                     "inputs": [{"id": "in", "links": [
                         {"id": "bc", "node_id_ref": "b", "port_id_ref": "out"}
                     ]}],
                     "app_data": {"ui_data": {"label": "C", "x_pos": 200.0, "y_pos": 0.0}}}
                ]
            }]
        })
    }

    #[test]
    fn test_new_controller_has_empty_primary() {
        let canvas = CanvasController::new();
        let primary = canvas.get_primary_pipeline_id().to_string();
        assert_eq!(canvas.get_current_pipeline_id(), primary);
        assert!(canvas.get_pipeline(&primary).unwrap().nodes.is_empty());
    }

    #[test]
    fn test_set_pipeline_flow_rejects_without_mutation() {
        let mut canvas = CanvasController::new();
        canvas.set_pipeline_flow(chain_flow()).unwrap();

        let err = canvas
            .set_pipeline_flow(json!({"doc_type": "pipeline", "version": "3.0", "id": "x"}))
            .unwrap_err();
        assert!(matches!(err, CanvasError::Schema { .. }));
        assert_eq!(canvas.get_pipeline_flow_id(), "flow");
        assert_eq!(canvas.get_pipeline("main").unwrap().nodes.len(), 3);
    }

    #[test]
    fn test_clear_pipeline_flow() {
        let mut canvas = CanvasController::new();
        canvas.set_pipeline_flow(chain_flow()).unwrap();
        canvas.clear_pipeline_flow();

        assert_eq!(canvas.get_canvas_info().pipelines.len(), 1);
        assert!(canvas.get_pipeline("main").is_none());
    }

    #[test]
    fn test_flow_messages() {
        let mut canvas = CanvasController::new();
        canvas.set_pipeline_flow(chain_flow()).unwrap();
        assert!(canvas.is_flow_valid(&[MessageType::Error]));

        let mut node: CanvasNode = canvas.get_pipeline("main").unwrap().node("a").unwrap().clone();
        node.messages.push(NodeMessage {
            id_ref: "param".into(),
            validation_id: None,
            message_type: MessageType::Warning,
            text: "check me".into(),
        });
        canvas.info.pipeline_mut("main").unwrap().nodes[0] = node;

        assert_eq!(canvas.get_flow_messages().len(), 1);
        assert!(canvas.is_flow_valid(&[MessageType::Error]));
        assert!(!canvas.is_flow_valid(&[MessageType::Error, MessageType::Warning]));
    }

    #[test]
    fn test_logging_toggle() {
        let mut canvas = CanvasController::new();
        assert!(!canvas.get_logging_state());
        canvas.set_logging_state(true);
        assert!(canvas.get_logging_state());
    }
}
