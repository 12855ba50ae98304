// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 canvasflow contributors

//! Notifications, panels, menus, clicks, tooltips and zoom

use tracing::{debug, warn};

use super::CanvasController;
use crate::config::SaveZoom;
use crate::errors::{CanvasError, CanvasResult};
use crate::handlers::{
    ClickSource, ClickType, ContextMenuSource, ContextMenuTarget, DecorationSource, MenuItem,
    TooltipSource,
};
use crate::model::{CanvasPipeline, Decoration, ObjectKind};
use crate::notifications::{Notification, NotificationType};
use crate::zoom::{zoom_to_fit, zoom_to_reveal, Rect, Viewport, ZoomTransform};

/// Space kept around the content by zoom-to-fit
const FIT_PADDING: f64 = 30.0;

/// Open/closed state of the panels around the canvas
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PanelState {
    pub context_menu: Option<Vec<MenuItem>>,
    pub right_flyout_open: bool,
    pub bottom_panel_open: bool,
    pub bottom_panel_height: Option<f64>,
}

impl CanvasController {
    // ─────────────────────────────────────────────────────────────────────────
    // Notifications
    // ─────────────────────────────────────────────────────────────────────────

    pub fn set_notification_messages(&mut self, messages: Vec<Notification>) {
        self.notifications.set(messages);
    }

    pub fn clear_notification_messages(&mut self) {
        self.notifications.clear();
    }

    pub fn delete_notification_messages(&mut self, ids: &[String]) -> usize {
        self.notifications.delete(ids)
    }

    /// All messages, or only those of the given types
    pub fn get_notification_messages(
        &self,
        types: Option<&[NotificationType]>,
    ) -> Vec<&Notification> {
        self.notifications.get(types)
    }

    pub fn get_notification_messages_max_type(&self) -> Option<NotificationType> {
        self.notifications.max_type()
    }

    pub fn open_notification_panel(&mut self) {
        self.notifications.open_panel();
    }

    pub fn close_notification_panel(&mut self) {
        self.notifications.close_panel();
    }

    pub fn toggle_notification_panel(&mut self) {
        self.notifications.toggle_panel();
    }

    pub fn is_notification_panel_open(&self) -> bool {
        self.notifications.is_panel_open()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Context menu and panels
    // ─────────────────────────────────────────────────────────────────────────

    /// Build the menu for `source` and keep it open
    pub fn open_context_menu(&mut self, source: &ContextMenuSource) -> &[MenuItem] {
        let menu = self.context_menu_for(source);
        self.panels.context_menu.insert(menu).as_slice()
    }

    pub fn close_context_menu(&mut self) {
        self.panels.context_menu = None;
    }

    pub fn get_context_menu(&self) -> Option<&[MenuItem]> {
        self.panels.context_menu.as_deref()
    }

    /// The default menu for `source`, passed through the context-menu handler
    pub fn context_menu_for(&mut self, source: &ContextMenuSource) -> Vec<MenuItem> {
        let default_menu = self.default_context_menu(source);
        self.with_handlers(|h, _| h.context_menu(source, default_menu))
    }

    fn default_context_menu(&self, source: &ContextMenuSource) -> Vec<MenuItem> {
        let editing = self.config.editing_allowed();
        let pipeline = self.info.pipeline(&source.pipeline_id);
        let target = source
            .target_object_id
            .as_deref()
            .and_then(|id| pipeline.and_then(|p| p.node(id)));

        let mut menu = Vec::new();
        match source.target {
            ContextMenuTarget::Canvas => {
                if editing {
                    menu.push(MenuItem::action("createComment", "New comment"));
                }
                menu.push(MenuItem::action("selectAll", "Select all"));
                if editing {
                    menu.push(MenuItem::divider());
                    menu.push(undo_item("undo", "Undo", self.get_undo_label(), self.can_undo()));
                    menu.push(undo_item("redo", "Redo", self.get_redo_label(), self.can_redo()));
                }
            }
            ContextMenuTarget::Node => {
                if let Some(node) = target.filter(|n| n.is_supernode()) {
                    menu.push(MenuItem::action("displaySubPipeline", "Open supernode"));
                    if editing {
                        menu.push(if node.expanded_in_place {
                            MenuItem::action("collapseSuperNodeInPlace", "Collapse supernode")
                        } else {
                            MenuItem::action("expandSuperNodeInPlace", "Expand supernode")
                        });
                    }
                    menu.push(MenuItem::divider());
                }
                if editing && !source.selected_object_ids.is_empty() {
                    menu.push(MenuItem::action("createSuperNode", "Create supernode"));
                }
                menu.push(MenuItem {
                    submenu: vec![
                        MenuItem::action("highlightBranch", "Branch"),
                        MenuItem::action("highlightUpstream", "Upstream"),
                        MenuItem::action("highlightDownstream", "Downstream"),
                        MenuItem::action("unhighlight", "Unhighlight"),
                    ],
                    ..MenuItem::action("highlight", "Highlight")
                });
                if editing {
                    menu.push(MenuItem::divider());
                    menu.push(MenuItem::action("deleteSelectedObjects", "Delete"));
                }
            }
            ContextMenuTarget::Comment => {
                if editing {
                    menu.push(MenuItem::action("deleteSelectedObjects", "Delete"));
                }
            }
            ContextMenuTarget::Link => {
                if editing {
                    menu.push(MenuItem::action("deleteLink", "Delete link"));
                }
            }
            ContextMenuTarget::Port => {
                if editing {
                    menu.push(MenuItem::action("disconnectPort", "Disconnect"));
                }
            }
        }
        menu
    }

    pub fn open_right_flyout(&mut self) {
        self.panels.right_flyout_open = true;
    }

    pub fn close_right_flyout(&mut self) {
        self.panels.right_flyout_open = false;
    }

    pub fn is_right_flyout_open(&self) -> bool {
        self.panels.right_flyout_open
    }

    pub fn open_bottom_panel(&mut self) {
        self.panels.bottom_panel_open = true;
    }

    pub fn close_bottom_panel(&mut self) {
        self.panels.bottom_panel_open = false;
    }

    pub fn is_bottom_panel_open(&self) -> bool {
        self.panels.bottom_panel_open
    }

    pub fn set_bottom_panel_height(&mut self, height: f64) {
        self.panels.bottom_panel_height = Some(height.max(0.0));
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Clicks and tooltips
    // ─────────────────────────────────────────────────────────────────────────

    /// React to a click the way the canvas does, then pass it to the click
    /// handler
    pub fn handle_click(&mut self, source: &ClickSource) -> CanvasResult<()> {
        self.log_api("handle_click", source);

        match (source.click_type, source.id.as_deref()) {
            (ClickType::SingleClick, None) => self.clear_selections(),
            (ClickType::SingleClick, Some(id)) => {
                let ids = self.clicked_selection(&source.pipeline_id, id, source.extend);
                self.set_selections(ids, Some(&source.pipeline_id))?;
            }
            (ClickType::ContextMenu, Some(id)) => {
                if !self.selection.contains(&source.pipeline_id, id) {
                    self.set_selections(vec![id.to_string()], Some(&source.pipeline_id))?;
                }
            }
            (ClickType::ContextMenu, None) => {}
            (ClickType::DoubleClick, Some(id)) => {
                let is_supernode = source.object_kind == Some(ObjectKind::Node)
                    && self
                        .get_node(&source.pipeline_id, id)
                        .map_or(false, |n| n.is_supernode());
                if is_supernode {
                    self.display_sub_pipeline_for_supernode(id, &source.pipeline_id)?;
                }
            }
            (ClickType::DoubleClick, None) => {}
        }

        self.with_handlers(|h, canvas| h.click_action(canvas, source));
        Ok(())
    }

    fn clicked_selection(&self, pipeline_id: &str, id: &str, extend: bool) -> Vec<String> {
        if !extend {
            return vec![id.to_string()];
        }
        let mut ids = self.selection.ids_in(pipeline_id).to_vec();
        match ids.iter().position(|s| s == id) {
            Some(pos) => {
                ids.remove(pos);
            }
            None => ids.push(id.to_string()),
        }
        ids
    }

    pub fn handle_decoration_click(&mut self, source: &DecorationSource) -> CanvasResult<()> {
        self.find_decoration(&source.pipeline_id, &source.object_id, &source.decoration_id)?;
        debug!("Decoration '{}' clicked", source.decoration_id);
        self.with_handlers(|h, canvas| h.decoration_action(canvas, source));
        Ok(())
    }

    fn find_decoration(
        &self,
        pipeline_id: &str,
        object_id: &str,
        decoration_id: &str,
    ) -> CanvasResult<&Decoration> {
        let pipeline = self.pipeline_or_err(pipeline_id)?;
        let decorations = match pipeline.object_kind(object_id) {
            Some(ObjectKind::Node) => pipeline.node(object_id).map(|n| n.decorations.as_slice()),
            Some(ObjectKind::Link) => pipeline.link(object_id).map(|l| l.decorations.as_slice()),
            _ => None,
        }
        .ok_or_else(|| CanvasError::not_found(ObjectKind::Node, object_id, pipeline_id))?;

        decorations
            .iter()
            .find(|d| d.id == decoration_id)
            .ok_or_else(|| {
                CanvasError::not_found(ObjectKind::Decoration, decoration_id, pipeline_id)
            })
    }

    /// Tooltip text for an object, as adjusted by the tooltip handler
    pub fn get_tooltip_text(&mut self, source: &TooltipSource) -> Option<String> {
        let default_text = self.default_tooltip(source);
        self.with_handlers(|h, _| h.tooltip(source, default_text))
    }

    fn default_tooltip(&self, source: &TooltipSource) -> Option<String> {
        match source {
            TooltipSource::Node { pipeline_id, node_id } => {
                let node = self.get_node(pipeline_id, node_id)?;
                Some(node.description.clone().unwrap_or_else(|| node.label.clone()))
            }
            TooltipSource::Port {
                pipeline_id,
                node_id,
                port_id,
            } => {
                let node = self.get_node(pipeline_id, node_id)?;
                let port = node.input_port(port_id).or_else(|| node.output_port(port_id))?;
                Some(port.label.clone().unwrap_or_else(|| port.id.clone()))
            }
            TooltipSource::Link { pipeline_id, link_id } => {
                let pipeline = self.info.pipeline(pipeline_id)?;
                let link = pipeline.link(link_id)?;
                let name = |id: Option<&str>| {
                    id.and_then(|id| pipeline.node(id).map(|n| n.label.clone()))
                        .unwrap_or_else(|| "?".to_string())
                };
                Some(format!(
                    "{} to {}",
                    name(link.src.object_id()),
                    name(link.trg.object_id())
                ))
            }
            TooltipSource::Decoration {
                pipeline_id,
                object_id,
                decoration_id,
            } => self
                .find_decoration(pipeline_id, object_id, decoration_id)
                .ok()?
                .tooltip
                .clone(),
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Zoom
    // ─────────────────────────────────────────────────────────────────────────

    /// Zoom of the displayed pipeline
    pub fn get_zoom(&self) -> ZoomTransform {
        let pipeline_id = self.get_current_pipeline_id();
        self.zooms
            .get(&pipeline_id)
            .copied()
            .or_else(|| self.saved_zoom(&pipeline_id))
            .unwrap_or_default()
    }

    fn saved_zoom(&self, pipeline_id: &str) -> Option<ZoomTransform> {
        match self.config.save_zoom {
            SaveZoom::None => None,
            SaveZoom::LocalStorage => self.zoom_store.load(&self.info.id, pipeline_id),
            SaveZoom::PipelineFlow => self.info.pipeline(pipeline_id)?.zoom,
        }
    }

    /// Set the zoom of the displayed pipeline, within the configured bounds
    pub fn zoom_to(&mut self, zoom: ZoomTransform) -> ZoomTransform {
        let zoom = ZoomTransform {
            k: self.config.zoom.clamp(zoom.k),
            ..zoom
        };
        let pipeline_id = self.get_current_pipeline_id();
        self.zooms.insert(pipeline_id.clone(), zoom);

        match self.config.save_zoom {
            SaveZoom::None => {}
            SaveZoom::LocalStorage => {
                if let Err(e) = self.zoom_store.save(&self.info.id, &pipeline_id, zoom) {
                    warn!("Could not save zoom: {}", e);
                }
            }
            SaveZoom::PipelineFlow => {
                if let Some(pipeline) = self.info.pipeline_mut(&pipeline_id) {
                    pipeline.zoom = Some(zoom);
                }
            }
        }
        zoom
    }

    pub fn zoom_in(&mut self, viewport: Option<Viewport>) -> ZoomTransform {
        let limits = self.config.zoom;
        self.zoom_to(self.get_zoom().scaled(limits.factor, &limits, viewport))
    }

    pub fn zoom_out(&mut self, viewport: Option<Viewport>) -> ZoomTransform {
        let limits = self.config.zoom;
        self.zoom_to(self.get_zoom().scaled(1.0 / limits.factor, &limits, viewport))
    }

    pub fn translate_by(&mut self, dx: f64, dy: f64) -> ZoomTransform {
        self.zoom_to(self.get_zoom().translated(dx, dy))
    }

    /// Fit every node and comment of the displayed pipeline in `viewport`
    pub fn zoom_to_fit(&mut self, viewport: Viewport) -> ZoomTransform {
        let pipeline_id = self.get_current_pipeline_id();
        let content = self
            .info
            .pipeline(&pipeline_id)
            .and_then(|p| self.content_bounds(p, None));

        let zoom = match content {
            Some(rect) => zoom_to_fit(rect, viewport, FIT_PADDING, &self.config.zoom),
            None => ZoomTransform::default(),
        };
        self.zoom_to(zoom)
    }

    /// Zoom that brings the given objects of the displayed pipeline into
    /// view, centered at `x_pct`/`y_pct` percent of the viewport. `None`
    /// when they are already visible or none of them exist.
    pub fn get_zoom_to_reveal(
        &self,
        object_ids: &[String],
        viewport: Viewport,
        x_pct: Option<f64>,
        y_pct: Option<f64>,
    ) -> Option<ZoomTransform> {
        let pipeline = self.info.pipeline(&self.get_current_pipeline_id())?;
        let content = self.content_bounds(pipeline, Some(object_ids))?;
        zoom_to_reveal(content, self.get_zoom(), viewport, x_pct, y_pct, &self.config.zoom)
    }

    /// Forget every zoom kept for the canvas
    pub fn clear_saved_zoom_values(&mut self) -> CanvasResult<()> {
        self.zooms.clear();
        for pipeline in &mut self.info.pipelines {
            pipeline.zoom = None;
        }
        self.zoom_store.clear()
    }

    fn content_bounds(&self, pipeline: &CanvasPipeline, only: Option<&[String]>) -> Option<Rect> {
        let wanted = |id: &String| only.map_or(true, |ids| ids.contains(id));
        let nodes = pipeline.nodes.iter().filter(|n| wanted(&n.id)).map(|n| {
            let (width, height) = n
                .size
                .map(|s| (s.width, s.height))
                .unwrap_or((self.config.node_width, self.config.node_height));
            Rect::new(n.position.x, n.position.y, width, height)
        });
        let comments = pipeline
            .comments
            .iter()
            .filter(|c| wanted(&c.id))
            .map(|c| Rect::new(c.position.x, c.position.y, c.width, c.height));
        Rect::bounding(nodes.chain(comments))
    }
}

fn undo_item(action: &str, verb: &str, label: Option<String>, enabled: bool) -> MenuItem {
    let text = match label {
        Some(label) => format!("{}: {}", verb, label),
        None => verb.to_string(),
    };
    let item = MenuItem::action(action, text);
    if enabled {
        item
    } else {
        item.disabled()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StateTag;
    use crate::controller::tests::chain_flow;
    use crate::handlers::CanvasHandlers;

    fn loaded() -> CanvasController {
        let mut canvas = CanvasController::new();
        canvas.set_pipeline_flow(chain_flow()).unwrap();
        canvas
    }

    fn canvas_menu_source() -> ContextMenuSource {
        ContextMenuSource {
            target: ContextMenuTarget::Canvas,
            pipeline_id: "main".into(),
            target_object_id: None,
            port_id: None,
            selected_object_ids: Vec::new(),
            position: None,
        }
    }

    fn click(click_type: ClickType, id: Option<&str>, extend: bool) -> ClickSource {
        ClickSource {
            click_type,
            object_kind: id.map(|_| ObjectKind::Node),
            id: id.map(str::to_string),
            pipeline_id: "main".into(),
            extend,
        }
    }

    #[test]
    fn test_notifications() {
        let mut canvas = CanvasController::new();
        canvas.set_notification_messages(vec![
            Notification::new("1", NotificationType::Info, "saved"),
            Notification::new("2", NotificationType::Error, "failed"),
        ]);

        assert_eq!(canvas.get_notification_messages_max_type(), Some(NotificationType::Error));
        assert_eq!(canvas.get_notification_messages(Some(&[NotificationType::Info])).len(), 1);
        assert_eq!(canvas.delete_notification_messages(&["2".into()]), 1);

        canvas.toggle_notification_panel();
        assert!(canvas.is_notification_panel_open());
    }

    #[test]
    fn test_menu_hides_edits_when_locked() {
        let mut canvas = loaded();
        let menu = canvas.open_context_menu(&canvas_menu_source()).to_vec();
        assert!(menu.iter().any(|m| m.action.as_deref() == Some("createComment")));
        assert!(menu.iter().any(|m| m.action.as_deref() == Some("undo") && !m.enabled));

        canvas.config.state_tag = StateTag::ReadOnly;
        let menu = canvas.context_menu_for(&canvas_menu_source());
        assert!(menu.iter().all(|m| m.action.as_deref() != Some("createComment")));

        canvas.close_context_menu();
        assert!(canvas.get_context_menu().is_none());
    }

    struct ExtraItem;

    impl CanvasHandlers for ExtraItem {
        fn context_menu(
            &mut self,
            _source: &ContextMenuSource,
            mut menu: Vec<MenuItem>,
        ) -> Vec<MenuItem> {
            menu.push(MenuItem::action("custom", "Custom"));
            menu
        }
    }

    #[test]
    fn test_menu_handler_extends_default() {
        let mut canvas = loaded();
        canvas.set_handlers(ExtraItem);
        let menu = canvas.context_menu_for(&canvas_menu_source());
        assert_eq!(menu.last().and_then(|m| m.action.as_deref()), Some("custom"));
    }

    #[test]
    fn test_clicks_select() {
        let mut canvas = loaded();
        canvas.handle_click(&click(ClickType::SingleClick, Some("a"), false)).unwrap();
        canvas.handle_click(&click(ClickType::SingleClick, Some("b"), true)).unwrap();
        assert_eq!(canvas.get_selected_object_ids(), vec!["a".to_string(), "b".to_string()]);

        canvas.handle_click(&click(ClickType::ContextMenu, Some("a"), false)).unwrap();
        assert_eq!(canvas.get_selected_object_ids().len(), 2);

        canvas.handle_click(&click(ClickType::SingleClick, None, false)).unwrap();
        assert!(canvas.get_selected_object_ids().is_empty());
    }

    #[test]
    fn test_double_click_opens_supernode() {
        let mut canvas = loaded();
        let supernode = canvas.create_supernode_command("main", vec!["b".into()]).unwrap();
        canvas
            .handle_click(&click(ClickType::DoubleClick, Some(&supernode), false))
            .unwrap();
        assert_eq!(canvas.get_breadcrumbs().len(), 2);
    }

    #[test]
    fn test_tooltips() {
        let mut canvas = loaded();
        let node = TooltipSource::Node {
            pipeline_id: "main".into(),
            node_id: "a".into(),
        };
        let link = TooltipSource::Link {
            pipeline_id: "main".into(),
            link_id: "ab".into(),
        };
        assert_eq!(canvas.get_tooltip_text(&node).as_deref(), Some("A"));
        assert_eq!(canvas.get_tooltip_text(&link).as_deref(), Some("A to B"));
    }

    #[test]
    fn test_zoom_bounds_and_persistence() {
        let mut canvas = loaded();
        for _ in 0..20 {
            canvas.zoom_in(None);
        }
        assert!((canvas.get_zoom().k - 1.8).abs() < 1e-9);

        canvas.config.save_zoom = SaveZoom::PipelineFlow;
        let zoom = canvas.translate_by(10.0, 0.0);
        assert_eq!(canvas.get_pipeline("main").unwrap().zoom, Some(zoom));

        canvas.clear_saved_zoom_values().unwrap();
        assert_eq!(canvas.get_zoom(), ZoomTransform::default());
    }

    #[test]
    fn test_zoom_to_reveal() {
        let mut canvas = loaded();
        let viewport = Viewport::new(1000.0, 600.0);
        assert!(canvas.get_zoom_to_reveal(&["c".into()], viewport, None, None).is_none());

        canvas.translate_by(-5000.0, 0.0);
        let zoom = canvas.get_zoom_to_reveal(&["c".into()], viewport, None, None).unwrap();
        assert!(zoom.x > -5000.0);

        let fit = canvas.zoom_to_fit(viewport);
        assert!(fit.k <= canvas.config().zoom.max_scale);
    }
}
