// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 canvasflow contributors

//! Controller behaviour through the public API

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use serde_json::{json, Value};

use canvasflow::model::{upgrade_flow, NodeKind};
use canvasflow::styles::StyleSpec;
use canvasflow::{
    CanvasController, CanvasError, CanvasHandlers, CanvasNode, EditActionData, EditPayload,
    PipelineFlow,
};

fn fixture(name: &str) -> Value {
    let path = format!("{}/tests/fixtures/{}", env!("CARGO_MANIFEST_DIR"), name);
    let text = std::fs::read_to_string(&path).unwrap();
    serde_json::from_str(&text).unwrap()
}

fn loaded(name: &str) -> CanvasController {
    let mut canvas = CanvasController::new();
    canvas.set_pipeline_flow(fixture(name)).unwrap();
    canvas
}

fn ids(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

fn as_value(flow: PipelineFlow) -> Value {
    serde_json::to_value(flow).unwrap()
}

// ─────────────────────────────────────────────────────────────────────────────
// Document round trip
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_round_trip_matches_document() {
    for name in ["chain.json", "nested.json"] {
        let canvas = loaded(name);
        let expected = as_value(upgrade_flow(fixture(name)).unwrap());
        assert_eq!(as_value(canvas.get_pipeline_flow()), expected, "{}", name);
    }
}

#[test]
fn test_round_trip_of_upgraded_document() {
    let canvas = loaded("legacy-v2.json");
    let flow = canvas.get_pipeline_flow();
    assert_eq!(flow.version, "3.0");

    let group = &flow.pipelines[0].nodes[0];
    assert_eq!(group.node_type, "super_node");
    assert_eq!(group.subflow_ref.as_ref().unwrap().pipeline_id_ref, "child");
    assert_eq!(flow.pipelines[0].nodes[1].node_type, "model_node");

    let mut reloaded = CanvasController::new();
    reloaded.set_pipeline_flow(serde_json::to_value(&flow).unwrap()).unwrap();
    assert_eq!(reloaded.get_pipeline_flow(), flow);
}

#[test]
fn test_rejected_document_keeps_model() {
    let mut canvas = loaded("chain.json");
    let err = canvas.set_pipeline_flow(fixture("cyclic.json")).unwrap_err();
    assert!(matches!(err, CanvasError::CircularSubflow { .. }));
    assert_eq!(canvas.get_pipeline_flow_id(), "chain-flow");
    assert_eq!(canvas.get_nodes("main").len(), 3);
}

#[test]
fn test_unknown_external_flow_is_absent() {
    let canvas = loaded("chain.json");
    assert!(canvas.get_external_pipeline_flow("https://flows.test/none.json").is_none());
}

// ─────────────────────────────────────────────────────────────────────────────
// Traversal and highlight
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_branch_is_union_of_upstream_downstream_and_seeds() {
    let canvas = loaded("chain.json");
    for seeds in [ids(&["A"]), ids(&["B"]), ids(&["C"]), ids(&["A", "C"])] {
        let branch = canvas.get_branch_nodes("main", &seeds);
        for seed in &seeds {
            assert!(branch.contains(seed));
        }

        let mut union: Vec<String> = canvas.get_upstream_nodes("main", &seeds);
        union.extend(canvas.get_downstream_nodes("main", &seeds));
        union.extend(seeds.iter().cloned());
        union.sort();
        union.dedup();

        let mut sorted = branch.clone();
        sorted.sort();
        assert_eq!(sorted, union);
    }
}

#[test]
fn test_highlight_chain() {
    let mut canvas = loaded("chain.json");

    let upstream = canvas.highlight_upstream("main", &ids(&["C"])).unwrap();
    assert_eq!(upstream.nodes, ids(&["A", "B", "C"]));
    assert_eq!(upstream.links, ids(&["A-B", "B-C"]));

    let downstream = canvas.highlight_downstream("main", &ids(&["A"])).unwrap();
    assert_eq!(downstream.nodes, ids(&["A", "B", "C"]));

    let only_seed = canvas.highlight_upstream("main", &ids(&["A"])).unwrap();
    assert_eq!(only_seed.nodes, ids(&["A"]));
    assert!(only_seed.links.is_empty());
}

#[test]
fn test_highlight_subdues_the_rest() {
    let mut canvas = loaded("chain.json");
    canvas.set_subdue_style(StyleSpec::with_body("opacity: 0.3"));

    canvas.highlight_upstream("main", &ids(&["A"])).unwrap();
    assert!(!canvas.get_node_style("main", "A", true).is_empty());
    assert_eq!(
        canvas.get_node_style("main", "C", true),
        StyleSpec::with_body("opacity: 0.3")
    );
    assert!(canvas.get_node_style("main", "C", false).is_empty());
}

// ─────────────────────────────────────────────────────────────────────────────
// Selection and styles
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_selecting_in_another_pipeline_clears_the_first() {
    let mut canvas = loaded("nested.json");
    canvas.set_selections(ids(&["source", "outer"]), Some("main")).unwrap();
    assert_eq!(canvas.get_selected_pipeline_id(), Some("main"));

    canvas.set_selections(ids(&["inner"]), Some("level1")).unwrap();
    assert_eq!(canvas.get_selected_pipeline_id(), Some("level1"));
    assert_eq!(canvas.get_selected_object_ids(), ids(&["inner"]));
    assert!(canvas.get_selected_nodes().iter().all(|n| n.id == "inner"));
}

#[test]
fn test_selection_defaults_to_displayed_pipeline() {
    let mut canvas = loaded("chain.json");
    canvas.set_selections(ids(&["B"]), None).unwrap();
    assert_eq!(canvas.get_selected_pipeline_id(), Some("main"));
}

#[test]
fn test_remove_temporary_styles_keeps_permanent() {
    let mut canvas = loaded("chain.json");
    let targets: HashMap<String, Vec<String>> = HashMap::from([("main".into(), ids(&["A"]))]);
    canvas
        .set_objects_style(&targets, StyleSpec::with_body("fill: green"), false)
        .unwrap();
    canvas
        .set_objects_style(&targets, StyleSpec::with_body("fill: yellow"), true)
        .unwrap();

    canvas.remove_all_styles(true);
    assert!(canvas.get_node_style("main", "A", true).is_empty());
    assert_eq!(
        canvas.get_node_style("main", "A", false),
        StyleSpec::with_body("fill: green")
    );
}

#[test]
fn test_style_setter_replaces_entry() {
    let mut canvas = loaded("chain.json");
    let targets: HashMap<String, Vec<String>> = HashMap::from([("main".into(), ids(&["A-B"]))]);
    let mut first = StyleSpec::with_body("stroke: red");
    first.label = StyleSpec::with_body("font-weight: bold").body;
    canvas.set_links_style(&targets, first, false).unwrap();
    canvas
        .set_links_style(&targets, StyleSpec::with_body("stroke: blue"), false)
        .unwrap();

    let style = canvas.get_link_style("main", "A-B", false);
    assert_eq!(style, StyleSpec::with_body("stroke: blue"));
    assert!(style.label.is_none());
}

#[test]
fn test_temporary_styles_not_serialized() {
    let mut canvas = loaded("chain.json");
    let targets: HashMap<String, Vec<String>> = HashMap::from([("main".into(), ids(&["B"]))]);
    canvas
        .set_objects_style(&targets, StyleSpec::with_body("fill: yellow"), true)
        .unwrap();

    let flow = canvas.get_pipeline_flow();
    let b = flow.pipelines[0].nodes.iter().find(|n| n.id == "B").unwrap();
    assert!(b.app_data.ui_data.style.is_none());
}

// ─────────────────────────────────────────────────────────────────────────────
// Command stack
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_undo_create_node_restores_selection() {
    let mut canvas = loaded("chain.json");
    canvas.set_selections(ids(&["A"]), Some("main")).unwrap();

    canvas
        .create_node_command(CanvasNode::execution("X", "Extra").at(400.0, 0.0), "main")
        .unwrap();
    canvas.set_selections(ids(&["X"]), Some("main")).unwrap();

    assert!(canvas.undo().unwrap());
    assert!(canvas.get_node("main", "X").is_none());
    assert_eq!(canvas.get_nodes("main").len(), 3);
    assert_eq!(canvas.get_selected_object_ids(), ids(&["A"]));

    assert!(canvas.redo().unwrap());
    let node = canvas.get_node("main", "X").unwrap();
    assert_eq!(node.label, "Extra");
    assert_eq!(canvas.get_nodes("main").len(), 4);
}

#[test]
fn test_delete_selected_only_touches_selection() {
    let mut canvas = loaded("chain.json");
    canvas
        .create_node_command(CanvasNode::execution("X", "Extra"), "main")
        .unwrap();
    canvas.set_selections(ids(&["C"]), Some("main")).unwrap();

    canvas.delete_selected_objects().unwrap();
    assert!(canvas.get_node("main", "X").is_some());
    assert!(canvas.get_node("main", "C").is_none());
    assert!(canvas.get_link("main", "B-C").is_none());
    assert!(canvas.get_selected_object_ids().is_empty());

    assert!(canvas.undo().unwrap());
    assert!(canvas.get_node("main", "C").is_some());
    assert!(canvas.get_link("main", "B-C").is_some());
}

/// The chain fixture with permanent styles on node A and link A-B
fn styled_chain() -> CanvasController {
    let mut doc = fixture("chain.json");
    let nodes = &mut doc["pipelines"][0]["nodes"];
    nodes[0]["app_data"]["ui_data"]["style"] = json!({"body": {"default": "fill: red"}});
    nodes[1]["inputs"][0]["links"][0]["app_data"] =
        json!({"ui_data": {"style": {"body": {"default": "stroke: red"}}}});

    let mut canvas = CanvasController::new();
    canvas.set_pipeline_flow(doc).unwrap();
    canvas
}

#[test]
fn test_undo_delete_restores_permanent_style() {
    let mut canvas = styled_chain();
    let before = as_value(canvas.get_pipeline_flow());

    canvas.set_selections(ids(&["A"]), Some("main")).unwrap();
    canvas.delete_selected_objects().unwrap();
    assert!(canvas.get_node_style("main", "A", false).is_empty());

    assert!(canvas.undo().unwrap());
    let style = canvas.get_node_style("main", "A", false);
    assert_eq!(style.body.unwrap().default.as_deref(), Some("fill: red"));
    assert_eq!(as_value(canvas.get_pipeline_flow()), before);

    assert!(canvas.redo().unwrap());
    assert!(canvas.get_node_style("main", "A", false).is_empty());
}

#[test]
fn test_undo_create_supernode_restores_permanent_style() {
    let mut canvas = styled_chain();
    let before = as_value(canvas.get_pipeline_flow());

    let supernode_id = canvas.create_supernode_command("main", ids(&["A", "B"])).unwrap();
    let child = canvas
        .get_node("main", &supernode_id)
        .and_then(|n| n.subflow_pipeline_id())
        .unwrap()
        .to_string();
    assert!(!canvas.get_node_style(&child, "A", false).is_empty());
    assert!(!canvas.get_link_style(&child, "A-B", false).is_empty());

    assert!(canvas.undo().unwrap());
    assert!(!canvas.get_node_style("main", "A", false).is_empty());
    assert!(!canvas.get_link_style("main", "A-B", false).is_empty());
    assert_eq!(as_value(canvas.get_pipeline_flow()), before);

    assert!(canvas.redo().unwrap());
    assert!(!canvas.get_node_style(&child, "A", false).is_empty());
    assert!(canvas.get_node_style("main", "A", false).is_empty());
}

#[test]
fn test_round_trip_of_minimal_document() {
    let doc = json!({
        "doc_type": "pipeline",
        "version": "3.0",
        "json_schema": canvasflow::model::FLOW_SCHEMA_URL,
        "id": "minimal",
        "primary_pipeline": "main",
        "pipelines": [{
            "id": "main",
            "nodes": [
                {"id": "a", "type": "execution_node", "op": "read", "outputs": [{"id": "out"}]},
                {
                    "id": "b",
                    "type": "execution_node",
                    "op": "write",
                    "inputs": [{"id": "in", "links": [{"node_id_ref": "a", "port_id_ref": "out"}]}]
                }
            ]
        }]
    });

    let mut canvas = CanvasController::new();
    canvas.set_pipeline_flow(doc.clone()).unwrap();
    assert_eq!(canvas.get_node("main", "a").unwrap().label, "read");
    assert_eq!(as_value(canvas.get_pipeline_flow()), doc);
}

#[test]
fn test_direct_mutations_are_not_recorded() {
    let mut canvas = loaded("chain.json");
    canvas.add_node(CanvasNode::execution("X", "Extra"), "main").unwrap();
    assert!(!canvas.can_undo());
}

#[test]
fn test_redo_cleared_by_new_command() {
    let mut canvas = loaded("chain.json");
    canvas
        .create_node_command(CanvasNode::execution("X", "Extra"), "main")
        .unwrap();
    canvas.undo().unwrap();
    assert!(canvas.can_redo());

    canvas
        .move_objects_command("main", ids(&["A"]), 10.0, 0.0)
        .unwrap();
    assert!(!canvas.can_redo());
    assert_eq!(canvas.get_undo_label().as_deref(), Some("Move objects"));
}

#[derive(Default)]
struct Recorder {
    seen: Rc<RefCell<Vec<String>>>,
    veto_moves: bool,
}

impl CanvasHandlers for Recorder {
    fn before_edit_action(
        &mut self,
        _canvas: &mut CanvasController,
        data: EditActionData,
    ) -> Option<EditActionData> {
        self.seen.borrow_mut().push(format!("before {}", data.edit_type()));
        if self.veto_moves && matches!(data.payload, EditPayload::MoveObjects { .. }) {
            return None;
        }
        Some(data)
    }

    fn edit_action(&mut self, _canvas: &mut CanvasController, data: &EditActionData) {
        self.seen.borrow_mut().push(format!("after {}", data.edit_type()));
    }
}

#[test]
fn test_handlers_wrap_each_command() {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let mut canvas = loaded("chain.json");
    canvas.set_handlers(Recorder {
        seen: Rc::clone(&seen),
        veto_moves: true,
    });

    canvas
        .create_node_command(CanvasNode::execution("X", "Extra"), "main")
        .unwrap();
    let err = canvas
        .move_objects_command("main", ids(&["X"]), 5.0, 5.0)
        .unwrap_err();
    assert!(matches!(err, CanvasError::EditVetoed { .. }));

    assert_eq!(
        *seen.borrow(),
        ids(&["before createNode", "after createNode", "before moveObjects"])
    );
    assert_eq!(canvas.get_undo_label().as_deref(), Some("Create node"));
}

// ─────────────────────────────────────────────────────────────────────────────
// Supernodes and navigation
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_ancestors_walk_to_primary() {
    let canvas = loaded("nested.json");
    assert_eq!(
        canvas.get_ancestor_pipeline_ids("level2"),
        ids(&["main", "level1", "level2"])
    );
    let (parent, supernode) = canvas.get_supernode_obj_referencing("level2").unwrap();
    assert_eq!(parent, "level1");
    assert_eq!(supernode.id, "inner");
}

#[test]
fn test_deleting_supernode_removes_subtree() {
    let mut canvas = loaded("nested.json");
    canvas.delete_node("main", "outer").unwrap();

    assert!(canvas.get_pipeline("level1").is_none());
    assert!(canvas.get_pipeline("level2").is_none());
    assert!(canvas.get_ancestor_pipeline_ids("level2").is_empty());
    assert!(canvas.get_link("main", "source-outer").is_none());
    assert_eq!(canvas.get_ancestor_pipeline_ids("main"), ids(&["main"]));
}

#[test]
fn test_breadcrumb_navigation() {
    let mut canvas = loaded("nested.json");

    let err = canvas.display_sub_pipeline("main").unwrap_err();
    assert!(matches!(err, CanvasError::InvalidOperation { .. }));
    let err = canvas
        .display_sub_pipeline_for_supernode("inner", "level1")
        .unwrap_err();
    assert!(matches!(err, CanvasError::InvalidOperation { .. }));
    assert!(canvas.display_sub_pipeline("nowhere").is_err());
    assert_eq!(canvas.get_current_pipeline_id(), "main");

    canvas.display_sub_pipeline_for_supernode("outer", "main").unwrap();
    canvas.display_sub_pipeline_for_supernode("inner", "level1").unwrap();
    let crumbs: Vec<&str> = canvas
        .get_breadcrumbs()
        .iter()
        .map(|b| b.pipeline_id.as_str())
        .collect();
    assert_eq!(crumbs, vec!["main", "level1", "level2"]);
    assert_eq!(canvas.get_current_breadcrumb().supernode_id.as_deref(), Some("inner"));

    assert!(canvas.display_previous_pipeline().unwrap());
    assert!(canvas.display_previous_pipeline().unwrap());
    assert!(!canvas.display_previous_pipeline().unwrap());
    assert_eq!(canvas.get_current_pipeline_id(), "main");
}

#[test]
fn test_create_supernode_and_undo() {
    let mut canvas = loaded("chain.json");
    canvas.set_selections(ids(&["A", "B"]), Some("main")).unwrap();
    assert!(canvas.are_selected_nodes_contiguous());

    let supernode_id = canvas.create_supernode_command("main", ids(&["A", "B"])).unwrap();
    let supernode = canvas.get_node("main", &supernode_id).unwrap();
    assert_eq!(supernode.kind, NodeKind::Supernode);
    let child = supernode.subflow_pipeline_id().unwrap().to_string();
    assert!(canvas.get_node(&child, "A").is_some());
    assert!(canvas.get_node("main", "A").is_none());

    assert!(canvas.undo().unwrap());
    assert!(canvas.get_pipeline(&child).is_none());
    assert!(canvas.get_link("main", "B-C").is_some());
    assert_eq!(canvas.get_nodes("main").len(), 3);
}

#[test]
fn test_non_contiguous_selection() {
    let mut canvas = loaded("chain.json");
    canvas.set_selections(ids(&["A", "C"]), Some("main")).unwrap();
    assert!(!canvas.are_selected_nodes_contiguous());

    let err = canvas
        .create_supernode_command("main", ids(&["A", "C"]))
        .unwrap_err();
    assert!(matches!(err, CanvasError::InvalidOperation { .. }));
    assert!(!canvas.can_undo());
}
