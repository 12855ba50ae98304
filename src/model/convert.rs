// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 canvasflow contributors

//! Conversion between the pipeline-flow document and canvas structures
//!
//! Loading flattens the links nested in ports, node associations, comments
//! and detached-link lists into one link list per pipeline and lifts
//! `ui_data.style` entries out into the permanent style layer. Saving does the
//! reverse and only ever writes permanent styles.

use std::collections::HashMap;

use super::canvas::*;
use super::flow::*;
use crate::errors::{CanvasError, CanvasResult};
use crate::styles::{StyleKey, StyleLayers, StyleSpec};

/// A converted document: canvas structures plus the permanent styles it held
#[derive(Debug, Clone)]
pub struct LoadedFlow {
    pub info: CanvasInfo,
    pub styles: Vec<(StyleKey, StyleSpec)>,
}

/// Convert an upgraded document into canvas structures
pub fn flow_to_canvas(flow: PipelineFlow) -> CanvasResult<LoadedFlow> {
    let mut styles = Vec::new();
    let mut pipelines = Vec::with_capacity(flow.pipelines.len());

    for pipeline in flow.pipelines {
        pipelines.push(pipeline_to_canvas(pipeline, &mut styles)?);
    }

    let mut extra = flow.extra;
    extra.remove("json_schema");

    Ok(LoadedFlow {
        info: CanvasInfo {
            id: flow.id,
            primary_pipeline: flow.primary_pipeline,
            pipelines,
            extra,
        },
        styles,
    })
}

fn pipeline_to_canvas(
    pipeline: FlowPipeline,
    styles: &mut Vec<(StyleKey, StyleSpec)>,
) -> CanvasResult<CanvasPipeline> {
    let pipeline_id = pipeline.id;
    let mut nodes = Vec::with_capacity(pipeline.nodes.len());
    let mut data_links = Vec::new();
    let mut assoc_links = Vec::new();

    for mut flow_node in pipeline.nodes {
        let node_id = flow_node.id.clone();

        // Links nested in input ports become data links targeting this node
        for port in &mut flow_node.inputs {
            for link in port.links.drain(..) {
                let implied = ImpliedFields {
                    id: link.id.is_none(),
                    ..ImpliedFields::default()
                };
                let id = link.id.unwrap_or_else(|| {
                    generated_link_id(
                        &link.node_id_ref,
                        link.port_id_ref.as_deref(),
                        &node_id,
                        Some(&port.id),
                    )
                });
                if let Some(style) = link.app_data.ui_data.style {
                    styles.push((StyleKey::new(&pipeline_id, &id), style));
                }
                data_links.push(CanvasLink {
                    id,
                    kind: LinkKind::NodeLink,
                    src: LinkEnd::Object {
                        id: link.node_id_ref,
                        port: link.port_id_ref,
                    },
                    trg: LinkEnd::port(&node_id, &port.id),
                    class_name: link.app_data.ui_data.class_name,
                    decorations: link.app_data.ui_data.decorations,
                    extras: Extras {
                        object: link.extra,
                        app_data: link.app_data.extra,
                        ui_data: link.app_data.ui_data.extra,
                    },
                    implied,
                });
            }
        }

        for assoc in flow_node.app_data.ui_data.associations.drain(..) {
            if let Some(style) = assoc.style {
                styles.push((StyleKey::new(&pipeline_id, &assoc.id), style));
            }
            assoc_links.push(CanvasLink {
                id: assoc.id,
                kind: LinkKind::AssociationLink,
                src: LinkEnd::object(&node_id),
                trg: LinkEnd::object(assoc.node_ref),
                class_name: assoc.class_name,
                decorations: assoc.decorations,
                extras: Extras {
                    object: assoc.extra,
                    ..Extras::default()
                },
                implied: ImpliedFields::default(),
            });
        }

        if let Some(style) = flow_node.app_data.ui_data.style.take() {
            styles.push((StyleKey::new(&pipeline_id, &node_id), style));
        }

        nodes.push(flow_node_to_canvas(flow_node));
    }

    let ui = pipeline.app_data.ui_data;
    let mut comments = Vec::with_capacity(ui.comments.len());
    let mut comment_links = Vec::new();

    for comment in ui.comments {
        if let Some(style) = comment.style {
            styles.push((StyleKey::new(&pipeline_id, &comment.id), style));
        }
        for reference in comment.associated_id_refs {
            let implied = ImpliedFields {
                id: reference.id.is_none(),
                ..ImpliedFields::default()
            };
            let id = reference
                .id
                .unwrap_or_else(|| comment_link_id(&comment.id, &reference.node_ref));
            if let Some(style) = reference.style {
                styles.push((StyleKey::new(&pipeline_id, &id), style));
            }
            comment_links.push(CanvasLink {
                id,
                kind: LinkKind::CommentLink,
                src: LinkEnd::object(&comment.id),
                trg: LinkEnd::object(reference.node_ref),
                class_name: reference.class_name,
                decorations: Vec::new(),
                extras: Extras {
                    object: reference.extra,
                    ..Extras::default()
                },
                implied,
            });
        }
        comments.push(CanvasComment {
            id: comment.id,
            content: comment.content,
            position: Position::new(comment.x_pos, comment.y_pos),
            width: comment.width,
            height: comment.height,
            class_name: comment.class_name,
            extras: Extras {
                object: comment.extra,
                ..Extras::default()
            },
        });
    }

    let mut detached = Vec::with_capacity(ui.detached_links.len());
    for link in ui.detached_links {
        let src = detached_end(&link.id, link.src_node_id, link.src_port_id, link.src_pos, "src")?;
        let trg = detached_end(&link.id, link.trg_node_id, link.trg_port_id, link.trg_pos, "trg")?;
        if let Some(style) = link.style {
            styles.push((StyleKey::new(&pipeline_id, &link.id), style));
        }
        detached.push(CanvasLink {
            id: link.id,
            kind: LinkKind::NodeLink,
            src,
            trg,
            class_name: link.class_name,
            decorations: link.decorations,
            extras: Extras {
                object: link.extra,
                ..Extras::default()
            },
            implied: ImpliedFields::default(),
        });
    }

    let mut links = data_links;
    links.extend(assoc_links);
    links.extend(comment_links);
    links.extend(detached);

    Ok(CanvasPipeline {
        id: pipeline_id,
        runtime_ref: pipeline.runtime_ref,
        nodes,
        comments,
        links,
        zoom: ui.zoom,
        external_url: None,
        extras: Extras {
            object: pipeline.extra,
            app_data: pipeline.app_data.extra,
            ui_data: ui.extra,
        },
    })
}

fn detached_end(
    link_id: &str,
    node: Option<String>,
    port: Option<String>,
    pos: Option<Position>,
    prefix: &str,
) -> CanvasResult<LinkEnd> {
    match (node, pos) {
        (Some(id), _) => Ok(LinkEnd::Object { id, port }),
        (None, Some(pos)) => Ok(LinkEnd::Detached(pos)),
        (None, None) => Err(CanvasError::Schema {
            reason: format!(
                "detached link '{}' has neither {}_node_id nor {}_pos",
                link_id, prefix, prefix
            ),
            help: Some(format!("Anchor the {} end to a node or a canvas position", prefix)),
        }),
    }
}

/// Stable id for a document link that carries none
fn generated_link_id(
    src: &str,
    src_port: Option<&str>,
    trg: &str,
    trg_port: Option<&str>,
) -> String {
    format!(
        "{}_{}_{}_{}",
        src,
        src_port.unwrap_or_default(),
        trg,
        trg_port.unwrap_or_default()
    )
}

fn comment_link_id(comment_id: &str, node_id: &str) -> String {
    format!("{}-{}", comment_id, node_id)
}

/// Label shown for a node whose document gives none
fn implied_label(node_id: &str, op: Option<&str>) -> String {
    op.unwrap_or(node_id).to_string()
}

/// Convert a document node (or palette template) into a canvas node.
/// Port links and associations are not carried over.
pub fn flow_node_to_canvas(node: FlowNode) -> CanvasNode {
    let ui = node.app_data.ui_data;
    let kind = NodeKind::from_flow_type(&node.node_type);
    let implied = ImpliedFields {
        id: false,
        label: ui.label.is_none(),
        x_pos: ui.x_pos.is_none(),
        y_pos: ui.y_pos.is_none(),
    };
    let label = ui
        .label
        .unwrap_or_else(|| implied_label(&node.id, node.op.as_deref()));
    let size = match (ui.resize_width, ui.resize_height) {
        (Some(width), Some(height)) => Some(Size { width, height }),
        _ => None,
    };

    CanvasNode {
        id: node.id,
        kind,
        op: node.op,
        label,
        description: ui.description,
        image: ui.image,
        position: Position::new(ui.x_pos.unwrap_or_default(), ui.y_pos.unwrap_or_default()),
        size,
        class_name: ui.class_name,
        inputs: node.inputs.into_iter().map(flow_port_to_canvas).collect(),
        outputs: node.outputs.into_iter().map(flow_port_to_canvas).collect(),
        decorations: ui.decorations,
        messages: ui.messages,
        parameters: node.parameters,
        ui_parameters: ui.ui_parameters,
        subflow: node.subflow_ref.map(|s| SubflowRef {
            pipeline_id: s.pipeline_id_ref,
            url: s.url,
            extra: s.extra,
        }),
        expanded_in_place: ui.is_expanded,
        extras: Extras {
            object: node.extra,
            app_data: node.app_data.extra,
            ui_data: ui.extra,
        },
        implied,
    }
}

fn flow_port_to_canvas(port: FlowPort) -> Port {
    let ui = port.app_data.ui_data;
    Port {
        id: port.id,
        label: ui.label,
        cardinality: ui.cardinality,
        class_name: ui.class_name,
        extras: Extras {
            object: port.extra,
            app_data: port.app_data.extra,
            ui_data: ui.extra,
        },
    }
}

/// Serialize the local pipelines of `info` at the latest schema version,
/// embedding only permanent styles.
pub fn canvas_to_flow(info: &CanvasInfo, styles: &StyleLayers) -> PipelineFlow {
    let pipelines = info
        .pipelines
        .iter()
        .filter(|p| !p.is_external())
        .map(|p| pipeline_to_flow(p, styles))
        .collect();

    build_flow(&info.id, &info.primary_pipeline, pipelines, info.extra.clone())
}

/// Serialize an arbitrary set of pipelines as a standalone document
pub(crate) fn pipelines_to_flow<'a>(
    flow_id: &str,
    primary: &str,
    pipelines: impl Iterator<Item = &'a CanvasPipeline>,
    styles: &StyleLayers,
) -> PipelineFlow {
    let pipelines = pipelines.map(|p| pipeline_to_flow(p, styles)).collect();
    build_flow(flow_id, primary, pipelines, Opaque::new())
}

fn build_flow(
    id: &str,
    primary: &str,
    pipelines: Vec<FlowPipeline>,
    extra: Opaque,
) -> PipelineFlow {
    PipelineFlow {
        doc_type: FLOW_DOC_TYPE.to_string(),
        version: format!("{}.0", LATEST_FLOW_VERSION),
        json_schema: Some(FLOW_SCHEMA_URL.to_string()),
        id: id.to_string(),
        primary_pipeline: primary.to_string(),
        pipelines,
        extra,
    }
}

fn pipeline_to_flow(pipeline: &CanvasPipeline, styles: &StyleLayers) -> FlowPipeline {
    let permanent = |id: &str| styles.get(&StyleKey::new(&pipeline.id, id), false).cloned();
    let mut detached_links = Vec::new();
    let mut port_links: HashMap<(&str, &str), Vec<&CanvasLink>> = HashMap::new();
    let mut associations: HashMap<&str, Vec<&CanvasLink>> = HashMap::new();
    let mut comment_refs: HashMap<&str, Vec<&CanvasLink>> = HashMap::new();

    for link in &pipeline.links {
        let owners = match link.kind {
            LinkKind::NodeLink => None,
            LinkKind::AssociationLink => Some(&mut associations),
            LinkKind::CommentLink => Some(&mut comment_refs),
        };
        if let Some(owners) = owners {
            if let Some(owner) = link.src.object_id() {
                owners.entry(owner).or_default().push(link);
            }
            continue;
        }
        let attached = match (&link.src, &link.trg) {
            (LinkEnd::Object { .. }, LinkEnd::Object { id, port: Some(port) }) => pipeline
                .node(id)
                .and_then(|n| n.input_port(port))
                .map(|_| (id.as_str(), port.as_str())),
            _ => None,
        };
        match attached {
            Some(target) => port_links.entry(target).or_default().push(link),
            None => detached_links.push(detached_to_flow(link, permanent(&link.id))),
        }
    }

    let nodes = pipeline
        .nodes
        .iter()
        .map(|node| {
            let mut flow_node = canvas_node_to_flow(node);
            flow_node.app_data.ui_data.style = permanent(&node.id);

            for port in &mut flow_node.inputs {
                port.links = port_links
                    .get(&(node.id.as_str(), port.id.as_str()))
                    .into_iter()
                    .flatten()
                    .map(|link| port_link_to_flow(link, permanent(&link.id)))
                    .collect();
            }

            flow_node.app_data.ui_data.associations = associations
                .get(node.id.as_str())
                .into_iter()
                .flatten()
                .filter_map(|l| {
                    Some(FlowAssociation {
                        id: l.id.clone(),
                        node_ref: l.trg.object_id()?.to_string(),
                        class_name: l.class_name.clone(),
                        style: permanent(&l.id),
                        decorations: persistent_decorations(&l.decorations),
                        extra: l.extras.object.clone(),
                    })
                })
                .collect();

            flow_node
        })
        .collect();

    let comments = pipeline
        .comments
        .iter()
        .map(|comment| FlowComment {
            id: comment.id.clone(),
            x_pos: comment.position.x,
            y_pos: comment.position.y,
            width: comment.width,
            height: comment.height,
            content: comment.content.clone(),
            class_name: comment.class_name.clone(),
            style: permanent(&comment.id),
            associated_id_refs: comment_refs
                .get(comment.id.as_str())
                .into_iter()
                .flatten()
                .filter_map(|l| {
                    let node_ref = l.trg.object_id()?;
                    let implied = l.implied.id && l.id == comment_link_id(&comment.id, node_ref);
                    Some(FlowCommentRef {
                        id: (!implied).then(|| l.id.clone()),
                        node_ref: node_ref.to_string(),
                        class_name: l.class_name.clone(),
                        style: permanent(&l.id),
                        extra: l.extras.object.clone(),
                    })
                })
                .collect(),
            extra: comment.extras.object.clone(),
        })
        .collect();

    FlowPipeline {
        id: pipeline.id.clone(),
        runtime_ref: pipeline.runtime_ref.clone(),
        nodes,
        app_data: PipelineAppData {
            ui_data: PipelineUiData {
                comments,
                detached_links,
                zoom: pipeline.zoom,
                extra: pipeline.extras.ui_data.clone(),
            },
            extra: pipeline.extras.app_data.clone(),
        },
        extra: pipeline.extras.object.clone(),
    }
}

/// Convert a canvas node back to document shape, without links or style
fn canvas_node_to_flow(node: &CanvasNode) -> FlowNode {
    let implied = node.implied;
    let label = (!implied.label || node.label != implied_label(&node.id, node.op.as_deref()))
        .then(|| node.label.clone());
    let x_pos = (!implied.x_pos || node.position.x != 0.0).then_some(node.position.x);
    let y_pos = (!implied.y_pos || node.position.y != 0.0).then_some(node.position.y);

    FlowNode {
        id: node.id.clone(),
        node_type: node.kind.as_flow_type().to_string(),
        op: node.op.clone(),
        inputs: node.inputs.iter().map(canvas_port_to_flow).collect(),
        outputs: node.outputs.iter().map(canvas_port_to_flow).collect(),
        subflow_ref: node.subflow.as_ref().map(|s| FlowSubflowRef {
            pipeline_id_ref: s.pipeline_id.clone(),
            url: s.url.clone(),
            extra: s.extra.clone(),
        }),
        parameters: node.parameters.clone(),
        app_data: NodeAppData {
            ui_data: NodeUiData {
                label,
                description: node.description.clone(),
                image: node.image.clone(),
                x_pos,
                y_pos,
                resize_width: node.size.map(|s| s.width),
                resize_height: node.size.map(|s| s.height),
                class_name: node.class_name.clone(),
                style: None,
                decorations: persistent_decorations(&node.decorations),
                messages: node.messages.clone(),
                associations: Vec::new(),
                is_expanded: node.expanded_in_place,
                ui_parameters: node.ui_parameters.clone(),
                extra: node.extras.ui_data.clone(),
            },
            extra: node.extras.app_data.clone(),
        },
        extra: node.extras.object.clone(),
    }
}

fn canvas_port_to_flow(port: &Port) -> FlowPort {
    FlowPort {
        id: port.id.clone(),
        links: Vec::new(),
        app_data: PortAppData {
            ui_data: PortUiData {
                label: port.label.clone(),
                cardinality: port.cardinality,
                class_name: port.class_name.clone(),
                extra: port.extras.ui_data.clone(),
            },
            extra: port.extras.app_data.clone(),
        },
        extra: port.extras.object.clone(),
    }
}

fn port_link_to_flow(link: &CanvasLink, style: Option<StyleSpec>) -> FlowPortLink {
    let implied = link.implied.id
        && link.id
            == generated_link_id(
                link.src.object_id().unwrap_or_default(),
                link.src.port_id(),
                link.trg.object_id().unwrap_or_default(),
                link.trg.port_id(),
            );
    FlowPortLink {
        id: (!implied).then(|| link.id.clone()),
        node_id_ref: link.src.object_id().unwrap_or_default().to_string(),
        port_id_ref: link.src.port_id().map(String::from),
        app_data: LinkAppData {
            ui_data: LinkUiData {
                class_name: link.class_name.clone(),
                style,
                decorations: persistent_decorations(&link.decorations),
                extra: link.extras.ui_data.clone(),
            },
            extra: link.extras.app_data.clone(),
        },
        extra: link.extras.object.clone(),
    }
}

fn detached_to_flow(link: &CanvasLink, style: Option<StyleSpec>) -> FlowDetachedLink {
    let (src_node_id, src_port_id, src_pos) = split_end(&link.src);
    let (trg_node_id, trg_port_id, trg_pos) = split_end(&link.trg);
    FlowDetachedLink {
        id: link.id.clone(),
        src_node_id,
        src_port_id,
        src_pos,
        trg_node_id,
        trg_port_id,
        trg_pos,
        class_name: link.class_name.clone(),
        style,
        decorations: persistent_decorations(&link.decorations),
        extra: link.extras.object.clone(),
    }
}

fn split_end(end: &LinkEnd) -> (Option<String>, Option<String>, Option<Position>) {
    match end {
        LinkEnd::Object { id, port } => (Some(id.clone()), port.clone(), None),
        LinkEnd::Detached(pos) => (None, None, Some(*pos)),
    }
}

fn persistent_decorations(decorations: &[Decoration]) -> Vec<Decoration> {
    decorations.iter().filter(|d| !d.temporary).cloned().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_flow() -> PipelineFlow {
        serde_json::from_value(json!({
            "doc_type": "pipeline",
            "version": "3.0",
            "json_schema": FLOW_SCHEMA_URL,
            "id": "flow-1",
            "primary_pipeline": "main",
            "pipelines": [{
                "id": "main",
                "nodes": [
                    {
                        "id": "a",
                        "type": "execution_node",
                        "op": "source",
                        "outputs": [{"id": "out"}],
                        "app_data": {"ui_data": {
                            "label": "A", "x_pos": 10.0, "y_pos": 10.0,
                            "associations": [{"id": "as1", "node_ref": "b"}]
                        }}
                    },
                    {
                        "id": "b",
                        "type": "execution_node",
                        "op": "sink",
                        "inputs": [{
                            "id": "in",
                            "links": [{
                                "id": "l1",
                                "node_id_ref": "a",
                                "port_id_ref": "out",
                                "app_data": {"ui_data": {
                                    "style": {"body": {"default": "stroke: red"}}
                                }}
                            }, {
                                "id": "l2",
                                "node_id_ref": "a",
                                "port_id_ref": "out"
                            }]
                        }],
                        "app_data": {"ui_data": {
                            "label": "B", "x_pos": 200.0, "y_pos": 10.0,
                            "style": {"body": {"default": "fill: blue"}}
                        }}
                    }
                ],
                "app_data": {"ui_data": {
                    "comments": [{
                        "id": "c1", "x_pos": 0.0, "y_pos": 100.0, "width": 175.0, "height": 42.0,
                        "content": "hello",
                        "associated_id_refs": [{"id": "cl1", "node_ref": "a"}]
                    }],
                    "detached_links": [{
                        "id": "d1", "src_node_id": "a", "src_port_id": "out",
                        "trg_pos": {"x": 300.0, "y": 300.0}
                    }]
                }}
            }]
        }))
        .unwrap()
    }

    #[test]
    fn test_links_are_flattened() {
        let loaded = flow_to_canvas(sample_flow()).unwrap();
        let main = loaded.info.pipeline("main").unwrap();

        let l1 = main.link("l1").unwrap();
        assert_eq!(l1.kind, LinkKind::NodeLink);
        assert_eq!(l1.src, LinkEnd::port("a", "out"));
        assert_eq!(l1.trg, LinkEnd::port("b", "in"));

        assert_eq!(main.link("l2").unwrap().trg, LinkEnd::port("b", "in"));
        assert_eq!(main.link("as1").unwrap().kind, LinkKind::AssociationLink);
        assert_eq!(main.link("cl1").unwrap().kind, LinkKind::CommentLink);
        assert!(main.link("d1").unwrap().trg.is_detached());
    }

    #[test]
    fn test_styles_move_to_permanent_layer() {
        let loaded = flow_to_canvas(sample_flow()).unwrap();
        let keys: Vec<_> = loaded.styles.iter().map(|(k, _)| k.object_id.as_str()).collect();
        assert!(keys.contains(&"b"));
        assert!(keys.contains(&"l1"));
    }

    #[test]
    fn test_round_trip_is_lossless() {
        let flow = sample_flow();
        let loaded = flow_to_canvas(flow.clone()).unwrap();

        let mut styles = StyleLayers::default();
        for (key, spec) in loaded.styles {
            styles.set(key, spec, false);
        }

        let saved = canvas_to_flow(&loaded.info, &styles);
        assert_eq!(
            serde_json::to_value(&saved).unwrap(),
            serde_json::to_value(&flow).unwrap()
        );
    }

    #[test]
    fn test_absent_fields_stay_absent() {
        let doc = json!({
            "doc_type": "pipeline",
            "version": "3.0",
            "json_schema": FLOW_SCHEMA_URL,
            "id": "bare",
            "primary_pipeline": "main",
            "pipelines": [{
                "id": "main",
                "nodes": [
                    {"id": "a", "type": "execution_node", "op": "read", "outputs": [{"id": "out"}]},
                    {
                        "id": "b",
                        "type": "execution_node",
                        "op": "write",
                        "inputs": [{
                            "id": "in",
                            "links": [{"node_id_ref": "a", "port_id_ref": "out"}]
                        }]
                    }
                ],
                "app_data": {"ui_data": {"comments": [{
                    "id": "c1", "x_pos": 0.0, "y_pos": 0.0, "width": 100.0, "height": 40.0,
                    "content": "", "associated_id_refs": [{"node_ref": "b"}]
                }]}}
            }]
        });
        let loaded = flow_to_canvas(serde_json::from_value(doc.clone()).unwrap()).unwrap();
        let main = loaded.info.pipeline("main").unwrap();
        assert_eq!(main.node("a").unwrap().label, "read");
        assert!(main.link("a_out_b_in").is_some());

        let saved = canvas_to_flow(&loaded.info, &StyleLayers::default());
        assert_eq!(serde_json::to_value(&saved).unwrap(), doc);
    }

    #[test]
    fn test_changed_defaults_are_written() {
        let flow: PipelineFlow = serde_json::from_value(json!({
            "doc_type": "pipeline",
            "version": "3.0",
            "id": "bare",
            "primary_pipeline": "main",
            "pipelines": [{
                "id": "main",
                "nodes": [{"id": "a", "type": "execution_node", "op": "read"}]
            }]
        }))
        .unwrap();
        let mut loaded = flow_to_canvas(flow).unwrap();
        let node = &mut loaded.info.pipeline_mut("main").unwrap().nodes[0];
        node.label = "Reader".into();
        node.position = Position::new(40.0, 0.0);

        let saved = canvas_to_flow(&loaded.info, &StyleLayers::default());
        let ui = &saved.pipelines[0].nodes[0].app_data.ui_data;
        assert_eq!(ui.label.as_deref(), Some("Reader"));
        assert_eq!(ui.x_pos, Some(40.0));
        assert_eq!(ui.y_pos, None);
    }

    #[test]
    fn test_temporary_styles_never_serialized() {
        let loaded = flow_to_canvas(sample_flow()).unwrap();
        let mut styles = StyleLayers::default();
        styles.set(
            StyleKey::new("main", "a"),
            StyleSpec::with_body("fill: yellow"),
            true,
        );

        let saved = canvas_to_flow(&loaded.info, &styles);
        let a = &saved.pipelines[0].nodes[0];
        assert!(a.app_data.ui_data.style.is_none());
    }

    #[test]
    fn test_detached_link_needs_an_anchor() {
        let mut flow = sample_flow();
        flow.pipelines[0].app_data.ui_data.detached_links[0].src_node_id = None;
        let err = flow_to_canvas(flow).unwrap_err();
        assert!(matches!(err, CanvasError::Schema { .. }));
    }
}
