// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 canvasflow contributors

//! Schema upgrades for flow and palette documents
//!
//! Upgrades run on the raw JSON value, one version step at a time, before the
//! typed decode. Fields the upgrade steps do not touch are carried through as
//! they are.

use regex::Regex;
use serde_json::{Map, Value};
use tracing::debug;

use super::flow::{PipelineFlow, FLOW_DOC_TYPE, FLOW_SCHEMA_URL, LATEST_FLOW_VERSION};
use super::palette::{PaletteData, LATEST_PALETTE_VERSION};
use crate::errors::{CanvasError, CanvasResult};

const FLOW_SCHEMA_VERSION_PATTERN: &str = r"pipeline-flow-v(\d+)-schema\.json";

/// Read the schema version of a flow document.
///
/// Looks at `version` first (`"3"`, `"3.0"` or a number) and falls back to
/// the version embedded in the `json_schema` URL.
pub fn detect_version(doc: &Value) -> CanvasResult<u32> {
    if let Some(version) = doc.get("version") {
        return parse_version(version);
    }

    let schema = doc
        .get("json_schema")
        .and_then(Value::as_str)
        .ok_or_else(|| CanvasError::missing_field("version", "pipeline flow"))?;

    let pattern = Regex::new(FLOW_SCHEMA_VERSION_PATTERN)
        .map_err(|e| CanvasError::schema(format!("bad schema pattern: {}", e)))?;

    pattern
        .captures(schema)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok())
        .ok_or_else(|| CanvasError::Schema {
            reason: format!("cannot determine version from json_schema '{}'", schema),
            help: Some("Add a \"version\" field to the document".into()),
        })
}

fn parse_version(value: &Value) -> CanvasResult<u32> {
    let parsed = match value {
        Value::String(s) => s.split('.').next().and_then(|major| major.trim().parse().ok()),
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().map(|f| f.trunc() as u64))
            .and_then(|v| u32::try_from(v).ok()),
        _ => None,
    };

    match parsed {
        Some(v) if v > 0 => Ok(v),
        _ => Err(CanvasError::schema(format!("invalid version {}", value))),
    }
}

/// Upgrade a flow document of any supported version to the latest one and
/// decode it.
pub fn upgrade_flow(mut doc: Value) -> CanvasResult<PipelineFlow> {
    let root = doc
        .as_object_mut()
        .ok_or_else(|| CanvasError::schema("pipeline flow must be a JSON object"))?;

    match root.get("doc_type").and_then(Value::as_str) {
        Some(FLOW_DOC_TYPE) => {}
        Some(other) => {
            return Err(CanvasError::Schema {
                reason: format!("doc_type is '{}', expected '{}'", other, FLOW_DOC_TYPE),
                help: None,
            })
        }
        None => {
            root.insert("doc_type".into(), Value::from(FLOW_DOC_TYPE));
        }
    }

    for field in ["id", "primary_pipeline", "pipelines"] {
        if !root.contains_key(field) {
            return Err(CanvasError::missing_field(field, "pipeline flow"));
        }
    }
    if !root["pipelines"].is_array() {
        return Err(CanvasError::schema("'pipelines' must be an array"));
    }

    let version = detect_version(&doc)?;
    if version > LATEST_FLOW_VERSION {
        return Err(CanvasError::UnsupportedVersion {
            doc: "pipeline-flow",
            version: version.to_string(),
            latest: LATEST_FLOW_VERSION,
        });
    }

    let mut current = version;
    while current < LATEST_FLOW_VERSION {
        match current {
            1 => upgrade_flow_v1(&mut doc),
            2 => upgrade_flow_v2(&mut doc),
            _ => {}
        }
        current += 1;
    }
    if version != LATEST_FLOW_VERSION {
        debug!(from = version, to = LATEST_FLOW_VERSION, "Upgraded pipeline flow");
    }

    if let Some(root) = doc.as_object_mut() {
        root.insert("version".into(), Value::from(format!("{}.0", LATEST_FLOW_VERSION)));
        root.insert("json_schema".into(), Value::from(FLOW_SCHEMA_URL));
    }

    serde_json::from_value(doc).map_err(|e| CanvasError::Schema {
        reason: e.to_string(),
        help: Some("Check the document against the pipeline-flow v3 schema".into()),
    })
}

fn pipelines_mut(doc: &mut Value) -> impl Iterator<Item = &mut Map<String, Value>> {
    doc.get_mut("pipelines")
        .and_then(Value::as_array_mut)
        .into_iter()
        .flatten()
        .filter_map(Value::as_object_mut)
}

/// v1 comments referenced nodes by bare id strings
fn upgrade_flow_v1(doc: &mut Value) {
    for pipeline in pipelines_mut(doc) {
        let comments = pipeline
            .get_mut("app_data")
            .and_then(|a| a.get_mut("ui_data"))
            .and_then(|u| u.get_mut("comments"))
            .and_then(Value::as_array_mut);

        for comment in comments.into_iter().flatten() {
            let refs = comment
                .get_mut("associated_id_refs")
                .and_then(Value::as_array_mut);
            for reference in refs.into_iter().flatten() {
                if let Value::String(node_ref) = reference {
                    let node_ref = std::mem::take(node_ref);
                    *reference = serde_json::json!({ "node_ref": node_ref });
                }
            }
        }
    }
}

/// v2 used short node type names and bare subflow pipeline ids
fn upgrade_flow_v2(doc: &mut Value) {
    for pipeline in pipelines_mut(doc) {
        let nodes = pipeline.get_mut("nodes").and_then(Value::as_array_mut);
        for node in nodes.into_iter().flatten() {
            upgrade_node_v2(node);
        }
    }
}

fn upgrade_node_v2(node: &mut Value) {
    let Some(node) = node.as_object_mut() else {
        return;
    };

    let renamed = match node.get("type").and_then(Value::as_str) {
        Some("supernode") => Some("super_node"),
        Some("model") => Some("model_node"),
        _ => None,
    };
    if let Some(renamed) = renamed {
        node.insert("type".into(), Value::from(renamed));
    }

    if let Some(Value::String(pipeline_id)) = node.get("subflow_ref") {
        let pipeline_id = pipeline_id.clone();
        node.insert(
            "subflow_ref".into(),
            serde_json::json!({ "pipeline_id_ref": pipeline_id }),
        );
    }
}

/// Upgrade a palette document to the latest version and decode it.
///
/// Palettes without a version are treated as version 1.
pub fn upgrade_palette(mut doc: Value) -> CanvasResult<PaletteData> {
    if !doc.is_object() {
        return Err(CanvasError::schema("palette must be a JSON object"));
    }

    let version = match doc.get("version") {
        Some(v) => parse_version(v)?,
        None => 1,
    };
    if version > LATEST_PALETTE_VERSION {
        return Err(CanvasError::UnsupportedVersion {
            doc: "palette",
            version: version.to_string(),
            latest: LATEST_PALETTE_VERSION,
        });
    }

    if version < LATEST_PALETTE_VERSION {
        let categories = doc.get_mut("categories").and_then(Value::as_array_mut);
        for category in categories.into_iter().flatten() {
            let Some(category) = category.as_object_mut() else {
                continue;
            };
            rename_key(category, "category", "id");
            rename_key(category, "nodetypes", "node_types");

            let templates = category.get_mut("node_types").and_then(Value::as_array_mut);
            for template in templates.into_iter().flatten() {
                upgrade_node_v2(template);
            }
        }
        debug!(from = version, to = LATEST_PALETTE_VERSION, "Upgraded palette");
    }

    if let Some(root) = doc.as_object_mut() {
        root.insert("version".into(), Value::from(format!("{}.0", LATEST_PALETTE_VERSION)));
    }

    serde_json::from_value(doc).map_err(|e| CanvasError::Schema {
        reason: format!("invalid palette: {}", e),
        help: None,
    })
}

fn rename_key(object: &mut Map<String, Value>, from: &str, to: &str) {
    if object.contains_key(to) {
        return;
    }
    if let Some(value) = object.remove(from) {
        object.insert(to.to_string(), value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_detect_version_forms() {
        assert_eq!(detect_version(&json!({"version": "3.0"})).unwrap(), 3);
        assert_eq!(detect_version(&json!({"version": "2"})).unwrap(), 2);
        assert_eq!(detect_version(&json!({"version": 1})).unwrap(), 1);
        assert_eq!(
            detect_version(&json!({
                "json_schema": "http://example.com/pipeline-flow-v2-schema.json"
            }))
            .unwrap(),
            2
        );
        assert!(detect_version(&json!({})).is_err());
    }

    #[test]
    fn test_upgrade_v1_document() {
        let doc = json!({
            "doc_type": "pipeline",
            "version": "1.0",
            "id": "f",
            "primary_pipeline": "p",
            "pipelines": [{
                "id": "p",
                "nodes": [{"id": "s", "type": "supernode", "subflow_ref": "child"}],
                "app_data": {"ui_data": {"comments": [
                    {"id": "c", "content": "x", "associated_id_refs": ["s"]}
                ]}}
            }, {"id": "child", "nodes": []}]
        });

        let flow = upgrade_flow(doc).unwrap();
        assert_eq!(flow.version, "3.0");
        assert_eq!(flow.json_schema.as_deref(), Some(FLOW_SCHEMA_URL));

        let node = &flow.pipelines[0].nodes[0];
        assert_eq!(node.node_type, "super_node");
        assert_eq!(node.subflow_ref.as_ref().unwrap().pipeline_id_ref, "child");

        let comment = &flow.pipelines[0].app_data.ui_data.comments[0];
        assert_eq!(comment.associated_id_refs[0].node_ref, "s");
    }

    #[test]
    fn test_unknown_fields_survive_upgrade() {
        let doc = json!({
            "doc_type": "pipeline",
            "version": "2",
            "id": "f",
            "primary_pipeline": "p",
            "runtimes": [{"id": "r"}],
            "pipelines": [{"id": "p", "vendor": {"a": 1}}]
        });

        let flow = upgrade_flow(doc).unwrap();
        assert_eq!(flow.extra["runtimes"], json!([{"id": "r"}]));
        assert_eq!(flow.pipelines[0].extra["vendor"], json!({"a": 1}));
    }

    #[test]
    fn test_newer_version_rejected() {
        let doc = json!({
            "doc_type": "pipeline", "version": "4.0",
            "id": "f", "primary_pipeline": "p", "pipelines": []
        });
        assert!(matches!(
            upgrade_flow(doc),
            Err(CanvasError::UnsupportedVersion { .. })
        ));
    }

    #[test]
    fn test_missing_required_fields() {
        let doc = json!({"doc_type": "pipeline", "version": "3.0", "id": "f", "pipelines": []});
        let err = upgrade_flow(doc).unwrap_err();
        assert!(err.to_string().contains("primary_pipeline"));

        let doc = json!({"doc_type": "palette", "version": "3.0",
                         "id": "f", "primary_pipeline": "p", "pipelines": []});
        assert!(upgrade_flow(doc).is_err());
    }

    #[test]
    fn test_upgrade_v1_palette() {
        let doc = json!({
            "categories": [{
                "category": "io",
                "label": "Input/Output",
                "nodetypes": [{"id": "read", "type": "execution_node", "op": "read"}]
            }]
        });

        let palette = upgrade_palette(doc).unwrap();
        assert_eq!(palette.version, "3.0");
        assert_eq!(palette.categories[0].id, "io");
        assert_eq!(palette.categories[0].node_types[0].op.as_deref(), Some("read"));
    }
}
