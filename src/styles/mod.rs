// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 canvasflow contributors

//! Style overlays
//!
//! Styles are kept apart from the objects they decorate, in two independent
//! layers keyed by `(pipeline id, object id)`. The permanent layer is written
//! into the document on save; the temporary layer lives only for the session.
//! Setting a style replaces the whole entry for that layer.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::model::Opaque;

/// Style of one visual element, per interaction state
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StateStyle {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hover: Option<String>,

    #[serde(flatten)]
    pub extra: Opaque,
}

impl StateStyle {
    pub fn new(default: impl Into<String>) -> Self {
        Self {
            default: Some(default.into()),
            ..Self::default()
        }
    }
}

/// A complete style spec for a node, comment or link.
///
/// Documents may also carry a bare CSS string; it is read into
/// `body.default` and written back in the same short form.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "StyleRepr", into = "StyleRepr")]
pub struct StyleSpec {
    pub body: Option<StateStyle>,
    pub image: Option<StateStyle>,
    pub label: Option<StateStyle>,
    pub selection_outline: Option<StateStyle>,
    pub extra: Opaque,
    inline: bool,
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum StyleRepr {
    Inline(String),
    Full(FullStyle),
}

#[derive(Serialize, Deserialize)]
struct FullStyle {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    body: Option<StateStyle>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    image: Option<StateStyle>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    label: Option<StateStyle>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    selection_outline: Option<StateStyle>,
    #[serde(flatten)]
    extra: Opaque,
}

impl From<StyleRepr> for StyleSpec {
    fn from(repr: StyleRepr) -> Self {
        match repr {
            StyleRepr::Inline(css) => Self {
                body: Some(StateStyle::new(css)),
                inline: true,
                ..Self::default()
            },
            StyleRepr::Full(full) => Self {
                body: full.body,
                image: full.image,
                label: full.label,
                selection_outline: full.selection_outline,
                extra: full.extra,
                inline: false,
            },
        }
    }
}

impl From<StyleSpec> for StyleRepr {
    fn from(spec: StyleSpec) -> Self {
        if spec.inline && spec.is_body_default_only() {
            if let Some(css) = spec.body.as_ref().and_then(|b| b.default.clone()) {
                return Self::Inline(css);
            }
        }
        Self::Full(FullStyle {
            body: spec.body,
            image: spec.image,
            label: spec.label,
            selection_outline: spec.selection_outline,
            extra: spec.extra,
        })
    }
}

impl StyleSpec {
    /// A spec that only styles the body in its default state
    pub fn with_body(css: impl Into<String>) -> Self {
        Self {
            body: Some(StateStyle::new(css)),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.body.is_none()
            && self.image.is_none()
            && self.label.is_none()
            && self.selection_outline.is_none()
            && self.extra.is_empty()
    }

    fn is_body_default_only(&self) -> bool {
        self.image.is_none()
            && self.label.is_none()
            && self.selection_outline.is_none()
            && self.extra.is_empty()
            && self
                .body
                .as_ref()
                .is_some_and(|b| b.hover.is_none() && b.extra.is_empty())
    }

    /// Overlay `top` on this spec, one sub-style at a time
    pub fn overlaid_with(&self, top: &StyleSpec) -> StyleSpec {
        let mut extra = self.extra.clone();
        extra.extend(top.extra.clone());
        StyleSpec {
            body: top.body.clone().or_else(|| self.body.clone()),
            image: top.image.clone().or_else(|| self.image.clone()),
            label: top.label.clone().or_else(|| self.label.clone()),
            selection_outline: top
                .selection_outline
                .clone()
                .or_else(|| self.selection_outline.clone()),
            extra,
            inline: false,
        }
    }
}

/// Address of a styled object
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StyleKey {
    pub pipeline_id: String,
    pub object_id: String,
}

impl StyleKey {
    pub fn new(pipeline_id: impl Into<String>, object_id: impl Into<String>) -> Self {
        Self {
            pipeline_id: pipeline_id.into(),
            object_id: object_id.into(),
        }
    }
}

/// One style assignment of a multi-style call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StyleEntry {
    pub pipeline_id: String,
    pub object_id: String,
    pub style: StyleSpec,
}

impl StyleEntry {
    pub fn new(
        pipeline_id: impl Into<String>,
        object_id: impl Into<String>,
        style: StyleSpec,
    ) -> Self {
        Self {
            pipeline_id: pipeline_id.into(),
            object_id: object_id.into(),
            style,
        }
    }

    pub fn key(&self) -> StyleKey {
        StyleKey::new(&self.pipeline_id, &self.object_id)
    }
}

/// A permanent entry that a command changed, with its value on each side
#[derive(Debug, Clone, PartialEq)]
pub struct StyleDelta {
    pub key: StyleKey,
    pub before: Option<StyleSpec>,
    pub after: Option<StyleSpec>,
}

/// Temporary and permanent style overlays
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StyleLayers {
    temporary: HashMap<StyleKey, StyleSpec>,
    permanent: HashMap<StyleKey, StyleSpec>,
}

impl StyleLayers {
    fn layer(&self, temporary: bool) -> &HashMap<StyleKey, StyleSpec> {
        if temporary {
            &self.temporary
        } else {
            &self.permanent
        }
    }

    fn layer_mut(&mut self, temporary: bool) -> &mut HashMap<StyleKey, StyleSpec> {
        if temporary {
            &mut self.temporary
        } else {
            &mut self.permanent
        }
    }

    /// Replace the entry for `key` in one layer
    pub fn set(&mut self, key: StyleKey, spec: StyleSpec, temporary: bool) {
        self.layer_mut(temporary).insert(key, spec);
    }

    pub fn get(&self, key: &StyleKey, temporary: bool) -> Option<&StyleSpec> {
        self.layer(temporary).get(key)
    }

    pub fn remove(&mut self, key: &StyleKey, temporary: bool) -> Option<StyleSpec> {
        self.layer_mut(temporary).remove(key)
    }

    /// Clear one layer entirely
    pub fn remove_all(&mut self, temporary: bool) {
        self.layer_mut(temporary).clear();
    }

    /// Clear one layer within a single pipeline
    pub fn remove_all_in_pipeline(&mut self, pipeline_id: &str, temporary: bool) {
        self.layer_mut(temporary)
            .retain(|key, _| key.pipeline_id != pipeline_id);
    }

    /// Drop both layers' entries for the given objects
    pub fn remove_objects(&mut self, pipeline_id: &str, object_ids: &[String]) {
        let gone = |key: &StyleKey| {
            key.pipeline_id == pipeline_id && object_ids.contains(&key.object_id)
        };
        self.temporary.retain(|key, _| !gone(key));
        self.permanent.retain(|key, _| !gone(key));
    }

    /// Re-key both layers' entries for objects that moved to another pipeline
    pub fn move_objects(&mut self, from: &str, to: &str, object_ids: &[String]) {
        for layer in [&mut self.temporary, &mut self.permanent] {
            for id in object_ids {
                if let Some(spec) = layer.remove(&StyleKey::new(from, id)) {
                    layer.insert(StyleKey::new(to, id), spec);
                }
            }
        }
    }

    /// Drop both layers' entries for a whole pipeline
    pub fn remove_pipeline(&mut self, pipeline_id: &str) {
        self.temporary.retain(|key, _| key.pipeline_id != pipeline_id);
        self.permanent.retain(|key, _| key.pipeline_id != pipeline_id);
    }

    /// Keep only entries whose key passes `keep`
    pub fn retain(&mut self, mut keep: impl FnMut(&StyleKey) -> bool) {
        self.temporary.retain(|key, _| keep(key));
        self.permanent.retain(|key, _| keep(key));
    }

    /// Permanent style with the temporary one laid over it
    pub fn effective(&self, key: &StyleKey) -> StyleSpec {
        match (self.permanent.get(key), self.temporary.get(key)) {
            (Some(base), Some(top)) => base.overlaid_with(top),
            (Some(only), None) | (None, Some(only)) => only.clone(),
            (None, None) => StyleSpec::default(),
        }
    }

    /// Permanent entries that differ between `earlier` and now, in key order
    pub fn permanent_changes(&self, earlier: &StyleLayers) -> Vec<StyleDelta> {
        let mut deltas: Vec<StyleDelta> = earlier
            .permanent
            .iter()
            .filter(|(key, spec)| self.permanent.get(*key) != Some(*spec))
            .map(|(key, spec)| StyleDelta {
                key: key.clone(),
                before: Some(spec.clone()),
                after: self.permanent.get(key).cloned(),
            })
            .collect();
        deltas.extend(
            self.permanent
                .iter()
                .filter(|(key, _)| !earlier.permanent.contains_key(*key))
                .map(|(key, spec)| StyleDelta {
                    key: key.clone(),
                    before: None,
                    after: Some(spec.clone()),
                }),
        );
        deltas.sort_by(|a, b| a.key.cmp(&b.key));
        deltas
    }

    /// Put one permanent entry back to a recorded value
    pub fn restore_permanent(&mut self, key: &StyleKey, spec: Option<&StyleSpec>) {
        match spec {
            Some(spec) => {
                self.permanent.insert(key.clone(), spec.clone());
            }
            None => {
                self.permanent.remove(key);
            }
        }
    }

    pub fn len(&self, temporary: bool) -> usize {
        self.layer(temporary).len()
    }

    pub fn is_empty(&self) -> bool {
        self.temporary.is_empty() && self.permanent.is_empty()
    }
}

/// Styles applied by the highlight operations
#[derive(Debug, Clone, PartialEq)]
pub struct HighlightStyles {
    pub node: StyleSpec,
    pub link: StyleSpec,
    pub subdued_node: StyleSpec,
    pub subdued_link: StyleSpec,
}

impl Default for HighlightStyles {
    fn default() -> Self {
        Self {
            node: StyleSpec {
                body: Some(StateStyle::new("stroke: #0f62fe; stroke-width: 2")),
                selection_outline: Some(StateStyle::new("stroke: #0f62fe")),
                ..StyleSpec::default()
            },
            link: StyleSpec::with_body("stroke: #0f62fe; stroke-width: 2"),
            subdued_node: StyleSpec::with_body("opacity: 0.3"),
            subdued_link: StyleSpec::with_body("opacity: 0.3"),
        }
    }
}

impl HighlightStyles {
    /// Use one spec for everything outside the highlighted set
    pub fn set_subdue(&mut self, spec: StyleSpec) {
        self.subdued_node = spec.clone();
        self.subdued_link = spec;
    }
}
