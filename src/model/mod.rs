// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 canvasflow contributors

//! Document model
//!
//! Two representations of the same data live here: the serialized
//! pipeline-flow document (`flow`) and the live in-memory canvas structures
//! (`canvas`) the controller mutates. `convert` maps between them, `upgrade`
//! migrates older documents and `integrity` checks the invariants a loaded
//! document must satisfy before it replaces the current model.

mod canvas;
mod convert;
mod document;
mod flow;
mod integrity;
mod palette;
mod upgrade;

pub use canvas::*;
pub use convert::{canvas_to_flow, flow_node_to_canvas, flow_to_canvas, LoadedFlow};
pub(crate) use convert::pipelines_to_flow;
pub use document::{parse_document, read_document, render_document, DocumentFormat};
pub use flow::*;
pub use integrity::{FlowValidator, ValidationReport};
pub use palette::{PaletteCategory, PaletteData, LATEST_PALETTE_VERSION};
pub use upgrade::{detect_version, upgrade_flow, upgrade_palette};
