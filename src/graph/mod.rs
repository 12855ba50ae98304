// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 canvasflow contributors

//! Graph structures over the document model
//!
//! `index` answers upstream/downstream/branch and contiguity queries within
//! one pipeline; `hierarchy` relates pipelines through supernodes.

mod hierarchy;
mod index;
mod render;

pub use hierarchy::{SubflowGraph, SubflowParent};
pub use index::{in_pipeline_order, PipelineIndex, TraversalDirection};
pub use render::{render, to_dot, to_mermaid, to_text, GraphFormat};
