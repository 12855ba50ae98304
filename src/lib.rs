// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 canvasflow contributors

//! # canvasflow - Pipeline Canvas Controller
//!
//! `canvasflow` is the model and controller behind a flow-graph editor: it
//! holds a pipeline flow document of nested pipelines, nodes, comments and
//! links, and offers every operation an editor front end needs on top of it.
//!
//! ## Features
//!
//! - **Versioned documents** - Older pipeline flows and palettes are upgraded on load
//! - **Supernodes** - Nested and external sub-pipelines with breadcrumb navigation
//! - **Undo/redo** - Recorded edits with before/after host hooks and veto
//! - **Graph queries** - Upstream, downstream and branch traversal with highlighting
//! - **Styles** - Permanent and temporary style layers per object
//!
//! ## Quick Start
//!
//! ```bash
//! # Check documents
//! canvasflow validate flows/*.json
//!
//! # Bring a document up to the latest schema
//! canvasflow upgrade old-flow.json -o flow.json
//!
//! # Show the nodes feeding into a node
//! canvasflow branch flow.json --node sink --direction upstream
//! ```

pub mod cli;
pub mod commands;
pub mod config;
pub mod controller;
pub mod errors;
pub mod graph;
pub mod handlers;
pub mod model;
pub mod navigation;
pub mod notifications;
pub mod selection;
pub mod styles;
pub mod zoom;

// Re-export commonly used types
pub use commands::{EditActionData, EditPayload, EditSource, EditType};
pub use config::CanvasConfig;
pub use controller::{CanvasController, Highlight, PipelineObjectIds};
pub use errors::{CanvasError, CanvasResult};
pub use handlers::{CanvasHandlers, DefaultHandlers};
pub use model::{CanvasComment, CanvasInfo, CanvasLink, CanvasNode, CanvasPipeline, PipelineFlow};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
