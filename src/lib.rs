//! Mind-map engine.
//!
//! Lays out the visible part of a hierarchical document as a horizontal tidy
//! tree, keeps per-node expansion flags across document revisions and derives
//! pan/zoom/fit viewport transforms from the layout bounds.
//!
//! - [`domain`]: document model, expansion, layout, viewport, relations, engine
//! - [`application`]: document service and exports
//! - [`infrastructure`]: filesystem boundary and service wiring
//! - [`cli`]: the `mindmap` command line

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod infrastructure;
pub mod util;

pub use domain::{
    Bounds, Container, EngineUpdate, Layout, LayoutConfig, Link, MindMapEngine, NodePatch,
    PositionedNode, RelationSet, Transform, TreeNode, Viewport, ViewportConfig,
};
