//! Domain layer: document model and the mind-map engine
//!
//! This layer is independent of external concerns (no I/O, no CLI, no config loading).

pub mod arena;
pub mod engine;
pub mod error;
pub mod expansion;
pub mod layout;
pub mod node;
pub mod relation;
pub mod tree;
pub mod validate;
pub mod viewport;

pub use arena::{VisibleNode, VisibleTree};
pub use engine::{EngineUpdate, MindMapEngine};
pub use error::{DomainError, DomainResult};
pub use expansion::{ExpansionMap, ExpansionState, ReconciledTree, Transition};
pub use layout::{
    layout, layout_reconciled, Bounds, Layout, LayoutConfig, Link, Point, PositionedNode,
};
pub use node::{Metadata, NodeId, NodeKind, NodePatch, TreeNode};
pub use relation::{related_ids, RelationSet};
pub use tree::{count_nodes, find_by_id, insert_child, replace_by_id};
pub use validate::validate_document;
pub use viewport::{Container, PointerButton, Transform, ViewMode, Viewport, ViewportConfig};
