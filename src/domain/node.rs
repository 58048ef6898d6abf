//! Document entities: the externally supplied mind-map tree.
//!
//! A document is owned by the caller and treated as immutable. Children are
//! held behind `Arc` so edits can rebuild the path to a changed node while
//! sharing every untouched subtree with the previous revision.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Caller-assigned node identifier, stable across edits.
pub type NodeId = String;

/// Opaque per-node metadata (scalar or list values).
pub type Metadata = BTreeMap<String, Value>;

/// Node category used by presentation layers for styling only.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum NodeKind {
    Root,
    Category,
    Subcategory,
    Detail,
    Custom(String),
}

impl NodeKind {
    pub fn as_str(&self) -> &str {
        match self {
            NodeKind::Root => "root",
            NodeKind::Category => "category",
            NodeKind::Subcategory => "subcategory",
            NodeKind::Detail => "detail",
            NodeKind::Custom(s) => s,
        }
    }
}

impl From<String> for NodeKind {
    fn from(s: String) -> Self {
        match s.as_str() {
            "root" => NodeKind::Root,
            "category" => NodeKind::Category,
            "subcategory" => NodeKind::Subcategory,
            "detail" => NodeKind::Detail,
            _ => NodeKind::Custom(s),
        }
    }
}

impl From<NodeKind> for String {
    fn from(kind: NodeKind) -> Self {
        match kind {
            NodeKind::Custom(s) => s,
            other => other.as_str().to_string(),
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One node of the document tree.
///
/// Interactive state (expanded/collapsed) is deliberately absent: it lives in
/// [`crate::domain::ExpansionState`]. An `expanded` key in incoming JSON is
/// ignored, and equality compares document content only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeNode {
    pub id: NodeId,
    #[serde(default, alias = "name", skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<NodeKind>,
    #[serde(default, skip_serializing_if = "Metadata::is_empty")]
    pub metadata: Metadata,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Arc<TreeNode>>,
}

impl TreeNode {
    pub fn new(id: impl Into<NodeId>) -> Self {
        Self {
            id: id.into(),
            label: None,
            summary: None,
            description: None,
            kind: None,
            metadata: Metadata::new(),
            children: Vec::new(),
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_kind(mut self, kind: NodeKind) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn with_child(mut self, child: TreeNode) -> Self {
        self.children.push(Arc::new(child));
        self
    }

    /// Fresh node with the defaults used by the "add node" action.
    pub fn new_detail() -> Self {
        Self {
            id: format!("node-{}", uuid::Uuid::new_v4()),
            label: Some("New Node".to_string()),
            summary: Some("Enter summary here".to_string()),
            description: Some("Enter description here".to_string()),
            kind: Some(NodeKind::Detail),
            metadata: Metadata::new(),
            children: Vec::new(),
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Label for display, falling back to a generic name.
    pub fn display_label(&self) -> &str {
        self.label.as_deref().unwrap_or("Node")
    }
}

impl fmt::Display for TreeNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.display_label(), self.id)
    }
}

/// Fields to merge into an existing node on edit-save. `None` keeps the
/// current value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodePatch {
    pub label: Option<String>,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub metadata: Option<Metadata>,
}

impl NodePatch {
    pub fn is_empty(&self) -> bool {
        self.label.is_none()
            && self.summary.is_none()
            && self.description.is_none()
            && self.metadata.is_none()
    }

    /// Copy of `node` with the patch fields applied. Children are shared.
    pub fn apply(&self, node: &TreeNode) -> TreeNode {
        let mut patched = node.clone();
        if let Some(label) = &self.label {
            patched.label = Some(label.clone());
        }
        if let Some(summary) = &self.summary {
            patched.summary = Some(summary.clone());
        }
        if let Some(description) = &self.description {
            patched.description = Some(description.clone());
        }
        if let Some(metadata) = &self.metadata {
            patched.metadata = metadata.clone();
        }
        patched
    }
}
