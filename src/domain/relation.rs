//! Highlight set around a focused node.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::domain::layout::Link;
use crate::domain::node::NodeId;

/// The focused node plus its immediate parent and children.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RelationSet {
    focused: Option<NodeId>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl RelationSet {
    /// Nothing focused, nothing highlighted.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Scan `links` once for the parent link and the child links of `focused`.
    pub fn around(links: &[Link], focused: &str) -> Self {
        let mut parent = None;
        let mut children = Vec::new();
        for link in links {
            if link.target_id == focused && parent.is_none() {
                parent = Some(link.source_id.clone());
            }
            if link.source_id == focused {
                children.push(link.target_id.clone());
            }
        }
        Self {
            focused: Some(focused.to_string()),
            parent,
            children,
        }
    }

    pub fn focused(&self) -> Option<&str> {
        self.focused.as_deref()
    }

    pub fn parent(&self) -> Option<&str> {
        self.parent.as_deref()
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn contains(&self, id: &str) -> bool {
        self.focused.as_deref() == Some(id)
            || self.parent.as_deref() == Some(id)
            || self.children.iter().any(|c| c == id)
    }

    pub fn is_empty(&self) -> bool {
        self.focused.is_none()
    }

    /// All ids in the set, sorted.
    pub fn ids(&self) -> BTreeSet<&str> {
        self.focused
            .iter()
            .chain(self.parent.iter())
            .chain(self.children.iter())
            .map(String::as_str)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.ids().len()
    }
}

/// Relation set of `focused`, or the empty set when nothing is focused.
pub fn related_ids(links: &[Link], focused: Option<&str>) -> RelationSet {
    match focused {
        Some(id) => RelationSet::around(links, id),
        None => RelationSet::empty(),
    }
}
