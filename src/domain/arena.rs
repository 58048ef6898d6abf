//! Arena holding the visible part of a reconciled document.
//!
//! The layout walk needs parent links, sibling order and per-node scratch
//! state, none of which the `Arc`-shared document carries. Building a
//! [`VisibleTree`] once per layout gives index-based access to all of that
//! while the document itself stays immutable.

use std::sync::Arc;

use generational_arena::{Arena, Index};
use tracing::instrument;

use crate::domain::expansion::{ExpansionMap, ReconciledTree};
use crate::domain::node::TreeNode;

/// A visible document node placed in the arena.
#[derive(Debug)]
pub struct VisibleNode {
    /// Shared document node; its `children` include hidden ones.
    pub node: Arc<TreeNode>,
    pub depth: usize,
    pub expanded: bool,
    /// Index of parent node in the arena, None for the root
    pub parent: Option<Index>,
    /// Visible children only, in document order
    pub children: Vec<Index>,
}

impl VisibleNode {
    pub fn id(&self) -> &str {
        &self.node.id
    }

    /// Number of document children, visible or not.
    pub fn child_count(&self) -> usize {
        self.node.children.len()
    }
}

/// Arena-based tree of the nodes reachable from the root through expanded
/// ancestors only.
#[derive(Debug, Default)]
pub struct VisibleTree {
    arena: Arena<VisibleNode>,
    root: Option<Index>,
}

impl VisibleTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Collect the visible nodes of `document`. A node's children are added
    /// only when its flag in `expansion` is set, the root included.
    #[instrument(level = "debug", skip_all, fields(root = %document.id))]
    pub fn from_document(document: &Arc<TreeNode>, expansion: &ExpansionMap) -> Self {
        let mut tree = Self::new();
        let mut stack: Vec<(Arc<TreeNode>, Option<Index>, usize)> =
            vec![(Arc::clone(document), None, 0)];

        while let Some((node, parent, depth)) = stack.pop() {
            let expanded = expansion.is_expanded(&node.id);
            let children = if expanded {
                node.children.clone()
            } else {
                Vec::new()
            };
            let idx = tree.insert_node(node, parent, depth, expanded);
            // Push children in reverse order for left-to-right insertion
            for child in children.into_iter().rev() {
                stack.push((child, Some(idx), depth + 1));
            }
        }
        tree
    }

    pub fn from_reconciled(reconciled: &ReconciledTree) -> Self {
        Self::from_document(&reconciled.document, &reconciled.expansion)
    }

    #[instrument(level = "trace", skip(self, node))]
    pub fn insert_node(
        &mut self,
        node: Arc<TreeNode>,
        parent: Option<Index>,
        depth: usize,
        expanded: bool,
    ) -> Index {
        let visible = VisibleNode {
            node,
            depth,
            expanded,
            parent,
            children: Vec::new(),
        };
        let node_idx = self.arena.insert(visible);

        if let Some(parent_idx) = parent {
            if let Some(parent) = self.arena.get_mut(parent_idx) {
                parent.children.push(node_idx);
            }
        } else {
            self.root = Some(node_idx);
        }

        node_idx
    }

    pub fn get_node(&self, idx: Index) -> Option<&VisibleNode> {
        self.arena.get(idx)
    }

    pub fn root(&self) -> Option<Index> {
        self.root
    }

    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    /// Pre-order, children left to right.
    pub fn iter(&self) -> PreOrderIter<'_> {
        PreOrderIter::new(self)
    }

    /// Post-order, children left to right.
    pub fn iter_postorder(&self) -> PostOrderIter<'_> {
        PostOrderIter::new(self)
    }

    /// Number of visible levels; 0 for an empty tree.
    #[instrument(level = "debug", skip(self))]
    pub fn depth(&self) -> usize {
        self.iter().map(|(_, n)| n.depth + 1).max().unwrap_or(0)
    }

    /// Ids of visible nodes without visible children.
    pub fn leaf_ids(&self) -> Vec<&str> {
        self.iter()
            .filter(|(_, n)| n.children.is_empty())
            .map(|(_, n)| n.id())
            .collect()
    }
}

pub struct PreOrderIter<'a> {
    tree: &'a VisibleTree,
    stack: Vec<Index>,
}

impl<'a> PreOrderIter<'a> {
    fn new(tree: &'a VisibleTree) -> Self {
        let stack = tree.root().into_iter().collect();
        Self { tree, stack }
    }
}

impl<'a> Iterator for PreOrderIter<'a> {
    type Item = (Index, &'a VisibleNode);

    fn next(&mut self) -> Option<Self::Item> {
        let current_idx = self.stack.pop()?;
        let node = self.tree.get_node(current_idx)?;
        for &child in node.children.iter().rev() {
            self.stack.push(child);
        }
        Some((current_idx, node))
    }
}

pub struct PostOrderIter<'a> {
    tree: &'a VisibleTree,
    stack: Vec<(Index, bool)>,
}

impl<'a> PostOrderIter<'a> {
    fn new(tree: &'a VisibleTree) -> Self {
        let stack = tree.root().map(|root| (root, false)).into_iter().collect();
        Self { tree, stack }
    }
}

impl<'a> Iterator for PostOrderIter<'a> {
    type Item = (Index, &'a VisibleNode);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some((current_idx, visited)) = self.stack.pop() {
            if let Some(node) = self.tree.get_node(current_idx) {
                if !visited {
                    self.stack.push((current_idx, true));
                    for &child in node.children.iter().rev() {
                        self.stack.push((child, false));
                    }
                } else {
                    return Some((current_idx, node));
                }
            }
        }
        None
    }
}
