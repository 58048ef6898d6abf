//! Immutable-update operations over the document tree.
//!
//! Every operation visits the tree in O(n). A missing id is not an error: the
//! input tree is handed back unchanged (same `Arc`), since callers only ever
//! pass ids they just read from a rendered layout.

use std::sync::Arc;

use tracing::{instrument, trace};

use crate::domain::node::{NodePatch, TreeNode};

/// Pre-order iterator over a document, yielding `(depth, node)`.
pub struct DocumentIter<'a> {
    stack: Vec<(usize, &'a TreeNode)>,
}

impl<'a> DocumentIter<'a> {
    pub fn new(root: &'a TreeNode) -> Self {
        Self {
            stack: vec![(0, root)],
        }
    }
}

impl<'a> Iterator for DocumentIter<'a> {
    type Item = (usize, &'a TreeNode);

    fn next(&mut self) -> Option<Self::Item> {
        let (depth, node) = self.stack.pop()?;
        // Push children in reverse order for left-to-right traversal
        for child in node.children.iter().rev() {
            self.stack.push((depth + 1, child.as_ref()));
        }
        Some((depth, node))
    }
}

pub fn iter(tree: &TreeNode) -> DocumentIter<'_> {
    DocumentIter::new(tree)
}

pub fn find_by_id<'a>(tree: &'a TreeNode, id: &str) -> Option<&'a TreeNode> {
    iter(tree).map(|(_, node)| node).find(|node| node.id == id)
}

pub fn count_nodes(tree: &TreeNode) -> usize {
    iter(tree).count()
}

/// Rebuild the path from `node` down to the node matching `id`, sharing all
/// other subtrees. Returns `None` when `id` is not in this subtree.
fn rebuild<F>(node: &Arc<TreeNode>, id: &str, update: &mut F) -> Option<Arc<TreeNode>>
where
    F: FnMut(&TreeNode) -> TreeNode,
{
    if node.id == id {
        return Some(Arc::new(update(node)));
    }
    for (i, child) in node.children.iter().enumerate() {
        if let Some(new_child) = rebuild(child, id, update) {
            let mut copy = TreeNode::clone(node);
            copy.children[i] = new_child;
            return Some(Arc::new(copy));
        }
    }
    None
}

/// Merge `patch` into the node matching `id`.
#[instrument(level = "trace", skip(tree, patch))]
pub fn replace_by_id(tree: &Arc<TreeNode>, id: &str, patch: &NodePatch) -> Arc<TreeNode> {
    match rebuild(tree, id, &mut |node: &TreeNode| patch.apply(node)) {
        Some(updated) => updated,
        None => {
            trace!("replace_by_id: {} not found, tree unchanged", id);
            Arc::clone(tree)
        }
    }
}

/// Append `child` to the children of `parent_id`.
///
/// Making the new child visible is the caller's concern: expansion state is
/// kept outside the document (see [`crate::domain::MindMapEngine::add_child`]).
#[instrument(level = "trace", skip(tree, child))]
pub fn insert_child(tree: &Arc<TreeNode>, parent_id: &str, child: TreeNode) -> Arc<TreeNode> {
    let child = Arc::new(child);
    let inserted = rebuild(tree, parent_id, &mut |parent: &TreeNode| {
        let mut copy = parent.clone();
        copy.children.push(Arc::clone(&child));
        copy
    });
    match inserted {
        Some(updated) => updated,
        None => {
            trace!("insert_child: parent {} not found, tree unchanged", parent_id);
            Arc::clone(tree)
        }
    }
}
