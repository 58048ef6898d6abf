//! Expansion state: per-node expanded/collapsed flags layered over documents.
//!
//! Flags are kept in an id-keyed map owned by [`ExpansionState`], never on the
//! document itself. Each new `(document, global flag)` pair is reconciled
//! against the retained map:
//!
//! - global flag changed (or first observation): every node takes the flag,
//!   the root is forced expanded.
//! - document changed, global flag unchanged: known ids keep their flag, new
//!   ids start collapsed (the root starts expanded), vanished ids are dropped.
//! - nothing changed: no-op.
//!
//! When both change in the same update the global rule wins, applied to the
//! new document's shape.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, instrument, trace};

use crate::domain::node::{NodeId, TreeNode};
use crate::domain::tree;

/// Map from node id to its expanded flag.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpansionMap {
    flags: HashMap<NodeId, bool>,
}

impl ExpansionMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Unknown ids read as collapsed.
    pub fn is_expanded(&self, id: &str) -> bool {
        self.flags.get(id).copied().unwrap_or(false)
    }

    pub fn get(&self, id: &str) -> Option<bool> {
        self.flags.get(id).copied()
    }

    pub fn set(&mut self, id: impl Into<NodeId>, expanded: bool) {
        self.flags.insert(id.into(), expanded);
    }

    pub fn contains(&self, id: &str) -> bool {
        self.flags.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.flags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, bool)> + '_ {
        self.flags.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Every node takes `expanded`, except the root which is always expanded.
    pub fn uniform(document: &TreeNode, expanded: bool) -> Self {
        let flags = tree::iter(document)
            .map(|(depth, node)| (node.id.clone(), depth == 0 || expanded))
            .collect();
        Self { flags }
    }

    /// Flags for `document` carried over from `previous`; unseen nodes start
    /// collapsed, an unseen root starts expanded.
    pub fn carried_over(document: &TreeNode, previous: &ExpansionMap) -> Self {
        let flags = tree::iter(document)
            .map(|(depth, node)| {
                let expanded = previous.get(&node.id).unwrap_or(depth == 0);
                (node.id.clone(), expanded)
            })
            .collect();
        Self { flags }
    }
}

/// Which reconciliation rule an update triggered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Initial,
    GlobalChanged,
    DocumentChanged,
    Unchanged,
}

/// A document paired with the flags reconciled against it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconciledTree {
    pub document: Arc<TreeNode>,
    pub expansion: ExpansionMap,
}

impl ReconciledTree {
    pub fn is_expanded(&self, id: &str) -> bool {
        self.expansion.is_expanded(id)
    }
}

/// Retained expansion state of one engine instance.
#[derive(Debug, Clone, Default)]
pub struct ExpansionState {
    flags: ExpansionMap,
    global: Option<bool>,
    document: Option<Arc<TreeNode>>,
}

impl ExpansionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reconcile a document revision and the global expand-all flag against
    /// the retained flags.
    #[instrument(level = "debug", skip(self, document), fields(root = %document.id))]
    pub fn reconcile(&mut self, document: &Arc<TreeNode>, global_expanded: bool) -> Transition {
        let global_changed = self.global != Some(global_expanded);
        let document_changed = match &self.document {
            Some(previous) => previous != document,
            None => true,
        };

        let transition = if self.global.is_none() {
            self.flags = ExpansionMap::uniform(document, global_expanded);
            Transition::Initial
        } else if global_changed {
            self.flags = ExpansionMap::uniform(document, global_expanded);
            Transition::GlobalChanged
        } else if document_changed {
            self.flags = ExpansionMap::carried_over(document, &self.flags);
            Transition::DocumentChanged
        } else {
            Transition::Unchanged
        };

        self.global = Some(global_expanded);
        self.document = Some(Arc::clone(document));
        debug!("reconcile: {:?} ({} flags)", transition, self.flags.len());
        transition
    }

    /// Flip one node's flag in the retained state. Unknown ids are ignored.
    pub fn toggle(&mut self, id: &str) -> Option<bool> {
        let current = self.flags.get(id)?;
        self.flags.set(id, !current);
        trace!("toggle: {} -> {}", id, !current);
        Some(!current)
    }

    /// Force a node expanded, e.g. after adding a child to it.
    pub fn expand(&mut self, id: &str) {
        self.flags.set(id, true);
    }

    pub fn is_expanded(&self, id: &str) -> bool {
        self.flags.is_expanded(id)
    }

    pub fn flags(&self) -> &ExpansionMap {
        &self.flags
    }

    pub fn global(&self) -> Option<bool> {
        self.global
    }

    /// The last reconciled document with its current flags.
    pub fn reconciled(&self) -> Option<ReconciledTree> {
        self.document.as_ref().map(|document| ReconciledTree {
            document: Arc::clone(document),
            expansion: self.flags.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc() -> Arc<TreeNode> {
        Arc::new(
            TreeNode::new("1")
                .with_child(TreeNode::new("2").with_child(TreeNode::new("4")))
                .with_child(TreeNode::new("3")),
        )
    }

    #[test]
    fn given_first_document_when_reconciling_collapsed_then_only_root_expanded() {
        let mut state = ExpansionState::new();
        assert_eq!(state.reconcile(&doc(), false), Transition::Initial);
        assert!(state.is_expanded("1"));
        assert!(!state.is_expanded("2"));
        assert!(!state.is_expanded("4"));
    }

    #[test]
    fn given_same_inputs_when_reconciling_again_then_unchanged() {
        let mut state = ExpansionState::new();
        let d = doc();
        state.reconcile(&d, false);
        state.toggle("2");
        assert_eq!(state.reconcile(&d, false), Transition::Unchanged);
        assert!(state.is_expanded("2"));
    }

    #[test]
    fn given_equal_but_distinct_document_when_reconciling_then_unchanged() {
        let mut state = ExpansionState::new();
        state.reconcile(&doc(), false);
        assert_eq!(state.reconcile(&doc(), false), Transition::Unchanged);
    }

    #[test]
    fn given_unknown_id_when_toggling_then_ignored() {
        let mut state = ExpansionState::new();
        state.reconcile(&doc(), false);
        assert_eq!(state.toggle("missing"), None);
        assert!(!state.flags().contains("missing"));
    }

    #[test]
    fn given_removed_node_when_document_changes_then_flag_dropped() {
        let mut state = ExpansionState::new();
        state.reconcile(&doc(), true);
        let smaller = Arc::new(TreeNode::new("1").with_child(TreeNode::new("3")));
        assert_eq!(state.reconcile(&smaller, true), Transition::DocumentChanged);
        assert!(!state.flags().contains("2"));
        assert_eq!(state.flags().len(), 2);
    }
}
