//! Engine instance tying document, expansion, layout and viewport together.
//!
//! All state transitions are synchronous. After every transition the layout
//! is refreshed, which is a no-op unless the reconciled tree changed.

use std::sync::Arc;

use tracing::{debug, instrument};

use crate::domain::expansion::{ExpansionState, ReconciledTree, Transition};
use crate::domain::layout::{self, Layout, LayoutConfig, Point};
use crate::domain::node::{NodeId, NodePatch, TreeNode};
use crate::domain::relation::{self, RelationSet};
use crate::domain::tree;
use crate::domain::viewport::{Container, PointerButton, Transform, Viewport, ViewportConfig};

/// Inputs arriving in the same event cycle.
///
/// Applied in a fixed order: document and global flag are reconciled together
/// (global rule wins), then the layout is refreshed, then the fit request is
/// evaluated against the new bounds.
#[derive(Debug, Clone, Default)]
pub struct EngineUpdate {
    pub document: Option<Arc<TreeNode>>,
    pub global_expanded: Option<bool>,
    pub fit: Option<Container>,
}

#[derive(Debug)]
struct LayoutCache {
    key: ReconciledTree,
    layout: Arc<Layout>,
}

#[derive(Debug)]
pub struct MindMapEngine {
    layout_config: LayoutConfig,
    document: Arc<TreeNode>,
    global_expanded: bool,
    expansion: ExpansionState,
    viewport: Viewport,
    selected: Option<NodeId>,
    hovered: Option<NodeId>,
    fit_trigger: u64,
    cache: Option<LayoutCache>,
    layout_passes: u64,
}

impl MindMapEngine {
    pub fn new(
        document: impl Into<Arc<TreeNode>>,
        global_expanded: bool,
        layout_config: LayoutConfig,
        viewport_config: ViewportConfig,
    ) -> Self {
        let document = document.into();
        let mut engine = Self {
            layout_config,
            document: Arc::clone(&document),
            global_expanded,
            expansion: ExpansionState::new(),
            viewport: Viewport::new(viewport_config),
            selected: None,
            hovered: None,
            fit_trigger: 0,
            cache: None,
            layout_passes: 0,
        };
        engine.expansion.reconcile(&document, global_expanded);
        engine.refresh_layout();
        engine
    }

    /// Engine with default geometry, everything below the root collapsed.
    pub fn with_defaults(document: impl Into<Arc<TreeNode>>) -> Self {
        Self::new(
            document,
            false,
            LayoutConfig::default(),
            ViewportConfig::default(),
        )
    }

    pub fn document(&self) -> &Arc<TreeNode> {
        &self.document
    }

    pub fn global_expanded(&self) -> bool {
        self.global_expanded
    }

    pub fn is_expanded(&self, id: &str) -> bool {
        self.expansion.is_expanded(id)
    }

    pub fn expansion(&self) -> &ExpansionState {
        &self.expansion
    }

    /// Current document with current flags.
    pub fn reconciled(&self) -> ReconciledTree {
        ReconciledTree {
            document: Arc::clone(&self.document),
            expansion: self.expansion.flags().clone(),
        }
    }

    /// Apply inputs of one event cycle.
    #[instrument(level = "debug", skip(self, update))]
    pub fn update(&mut self, update: EngineUpdate) -> Transition {
        if let Some(document) = update.document {
            self.document = document;
        }
        if let Some(flag) = update.global_expanded {
            self.global_expanded = flag;
        }
        let transition = self.reconcile();
        if let Some(container) = update.fit {
            self.request_fit(container);
        }
        transition
    }

    /// Replace the document, keeping flags of known ids.
    pub fn set_document(&mut self, document: impl Into<Arc<TreeNode>>) -> Transition {
        self.update(EngineUpdate {
            document: Some(document.into()),
            ..Default::default()
        })
    }

    /// Expand-all / collapse-all.
    pub fn set_global_expanded(&mut self, expanded: bool) -> Transition {
        self.update(EngineUpdate {
            global_expanded: Some(expanded),
            ..Default::default()
        })
    }

    /// Flip one node's expansion; unknown ids are ignored.
    pub fn toggle(&mut self, id: &str) -> Option<bool> {
        let flipped = self.expansion.toggle(id);
        if flipped.is_some() {
            self.refresh_layout();
        }
        flipped
    }

    /// Append `child` under `parent_id` and expand the parent so the child is
    /// visible. Returns the child's id, or None if the parent is unknown.
    #[instrument(level = "debug", skip(self, child), fields(child = %child.id))]
    pub fn add_child(&mut self, parent_id: &str, child: TreeNode) -> Option<NodeId> {
        tree::find_by_id(&self.document, parent_id)?;
        let child_id = child.id.clone();
        let document = tree::insert_child(&self.document, parent_id, child);
        self.expansion.expand(parent_id);
        self.set_document(document);
        debug!("added {} under {}", child_id, parent_id);
        Some(child_id)
    }

    /// Add a fresh detail node under the selected node. No-op without a
    /// selection.
    pub fn add_to_selected(&mut self) -> Option<NodeId> {
        let parent = self.selected.clone()?;
        self.add_child(&parent, TreeNode::new_detail())
    }

    /// Merge `patch` into node `id`. Returns false if the id is unknown.
    pub fn edit(&mut self, id: &str, patch: &NodePatch) -> bool {
        if tree::find_by_id(&self.document, id).is_none() {
            return false;
        }
        let document = tree::replace_by_id(&self.document, id, patch);
        self.set_document(document);
        true
    }

    /// Memoized layout of the current reconciled tree.
    pub fn layout(&self) -> Arc<Layout> {
        match &self.cache {
            Some(cache) => Arc::clone(&cache.layout),
            None => Arc::new(Layout::default()),
        }
    }

    /// Number of layout computations performed so far.
    pub fn layout_passes(&self) -> u64 {
        self.layout_passes
    }

    pub fn select(&mut self, id: Option<&str>) {
        self.selected = id
            .filter(|id| tree::find_by_id(&self.document, id).is_some())
            .map(str::to_string);
    }

    pub fn selected(&self) -> Option<&TreeNode> {
        self.selected
            .as_deref()
            .and_then(|id| tree::find_by_id(&self.document, id))
    }

    pub fn hover(&mut self, id: Option<&str>) {
        self.hovered = id.map(str::to_string);
    }

    pub fn hovered(&self) -> Option<&str> {
        self.hovered.as_deref()
    }

    /// Highlight set around the hovered node.
    pub fn related(&self) -> RelationSet {
        relation::related_ids(&self.layout().links, self.hovered.as_deref())
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn transform(&self) -> Transform {
        self.viewport.transform()
    }

    pub fn fit_trigger(&self) -> u64 {
        self.fit_trigger
    }

    /// Advance the fit trigger and apply it against the current bounds.
    pub fn request_fit(&mut self, container: Container) -> Transform {
        self.fit_trigger += 1;
        let bounds = self.layout().bounds;
        self.viewport.apply_fit_trigger(self.fit_trigger, &bounds, container);
        self.viewport.transform()
    }

    /// Put the root at the container center.
    pub fn center_on_root(&mut self, container: Container) {
        let root = self
            .layout()
            .root()
            .map(|n| n.position())
            .unwrap_or_default();
        self.viewport.center_on(root, container);
    }

    pub fn pointer_down(&mut self, button: PointerButton, at: Point) -> bool {
        self.viewport.pointer_down(button, at)
    }

    pub fn pointer_move(&mut self, at: Point) -> bool {
        self.viewport.pointer_move(at)
    }

    pub fn pointer_up(&mut self) {
        self.viewport.pointer_up()
    }

    pub fn lost_capture(&mut self) {
        self.viewport.lost_capture()
    }

    pub fn wheel(&mut self, delta_y: f64, modifier: bool) -> bool {
        self.viewport.wheel(delta_y, modifier)
    }

    pub fn zoom_in(&mut self) {
        self.viewport.zoom_in()
    }

    pub fn zoom_out(&mut self) {
        self.viewport.zoom_out()
    }

    fn reconcile(&mut self) -> Transition {
        let transition = self.expansion.reconcile(&self.document, self.global_expanded);
        if transition != Transition::Unchanged {
            self.drop_stale_focus();
        }
        self.refresh_layout();
        transition
    }

    fn drop_stale_focus(&mut self) {
        let document = &self.document;
        let known = |id: &Option<NodeId>| {
            id.as_deref()
                .map_or(true, |id| tree::find_by_id(document, id).is_some())
        };
        if !known(&self.selected) {
            self.selected = None;
        }
        if !known(&self.hovered) {
            self.hovered = None;
        }
    }

    fn refresh_layout(&mut self) {
        let fresh = match &self.cache {
            Some(cache) => {
                cache.key.document == self.document
                    && &cache.key.expansion == self.expansion.flags()
            }
            None => false,
        };
        if fresh {
            return;
        }
        let key = self.reconciled();
        let computed = layout::layout_reconciled(&key, &self.layout_config);
        self.layout_passes += 1;
        self.cache = Some(LayoutCache {
            key,
            layout: Arc::new(computed),
        });
    }
}
