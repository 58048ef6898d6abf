//! Tidy tree layout of the visible nodes.
//!
//! Linear-time Reingold-Tilford layout as improved by Buchheim, Junger and
//! Leipert. The walk computes a breadth coordinate per node in separation
//! units; the result is mapped to screen space with depth on the horizontal
//! axis and breadth on the vertical axis, so the tree grows to the right.
//!
//! 1. First walk (post-order): preliminary breadth by merging subtree
//!    contours, threads give O(1) contour steps.
//! 2. Second walk (pre-order): accumulate modifiers into final breadth.
//! 3. Map `(breadth, depth)` to pixels and derive links and bounds.

use std::collections::HashMap;

use generational_arena::Index;
use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};
use tracing::{debug, instrument};

use crate::domain::arena::{VisibleNode, VisibleTree};
use crate::domain::error::{DomainError, DomainResult};
use crate::domain::expansion::ReconciledTree;
use crate::domain::node::{NodeId, NodeKind};
use crate::domain::relation::RelationSet;

/// Grid and footprint settings of the layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Vertical pixels per separation unit between neighbours.
    pub sibling_pitch: f64,
    /// Horizontal pixels between depth levels.
    pub depth_pitch: f64,
    /// Separation multiplier for neighbours sharing a parent.
    pub sibling_separation: f64,
    /// Separation multiplier for neighbours with different parents.
    pub cousin_separation: f64,
    pub node_width: f64,
    pub node_height: f64,
    pub padding: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            sibling_pitch: 120.0,
            depth_pitch: 250.0,
            sibling_separation: 2.0,
            cousin_separation: 1.0,
            node_width: 250.0,
            node_height: 80.0,
            padding: 50.0,
        }
    }
}

impl LayoutConfig {
    pub fn validate(&self) -> DomainResult<()> {
        let positive = [
            ("layout.sibling_pitch", self.sibling_pitch),
            ("layout.depth_pitch", self.depth_pitch),
            ("layout.sibling_separation", self.sibling_separation),
            ("layout.cousin_separation", self.cousin_separation),
            ("layout.node_width", self.node_width),
            ("layout.node_height", self.node_height),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(DomainError::dimension(name, value));
            }
        }
        if !(self.padding.is_finite() && self.padding >= 0.0) {
            return Err(DomainError::dimension("layout.padding", self.padding));
        }
        // branches must stay visibly apart: siblings at least twice the cousin gap
        if self.sibling_separation < 2.0 * self.cousin_separation {
            return Err(DomainError::dimension(
                "layout.sibling_separation (must be >= 2 x cousin_separation)",
                self.sibling_separation,
            ));
        }
        Ok(())
    }

    fn separation(&self, same_parent: bool) -> f64 {
        if same_parent {
            self.sibling_separation
        } else {
            self.cousin_separation
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// A visible node with its pixel position.
#[derive(Debug, Clone, PartialEq)]
pub struct PositionedNode {
    pub id: NodeId,
    pub label: Option<String>,
    pub kind: Option<NodeKind>,
    pub x: f64,
    pub y: f64,
    pub depth: usize,
    pub expanded: bool,
    /// Document children, visible or not.
    pub child_count: usize,
}

impl PositionedNode {
    pub fn has_children(&self) -> bool {
        self.child_count > 0
    }

    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

impl Serialize for PositionedNode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("PositionedNode", 8)?;
        s.serialize_field("id", &self.id)?;
        s.serialize_field("label", &self.label)?;
        s.serialize_field("type", &self.kind)?;
        s.serialize_field("x", &self.x)?;
        s.serialize_field("y", &self.y)?;
        s.serialize_field("depth", &self.depth)?;
        s.serialize_field("expanded", &self.expanded)?;
        s.serialize_field("childCount", &self.child_count)?;
        s.end()
    }
}

/// Parent to child connector.
#[derive(Debug, Clone, PartialEq)]
pub struct Link {
    pub source_id: NodeId,
    pub target_id: NodeId,
    pub source: Point,
    pub target: Point,
}

impl Link {
    /// Cubic horizontal S-curve; both control points sit on the vertical
    /// line halfway between the endpoints.
    pub fn path(&self) -> String {
        let (s, t) = (self.source, self.target);
        let mid_x = s.x + (t.x - s.x) / 2.0;
        format!(
            "M {} {} C {} {}, {} {}, {} {}",
            s.x, s.y, mid_x, s.y, mid_x, t.y, t.x, t.y
        )
    }

    pub fn is_related(&self, relations: &RelationSet) -> bool {
        relations.contains(&self.source_id) && relations.contains(&self.target_id)
    }
}

impl Serialize for Link {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("Link", 5)?;
        s.serialize_field("sourceId", &self.source_id)?;
        s.serialize_field("targetId", &self.target_id)?;
        s.serialize_field("source", &self.source)?;
        s.serialize_field("target", &self.target)?;
        s.serialize_field("path", &self.path())?;
        s.end()
    }
}

/// Box enclosing every node footprint plus padding.
#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bounds {
    pub min_x: f64,
    pub max_x: f64,
    pub min_y: f64,
    pub max_y: f64,
}

impl Bounds {
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    pub fn center_x(&self) -> f64 {
        self.min_x + self.width() / 2.0
    }

    pub fn center_y(&self) -> f64 {
        self.min_y + self.height() / 2.0
    }

    pub fn center(&self) -> Point {
        Point::new(self.center_x(), self.center_y())
    }

    fn around<'a>(nodes: impl Iterator<Item = &'a PositionedNode>, config: &LayoutConfig) -> Self {
        let mut acc: Option<Bounds> = None;
        for n in nodes {
            let b = acc.get_or_insert(Bounds {
                min_x: n.x,
                max_x: n.x,
                min_y: n.y,
                max_y: n.y,
            });
            b.min_x = b.min_x.min(n.x);
            b.max_x = b.max_x.max(n.x);
            b.min_y = b.min_y.min(n.y);
            b.max_y = b.max_y.max(n.y);
        }
        let b = acc.unwrap_or_default();
        let dx = config.node_width / 2.0 + config.padding;
        let dy = config.node_height / 2.0 + config.padding;
        Bounds {
            min_x: b.min_x - dx,
            max_x: b.max_x + dx,
            min_y: b.min_y - dy,
            max_y: b.max_y + dy,
        }
    }
}

impl Serialize for Bounds {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("Bounds", 8)?;
        s.serialize_field("minX", &self.min_x)?;
        s.serialize_field("maxX", &self.max_x)?;
        s.serialize_field("minY", &self.min_y)?;
        s.serialize_field("maxY", &self.max_y)?;
        s.serialize_field("width", &self.width())?;
        s.serialize_field("height", &self.height())?;
        s.serialize_field("centerX", &self.center_x())?;
        s.serialize_field("centerY", &self.center_y())?;
        s.end()
    }
}

/// Result of one layout pass.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Layout {
    /// Visible nodes in pre-order.
    pub nodes: Vec<PositionedNode>,
    pub links: Vec<Link>,
    pub bounds: Bounds,
}

impl Layout {
    pub fn node(&self, id: &str) -> Option<&PositionedNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn root(&self) -> Option<&PositionedNode> {
        self.nodes.first()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.node(id).is_some()
    }
}

/// Scratch state of the walk, indexed by pre-order slot.
#[derive(Debug)]
struct WalkNode {
    parent: Option<usize>,
    children: Vec<usize>,
    /// Position among siblings.
    number: usize,
    prelim: f64,
    modifier: f64,
    change: f64,
    shift: f64,
    thread: Option<usize>,
    ancestor: usize,
    default_ancestor: Option<usize>,
    breadth: f64,
}

struct Walker<'a> {
    nodes: Vec<WalkNode>,
    config: &'a LayoutConfig,
}

impl<'a> Walker<'a> {
    fn new(order: &[(Index, &VisibleNode)], config: &'a LayoutConfig) -> Self {
        let slots: HashMap<Index, usize> = order
            .iter()
            .enumerate()
            .map(|(slot, (idx, _))| (*idx, slot))
            .collect();

        let mut nodes: Vec<WalkNode> = order
            .iter()
            .enumerate()
            .map(|(slot, (_, node))| WalkNode {
                parent: node.parent.and_then(|p| slots.get(&p).copied()),
                children: node
                    .children
                    .iter()
                    .filter_map(|c| slots.get(c).copied())
                    .collect(),
                number: 0,
                prelim: 0.0,
                modifier: 0.0,
                change: 0.0,
                shift: 0.0,
                thread: None,
                ancestor: slot,
                default_ancestor: None,
                breadth: 0.0,
            })
            .collect();

        for slot in 0..nodes.len() {
            let children = nodes[slot].children.clone();
            for (number, child) in children.into_iter().enumerate() {
                nodes[child].number = number;
            }
        }
        Self { nodes, config }
    }

    fn separation(&self, a: usize, b: usize) -> f64 {
        self.config.separation(self.nodes[a].parent == self.nodes[b].parent)
    }

    fn left_sibling(&self, v: usize) -> Option<usize> {
        let number = self.nodes[v].number;
        let parent = self.nodes[v].parent?;
        if number == 0 {
            None
        } else {
            Some(self.nodes[parent].children[number - 1])
        }
    }

    fn next_left(&self, v: usize) -> Option<usize> {
        self.nodes[v].children.first().copied().or(self.nodes[v].thread)
    }

    fn next_right(&self, v: usize) -> Option<usize> {
        self.nodes[v].children.last().copied().or(self.nodes[v].thread)
    }

    fn first_walk(&mut self, v: usize) {
        let left = self.left_sibling(v);
        if let (Some(&first), Some(&last)) =
            (self.nodes[v].children.first(), self.nodes[v].children.last())
        {
            self.execute_shifts(v);
            let midpoint = (self.nodes[first].prelim + self.nodes[last].prelim) / 2.0;
            match left {
                Some(w) => {
                    self.nodes[v].prelim = self.nodes[w].prelim + self.separation(v, w);
                    self.nodes[v].modifier = self.nodes[v].prelim - midpoint;
                }
                None => self.nodes[v].prelim = midpoint,
            }
        } else if let Some(w) = left {
            self.nodes[v].prelim = self.nodes[w].prelim + self.separation(v, w);
        }

        if let Some(parent) = self.nodes[v].parent {
            let fallback = self.nodes[parent].children[0];
            let ancestor = self.nodes[parent].default_ancestor.unwrap_or(fallback);
            let ancestor = self.apportion(v, left, ancestor);
            self.nodes[parent].default_ancestor = Some(ancestor);
        }
    }

    /// Push the subtree of `v` away from its left siblings' subtrees until
    /// every level is at least one separation apart.
    fn apportion(&mut self, v: usize, left: Option<usize>, mut ancestor: usize) -> usize {
        let Some(w) = left else {
            return ancestor;
        };
        let Some(parent) = self.nodes[v].parent else {
            return ancestor;
        };

        // i = inside, o = outside; p = right contour, m = left contour
        let mut vip = v;
        let mut vop = v;
        let mut vim = w;
        let mut vom = self.nodes[parent].children[0];
        let mut sip = self.nodes[vip].modifier;
        let mut sop = self.nodes[vop].modifier;
        let mut sim = self.nodes[vim].modifier;
        let mut som = self.nodes[vom].modifier;

        let mut next_im = self.next_right(vim);
        let mut next_ip = self.next_left(vip);
        while let (Some(im), Some(ip)) = (next_im, next_ip) {
            vim = im;
            vip = ip;
            // contours of equal depth exist on both sides, so these are set
            if let Some(om) = self.next_left(vom) {
                vom = om;
            }
            if let Some(op) = self.next_right(vop) {
                vop = op;
            }
            self.nodes[vop].ancestor = v;

            let shift = self.nodes[vim].prelim + sim - self.nodes[vip].prelim - sip
                + self.separation(vim, vip);
            if shift > 0.0 {
                let moved = self.next_ancestor(vim, v, ancestor);
                self.move_subtree(moved, v, shift);
                sip += shift;
                sop += shift;
            }
            sim += self.nodes[vim].modifier;
            sip += self.nodes[vip].modifier;
            som += self.nodes[vom].modifier;
            sop += self.nodes[vop].modifier;

            next_im = self.next_right(vim);
            next_ip = self.next_left(vip);
        }

        if let Some(im) = next_im {
            if self.next_right(vop).is_none() {
                self.nodes[vop].thread = Some(im);
                self.nodes[vop].modifier += sim - sop;
            }
        }
        if let Some(ip) = next_ip {
            if self.next_left(vom).is_none() {
                self.nodes[vom].thread = Some(ip);
                self.nodes[vom].modifier += sip - som;
                ancestor = v;
            }
        }
        ancestor
    }

    fn next_ancestor(&self, vim: usize, v: usize, ancestor: usize) -> usize {
        let candidate = self.nodes[vim].ancestor;
        if self.nodes[candidate].parent == self.nodes[v].parent {
            candidate
        } else {
            ancestor
        }
    }

    fn move_subtree(&mut self, wm: usize, wp: usize, shift: f64) {
        let subtrees = (self.nodes[wp].number - self.nodes[wm].number) as f64;
        let change = shift / subtrees;
        self.nodes[wp].change -= change;
        self.nodes[wp].shift += shift;
        self.nodes[wm].change += change;
        self.nodes[wp].prelim += shift;
        self.nodes[wp].modifier += shift;
    }

    fn execute_shifts(&mut self, v: usize) {
        let mut shift = 0.0;
        let mut change = 0.0;
        let children = self.nodes[v].children.clone();
        for &w in children.iter().rev() {
            self.nodes[w].prelim += shift;
            self.nodes[w].modifier += shift;
            change += self.nodes[w].change;
            shift += self.nodes[w].shift + change;
        }
    }

    /// Slots are pre-order, so every parent is final before its children.
    fn second_walk(&mut self) {
        for slot in 0..self.nodes.len() {
            let parent_modifier = match self.nodes[slot].parent {
                Some(p) => self.nodes[p].modifier,
                // shift the root to breadth 0
                None => -self.nodes[slot].prelim,
            };
            self.nodes[slot].breadth = self.nodes[slot].prelim + parent_modifier;
            self.nodes[slot].modifier += parent_modifier;
        }
    }
}

/// Lay out the visible part of `tree`.
#[instrument(level = "debug", skip_all, fields(visible = tree.len()))]
pub fn layout(tree: &VisibleTree, config: &LayoutConfig) -> Layout {
    let order: Vec<(Index, &VisibleNode)> = tree.iter().collect();
    if order.is_empty() {
        return Layout::default();
    }

    let slots: HashMap<Index, usize> = order
        .iter()
        .enumerate()
        .map(|(slot, (idx, _))| (*idx, slot))
        .collect();
    let mut walker = Walker::new(&order, config);
    for (idx, _) in tree.iter_postorder() {
        if let Some(&slot) = slots.get(&idx) {
            walker.first_walk(slot);
        }
    }
    walker.second_walk();

    let nodes: Vec<PositionedNode> = order
        .iter()
        .zip(walker.nodes.iter())
        .map(|((_, visible), walked)| PositionedNode {
            id: visible.node.id.clone(),
            label: visible.node.label.clone(),
            kind: visible.node.kind.clone(),
            x: visible.depth as f64 * config.depth_pitch,
            y: walked.breadth * config.sibling_pitch,
            depth: visible.depth,
            expanded: visible.expanded,
            child_count: visible.child_count(),
        })
        .collect();

    let links: Vec<Link> = walker
        .nodes
        .iter()
        .enumerate()
        .filter_map(|(slot, walked)| {
            let parent = &nodes[walked.parent?];
            let child = &nodes[slot];
            Some(Link {
                source_id: parent.id.clone(),
                target_id: child.id.clone(),
                source: parent.position(),
                target: child.position(),
            })
        })
        .collect();

    let bounds = Bounds::around(nodes.iter(), config);
    debug!(
        "layout: {} nodes, {} links, {:.0}x{:.0}",
        nodes.len(),
        links.len(),
        bounds.width(),
        bounds.height()
    );
    Layout {
        nodes,
        links,
        bounds,
    }
}

/// Build the visible tree of `reconciled` and lay it out.
pub fn layout_reconciled(reconciled: &ReconciledTree, config: &LayoutConfig) -> Layout {
    layout(&VisibleTree::from_reconciled(reconciled), config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::expansion::ExpansionMap;
    use crate::domain::node::TreeNode;
    use std::sync::Arc;

    fn laid_out(doc: TreeNode) -> Layout {
        let doc = Arc::new(doc);
        let flags = ExpansionMap::uniform(&doc, true);
        layout(&VisibleTree::from_document(&doc, &flags), &LayoutConfig::default())
    }

    #[test]
    fn given_single_node_when_laying_out_then_origin_and_padded_bounds() {
        let result = laid_out(TreeNode::new("1"));
        assert_eq!(result.nodes.len(), 1);
        assert_eq!(result.nodes[0].position(), Point::new(0.0, 0.0));
        assert!(result.links.is_empty());
        assert_eq!(result.bounds.min_x, -175.0);
        assert_eq!(result.bounds.max_x, 175.0);
        assert_eq!(result.bounds.min_y, -90.0);
        assert_eq!(result.bounds.max_y, 90.0);
    }

    #[test]
    fn given_two_children_when_laying_out_then_parent_centered_between_them() {
        let result = laid_out(
            TreeNode::new("1")
                .with_child(TreeNode::new("2"))
                .with_child(TreeNode::new("3")),
        );
        let a = result.node("2").unwrap();
        let b = result.node("3").unwrap();
        assert_eq!(b.y - a.y, 240.0);
        assert_eq!(result.node("1").unwrap().y, 0.0);
        assert_eq!(a.y, -120.0);
        assert_eq!(a.x, 250.0);
    }

    #[test]
    fn given_cousins_when_laying_out_then_cousin_gap_is_smaller_than_sibling_gap() {
        let result = laid_out(
            TreeNode::new("r")
                .with_child(TreeNode::new("a").with_child(TreeNode::new("a1")))
                .with_child(TreeNode::new("b").with_child(TreeNode::new("b1"))),
        );
        let a1 = result.node("a1").unwrap();
        let b1 = result.node("b1").unwrap();
        let a = result.node("a").unwrap();
        let b = result.node("b").unwrap();
        assert_eq!(b.y - a.y, 240.0);
        // leaves of different parents only need the cousin gap, but their
        // parents already hold them the sibling gap apart
        assert!(b1.y - a1.y >= 120.0);
    }

    #[test]
    fn given_link_when_rendering_path_then_horizontal_s_curve() {
        let link = Link {
            source_id: "a".into(),
            target_id: "b".into(),
            source: Point::new(0.0, 0.0),
            target: Point::new(250.0, -120.0),
        };
        assert_eq!(link.path(), "M 0 0 C 125 0, 125 -120, 250 -120");
    }

    #[test]
    fn given_invalid_separation_when_validating_then_rejected() {
        let config = LayoutConfig {
            sibling_separation: 1.5,
            cousin_separation: 1.0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
        assert!(LayoutConfig::default().validate().is_ok());
    }

    #[test]
    fn given_positioned_node_when_serializing_then_uses_wire_names() {
        let result = laid_out(TreeNode::new("1").with_child(TreeNode::new("2")));
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["nodes"][0]["childCount"], 1);
        assert_eq!(value["links"][0]["sourceId"], "1");
        assert_eq!(value["bounds"]["centerX"], 125.0);
    }
}
