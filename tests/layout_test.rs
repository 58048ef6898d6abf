//! Tests for the tidy tree layout over visible nodes

use std::collections::BTreeSet;
use std::sync::Arc;

use rstest::{fixture, rstest};

use mindmap::domain::{
    layout, layout_reconciled, ExpansionMap, LayoutConfig, PositionedNode, ReconciledTree,
    TreeNode, VisibleTree,
};
use mindmap::util::testing;

const EPS: f64 = 1e-9;

#[fixture]
fn document() -> Arc<TreeNode> {
    testing::init_test_setup();
    Arc::new(
        TreeNode::new("r")
            .with_label("Root")
            .with_child(
                TreeNode::new("a")
                    .with_child(
                        TreeNode::new("a1")
                            .with_child(TreeNode::new("a1x"))
                            .with_child(TreeNode::new("a1y")),
                    )
                    .with_child(TreeNode::new("a2")),
            )
            .with_child(TreeNode::new("b"))
            .with_child(
                TreeNode::new("c")
                    .with_child(TreeNode::new("c1"))
                    .with_child(TreeNode::new("c2"))
                    .with_child(TreeNode::new("c3")),
            ),
    )
}

fn reconciled(document: &Arc<TreeNode>, flags: ExpansionMap) -> ReconciledTree {
    ReconciledTree {
        document: Arc::clone(document),
        expansion: flags,
    }
}

/// Ids reachable from the root through expanded nodes only.
fn reachable(node: &TreeNode, flags: &ExpansionMap, out: &mut BTreeSet<String>) {
    out.insert(node.id.clone());
    if flags.is_expanded(&node.id) {
        for child in &node.children {
            reachable(child, flags, out);
        }
    }
}

#[test]
fn given_root_with_one_child_when_laying_out_then_child_one_depth_pitch_right() {
    let doc = Arc::new(
        TreeNode::new("1")
            .with_label("Root")
            .with_child(TreeNode::new("2").with_label("A")),
    );
    let result = layout_reconciled(
        &reconciled(&doc, ExpansionMap::uniform(&doc, false)),
        &LayoutConfig::default(),
    );

    assert_eq!(result.nodes.len(), 2);
    assert_eq!(result.links.len(), 1);
    let root = result.node("1").unwrap();
    let child = result.node("2").unwrap();
    assert_eq!(root.depth, 0);
    assert_eq!(child.depth, 1);
    assert_eq!(child.x - root.x, 250.0);
    assert_eq!(child.y, root.y);
    assert_eq!(result.links[0].source_id, "1");
    assert_eq!(result.links[0].target_id, "2");
}

#[rstest]
#[case::all_collapsed(false, &[])]
#[case::all_expanded(true, &[])]
#[case::one_branch_open(false, &["a"])]
#[case::nested_open_parent_closed(false, &["a1"])]
#[case::root_closed(true, &["r"])]
#[case::mixed(true, &["a1", "c"])]
fn given_expansion_when_laying_out_then_nodes_are_exactly_the_reachable_set(
    document: Arc<TreeNode>,
    #[case] global: bool,
    #[case] toggles: &[&str],
) {
    let mut flags = ExpansionMap::uniform(&document, global);
    for id in toggles {
        let current = flags.is_expanded(id);
        flags.set(*id, !current);
    }
    let mut expected = BTreeSet::new();
    reachable(&document, &flags, &mut expected);

    let result = layout(
        &VisibleTree::from_document(&document, &flags),
        &LayoutConfig::default(),
    );
    let actual: BTreeSet<String> = result.nodes.iter().map(|n| n.id.clone()).collect();

    assert_eq!(actual, expected);
    assert_eq!(result.links.len(), result.nodes.len() - 1);
}

#[rstest]
fn given_same_reconciled_tree_when_laying_out_twice_then_bit_identical(document: Arc<TreeNode>) {
    let tree = reconciled(&document, ExpansionMap::uniform(&document, true));
    let first = layout_reconciled(&tree, &LayoutConfig::default());
    let second = layout_reconciled(&tree, &LayoutConfig::default());

    assert_eq!(first, second);
    for (a, b) in first.nodes.iter().zip(second.nodes.iter()) {
        assert_eq!(a.x.to_bits(), b.x.to_bits());
        assert_eq!(a.y.to_bits(), b.y.to_bits());
    }
}

#[rstest]
fn given_expanded_tree_when_laying_out_then_siblings_keep_pitch_and_depth_sets_x(
    document: Arc<TreeNode>,
) {
    let config = LayoutConfig::default();
    let result = layout_reconciled(
        &reconciled(&document, ExpansionMap::uniform(&document, true)),
        &config,
    );
    assert_eq!(result.nodes.len(), 11);

    for node in &result.nodes {
        assert_eq!(node.x, node.depth as f64 * config.depth_pitch);
    }

    // siblings in document order, strictly increasing y, at least one pitch apart
    for parent in document_parents(&document) {
        let ys: Vec<f64> = parent
            .children
            .iter()
            .map(|c| result.node(&c.id).unwrap().y)
            .collect();
        for pair in ys.windows(2) {
            assert!(
                pair[1] - pair[0] >= config.sibling_pitch - EPS,
                "siblings of {} too close: {:?}",
                parent.id,
                ys
            );
            assert!(
                pair[1] - pair[0] >= config.sibling_separation * config.sibling_pitch - EPS
            );
        }
    }
}

fn document_parents(node: &TreeNode) -> Vec<&TreeNode> {
    let mut out = Vec::new();
    if !node.children.is_empty() {
        out.push(node);
    }
    for child in &node.children {
        out.extend(document_parents(child));
    }
    out
}

#[rstest]
fn given_expanded_tree_when_laying_out_then_same_depth_neighbours_never_overlap(
    document: Arc<TreeNode>,
) {
    let config = LayoutConfig::default();
    let result = layout_reconciled(
        &reconciled(&document, ExpansionMap::uniform(&document, true)),
        &config,
    );
    let max_depth = result.nodes.iter().map(|n| n.depth).max().unwrap();

    for depth in 0..=max_depth {
        let mut level: Vec<&PositionedNode> =
            result.nodes.iter().filter(|n| n.depth == depth).collect();
        level.sort_by(|a, b| a.y.total_cmp(&b.y));
        for pair in level.windows(2) {
            assert!(
                pair[1].y - pair[0].y >= config.cousin_separation * config.sibling_pitch - EPS,
                "{} and {} overlap",
                pair[0].id,
                pair[1].id
            );
        }
    }
}

#[rstest]
fn given_parent_with_visible_children_when_laying_out_then_centered_on_children(
    document: Arc<TreeNode>,
) {
    let result = layout_reconciled(
        &reconciled(&document, ExpansionMap::uniform(&document, true)),
        &LayoutConfig::default(),
    );
    for parent in document_parents(&document) {
        let first = result.node(&parent.children[0].id).unwrap().y;
        let last = result
            .node(&parent.children[parent.children.len() - 1].id)
            .unwrap()
            .y;
        let y = result.node(&parent.id).unwrap().y;
        assert!((y - (first + last) / 2.0).abs() < EPS, "{} not centered", parent.id);
    }
    assert_eq!(result.root().unwrap().y, 0.0);
}

#[rstest]
fn given_layout_when_computing_bounds_then_covers_footprint_and_padding(document: Arc<TreeNode>) {
    let config = LayoutConfig::default();
    let result = layout_reconciled(
        &reconciled(&document, ExpansionMap::uniform(&document, true)),
        &config,
    );
    let b = result.bounds;
    for n in &result.nodes {
        assert!(n.x - config.node_width / 2.0 - config.padding >= b.min_x - EPS);
        assert!(n.x + config.node_width / 2.0 + config.padding <= b.max_x + EPS);
        assert!(n.y - config.node_height / 2.0 - config.padding >= b.min_y - EPS);
        assert!(n.y + config.node_height / 2.0 + config.padding <= b.max_y + EPS);
    }
    assert_eq!(b.min_x, -(config.node_width / 2.0 + config.padding));
    assert_eq!(b.max_x, 3.0 * config.depth_pitch + config.node_width / 2.0 + config.padding);
    assert!((b.center_x() - (b.min_x + b.max_x) / 2.0).abs() < EPS);
}

#[rstest]
fn given_links_when_rendering_paths_then_start_and_end_at_node_centers(document: Arc<TreeNode>) {
    let result = layout_reconciled(
        &reconciled(&document, ExpansionMap::uniform(&document, true)),
        &LayoutConfig::default(),
    );
    for link in &result.links {
        let source = result.node(&link.source_id).unwrap();
        let target = result.node(&link.target_id).unwrap();
        assert_eq!(link.source, source.position());
        assert_eq!(link.target, target.position());
        let path = link.path();
        assert!(path.starts_with(&format!("M {} {} C", source.x, source.y)));
        assert!(path.ends_with(&format!("{} {}", target.x, target.y)));
    }
}

#[test]
fn given_wider_pitch_when_laying_out_then_positions_scale() {
    let doc = Arc::new(
        TreeNode::new("1")
            .with_child(TreeNode::new("2"))
            .with_child(TreeNode::new("3")),
    );
    let config = LayoutConfig {
        sibling_pitch: 10.0,
        depth_pitch: 100.0,
        ..Default::default()
    };
    let result = layout_reconciled(&reconciled(&doc, ExpansionMap::uniform(&doc, true)), &config);
    assert_eq!(result.node("2").unwrap().y, -10.0);
    assert_eq!(result.node("3").unwrap().y, 10.0);
    assert_eq!(result.node("3").unwrap().x, 100.0);
}
