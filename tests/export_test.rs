//! JSON, HTML and outline exports

use std::sync::Arc;

use rstest::{fixture, rstest};
use serde_json::{json, Value};

use mindmap::application::{export_html, export_json, export_outline, OutlineMode};
use mindmap::domain::{
    layout_reconciled, ExpansionMap, LayoutConfig, NodeKind, ReconciledTree, TreeNode,
};

#[fixture]
fn document() -> Arc<TreeNode> {
    let mut b = TreeNode::new("3")
        .with_label("B")
        .with_kind(NodeKind::Category);
    b.summary = Some("Second branch".into());
    b.metadata.insert("tags".into(), json!(["x", "y"]));
    Arc::new(
        TreeNode::new("1")
            .with_label("Root")
            .with_kind(NodeKind::Root)
            .with_child(
                TreeNode::new("2")
                    .with_label("A")
                    .with_kind(NodeKind::Category)
                    .with_child(TreeNode::new("4").with_label("A.1")),
            )
            .with_child(b),
    )
}

#[rstest]
fn given_document_when_exporting_json_then_parses_back_equal(document: Arc<TreeNode>) {
    let text = export_json(&document).unwrap();
    let parsed: TreeNode = serde_json::from_str(&text).unwrap();

    assert_eq!(parsed, *document);
    let raw: Value = serde_json::from_str(&text).unwrap();
    assert_eq!(raw["type"], "root");
    assert!(raw.get("expanded").is_none());
    assert!(raw["children"][0]["children"][0].get("metadata").is_none());
}

#[rstest]
fn given_document_when_exporting_html_then_every_node_has_a_section(document: Arc<TreeNode>) {
    let html = export_html(&document).unwrap();

    assert!(html.starts_with("<!DOCTYPE html>"));
    assert!(html.contains("<title>Root</title>"));
    for id in ["1", "2", "3", "4"] {
        assert!(html.contains(&format!("<section id=\"{id}\">")), "missing {id}");
    }
    assert!(html.contains("<h1>Root</h1>"));
    assert!(html.contains("<h3>A.1</h3>"));
    assert!(html.contains("<p class=\"summary\">Second branch</p>"));
    assert!(html.contains("<span class=\"badge\">category</span>"));
    assert!(html.contains("4 nodes"));
    assert_eq!(html.matches("<section").count(), html.matches("</section>").count());
}

#[rstest]
fn given_full_mode_when_exporting_outline_then_all_nodes_listed(document: Arc<TreeNode>) {
    let reconciled = ReconciledTree {
        expansion: ExpansionMap::uniform(&document, false),
        document,
    };
    let outline = export_outline(&reconciled, OutlineMode::Full);

    assert!(outline.starts_with("Root [root]"));
    assert!(outline.contains("A.1"));
    assert_eq!(outline.lines().count(), 4);
}

#[rstest]
fn given_visible_mode_when_exporting_outline_then_collapsed_children_hidden(
    document: Arc<TreeNode>,
) {
    let reconciled = ReconciledTree {
        expansion: ExpansionMap::uniform(&document, false),
        document,
    };
    let outline = export_outline(&reconciled, OutlineMode::Visible);

    assert!(outline.starts_with("[-] Root [root]"));
    assert!(outline.contains("[+] A [category]"));
    assert!(!outline.contains("A.1"));
    assert_eq!(outline.lines().count(), 3);

    let layout = layout_reconciled(&reconciled, &LayoutConfig::default());
    assert_eq!(layout.nodes.len(), outline.lines().count());
}

#[rstest]
fn given_layout_when_serialized_then_camel_case_fields(document: Arc<TreeNode>) {
    let reconciled = ReconciledTree {
        expansion: ExpansionMap::uniform(&document, true),
        document,
    };
    let layout = layout_reconciled(&reconciled, &LayoutConfig::default());
    let value = serde_json::to_value(&layout).unwrap();

    assert_eq!(value["nodes"][0]["id"], "1");
    assert_eq!(value["nodes"][0]["childCount"], 2);
    assert_eq!(value["nodes"][0]["type"], "root");
    assert!(value["links"][0]["path"].as_str().unwrap().starts_with("M 0 0 C"));
    assert_eq!(value["links"][0]["sourceId"], "1");
    assert!(value["bounds"]["centerX"].is_number());
}
