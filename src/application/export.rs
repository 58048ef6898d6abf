//! Document exports: JSON dump, HTML document and text outline.
//!
//! JSON and HTML walk the full document regardless of expansion. The outline
//! can optionally be restricted to the visible nodes.

use std::fmt::Write as _;
use std::str::FromStr;

use itertools::Itertools;
use termtree::Tree;
use tracing::instrument;

use crate::application::{ApplicationError, ApplicationResult};
use crate::domain::{count_nodes, tree, ReconciledTree, TreeNode, VisibleTree};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Html,
    Outline,
    /// Flat `id: label` listing
    Index,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Html => "html",
            ExportFormat::Outline | ExportFormat::Index => "txt",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = ApplicationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(ExportFormat::Json),
            "html" => Ok(ExportFormat::Html),
            "outline" | "txt" => Ok(ExportFormat::Outline),
            "index" => Ok(ExportFormat::Index),
            other => Err(ApplicationError::Config {
                message: format!("unknown export format: {other}"),
            }),
        }
    }
}

/// Pretty JSON of the document, two-space indent.
pub fn export_json(document: &TreeNode) -> ApplicationResult<String> {
    serde_json::to_string_pretty(document).map_err(|e| ApplicationError::OperationFailed {
        context: "serialize document".to_string(),
        source: Box::new(e),
    })
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn render_failed(e: std::fmt::Error) -> ApplicationError {
    ApplicationError::OperationFailed {
        context: "render html".to_string(),
        source: Box::new(e),
    }
}

fn write_fields(
    out: &mut String,
    node: &TreeNode,
    depth: usize,
    metadata: Option<&str>,
) -> std::fmt::Result {
    let indent = "  ".repeat(depth + 1);
    let level = (depth + 1).min(6);
    writeln!(out, "{indent}<section id=\"{}\">", escape_html(&node.id))?;
    writeln!(
        out,
        "{indent}  <h{level}>{}</h{level}>",
        escape_html(node.display_label())
    )?;
    if let Some(kind) = &node.kind {
        writeln!(
            out,
            "{indent}  <span class=\"badge\">{}</span>",
            escape_html(kind.as_str())
        )?;
    }
    if let Some(summary) = &node.summary {
        writeln!(out, "{indent}  <p class=\"summary\">{}</p>", escape_html(summary))?;
    }
    if let Some(description) = &node.description {
        writeln!(
            out,
            "{indent}  <p class=\"description\">{}</p>",
            escape_html(description)
        )?;
    }
    if let Some(pretty) = metadata {
        writeln!(out, "{indent}  <pre class=\"metadata\">{}</pre>", escape_html(pretty))?;
    }
    Ok(())
}

fn write_section(out: &mut String, node: &TreeNode, depth: usize) -> ApplicationResult<()> {
    let metadata = if node.metadata.is_empty() {
        None
    } else {
        let pretty = serde_json::to_string_pretty(&node.metadata).map_err(|e| {
            ApplicationError::OperationFailed {
                context: format!("serialize metadata of node {}", node.id),
                source: Box::new(e),
            }
        })?;
        Some(pretty)
    };
    write_fields(out, node, depth, metadata.as_deref()).map_err(render_failed)?;
    for child in &node.children {
        write_section(out, child, depth + 1)?;
    }
    writeln!(out, "{}</section>", "  ".repeat(depth + 1)).map_err(render_failed)
}

/// Self-contained HTML document, one nested section per node.
#[instrument(level = "debug", skip_all, fields(root = %document.id))]
pub fn export_html(document: &TreeNode) -> ApplicationResult<String> {
    let title = escape_html(document.display_label());
    let mut body = String::new();
    write_section(&mut body, document, 0)?;

    Ok(format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <title>{title}</title>
  <style>
    body {{ font-family: sans-serif; max-width: 60rem; margin: 2rem auto; }}
    section section {{ margin-left: 1.5rem; }}
    .badge {{
      font-size: 0.75rem; padding: 0.1rem 0.5rem; border-radius: 0.5rem; background: #eee;
    }}
    .summary {{ font-weight: 600; }}
    pre.metadata {{ background: #f6f6f6; padding: 0.5rem; }}
  </style>
</head>
<body>
  <p class="stats">{count} nodes</p>
{body}</body>
</html>
"#,
        count = count_nodes(document),
    ))
}

/// Which nodes an outline shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutlineMode {
    /// Every node of the document.
    #[default]
    Full,
    /// Visible nodes only, with `[+]`/`[-]` markers on nodes with children.
    Visible,
}

pub trait TreeNodeConvert {
    fn to_tree_string(&self) -> Tree<String>;
}

fn outline_label(node: &TreeNode) -> String {
    match &node.kind {
        Some(kind) => format!("{} [{}]", node.display_label(), kind),
        None => node.display_label().to_string(),
    }
}

impl TreeNodeConvert for TreeNode {
    fn to_tree_string(&self) -> Tree<String> {
        let leaves = self.children.iter().map(|c| c.to_tree_string()).collect_vec();
        Tree::new(outline_label(self)).with_leaves(leaves)
    }
}

impl TreeNodeConvert for VisibleTree {
    fn to_tree_string(&self) -> Tree<String> {
        let Some(root_idx) = self.root() else {
            return Tree::new("Empty tree".to_string());
        };

        fn label(tree: &VisibleTree, idx: generational_arena::Index) -> String {
            match tree.get_node(idx) {
                Some(n) if n.child_count() > 0 => {
                    let marker = if n.expanded { "[-]" } else { "[+]" };
                    format!("{} {}", marker, outline_label(&n.node))
                }
                Some(n) => outline_label(&n.node),
                None => String::new(),
            }
        }

        fn build(tree: &VisibleTree, idx: generational_arena::Index) -> Tree<String> {
            let leaves = tree
                .get_node(idx)
                .map(|n| n.children.iter().map(|&c| build(tree, c)).collect_vec())
                .unwrap_or_default();
            Tree::new(label(tree, idx)).with_leaves(leaves)
        }

        build(self, root_idx)
    }
}

/// Text outline of the document.
pub fn export_outline(reconciled: &ReconciledTree, mode: OutlineMode) -> String {
    match mode {
        OutlineMode::Full => reconciled.document.to_tree_string().to_string(),
        OutlineMode::Visible => VisibleTree::from_reconciled(reconciled)
            .to_tree_string()
            .to_string(),
    }
}

/// Flat `id: label` listing in document order, one per line.
pub fn export_index(document: &TreeNode) -> String {
    tree::iter(document)
        .map(|(depth, n)| format!("{}{}: {}", "  ".repeat(depth), n.id, n.display_label()))
        .join("\n")
}
