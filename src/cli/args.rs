//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand, ValueHint};

use crate::application::ExportFormat;

/// Mind-map engine: tidy tree layout, expansion state and viewport fitting for JSON documents
#[derive(Parser, Debug)]
#[command(name = "mindmap")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Debug verbosity (-d info, -dd debug, -ddd trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub debug: u8,

    /// Directory holding a local .mindmap.toml (default: cwd)
    #[arg(short = 'C', long, global = true, value_hint = ValueHint::DirPath)]
    pub config_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Expansion inputs applied before layout.
#[derive(Args, Debug, Clone, Default)]
pub struct ViewArgs {
    /// Expand every node (default: only the root)
    #[arg(short = 'e', long)]
    pub expand_all: bool,

    /// Toggle node(s) after applying the global flag
    #[arg(short, long, value_name = "ID")]
    pub toggle: Vec<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print positioned nodes, links and bounds as JSON
    Layout {
        /// Document file
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,
        #[command(flatten)]
        view: ViewArgs,
    },

    /// Show the document as a tree
    Tree {
        /// Document file
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,
        /// Show every node, ignoring expansion
        #[arg(short, long)]
        all: bool,
        #[command(flatten)]
        view: ViewArgs,
    },

    /// Export the full document
    Export {
        /// Document file
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,
        /// json, html, outline or index
        #[arg(short, long, default_value = "json")]
        format: ExportFormat,
        /// Output file (default: stdout); the format's extension is added if missing
        #[arg(short, long, value_hint = ValueHint::FilePath)]
        output: Option<PathBuf>,
    },

    /// Add a child node and write the document back
    Add {
        /// Document file
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,
        /// Parent node id
        #[arg(short, long)]
        parent: String,
        #[arg(long)]
        label: Option<String>,
        #[arg(long)]
        summary: Option<String>,
        #[arg(long)]
        description: Option<String>,
    },

    /// Edit fields of a node and write the document back
    Edit {
        /// Document file
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,
        /// Node id
        id: String,
        #[arg(long)]
        label: Option<String>,
        #[arg(long)]
        summary: Option<String>,
        #[arg(long)]
        description: Option<String>,
        /// Replacement metadata as a JSON object
        #[arg(long, value_name = "JSON")]
        metadata: Option<String>,
    },

    /// Compute the fit-to-view transform for a container
    Fit {
        /// Document file
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,
        /// Container width in pixels
        #[arg(long)]
        width: f64,
        /// Container height in pixels
        #[arg(long)]
        height: f64,
        #[command(flatten)]
        view: ViewArgs,
    },

    /// Show the parent and children of a node
    Related {
        /// Document file
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,
        /// Focused node id
        id: String,
        #[command(flatten)]
        view: ViewArgs,
    },

    /// Manage settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Generate shell completions
    Completion {
        /// Shell type
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show effective configuration
    Show,
    /// Print a commented template
    Template,
    /// Show config file locations
    Path,
}
