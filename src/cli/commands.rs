//! Command dispatch

use std::io;
use std::path::{Path, PathBuf};

use clap::CommandFactory;
use clap_complete::generate;
use serde::Serialize;
use tracing::{debug, instrument};

use crate::application::export::{export_html, export_index, export_json, export_outline};
use crate::application::{ExportFormat, IoResultExt, OutlineMode};
use crate::cli::args::{Cli, Commands, ConfigCommands, ViewArgs};
use crate::cli::output;
use crate::cli::{CliError, CliResult};
use crate::config::{global_config_path, local_config_path, Settings};
use crate::domain::{
    count_nodes, Bounds, Container, Metadata, MindMapEngine, NodePatch, RelationSet, Transform,
    TreeNode, ViewMode,
};
use crate::infrastructure::di::ServiceContainer;

/// Run the parsed command line.
pub fn execute(cli: &Cli) -> CliResult<()> {
    let Some(command) = &cli.command else {
        return Err(CliError::Usage("no command given, see --help".to_string()));
    };

    if let Commands::Completion { shell } = command {
        let mut cmd = Cli::command();
        let name = cmd.get_name().to_string();
        generate(*shell, &mut cmd, name, &mut io::stdout());
        return Ok(());
    }

    let local_dir = match &cli.config_dir {
        Some(dir) => dir.clone(),
        None => std::env::current_dir().map_err(|e| {
            CliError::Infra(crate::infrastructure::InfraError::io("current dir", e))
        })?,
    };

    if let Commands::Config { command } = command {
        return cmd_config(command, &local_dir);
    }

    let settings = Settings::load(Some(&local_dir))?;
    let services = ServiceContainer::new(settings);

    match command {
        Commands::Layout { file, view } => cmd_layout(&services, file, view),
        Commands::Tree { file, all, view } => cmd_tree(&services, file, *all, view),
        Commands::Export {
            file,
            format,
            output,
        } => cmd_export(&services, file, *format, output.as_deref()),
        Commands::Add {
            file,
            parent,
            label,
            summary,
            description,
        } => {
            let mut node = TreeNode::new_detail();
            if let Some(label) = label {
                node.label = Some(label.clone());
            }
            if let Some(summary) = summary {
                node.summary = Some(summary.clone());
            }
            if let Some(description) = description {
                node.description = Some(description.clone());
            }
            cmd_add(&services, file, parent, node)
        }
        Commands::Edit {
            file,
            id,
            label,
            summary,
            description,
            metadata,
        } => {
            let metadata = metadata
                .as_deref()
                .map(serde_json::from_str::<Metadata>)
                .transpose()
                .map_err(|e| CliError::InvalidArgs(format!("--metadata: {e}")))?;
            let patch = NodePatch {
                label: label.clone(),
                summary: summary.clone(),
                description: description.clone(),
                metadata,
            };
            cmd_edit(&services, file, id, &patch)
        }
        Commands::Fit {
            file,
            width,
            height,
            view,
        } => cmd_fit(&services, file, Container::new(*width, *height), view),
        Commands::Related { file, id, view } => cmd_related(&services, file, id, view),
        Commands::Config { .. } | Commands::Completion { .. } => Ok(()),
    }
}

/// Load the document into an engine and apply the expansion inputs.
fn open_engine(
    services: &ServiceContainer,
    file: &Path,
    view: &ViewArgs,
) -> CliResult<MindMapEngine> {
    let document = services.documents.load(file)?;
    let mut engine = services.engine(document, view.expand_all);
    for id in &view.toggle {
        if engine.toggle(id).is_none() {
            output::warning(&format!("unknown node id: {id}"));
        }
    }
    Ok(engine)
}

fn print_json(value: &impl Serialize) -> CliResult<()> {
    let json = serde_json::to_string_pretty(value).map_err(|e| {
        CliError::from(crate::application::ApplicationError::OperationFailed {
            context: "serialize output".to_string(),
            source: Box::new(e),
        })
    })?;
    output::info(&json);
    Ok(())
}

#[instrument(skip(services))]
fn cmd_layout(services: &ServiceContainer, file: &Path, view: &ViewArgs) -> CliResult<()> {
    let engine = open_engine(services, file, view)?;
    print_json(engine.layout().as_ref())
}

#[instrument(skip(services))]
fn cmd_tree(services: &ServiceContainer, file: &Path, all: bool, view: &ViewArgs) -> CliResult<()> {
    let engine = open_engine(services, file, view)?;
    let mode = if all {
        OutlineMode::Full
    } else {
        OutlineMode::Visible
    };
    output::info(&export_outline(&engine.reconciled(), mode));
    let layout = engine.layout();
    output::detail(&format!(
        "{} of {} nodes visible",
        layout.nodes.len(),
        count_nodes(engine.document())
    ));
    Ok(())
}

#[instrument(skip(services))]
fn cmd_export(
    services: &ServiceContainer,
    file: &Path,
    format: ExportFormat,
    out: Option<&Path>,
) -> CliResult<()> {
    let document = services.documents.load(file)?;
    let text = match format {
        ExportFormat::Json => export_json(&document)?,
        ExportFormat::Html => export_html(&document)?,
        ExportFormat::Outline => {
            let engine = services.engine(document, true);
            export_outline(&engine.reconciled(), OutlineMode::Full)
        }
        ExportFormat::Index => export_index(&document),
    };
    match out {
        Some(path) => {
            let path = if path.extension().is_none() {
                path.with_extension(format.extension())
            } else {
                path.to_path_buf()
            };
            services
                .fs
                .write_atomic(&path, &text)
                .with_path_context("write export", &path)?;
            output::action("Exported", &path.display());
        }
        None => output::info(&text),
    }
    Ok(())
}

#[instrument(skip(services, node))]
fn cmd_add(
    services: &ServiceContainer,
    file: &Path,
    parent: &str,
    node: TreeNode,
) -> CliResult<()> {
    let id = services.documents.add_child(file, parent, node)?;
    debug!("added {} under {}", id, parent);
    output::success(&format!("added {id} under {parent}"));
    Ok(())
}

#[instrument(skip(services))]
fn cmd_edit(
    services: &ServiceContainer,
    file: &Path,
    id: &str,
    patch: &NodePatch,
) -> CliResult<()> {
    if patch.is_empty() {
        return Err(CliError::InvalidArgs(
            "nothing to change, give --label, --summary, --description or --metadata".into(),
        ));
    }
    services.documents.edit(file, id, patch)?;
    output::success(&format!("updated {id}"));
    Ok(())
}

#[derive(Serialize)]
struct FitOutput {
    mode: ViewMode,
    transform: Transform,
    bounds: Bounds,
    container: Container,
}

#[instrument(skip(services))]
fn cmd_fit(
    services: &ServiceContainer,
    file: &Path,
    container: Container,
    view: &ViewArgs,
) -> CliResult<()> {
    let mut engine = open_engine(services, file, view)?;
    let transform = engine.request_fit(container);
    if engine.viewport().mode() != ViewMode::Fitted {
        output::warning("container or bounds empty, transform left at identity");
    }
    print_json(&FitOutput {
        mode: engine.viewport().mode(),
        transform,
        bounds: engine.layout().bounds,
        container,
    })
}

#[instrument(skip(services))]
fn cmd_related(
    services: &ServiceContainer,
    file: &Path,
    id: &str,
    view: &ViewArgs,
) -> CliResult<()> {
    let mut engine = open_engine(services, file, view)?;
    if !engine.layout().contains(id) {
        return Err(CliError::InvalidArgs(format!("node {id} is not visible")));
    }
    engine.hover(Some(id));
    let related: RelationSet = engine.related();
    print_json(&related)
}

fn cmd_config(command: &ConfigCommands, local_dir: &Path) -> CliResult<()> {
    match command {
        ConfigCommands::Show => {
            let settings = Settings::load(Some(local_dir))?;
            output::info(&settings.to_toml()?);
        }
        ConfigCommands::Template => output::info(&Settings::template()),
        ConfigCommands::Path => {
            output::header("Config files");
            let global: Option<PathBuf> = global_config_path();
            match global {
                Some(path) => show_path("global", &path),
                None => output::detail(&"global: (no config dir)"),
            }
            show_path("local", &local_config_path(local_dir));
        }
    }
    Ok(())
}

fn show_path(label: &str, path: &Path) {
    let state = if path.exists() { "" } else { " (not found)" };
    output::highlight(&format!("{label}: {}{state}", path.display()));
}
