// SPDX-License-Identifier: MIT OR Apache-2.0
//! Command execution.
//!
//! Each command returns the text to print on stdout. Snapshots written to a
//! file produce no output.

use crate::cli::{Cli, Command, ProjectCommand, ReportFormat, STDIO};
use crate::config::{ConfigError, StudioConfig};
use crate::project::{ProjectError, ProjectId, ProjectLibrary};
use crate::session::Session;
use pipeline_graph::catalog::NodeSchema;
use pipeline_graph::{
    extract_variables, GraphSnapshot, LocalValidator, NodeCatalog, NodeId, SnapshotError, ValidationError,
};
use std::fmt::Write as _;

/// Error reported to the user before exiting
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Input could not be read
    #[error("Failed to read {path}: {source}")]
    Read {
        /// File name, or '-' for stdin
        path: String,
        /// Underlying error
        source: std::io::Error,
    },
    /// Output could not be written
    #[error("Failed to write {path}: {source}")]
    Write {
        /// File name
        path: String,
        /// Underlying error
        source: std::io::Error,
    },
    /// Bad configuration file
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// Project library failure
    #[error(transparent)]
    Project(#[from] ProjectError),
    /// Bad snapshot
    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
    /// Validation failed to run
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// Output could not be encoded
    #[error("Failed to encode output: {0}")]
    Json(#[from] serde_json::Error),
    /// No such node in the snapshot
    #[error("No node {0} in the graph")]
    UnknownNode(NodeId),
    /// The node has no editable text
    #[error("Node {0} is not a text node")]
    NotText(NodeId),
}

/// Run a parsed command line
pub fn execute(cli: Cli) -> Result<String, CliError> {
    let mut config = StudioConfig::load_or_default(cli.config.as_deref())?;
    if let Some(library) = cli.library {
        config.library_path = library;
    }

    match cli.command {
        Command::Variables { text } => Ok(extract_variables(&text).iter().collect::<Vec<_>>().join("\n")),
        Command::Catalog => Ok(describe_catalog(&NodeCatalog::builtin())),
        Command::InitConfig { path } => {
            config.save(&path)?;
            Ok(path.display().to_string())
        }
        command => {
            let library = ProjectLibrary::open(&config.library_path)?;
            let mut session = Session::new(config, library, LocalValidator);
            run(&mut session, command)
        }
    }
}

fn run(session: &mut Session, command: Command) -> Result<String, CliError> {
    match command {
        Command::Layout(io) => {
            session.load_snapshot(read_snapshot(&io.input)?);
            let layout = session.arrange();
            tracing::info!(
                "Arranged {} nodes ({} connected)",
                layout.positions.len(),
                layout.levels.len()
            );
            write_snapshot(&session.store().snapshot(), &io.output)
        }
        Command::Validate { input, format } => {
            session.load_snapshot(read_snapshot(&input)?);
            let summary = session.validate()?;
            match format {
                ReportFormat::Text => Ok(summary.report()),
                ReportFormat::Json => Ok(serde_json::to_string_pretty(&summary)?),
            }
        }
        Command::SetText { io, node, text } => {
            session.load_snapshot(read_snapshot(&io.input)?);
            let node_id = NodeId::from(node);
            let kind = session
                .store()
                .node(&node_id)
                .map(|node| node.kind.clone())
                .ok_or_else(|| CliError::UnknownNode(node_id.clone()))?;
            if !kind.has_dynamic_handles() {
                return Err(CliError::NotText(node_id));
            }

            let update = session
                .set_text(&node_id, text)
                .ok_or_else(|| CliError::UnknownNode(node_id.clone()))?;
            for edge in &update.removed_edges {
                tracing::info!("Removed edge {edge}");
            }
            write_snapshot(&session.store().snapshot(), &io.output)
        }
        Command::Project(command) => run_project(session, command),
        Command::Variables { .. } | Command::Catalog | Command::InitConfig { .. } => Ok(String::new()),
    }
}

fn run_project(session: &mut Session, command: ProjectCommand) -> Result<String, CliError> {
    match command {
        ProjectCommand::List => {
            let mut out = String::new();
            for project in session.library().projects() {
                let id = project.id.as_ref().map_or("-", ProjectId::as_str);
                let _ = writeln!(
                    out,
                    "{id}\t{}\t{} nodes, {} edges",
                    project.name,
                    project.nodes.len(),
                    project.edges.len()
                );
            }
            Ok(out.trim_end().to_string())
        }
        ProjectCommand::New => {
            let id = session.new_project()?;
            Ok(format!("{id}\t{}", session.library().current().name))
        }
        ProjectCommand::Save { input, name, id } => {
            if let Some(id) = id {
                session.open_project(&ProjectId::from(id.as_str()))?;
            }
            session.load_snapshot(read_snapshot(&input)?);
            if let Some(name) = name {
                session.rename(name);
            }
            Ok(session.save()?.to_string())
        }
        ProjectCommand::Open { id, output } => {
            session.open_project(&ProjectId::from(id.as_str()))?;
            write_snapshot(&session.store().snapshot(), &output)
        }
        ProjectCommand::Rename { id, name } => {
            session.rename_project(&ProjectId::from(id.as_str()), name)?;
            Ok(String::new())
        }
        ProjectCommand::Delete { id } => {
            session.delete_project(&ProjectId::from(id.as_str()))?;
            Ok(String::new())
        }
        ProjectCommand::Clear => {
            session.clear_projects()?;
            Ok(String::new())
        }
    }
}

fn describe_catalog(catalog: &NodeCatalog) -> String {
    let handles = |schema: &NodeSchema, outputs: bool| {
        let specs = if outputs { &schema.outputs } else { &schema.inputs };
        let mut names: Vec<&str> = specs.iter().map(|spec| spec.suffix.as_str()).collect();
        if !outputs && schema.kind.has_dynamic_handles() {
            names.insert(0, "{{variables}}");
        }
        if names.is_empty() {
            "-".to_string()
        } else {
            names.join(", ")
        }
    };

    catalog
        .schemas()
        .map(|schema| {
            format!(
                "{}\t{}\tin: {}\tout: {}",
                schema.kind,
                schema.label,
                handles(schema, false),
                handles(schema, true)
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn read_snapshot(path: &str) -> Result<GraphSnapshot, CliError> {
    let content = if path == STDIO {
        std::io::read_to_string(std::io::stdin().lock())
    } else {
        std::fs::read_to_string(path)
    }
    .map_err(|source| CliError::Read {
        path: path.to_string(),
        source,
    })?;
    Ok(GraphSnapshot::from_json(&content)?)
}

fn write_snapshot(snapshot: &GraphSnapshot, path: &str) -> Result<String, CliError> {
    let json = snapshot.to_json()?;
    if path == STDIO {
        return Ok(json);
    }
    std::fs::write(path, json).map_err(|source| CliError::Write {
        path: path.to_string(),
        source,
    })?;
    tracing::info!("Wrote {path}");
    Ok(String::new())
}
