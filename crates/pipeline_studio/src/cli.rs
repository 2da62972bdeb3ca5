// SPDX-License-Identifier: MIT OR Apache-2.0
//! Command line definition.

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Read from stdin or write to stdout
pub const STDIO: &str = "-";

/// Top-level arguments
#[derive(Debug, Parser)]
#[command(
    name = "pipeline-studio",
    version,
    about = "Edit, lay out and validate pipeline graphs."
)]
pub struct Cli {
    /// Configuration file (RON). Built-in defaults are used when omitted.
    #[arg(short = 'c', long = "config", global = true)]
    pub config: Option<PathBuf>,

    /// Project library file. Overrides the configured location.
    #[arg(short = 'l', long = "library", global = true)]
    pub library: Option<PathBuf>,

    /// What to do
    #[command(subcommand)]
    pub command: Command,
}

/// Subcommands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Auto-arrange a graph snapshot.
    Layout(GraphIo),

    /// Report node and edge counts and whether the graph is a DAG.
    Validate {
        /// Snapshot JSON to read. Use '-' for stdin.
        #[arg(short = 'i', long = "input", default_value = STDIO)]
        input: String,

        /// Output format.
        #[arg(short = 'f', long = "format", value_enum, default_value_t = ReportFormat::Text)]
        format: ReportFormat,
    },

    /// Replace the text of a text node, dropping edges into removed variables.
    SetText {
        /// Snapshot input and output.
        #[command(flatten)]
        io: GraphIo,

        /// ID of the text node.
        #[arg(short = 'n', long = "node")]
        node: String,

        /// New text.
        #[arg(short = 't', long = "text")]
        text: String,
    },

    /// List the `{{variables}}` in a piece of text.
    Variables {
        /// Text to scan.
        text: String,
    },

    /// List node kinds and their handles.
    Catalog,

    /// Write a configuration file with every default filled in.
    InitConfig {
        /// Where to write it.
        #[arg(default_value = "studio.ron")]
        path: PathBuf,
    },

    /// Manage saved projects.
    #[command(subcommand)]
    Project(ProjectCommand),
}

/// Snapshot input and output paths
#[derive(Debug, Args)]
pub struct GraphIo {
    /// Snapshot JSON to read. Use '-' for stdin.
    #[arg(short = 'i', long = "input", default_value = STDIO)]
    pub input: String,

    /// Where to write the resulting snapshot. Use '-' for stdout.
    #[arg(short = 'o', long = "output", default_value = STDIO)]
    pub output: String,
}

/// Project subcommands
#[derive(Debug, Subcommand)]
pub enum ProjectCommand {
    /// List saved projects, newest first.
    List,

    /// Start a new empty project.
    New,

    /// Save a snapshot as a project.
    Save {
        /// Snapshot JSON to read. Use '-' for stdin.
        #[arg(short = 'i', long = "input", default_value = STDIO)]
        input: String,

        /// Project name.
        #[arg(long = "name")]
        name: Option<String>,

        /// Overwrite this project instead of creating one.
        #[arg(long = "id")]
        id: Option<String>,
    },

    /// Open a project, arrange it and write its snapshot.
    Open {
        /// Project ID.
        id: String,

        /// Where to write the snapshot. Use '-' for stdout.
        #[arg(short = 'o', long = "output", default_value = STDIO)]
        output: String,
    },

    /// Rename a project.
    Rename {
        /// Project ID.
        id: String,

        /// New name.
        name: String,
    },

    /// Delete a project.
    Delete {
        /// Project ID.
        id: String,
    },

    /// Delete every project.
    Clear,
}

/// Validation output format
#[derive(Debug, Clone, Copy, Default, ValueEnum, PartialEq, Eq)]
pub enum ReportFormat {
    /// Human-readable report
    #[default]
    Text,
    /// `{num_nodes, num_edges, is_dag}` as JSON
    Json,
}
