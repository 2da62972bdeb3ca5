// SPDX-License-Identifier: MIT OR Apache-2.0
//! `PipelineStudio` command line.
//!
//! Works on pipeline graph snapshots stored as JSON:
//! - Auto-layout of a snapshot
//! - DAG validation with a readable report
//! - Text node edits that keep variable handles and edges consistent
//! - A project library of saved snapshots
//!
//! ## Architecture
//!
//! The graph itself lives in `pipeline_graph`. This binary adds the
//! configuration file, the project library and a [`session::Session`] that
//! ties them to one graph. Logs go to stderr so snapshots can be piped
//! through stdout.

mod cli;
mod commands;
mod config;
mod project;
mod session;

use clap::Parser;
use cli::Cli;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Log filter used when `RUST_LOG` is unset
const DEFAULT_LOG_FILTER: &str = "pipeline_studio=info,pipeline_graph=info";

fn main() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    tracing::debug!("Starting PipelineStudio v{}", env!("CARGO_PKG_VERSION"));

    match commands::execute(cli) {
        Ok(output) => {
            if !output.is_empty() {
                println!("{output}");
            }
        }
        Err(e) => {
            tracing::error!("{e}");
            std::process::exit(1);
        }
    }
}
