// SPDX-License-Identifier: MIT OR Apache-2.0
//! Studio configuration, read from a RON file.
//!
//! Every field has a default, so a config file only needs the values it
//! wants to change:
//!
//! ```ron
//! (
//!     library_path: "workflows.ron",
//!     layout: (columns: 3),
//! )
//! ```

use pipeline_graph::LayoutConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default project library file
pub const DEFAULT_LIBRARY_FILE: &str = "pipelines.ron";

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StudioConfig {
    /// Where projects are stored
    pub library_path: PathBuf,
    /// Run auto-layout after opening a project
    pub arrange_on_open: bool,
    /// Layout spacing
    pub layout: LayoutConfig,
}

impl Default for StudioConfig {
    fn default() -> Self {
        Self {
            library_path: PathBuf::from(DEFAULT_LIBRARY_FILE),
            arrange_on_open: true,
            layout: LayoutConfig::default(),
        }
    }
}

impl StudioConfig {
    /// Load configuration from a RON file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config = ron::from_str(&content)?;
        tracing::debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Load from `path` if given, else use defaults
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        path.map_or_else(|| Ok(Self::default()), Self::load)
    }

    /// Write configuration as pretty RON
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let pretty = ron::ser::PrettyConfig::default().struct_names(false);
        std::fs::write(path, ron::ser::to_string_pretty(self, pretty)?)?;
        Ok(())
    }
}

/// Error loading or saving configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The file could not be read or written
    #[error("Failed to access config file: {0}")]
    Io(#[from] std::io::Error),
    /// The file is not valid RON for this config
    #[error("Invalid config file: {0}")]
    Parse(#[from] ron::error::SpannedError),
    /// The config could not be encoded
    #[error("Failed to encode config: {0}")]
    Encode(#[from] ron::Error),
}
