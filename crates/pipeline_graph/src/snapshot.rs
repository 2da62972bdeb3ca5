// SPDX-License-Identifier: MIT OR Apache-2.0
//! Whole-graph snapshots exchanged with persistence and the renderer.

use crate::edge::Edge;
use crate::node::Node;
use serde::{Deserialize, Serialize};

/// Complete `(nodes, edges)` state of a graph
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphSnapshot {
    /// Nodes in insertion order
    #[serde(default)]
    pub nodes: Vec<Node>,
    /// Edges in insertion order
    #[serde(default)]
    pub edges: Vec<Edge>,
}

impl GraphSnapshot {
    /// Create a snapshot
    pub fn new(nodes: Vec<Node>, edges: Vec<Edge>) -> Self {
        Self { nodes, edges }
    }

    /// Check if the snapshot has neither nodes nor edges
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }

    /// Parse a snapshot from JSON
    pub fn from_json(json: &str) -> Result<Self, SnapshotError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serialize to pretty-printed JSON
    pub fn to_json(&self) -> Result<String, SnapshotError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Error reading or writing a snapshot
#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    /// Malformed JSON
    #[error("Invalid snapshot JSON: {0}")]
    Json(#[from] serde_json::Error),
}
