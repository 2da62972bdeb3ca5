// SPDX-License-Identifier: MIT OR Apache-2.0
//! Connection points on nodes.
//!
//! Handles are never stored on their own. They are derived from a node's
//! catalog schema, or for text nodes, from the variables in the text.

use crate::node::NodeId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a handle, formatted as `<nodeId>-<suffix>`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HandleId(pub String);

impl HandleId {
    /// Wrap an existing identifier
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Build the handle ID for a node and suffix
    pub fn for_node(node_id: &NodeId, suffix: &str) -> Self {
        Self(format!("{node_id}-{suffix}"))
    }

    /// Get the identifier as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for HandleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for HandleId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for HandleId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Which end of an edge a handle accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HandleDirection {
    /// Edges end here
    Target,
    /// Edges start here
    Source,
}

/// Where a handle comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HandleOrigin {
    /// Fixed by the node kind
    Static,
    /// Derived from a `{{variable}}` in the node text
    Variable,
}

/// Schema entry describing one static handle of a node kind
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandleSpec {
    /// Suffix appended to the node ID
    pub suffix: String,
    /// Direction
    pub direction: HandleDirection,
}

impl HandleSpec {
    /// Create a target handle spec
    pub fn input(suffix: impl Into<String>) -> Self {
        Self {
            suffix: suffix.into(),
            direction: HandleDirection::Target,
        }
    }

    /// Create a source handle spec
    pub fn output(suffix: impl Into<String>) -> Self {
        Self {
            suffix: suffix.into(),
            direction: HandleDirection::Source,
        }
    }

    /// Instantiate the spec for a concrete node
    pub fn instantiate(&self, node_id: &NodeId) -> Handle {
        Handle {
            id: HandleId::for_node(node_id, &self.suffix),
            name: self.suffix.clone(),
            direction: self.direction,
            origin: HandleOrigin::Static,
        }
    }
}

/// A handle on a concrete node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Handle {
    /// Handle ID
    pub id: HandleId,
    /// Display name (the suffix or variable name)
    pub name: String,
    /// Direction
    pub direction: HandleDirection,
    /// Static or derived
    pub origin: HandleOrigin,
}

impl Handle {
    /// Create the target handle for a text variable
    pub fn variable(node_id: &NodeId, name: &str) -> Self {
        Self {
            id: HandleId::for_node(node_id, name),
            name: name.to_string(),
            direction: HandleDirection::Target,
            origin: HandleOrigin::Variable,
        }
    }

    /// Check if edges may end on this handle
    pub fn is_target(&self) -> bool {
        self.direction == HandleDirection::Target
    }
}
