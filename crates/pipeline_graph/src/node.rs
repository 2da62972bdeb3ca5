// SPDX-License-Identifier: MIT OR Apache-2.0
//! Node definitions for the pipeline graph.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Free-form field map attached to every node
pub type NodeData = serde_json::Map<String, Value>;

/// Unique identifier for a node, formatted as `<kind>-<counter>`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub String);

impl NodeId {
    /// Wrap an existing identifier
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Build the identifier for the `counter`-th node of a kind
    pub fn for_kind(kind: &NodeKind, counter: u64) -> Self {
        Self(format!("{}-{counter}", kind.as_str()))
    }

    /// Get the identifier as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Split a generated identifier back into its kind name and counter.
    ///
    /// Returns `None` for identifiers that were not produced by
    /// [`NodeId::for_kind`].
    pub fn counter_for(&self, kind: &NodeKind) -> Option<u64> {
        self.0
            .strip_prefix(kind.as_str())?
            .strip_prefix('-')?
            .parse()
            .ok()
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for NodeId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Node type, serialized under the wire names used by the canvas
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum NodeKind {
    /// Pipeline entry point
    Input,
    /// Free text with `{{variable}}` placeholders
    Text,
    /// Language model call
    Llm,
    /// Single-input data transform
    Transform,
    /// Conditional router with pass/fail outputs
    Filter,
    /// HTTP API call
    Api,
    /// Database query
    Database,
    /// Merges several inputs
    Aggregator,
    /// Pipeline exit point
    Output,
    /// A kind the catalog does not know about, kept verbatim
    Other(String),
}

impl NodeKind {
    /// All built-in kinds, in palette order
    pub const BUILTIN: [NodeKind; 9] = [
        NodeKind::Input,
        NodeKind::Output,
        NodeKind::Llm,
        NodeKind::Text,
        NodeKind::Transform,
        NodeKind::Filter,
        NodeKind::Api,
        NodeKind::Database,
        NodeKind::Aggregator,
    ];

    /// Parse a wire name
    pub fn from_name(name: &str) -> Self {
        match name {
            "customInput" => Self::Input,
            "text" => Self::Text,
            "llm" => Self::Llm,
            "transform" => Self::Transform,
            "filter" => Self::Filter,
            "api" => Self::Api,
            "database" => Self::Database,
            "aggregator" => Self::Aggregator,
            "customOutput" => Self::Output,
            other => Self::Other(other.to_string()),
        }
    }

    /// Wire name of this kind
    pub fn as_str(&self) -> &str {
        match self {
            Self::Input => "customInput",
            Self::Text => "text",
            Self::Llm => "llm",
            Self::Transform => "transform",
            Self::Filter => "filter",
            Self::Api => "api",
            Self::Database => "database",
            Self::Aggregator => "aggregator",
            Self::Output => "customOutput",
            Self::Other(name) => name,
        }
    }

    /// Sort key used when nodes are tiled into a grid.
    ///
    /// Inputs come first, then text and data sources, processing nodes,
    /// and outputs. Unknown kinds go last.
    pub fn layout_rank(&self) -> u32 {
        match self {
            Self::Input => 1,
            Self::Text => 2,
            Self::Api | Self::Database => 3,
            Self::Llm => 4,
            Self::Transform | Self::Filter => 5,
            Self::Aggregator => 6,
            Self::Output => 7,
            Self::Other(_) => 99,
        }
    }

    /// Whether this kind derives input handles from its text
    pub fn has_dynamic_handles(&self) -> bool {
        matches!(self, Self::Text)
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for NodeKind {
    fn from(name: String) -> Self {
        Self::from_name(&name)
    }
}

impl From<NodeKind> for String {
    fn from(kind: NodeKind) -> Self {
        kind.as_str().to_string()
    }
}

/// Canvas coordinate
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    /// Horizontal coordinate
    pub x: f64,
    /// Vertical coordinate
    pub y: f64,
}

impl Position {
    /// Create a position
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// A node instance in the graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Unique instance ID
    pub id: NodeId,
    /// Node type
    #[serde(rename = "type")]
    pub kind: NodeKind,
    /// Position on the canvas
    #[serde(default)]
    pub position: Position,
    /// Field values edited by the user
    #[serde(default)]
    pub data: NodeData,
}

impl Node {
    /// Create a node with empty data
    pub fn new(id: NodeId, kind: NodeKind, position: Position) -> Self {
        Self {
            id,
            kind,
            position,
            data: NodeData::new(),
        }
    }

    /// Replace the data map
    pub fn with_data(mut self, data: NodeData) -> Self {
        self.data = data;
        self
    }

    /// Set a single field
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.data.insert(name.into(), value.into());
        self
    }

    /// Get a field value
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.data.get(name)
    }

    /// Get the `text` field of a text node
    pub fn text(&self) -> Option<&str> {
        self.field("text").and_then(Value::as_str)
    }
}
