// SPDX-License-Identifier: MIT OR Apache-2.0
//! Edge definitions for the graph.

use crate::handle::HandleId;
use crate::node::NodeId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Stroke and marker color of new edges
const EDGE_COLOR: &str = "#2d3748";
const EDGE_STROKE_WIDTH: f64 = 3.0;
const EDGE_MARKER_SIZE: f64 = 20.0;

/// Unique identifier for an edge
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EdgeId(pub String);

impl EdgeId {
    /// Wrap an existing identifier
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Derive the identifier of a new edge from its endpoints and creation time
    pub fn derive(connection: &Connection, created_millis: u128) -> Self {
        let handle = |h: &Option<HandleId>| h.as_ref().map(HandleId::as_str).unwrap_or_default().to_string();
        Self(format!(
            "{}{}-{}{}-{created_millis}",
            connection.source,
            handle(&connection.source_handle),
            connection.target,
            handle(&connection.target_handle),
        ))
    }

    /// Get the identifier as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EdgeId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// A proposed edge: the four-part key that must be unique in a graph
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection {
    /// Source node
    pub source: NodeId,
    /// Source handle, if the source has several
    #[serde(default)]
    pub source_handle: Option<HandleId>,
    /// Target node
    pub target: NodeId,
    /// Target handle, if the target has several
    #[serde(default)]
    pub target_handle: Option<HandleId>,
}

impl Connection {
    /// Connect two nodes without naming handles
    pub fn new(source: impl Into<NodeId>, target: impl Into<NodeId>) -> Self {
        Self {
            source: source.into(),
            source_handle: None,
            target: target.into(),
            target_handle: None,
        }
    }

    /// Set the source handle
    pub fn from_handle(mut self, handle: impl Into<HandleId>) -> Self {
        self.source_handle = Some(handle.into());
        self
    }

    /// Set the target handle
    pub fn to_handle(mut self, handle: impl Into<HandleId>) -> Self {
        self.target_handle = Some(handle.into());
        self
    }
}

/// Stroke style of a rendered edge
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeStyle {
    /// Stroke color
    pub stroke: String,
    /// Stroke width
    pub stroke_width: f64,
}

/// Arrow marker drawn at the target end
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeMarker {
    /// Marker shape
    #[serde(rename = "type")]
    pub kind: String,
    /// Marker color
    pub color: String,
    /// Marker width
    pub width: f64,
    /// Marker height
    pub height: f64,
}

fn default_edge_type() -> String {
    "default".to_string()
}

/// An edge between two node handles
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Edge {
    /// Unique edge ID
    pub id: EdgeId,
    /// Source node ID
    pub source: NodeId,
    /// Source handle ID
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_handle: Option<HandleId>,
    /// Target node ID
    pub target: NodeId,
    /// Target handle ID
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_handle: Option<HandleId>,
    /// Renderer edge type
    #[serde(rename = "type", default = "default_edge_type")]
    pub kind: String,
    /// Whether the renderer animates the stroke
    #[serde(default)]
    pub animated: bool,
    /// Stroke style
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<EdgeStyle>,
    /// End marker
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub marker_end: Option<EdgeMarker>,
}

impl Edge {
    /// Create an edge with the default visual metadata
    pub fn new(id: EdgeId, connection: Connection) -> Self {
        Self {
            id,
            source: connection.source,
            source_handle: connection.source_handle,
            target: connection.target,
            target_handle: connection.target_handle,
            kind: default_edge_type(),
            animated: true,
            style: Some(EdgeStyle {
                stroke: EDGE_COLOR.to_string(),
                stroke_width: EDGE_STROKE_WIDTH,
            }),
            marker_end: Some(EdgeMarker {
                kind: "arrow".to_string(),
                color: EDGE_COLOR.to_string(),
                width: EDGE_MARKER_SIZE,
                height: EDGE_MARKER_SIZE,
            }),
        }
    }

    /// Check if this edge has the same endpoints as a connection
    pub fn matches(&self, connection: &Connection) -> bool {
        self.source == connection.source
            && self.source_handle == connection.source_handle
            && self.target == connection.target
            && self.target_handle == connection.target_handle
    }

    /// Get the endpoint key of this edge
    pub fn connection(&self) -> Connection {
        Connection {
            source: self.source.clone(),
            source_handle: self.source_handle.clone(),
            target: self.target.clone(),
            target_handle: self.target_handle.clone(),
        }
    }

    /// Check if this edge starts or ends at a node
    pub fn involves_node(&self, node_id: &NodeId) -> bool {
        self.source == *node_id || self.target == *node_id
    }

    /// Check if this edge ends on a specific handle of a node
    pub fn targets_handle(&self, node_id: &NodeId, handle: &HandleId) -> bool {
        self.target == *node_id && self.target_handle.as_ref() == Some(handle)
    }
}
