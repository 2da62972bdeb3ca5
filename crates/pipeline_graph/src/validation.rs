// SPDX-License-Identifier: MIT OR Apache-2.0
//! Pipeline validation payloads and the service seam that answers them.
//!
//! The payload carries only what a validator needs: node ids, types,
//! positions and data, plus edge endpoints. Visual edge attributes stay
//! behind.

use crate::analysis::is_dag;
use crate::edge::{Connection, Edge, EdgeId};
use crate::handle::HandleId;
use crate::node::{Node, NodeData, NodeId, NodeKind, Position};
use crate::snapshot::GraphSnapshot;
use crate::store::GraphStore;
use serde::{Deserialize, Serialize};

/// Node as sent for validation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayloadNode {
    /// Node ID
    pub id: NodeId,
    /// Node kind
    #[serde(rename = "type", default = "untyped")]
    pub kind: NodeKind,
    /// Canvas position
    #[serde(default)]
    pub position: Position,
    /// Node data
    #[serde(default)]
    pub data: NodeData,
}

/// Edge as sent for validation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayloadEdge {
    /// Edge ID
    #[serde(default)]
    pub id: EdgeId,
    /// Source node ID
    pub source: NodeId,
    /// Source handle ID
    #[serde(default)]
    pub source_handle: Option<HandleId>,
    /// Target node ID
    pub target: NodeId,
    /// Target handle ID
    #[serde(default)]
    pub target_handle: Option<HandleId>,
}

fn untyped() -> NodeKind {
    NodeKind::Other(String::new())
}

/// Request body for a validation service
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationPayload {
    /// Nodes in store order
    #[serde(default)]
    pub nodes: Vec<PayloadNode>,
    /// Edges in store order
    #[serde(default)]
    pub edges: Vec<PayloadEdge>,
}

impl ValidationPayload {
    /// Build a payload from the store's current state
    pub fn from_store(store: &GraphStore) -> Self {
        Self::from_parts(store.nodes(), store.edges())
    }

    /// Build a payload from a snapshot
    pub fn from_snapshot(snapshot: &GraphSnapshot) -> Self {
        Self::from_parts(&snapshot.nodes, &snapshot.edges)
    }

    fn from_parts<'a>(
        nodes: impl IntoIterator<Item = &'a Node>,
        edges: impl IntoIterator<Item = &'a Edge>,
    ) -> Self {
        Self {
            nodes: nodes
                .into_iter()
                .map(|node| PayloadNode {
                    id: node.id.clone(),
                    kind: node.kind.clone(),
                    position: node.position,
                    data: node.data.clone(),
                })
                .collect(),
            edges: edges
                .into_iter()
                .map(|edge| PayloadEdge {
                    id: edge.id.clone(),
                    source: edge.source.clone(),
                    source_handle: edge.source_handle.clone(),
                    target: edge.target.clone(),
                    target_handle: edge.target_handle.clone(),
                })
                .collect(),
        }
    }

    /// Parse a payload from JSON
    pub fn from_json(json: &str) -> Result<Self, ValidationError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serialize to JSON
    pub fn to_json(&self) -> Result<String, ValidationError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Rebuild graph values for analysis
    fn to_graph(&self) -> (Vec<Node>, Vec<Edge>) {
        let nodes = self
            .nodes
            .iter()
            .map(|node| Node::new(node.id.clone(), node.kind.clone(), node.position).with_data(node.data.clone()))
            .collect();
        let edges = self
            .edges
            .iter()
            .map(|edge| {
                let mut connection = Connection::new(edge.source.clone(), edge.target.clone());
                connection.source_handle = edge.source_handle.clone();
                connection.target_handle = edge.target_handle.clone();
                Edge::new(edge.id.clone(), connection)
            })
            .collect();
        (nodes, edges)
    }
}

/// Response from a validation service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineSummary {
    /// Node count
    pub num_nodes: usize,
    /// Edge count, stale edges included
    pub num_edges: usize,
    /// Whether the graph is acyclic
    pub is_dag: bool,
}

impl PipelineSummary {
    /// Human-readable result text
    pub fn report(&self) -> String {
        let (mark, answer, verdict) = if self.is_dag {
            ("✅", "Yes", "✓ Your pipeline is a valid Directed Acyclic Graph!")
        } else {
            ("❌", "No", "✗ Warning: Your pipeline contains cycles or is not a valid DAG.")
        };
        format!(
            "Pipeline Analysis Results:\n\
             ━━━━━━━━━━━━━━━━━━━━━━\n\
             \n\
             📊 Number of Nodes: {}\n\
             🔗 Number of Edges: {}\n\
             {mark} Is Valid DAG: {answer}\n\
             \n\
             {verdict}",
            self.num_nodes, self.num_edges
        )
    }

    /// One-line notification text
    pub fn headline(&self) -> String {
        if self.is_dag {
            format!(
                "✅ Pipeline validated! {} nodes, {} edges - Valid DAG",
                self.num_nodes, self.num_edges
            )
        } else {
            format!(
                "❌ Pipeline contains cycles! {} nodes, {} edges - Not a DAG",
                self.num_nodes, self.num_edges
            )
        }
    }
}

/// Error from a validation round trip
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    /// Payload or response could not be (de)serialized
    #[error("Invalid validation payload: {0}")]
    Payload(#[from] serde_json::Error),
    /// The service failed to answer
    #[error("Validation service failed: {0}")]
    Service(String),
}

/// Something that can summarize a pipeline
pub trait ValidationService {
    /// Validate a payload
    fn validate(&self, payload: &ValidationPayload) -> Result<PipelineSummary, ValidationError>;

    /// Validate a JSON-encoded payload
    fn validate_json(&self, json: &str) -> Result<PipelineSummary, ValidationError> {
        self.validate(&ValidationPayload::from_json(json)?)
    }
}

/// In-process validator
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalValidator;

impl ValidationService for LocalValidator {
    fn validate(&self, payload: &ValidationPayload) -> Result<PipelineSummary, ValidationError> {
        let (nodes, edges) = payload.to_graph();
        let summary = PipelineSummary {
            num_nodes: nodes.len(),
            num_edges: edges.len(),
            is_dag: is_dag(&nodes, &edges),
        };
        tracing::debug!(
            "Validated pipeline: {} nodes, {} edges, dag={}",
            summary.num_nodes,
            summary.num_edges,
            summary.is_dag
        );
        Ok(summary)
    }
}
