// SPDX-License-Identifier: MIT OR Apache-2.0
//! Structural queries over a node/edge snapshot.

use crate::edge::Edge;
use crate::node::{Node, NodeId};
use indexmap::{IndexMap, IndexSet};
use std::collections::VecDeque;

/// Outgoing neighbours and incoming edge counts per node
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Adjacency {
    /// Targets of each node's outgoing edges, one entry per edge
    pub adjacency: IndexMap<NodeId, Vec<NodeId>>,
    /// Number of incoming edges per node
    pub indegree: IndexMap<NodeId, usize>,
}

impl Adjacency {
    /// Children of a node, empty for unknown nodes
    pub fn children(&self, node_id: &NodeId) -> &[NodeId] {
        self.adjacency.get(node_id).map(Vec::as_slice).unwrap_or_default()
    }

    /// Incoming edge count of a node, zero for unknown nodes
    pub fn indegree_of(&self, node_id: &NodeId) -> usize {
        self.indegree.get(node_id).copied().unwrap_or(0)
    }
}

/// Build adjacency lists and indegrees.
///
/// Every node starts with no children and indegree zero. Each edge whose
/// endpoints are both known appends its target to the source's list and
/// bumps the target's indegree, so self loops and parallel edges count once
/// per edge. Edges naming unknown nodes are ignored.
pub fn build_adjacency<'a>(
    nodes: impl IntoIterator<Item = &'a Node>,
    edges: impl IntoIterator<Item = &'a Edge>,
) -> Adjacency {
    let mut graph = Adjacency::default();
    for node in nodes {
        graph.adjacency.insert(node.id.clone(), Vec::new());
        graph.indegree.insert(node.id.clone(), 0);
    }

    for edge in edges {
        if !graph.adjacency.contains_key(&edge.target) {
            tracing::trace!("Ignoring edge {} into unknown node {}", edge.id, edge.target);
            continue;
        }
        let Some(children) = graph.adjacency.get_mut(&edge.source) else {
            tracing::trace!("Ignoring edge {} from unknown node {}", edge.id, edge.source);
            continue;
        };
        children.push(edge.target.clone());
        if let Some(count) = graph.indegree.get_mut(&edge.target) {
            *count += 1;
        }
    }

    graph
}

/// Nodes split by whether any edge touches them
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Partition<'a> {
    /// Nodes that are the source or target of at least one edge
    pub connected: Vec<&'a Node>,
    /// Nodes with no edges at all
    pub disconnected: Vec<&'a Node>,
}

/// Split nodes into connected and disconnected sets, keeping their order
pub fn partition_by_connectivity<'a>(
    nodes: impl IntoIterator<Item = &'a Node>,
    edges: impl IntoIterator<Item = &'a Edge>,
) -> Partition<'a> {
    let touched: IndexSet<&NodeId> = edges
        .into_iter()
        .flat_map(|edge| [&edge.source, &edge.target])
        .collect();

    let (connected, disconnected) = nodes.into_iter().partition(|node| touched.contains(&node.id));
    Partition {
        connected,
        disconnected,
    }
}

/// Connected nodes with no incoming edges, in their original order
pub fn find_roots<'a>(connected: &[&'a Node], graph: &Adjacency) -> Vec<&'a Node> {
    connected
        .iter()
        .copied()
        .filter(|node| graph.indegree_of(&node.id) == 0)
        .collect()
}

/// Check whether the graph is acyclic using Kahn's algorithm.
///
/// Unlike [`build_adjacency`], edges naming unknown nodes still count: an
/// unknown target joins the walk as an extra vertex and an unknown source
/// is never dequeued. The graph is a DAG when the number of dequeued
/// vertices equals the number of nodes.
pub fn is_dag<'a>(
    nodes: impl IntoIterator<Item = &'a Node>,
    edges: impl IntoIterator<Item = &'a Edge>,
) -> bool {
    let mut node_count = 0;
    let mut indegree: IndexMap<&NodeId, usize> = IndexMap::new();
    for node in nodes {
        node_count += 1;
        if !node.id.as_str().is_empty() {
            indegree.insert(&node.id, 0);
        }
    }

    let mut adjacency: IndexMap<&NodeId, Vec<&NodeId>> = IndexMap::new();
    for edge in edges {
        if edge.source.as_str().is_empty() || edge.target.as_str().is_empty() {
            continue;
        }
        adjacency.entry(&edge.source).or_default().push(&edge.target);
        *indegree.entry(&edge.target).or_insert(0) += 1;
    }

    let mut queue: VecDeque<&NodeId> = indegree
        .iter()
        .filter(|(_, count)| **count == 0)
        .map(|(id, _)| *id)
        .collect();

    let mut visited = 0;
    while let Some(id) = queue.pop_front() {
        visited += 1;
        for &child in adjacency.get(id).map(Vec::as_slice).unwrap_or_default() {
            if let Some(count) = indegree.get_mut(child) {
                *count -= 1;
                if *count == 0 {
                    queue.push_back(child);
                }
            }
        }
    }

    visited == node_count
}
