// SPDX-License-Identifier: MIT OR Apache-2.0
//! Authoritative node and edge collections.
//!
//! All mutation flows through batches of [`NodeChange`] and [`EdgeChange`].
//! Each non-empty batch bumps the store revision exactly once, so a bulk
//! clear is observed as one change rather than one per entity.

use crate::catalog::NodeCatalog;
use crate::edge::{Connection, Edge, EdgeId};
use crate::handle::Handle;
use crate::node::{Node, NodeId, NodeKind, Position};
use crate::snapshot::GraphSnapshot;
use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::{SystemTime, UNIX_EPOCH};

/// A structural change to the node collection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum NodeChange {
    /// Move a node
    Position {
        /// Node to move
        id: NodeId,
        /// New position
        position: Position,
    },
    /// Delete a node
    Remove {
        /// Node to delete
        id: NodeId,
    },
    /// Append a node
    Add {
        /// Node to append
        item: Node,
    },
}

impl NodeChange {
    /// Move `id` to `position`
    pub fn position(id: NodeId, position: Position) -> Self {
        Self::Position { id, position }
    }

    /// Delete `id`
    pub fn remove(id: NodeId) -> Self {
        Self::Remove { id }
    }
}

/// A structural change to the edge collection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum EdgeChange {
    /// Delete an edge
    Remove {
        /// Edge to delete
        id: EdgeId,
    },
    /// Append an edge
    Add {
        /// Edge to append
        item: Edge,
    },
}

impl EdgeChange {
    /// Delete `id`
    pub fn remove(id: EdgeId) -> Self {
        Self::Remove { id }
    }
}

fn now_millis() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis()
}

/// The graph being edited
#[derive(Debug, Clone)]
pub struct GraphStore {
    catalog: NodeCatalog,
    nodes: IndexMap<NodeId, Node>,
    edges: IndexMap<EdgeId, Edge>,
    /// Last counter handed out per kind
    counters: IndexMap<NodeKind, u64>,
    revision: u64,
}

impl GraphStore {
    /// Create an empty store using the built-in catalog
    pub fn new() -> Self {
        Self::with_catalog(NodeCatalog::builtin())
    }

    /// Create an empty store with a custom catalog
    pub fn with_catalog(catalog: NodeCatalog) -> Self {
        Self {
            catalog,
            nodes: IndexMap::new(),
            edges: IndexMap::new(),
            counters: IndexMap::new(),
            revision: 0,
        }
    }

    /// Node kinds known to this store
    pub fn catalog(&self) -> &NodeCatalog {
        &self.catalog
    }

    /// Number of applied batches so far
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Hand out a fresh ID for a node of `kind`
    pub fn next_id(&mut self, kind: &NodeKind) -> NodeId {
        let counter = self.counters.entry(kind.clone()).or_insert(0);
        *counter += 1;
        NodeId::for_kind(kind, *counter)
    }

    /// Get a node by ID
    pub fn node(&self, node_id: &NodeId) -> Option<&Node> {
        self.nodes.get(node_id)
    }

    /// Get all nodes in insertion order
    pub fn nodes(&self) -> impl ExactSizeIterator<Item = &Node> + Clone {
        self.nodes.values()
    }

    /// Get the number of nodes
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Get an edge by ID
    pub fn edge(&self, edge_id: &EdgeId) -> Option<&Edge> {
        self.edges.get(edge_id)
    }

    /// Get all edges in insertion order
    pub fn edges(&self) -> impl ExactSizeIterator<Item = &Edge> + Clone {
        self.edges.values()
    }

    /// Get the number of edges
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Check if the graph has neither nodes nor edges
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }

    /// Current handles of a node
    pub fn handles(&self, node_id: &NodeId) -> Option<Vec<Handle>> {
        self.node(node_id).map(|node| self.catalog.handles_for(node))
    }

    /// Append a node. Returns false if the ID is already taken.
    pub fn add_node(&mut self, node: Node) -> bool {
        self.apply_node_changes([NodeChange::Add { item: node }]) == 1
    }

    /// Create a node of `kind` at an explicit canvas position.
    ///
    /// Used for drag-and-drop, so the node is placed exactly where it was
    /// dropped and auto-layout is not involved.
    pub fn create_node(&mut self, kind: NodeKind, position: Position) -> NodeId {
        let id = self.next_id(&kind);
        let data = self.catalog.initial_data(&kind, &id);
        self.add_node(Node::new(id.clone(), kind, position).with_data(data));
        id
    }

    /// Apply a batch of node changes, returning how many took effect.
    ///
    /// Changes naming unknown nodes are skipped. Surviving nodes keep their
    /// relative order.
    pub fn apply_node_changes(&mut self, changes: impl IntoIterator<Item = NodeChange>) -> usize {
        let mut pending: IndexSet<NodeId> = IndexSet::new();
        let mut applied = 0;

        for change in changes {
            match change {
                NodeChange::Position { id, position } => match self.nodes.get_mut(&id) {
                    Some(node) => {
                        node.position = position;
                        applied += 1;
                    }
                    None => tracing::trace!("Skipping move of unknown node {id}"),
                },
                NodeChange::Remove { id } => {
                    if self.nodes.contains_key(&id) && pending.insert(id) {
                        applied += 1;
                    }
                }
                NodeChange::Add { item } => {
                    self.flush_node_removals(&mut pending);
                    if self.insert_node(item) {
                        applied += 1;
                    }
                }
            }
        }
        self.flush_node_removals(&mut pending);

        if applied > 0 {
            self.revision += 1;
            tracing::debug!("Applied {applied} node changes (revision {})", self.revision);
        }
        applied
    }

    /// Apply a batch of edge changes, returning how many took effect.
    ///
    /// Added edges that duplicate an existing connection are dropped.
    pub fn apply_edge_changes(&mut self, changes: impl IntoIterator<Item = EdgeChange>) -> usize {
        let mut pending: IndexSet<EdgeId> = IndexSet::new();
        let mut applied = 0;

        for change in changes {
            match change {
                EdgeChange::Remove { id } => {
                    if self.edges.contains_key(&id) && pending.insert(id) {
                        applied += 1;
                    }
                }
                EdgeChange::Add { item } => {
                    self.flush_edge_removals(&mut pending);
                    if self.insert_edge(item) {
                        applied += 1;
                    }
                }
            }
        }
        self.flush_edge_removals(&mut pending);

        if applied > 0 {
            self.revision += 1;
            tracing::debug!("Applied {applied} edge changes (revision {})", self.revision);
        }
        applied
    }

    /// Check if an edge with the same endpoints already exists
    pub fn is_duplicate(&self, connection: &Connection) -> bool {
        self.edges.values().any(|edge| edge.matches(connection))
    }

    /// Add an edge for `connection` unless an identical one exists
    pub fn connect(&mut self, connection: Connection) -> Option<EdgeId> {
        if self.is_duplicate(&connection) {
            tracing::debug!("Ignoring duplicate connection {} -> {}", connection.source, connection.target);
            return None;
        }

        let mut millis = now_millis();
        let mut id = EdgeId::derive(&connection, millis);
        while self.edges.contains_key(&id) {
            millis += 1;
            id = EdgeId::derive(&connection, millis);
        }

        let edge = Edge::new(id.clone(), connection);
        (self.apply_edge_changes([EdgeChange::Add { item: edge }]) == 1).then_some(id)
    }

    /// Set one field of a node's data. Returns false if the node is unknown.
    pub fn update_node_field(&mut self, node_id: &NodeId, field: &str, value: impl Into<Value>) -> bool {
        let Some(node) = self.nodes.get_mut(node_id) else {
            return false;
        };
        node.data.insert(field.to_string(), value.into());
        self.revision += 1;
        true
    }

    /// Delete nodes together with every edge touching them.
    ///
    /// Edges go first, as one batch, then the nodes as a second batch.
    /// Returns `(nodes_removed, edges_removed)`.
    pub fn delete_nodes(&mut self, node_ids: &[NodeId]) -> (usize, usize) {
        let doomed: IndexSet<&NodeId> = node_ids.iter().collect();
        let edge_changes: Vec<_> = self
            .edges
            .values()
            .filter(|edge| doomed.contains(&edge.source) || doomed.contains(&edge.target))
            .map(|edge| EdgeChange::remove(edge.id.clone()))
            .collect();

        let edges_removed = self.apply_edge_changes(edge_changes);
        let nodes_removed = self.apply_node_changes(node_ids.iter().cloned().map(NodeChange::remove));
        (nodes_removed, edges_removed)
    }

    /// Remove everything. Returns `(nodes_removed, edges_removed)`.
    ///
    /// ID counters are kept, so IDs are never reused within a session.
    pub fn clear(&mut self) -> (usize, usize) {
        let node_changes: Vec<_> = self.nodes.keys().cloned().map(NodeChange::remove).collect();
        let edge_changes: Vec<_> = self.edges.keys().cloned().map(EdgeChange::remove).collect();
        let nodes_removed = self.apply_node_changes(node_changes);
        let edges_removed = self.apply_edge_changes(edge_changes);
        (nodes_removed, edges_removed)
    }

    /// Copy the current state
    pub fn snapshot(&self) -> GraphSnapshot {
        GraphSnapshot::new(
            self.nodes.values().cloned().collect(),
            self.edges.values().cloned().collect(),
        )
    }

    /// Replace the whole graph with a snapshot, as one batch
    pub fn load(&mut self, snapshot: GraphSnapshot) {
        self.nodes.clear();
        self.edges.clear();
        for node in snapshot.nodes {
            self.insert_node(node);
        }
        for edge in snapshot.edges {
            self.insert_edge(edge);
        }
        self.revision += 1;
        tracing::debug!(
            "Loaded {} nodes and {} edges (revision {})",
            self.nodes.len(),
            self.edges.len(),
            self.revision
        );
    }

    fn insert_node(&mut self, node: Node) -> bool {
        if self.nodes.contains_key(&node.id) {
            tracing::warn!("Ignoring node with duplicate id {}", node.id);
            return false;
        }
        // Keep generated IDs clear of anything loaded from outside
        if let Some(counter) = node.id.counter_for(&node.kind) {
            let last = self.counters.entry(node.kind.clone()).or_insert(0);
            *last = (*last).max(counter);
        }
        self.nodes.insert(node.id.clone(), node);
        true
    }

    fn insert_edge(&mut self, edge: Edge) -> bool {
        if self.edges.contains_key(&edge.id) {
            tracing::warn!("Ignoring edge with duplicate id {}", edge.id);
            return false;
        }
        if self.edges.values().any(|existing| existing.matches(&edge.connection())) {
            tracing::debug!("Ignoring duplicate edge {}", edge.id);
            return false;
        }
        self.edges.insert(edge.id.clone(), edge);
        true
    }

    fn flush_node_removals(&mut self, pending: &mut IndexSet<NodeId>) {
        if !pending.is_empty() {
            self.nodes.retain(|id, _| !pending.contains(id));
            pending.clear();
        }
    }

    fn flush_edge_removals(&mut self, pending: &mut IndexSet<EdgeId>) {
        if !pending.is_empty() {
            self.edges.retain(|id, _| !pending.contains(id));
            pending.clear();
        }
    }
}

impl Default for GraphStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_with(kinds: &[NodeKind]) -> (GraphStore, Vec<NodeId>) {
        let mut store = GraphStore::new();
        let ids = kinds
            .iter()
            .map(|kind| store.create_node(kind.clone(), Position::default()))
            .collect();
        (store, ids)
    }

    #[test]
    fn test_next_id_per_kind() {
        let mut store = GraphStore::new();
        assert_eq!(store.next_id(&NodeKind::Llm).as_str(), "llm-1");
        assert_eq!(store.next_id(&NodeKind::Llm).as_str(), "llm-2");
        assert_eq!(store.next_id(&NodeKind::Text).as_str(), "text-1");
    }

    #[test]
    fn test_ids_not_reused_after_delete() {
        let (mut store, ids) = store_with(&[NodeKind::Text]);
        store.apply_node_changes([NodeChange::remove(ids[0].clone())]);
        assert_eq!(store.node_count(), 0);
        let next = store.create_node(NodeKind::Text, Position::default());
        assert_eq!(next.as_str(), "text-2");
    }

    #[test]
    fn test_add_node_rejects_duplicate_id() {
        let mut store = GraphStore::new();
        let node = Node::new(NodeId::from("llm-1"), NodeKind::Llm, Position::default());
        assert!(store.add_node(node.clone()));
        assert!(!store.add_node(node));
        assert_eq!(store.node_count(), 1);
    }

    #[test]
    fn test_create_node_uses_drop_position() {
        let mut store = GraphStore::new();
        let id = store.create_node(NodeKind::Filter, Position::new(42.0, -7.5));
        let node = store.node(&id).unwrap();
        assert_eq!(node.position, Position::new(42.0, -7.5));
        assert_eq!(node.data["nodeType"], "filter");
    }

    #[test]
    fn test_remove_preserves_order() {
        let (mut store, ids) = store_with(&[NodeKind::Input, NodeKind::Llm, NodeKind::Text, NodeKind::Output]);
        let applied = store.apply_node_changes([
            NodeChange::remove(ids[1].clone()),
            NodeChange::position(ids[3].clone(), Position::new(5.0, 5.0)),
        ]);
        assert_eq!(applied, 2);
        let order: Vec<_> = store.nodes().map(|n| n.id.clone()).collect();
        assert_eq!(order, vec![ids[0].clone(), ids[2].clone(), ids[3].clone()]);
        assert_eq!(store.node(&ids[3]).unwrap().position, Position::new(5.0, 5.0));
    }

    #[test]
    fn test_unknown_ids_are_skipped() {
        let (mut store, _) = store_with(&[NodeKind::Input]);
        let before = store.revision();
        let applied = store.apply_node_changes([
            NodeChange::remove(NodeId::from("ghost-1")),
            NodeChange::position(NodeId::from("ghost-2"), Position::default()),
        ]);
        assert_eq!(applied, 0);
        assert_eq!(store.revision(), before);
    }

    #[test]
    fn test_connect_dedups() {
        let (mut store, ids) = store_with(&[NodeKind::Input, NodeKind::Output]);
        let conn = Connection::new(ids[0].clone(), ids[1].clone())
            .from_handle("customInput-1-value")
            .to_handle("customOutput-1-value");

        assert!(store.connect(conn.clone()).is_some());
        assert!(store.connect(conn.clone()).is_none());
        assert!(store.connect(conn).is_none());
        assert_eq!(store.edge_count(), 1);

        // Different handle is a different connection
        let other = Connection::new(ids[0].clone(), ids[1].clone());
        assert!(store.connect(other).is_some());
        assert_eq!(store.edge_count(), 2);
    }

    #[test]
    fn test_connect_after_remove_gets_fresh_id() {
        let (mut store, ids) = store_with(&[NodeKind::Input, NodeKind::Output]);
        let conn = Connection::new(ids[0].clone(), ids[1].clone());
        let first = store.connect(conn.clone()).unwrap();
        let second_conn = Connection::new(ids[1].clone(), ids[0].clone());
        store.connect(second_conn).unwrap();
        store.apply_edge_changes([EdgeChange::remove(first.clone())]);
        let again = store.connect(conn).unwrap();
        assert_eq!(store.edge_count(), 2);
        assert!(store.edge(&again).is_some());
    }

    #[test]
    fn test_added_edge_respects_dedup() {
        let mut store = GraphStore::new();
        let conn = Connection::new("a", "b");
        store.apply_edge_changes([
            EdgeChange::Add { item: Edge::new(EdgeId::from("e1"), conn.clone()) },
            EdgeChange::Add { item: Edge::new(EdgeId::from("e2"), conn) },
        ]);
        assert_eq!(store.edge_count(), 1);
        assert!(store.edge(&EdgeId::from("e1")).is_some());
    }

    #[test]
    fn test_remove_then_add_in_one_batch() {
        let mut store = GraphStore::new();
        let node = Node::new(NodeId::from("llm-1"), NodeKind::Llm, Position::default());
        store.add_node(node.clone());
        let moved = Node { position: Position::new(9.0, 9.0), ..node };
        let applied = store.apply_node_changes([
            NodeChange::remove(NodeId::from("llm-1")),
            NodeChange::Add { item: moved },
        ]);
        assert_eq!(applied, 2);
        assert_eq!(store.node(&NodeId::from("llm-1")).unwrap().position.x, 9.0);
    }

    #[test]
    fn test_clear_is_batched() {
        let (mut store, ids) = store_with(&[NodeKind::Input, NodeKind::Llm, NodeKind::Output]);
        store.connect(Connection::new(ids[0].clone(), ids[1].clone()));
        store.connect(Connection::new(ids[1].clone(), ids[2].clone()));
        let before = store.revision();

        assert_eq!(store.clear(), (3, 2));
        assert!(store.is_empty());
        // One batch per collection
        assert_eq!(store.revision(), before + 2);
    }

    #[test]
    fn test_delete_nodes_cleans_edges() {
        let (mut store, ids) = store_with(&[NodeKind::Input, NodeKind::Llm, NodeKind::Output]);
        store.connect(Connection::new(ids[0].clone(), ids[1].clone()));
        store.connect(Connection::new(ids[1].clone(), ids[2].clone()));
        store.connect(Connection::new(ids[0].clone(), ids[2].clone()));

        assert_eq!(store.delete_nodes(&[ids[1].clone()]), (1, 2));
        assert_eq!(store.edge_count(), 1);
        assert_eq!(store.edges().next().unwrap().source, ids[0]);
    }

    #[test]
    fn test_plain_remove_leaves_edges() {
        let (mut store, ids) = store_with(&[NodeKind::Input, NodeKind::Output]);
        store.connect(Connection::new(ids[0].clone(), ids[1].clone()));
        store.apply_node_changes([NodeChange::remove(ids[1].clone())]);
        assert_eq!(store.edge_count(), 1);
    }

    #[test]
    fn test_update_node_field() {
        let (mut store, ids) = store_with(&[NodeKind::Transform]);
        assert!(store.update_node_field(&ids[0], "operation", "lowercase"));
        assert_eq!(store.node(&ids[0]).unwrap().data["operation"], "lowercase");
        assert!(!store.update_node_field(&NodeId::from("nope"), "x", 1));
    }

    #[test]
    fn test_load_advances_counters() {
        let snapshot = GraphSnapshot::new(
            vec![
                Node::new(NodeId::from("llm-7"), NodeKind::Llm, Position::default()),
                Node::new(NodeId::from("llm-2"), NodeKind::Llm, Position::default()),
                Node::new(NodeId::from("custom"), NodeKind::Text, Position::default()),
            ],
            vec![],
        );
        let mut store = GraphStore::new();
        store.load(snapshot.clone());
        assert_eq!(store.snapshot(), snapshot);
        assert_eq!(store.next_id(&NodeKind::Llm).as_str(), "llm-8");
        assert_eq!(store.next_id(&NodeKind::Text).as_str(), "text-1");
    }

    #[test]
    fn test_node_change_wire_format() {
        let change: NodeChange =
            serde_json::from_str(r#"{"type":"position","id":"llm-1","position":{"x":1,"y":2}}"#).unwrap();
        assert_eq!(change, NodeChange::position(NodeId::from("llm-1"), Position::new(1.0, 2.0)));
        let change: EdgeChange = serde_json::from_str(r#"{"type":"remove","id":"e-1"}"#).unwrap();
        assert_eq!(change, EdgeChange::remove(EdgeId::from("e-1")));
    }
}
