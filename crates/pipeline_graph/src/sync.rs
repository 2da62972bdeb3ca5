// SPDX-License-Identifier: MIT OR Apache-2.0
//! Keeps a text node's variable handles and the edges into them consistent.
//!
//! When the text of a node changes, variables that disappeared take their
//! handles with them. Any edge ending on such a handle is removed in a
//! single batch. New variables only add fresh, unconnected handles.

use crate::edge::{Edge, EdgeId};
use crate::handle::HandleId;
use crate::node::NodeId;
use crate::store::{EdgeChange, GraphStore};
use crate::variables::{extract_variables, removed_variables, VariableSet};

/// Edge removals required after a variable change
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HandleSync {
    /// Variables present before and missing now
    pub removed_variables: Vec<String>,
    /// One removal per edge that ended on a removed variable's handle
    pub edge_removals: Vec<EdgeChange>,
}

impl HandleSync {
    /// Check if no edges need to go
    pub fn is_noop(&self) -> bool {
        self.edge_removals.is_empty()
    }
}

/// Work out which edges into `node_id` lost their handle.
///
/// Pure: nothing is applied. Feed `edge_removals` to
/// [`GraphStore::apply_edge_changes`] as one batch.
pub fn synchronize_handles<'a>(
    node_id: &NodeId,
    previous: &VariableSet,
    current: &VariableSet,
    edges: impl IntoIterator<Item = &'a Edge>,
) -> HandleSync {
    let removed = removed_variables(previous, current);
    if removed.is_empty() {
        return HandleSync::default();
    }

    let stale: Vec<HandleId> = removed.iter().map(|name| HandleId::for_node(node_id, name)).collect();
    let edge_removals = edges
        .into_iter()
        .filter(|edge| stale.iter().any(|handle| edge.targets_handle(node_id, handle)))
        .map(|edge| EdgeChange::remove(edge.id.clone()))
        .collect();

    HandleSync {
        removed_variables: removed,
        edge_removals,
    }
}

/// Outcome of editing a text node
#[derive(Debug, Clone, PartialEq)]
pub struct TextUpdate {
    /// Variables in the new text
    pub variables: VariableSet,
    /// Variables that were dropped
    pub removed_variables: Vec<String>,
    /// Edges deleted because their handle vanished
    pub removed_edges: Vec<EdgeId>,
}

/// Replace a node's text and drop edges into variables that no longer exist.
///
/// The field update, extraction and edge cleanup all finish before this
/// returns, so a layout pass run afterwards sees a consistent edge set.
/// Returns `None` if the node does not exist.
pub fn set_node_text(store: &mut GraphStore, node_id: &NodeId, text: impl Into<String>) -> Option<TextUpdate> {
    let text = text.into();
    let node = store.node(node_id)?;
    let previous = extract_variables(store.catalog().text_of(node));
    let current = extract_variables(&text);

    store.update_node_field(node_id, "text", text);

    let sync = synchronize_handles(node_id, &previous, &current, store.edges());
    let removed_edges = sync
        .edge_removals
        .iter()
        .filter_map(|change| match change {
            EdgeChange::Remove { id } => Some(id.clone()),
            EdgeChange::Add { .. } => None,
        })
        .collect();

    if !sync.is_noop() {
        tracing::debug!(
            "Variables {:?} removed from {node_id}, dropping {} edges",
            sync.removed_variables,
            sync.edge_removals.len()
        );
        store.apply_edge_changes(sync.edge_removals);
    }

    Some(TextUpdate {
        variables: current,
        removed_variables: sync.removed_variables,
        removed_edges,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::edge::Connection;
    use crate::node::{NodeKind, Position};

    fn text_store(text: &str) -> (GraphStore, NodeId, NodeId) {
        let mut store = GraphStore::new();
        let input = store.create_node(NodeKind::Input, Position::default());
        let text_node = store.create_node(NodeKind::Text, Position::default());
        set_node_text(&mut store, &text_node, text).unwrap();
        (store, input, text_node)
    }

    fn connect_var(store: &mut GraphStore, from: &NodeId, to: &NodeId, var: &str) -> EdgeId {
        store
            .connect(
                Connection::new(from.clone(), to.clone())
                    .from_handle(HandleId::for_node(from, "value"))
                    .to_handle(HandleId::for_node(to, var)),
            )
            .unwrap()
    }

    #[test]
    fn test_removed_variable_drops_edge() {
        let (mut store, input, text) = text_store("{{x}} and {{y}}");
        connect_var(&mut store, &input, &text, "x");

        let update = set_node_text(&mut store, &text, "only {{y}}").unwrap();

        assert_eq!(update.variables.as_slice(), ["y"]);
        assert_eq!(update.removed_variables, ["x"]);
        assert_eq!(update.removed_edges.len(), 1);
        assert_eq!(store.edge_count(), 0);

        let handles: Vec<_> = store.handles(&text).unwrap().into_iter().filter(|h| h.is_target()).collect();
        assert_eq!(handles.len(), 1);
        assert_eq!(handles[0].id.as_str(), "text-1-y");
    }

    #[test]
    fn test_surviving_variables_keep_edges() {
        let (mut store, input, text) = text_store("{{x}} {{y}}");
        connect_var(&mut store, &input, &text, "y");

        let update = set_node_text(&mut store, &text, "{{y}} {{z}}").unwrap();
        assert_eq!(update.removed_variables, ["x"]);
        assert!(update.removed_edges.is_empty());
        assert_eq!(store.edge_count(), 1);
    }

    #[test]
    fn test_removal_is_one_batch() {
        let mut store = GraphStore::new();
        let a = store.create_node(NodeKind::Input, Position::default());
        let b = store.create_node(NodeKind::Input, Position::default());
        let text = store.create_node(NodeKind::Text, Position::default());
        set_node_text(&mut store, &text, "{{p}} {{q}}").unwrap();
        connect_var(&mut store, &a, &text, "p");
        connect_var(&mut store, &b, &text, "q");
        connect_var(&mut store, &b, &text, "p");

        let before = store.revision();
        let update = set_node_text(&mut store, &text, "nothing left").unwrap();
        assert_eq!(update.removed_edges.len(), 3);
        // One bump for the text field, one for the edge batch
        assert_eq!(store.revision(), before + 2);
        assert_eq!(store.edge_count(), 0);
    }

    #[test]
    fn test_other_nodes_untouched() {
        let mut store = GraphStore::new();
        let input = store.create_node(NodeKind::Input, Position::default());
        let first = store.create_node(NodeKind::Text, Position::default());
        let second = store.create_node(NodeKind::Text, Position::default());
        set_node_text(&mut store, &first, "{{x}}").unwrap();
        set_node_text(&mut store, &second, "{{x}}").unwrap();
        connect_var(&mut store, &input, &first, "x");
        connect_var(&mut store, &input, &second, "x");

        set_node_text(&mut store, &first, "").unwrap();
        assert_eq!(store.edge_count(), 1);
        assert_eq!(store.edges().next().unwrap().target, second);
    }

    #[test]
    fn test_synchronize_is_pure() {
        let node = NodeId::from("text-1");
        let edge = crate::edge::Edge::new(
            EdgeId::from("e"),
            Connection::new("customInput-1", "text-1").to_handle("text-1-a"),
        );
        let sync = synchronize_handles(
            &node,
            &extract_variables("{{a}}"),
            &extract_variables("{{b}}"),
            [&edge],
        );
        assert_eq!(sync.edge_removals, vec![EdgeChange::remove(EdgeId::from("e"))]);

        let added_only = synchronize_handles(&node, &extract_variables("{{a}}"), &extract_variables("{{a}} {{b}}"), [&edge]);
        assert!(added_only.is_noop());
    }

    #[test]
    fn test_loaded_node_without_text_field() {
        let json = r#"{
            "nodes": [
                {"id": "customInput-1", "type": "customInput", "position": {"x": 0, "y": 0},
                 "data": {"id": "customInput-1", "nodeType": "customInput"}},
                {"id": "text-1", "type": "text", "position": {"x": 0, "y": 0},
                 "data": {"id": "text-1", "nodeType": "text"}}
            ],
            "edges": [
                {"id": "e1", "source": "customInput-1", "sourceHandle": "customInput-1-value",
                 "target": "text-1", "targetHandle": "text-1-input"}
            ]
        }"#;
        let mut store = GraphStore::new();
        store.load(crate::snapshot::GraphSnapshot::from_json(json).unwrap());
        let text = NodeId::from("text-1");
        assert!(store.catalog().has_handle(store.node(&text).unwrap(), &HandleId::from("text-1-input")));

        let update = set_node_text(&mut store, &text, "hello").unwrap();
        assert_eq!(update.removed_variables, ["input"]);
        assert_eq!(update.removed_edges, [EdgeId::from("e1")]);
        assert_eq!(store.edge_count(), 0);
    }

    #[test]
    fn test_unknown_node() {
        let mut store = GraphStore::new();
        assert!(set_node_text(&mut store, &NodeId::from("text-9"), "{{a}}").is_none());
    }
}
