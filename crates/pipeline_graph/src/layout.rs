// SPDX-License-Identifier: MIT OR Apache-2.0
//! Hierarchical auto-layout.
//!
//! Connected nodes are leveled with a breadth-first pass that tolerates
//! cycles, placed left to right by level, and centred vertically against
//! the largest level. Nodes without edges are packed into a grid below.
//! A graph with no edges at all is just the grid.
//!
//! The result depends only on the node and edge order, never on hashing.

use crate::analysis::{build_adjacency, find_roots, partition_by_connectivity, Adjacency};
use crate::edge::Edge;
use crate::node::{Node, NodeId, Position};
use crate::store::{GraphStore, NodeChange};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};

/// Cell sizes and spacing used by the layout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Nominal node width
    pub node_width: f64,
    /// Nominal node height
    pub node_height: f64,
    /// Space between levels
    pub horizontal_gap: f64,
    /// Space between nodes within a level or grid column
    pub vertical_gap: f64,
    /// Top-left corner of the layout
    pub origin: Position,
    /// Grid width for unconnected nodes
    pub columns: usize,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            node_width: 250.0,
            node_height: 150.0,
            horizontal_gap: 200.0,
            vertical_gap: 100.0,
            origin: Position::new(100.0, 100.0),
            columns: 4,
        }
    }
}

impl LayoutConfig {
    fn column_step(&self) -> f64 {
        self.node_width + self.horizontal_gap
    }

    fn row_step(&self) -> f64 {
        self.node_height + self.vertical_gap
    }

    /// Position of the `index`-th grid cell in rows starting at `top`
    fn grid_cell(&self, index: usize, top: f64) -> Position {
        let columns = self.columns.max(1);
        let (row, col) = (index / columns, index % columns);
        Position::new(
            self.origin.x + col as f64 * self.column_step(),
            top + row as f64 * self.row_step(),
        )
    }
}

/// Computed placement
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Layout {
    /// New position of every node
    pub positions: IndexMap<NodeId, Position>,
    /// Level of every connected node. Empty when the graph has no edges.
    pub levels: IndexMap<NodeId, usize>,
}

impl Layout {
    /// Check if nothing was placed
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Position assigned to a node
    pub fn position(&self, node_id: &NodeId) -> Option<Position> {
        self.positions.get(node_id).copied()
    }

    /// Level assigned to a connected node
    pub fn level(&self, node_id: &NodeId) -> Option<usize> {
        self.levels.get(node_id).copied()
    }

    /// The layout as one batch of position-only changes
    pub fn position_changes(&self) -> Vec<NodeChange> {
        self.positions
            .iter()
            .map(|(id, position)| NodeChange::position(id.clone(), *position))
            .collect()
    }
}

/// Compute a layout for the given nodes and edges
pub fn compute_layout<'a>(
    nodes: impl IntoIterator<Item = &'a Node>,
    edges: impl IntoIterator<Item = &'a Edge>,
    config: &LayoutConfig,
) -> Layout {
    let nodes: Vec<&Node> = nodes.into_iter().collect();
    let edges: Vec<&Edge> = edges.into_iter().collect();
    let mut layout = Layout::default();

    if nodes.is_empty() {
        return layout;
    }
    if edges.is_empty() {
        place_grid(&nodes, config.origin.y, config, &mut layout);
        return layout;
    }

    let graph = build_adjacency(nodes.iter().copied(), edges.iter().copied());
    let partition = partition_by_connectivity(nodes.iter().copied(), edges.iter().copied());
    layout.levels = assign_levels(&partition.connected, &graph);

    let mut by_level: BTreeMap<usize, Vec<&Node>> = BTreeMap::new();
    for node in &partition.connected {
        let level = layout.levels.get(&node.id).copied().unwrap_or(0);
        by_level.entry(level).or_default().push(*node);
    }

    let widest = by_level.values().map(Vec::len).max().unwrap_or(0);
    // Zero when nothing is connected, so the grid starts one band down
    let mut lowest_y = 0.0_f64;
    for (level, members) in &by_level {
        let top = config.origin.y + (widest - members.len()) as f64 * config.row_step() / 2.0;
        let x = config.origin.x + *level as f64 * config.column_step();
        for (index, node) in members.iter().enumerate() {
            let y = top + index as f64 * config.row_step();
            layout.positions.insert(node.id.clone(), Position::new(x, y));
            lowest_y = lowest_y.max(y);
        }
    }

    if !partition.disconnected.is_empty() {
        let top = lowest_y + config.node_height + config.vertical_gap * 2.0;
        place_grid(&partition.disconnected, top, config, &mut layout);
    }

    tracing::debug!(
        "Layout placed {} nodes across {} levels",
        layout.positions.len(),
        by_level.len()
    );
    layout
}

/// Assign a level to every connected node.
///
/// Breadth-first from the roots, enqueueing a child once all of its
/// incoming edges have been walked. Each node is finalized at most once and
/// a child is only enqueued by decrementing its counter, so the queue sees
/// at most one entry per edge plus the seeds, whatever cycles exist.
///
/// With no roots (every node sits on or behind a cycle), the first
/// connected node seeds the walk with its counter forced to zero. Nodes the
/// walk never reaches get level zero.
fn assign_levels(connected: &[&Node], graph: &Adjacency) -> IndexMap<NodeId, usize> {
    let mut remaining: IndexMap<&NodeId, isize> = graph
        .indegree
        .iter()
        .map(|(id, count)| (id, *count as isize))
        .collect();

    let mut queue: VecDeque<(&NodeId, usize)> = find_roots(connected, graph)
        .into_iter()
        .map(|node| (&node.id, 0))
        .collect();

    if queue.is_empty() {
        if let Some(seed) = connected.first() {
            tracing::debug!("No root nodes, seeding layout from {}", seed.id);
            remaining.insert(&seed.id, 0);
            queue.push_back((&seed.id, 0));
        }
    }

    let mut finalized: IndexMap<&NodeId, usize> = IndexMap::new();
    while let Some((id, level)) = queue.pop_front() {
        if finalized.get(id).is_some_and(|assigned| *assigned <= level) {
            continue;
        }
        finalized.insert(id, level);

        for child in graph.children(id) {
            if let Some(count) = remaining.get_mut(child) {
                *count -= 1;
                if *count <= 0 {
                    queue.push_back((child, level + 1));
                }
            }
        }
    }

    connected
        .iter()
        .map(|node| (node.id.clone(), finalized.get(&node.id).copied().unwrap_or(0)))
        .collect()
}

/// Tile nodes row-major into the grid, ordered by kind rank
fn place_grid(nodes: &[&Node], top: f64, config: &LayoutConfig, layout: &mut Layout) {
    let mut ranked = nodes.to_vec();
    ranked.sort_by_key(|node| node.kind.layout_rank());
    for (index, node) in ranked.iter().enumerate() {
        layout.positions.insert(node.id.clone(), config.grid_cell(index, top));
    }
}

impl GraphStore {
    /// Lay out the whole graph and apply it as one batch of moves
    pub fn auto_arrange(&mut self, config: &LayoutConfig) -> Layout {
        let layout = compute_layout(self.nodes(), self.edges(), config);
        if !layout.is_empty() {
            self.apply_node_changes(layout.position_changes());
        }
        layout
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::edge::{Connection, EdgeId};
    use crate::node::NodeKind;

    fn node(id: &str, kind: NodeKind) -> Node {
        Node::new(NodeId::from(id), kind, Position::default())
    }

    fn llms(ids: &[&str]) -> Vec<Node> {
        ids.iter().map(|id| node(id, NodeKind::Llm)).collect()
    }

    fn edges(pairs: &[(&str, &str)]) -> Vec<Edge> {
        pairs
            .iter()
            .enumerate()
            .map(|(i, (s, t))| Edge::new(EdgeId::new(format!("e{i}")), Connection::new(*s, *t)))
            .collect()
    }

    fn pos(layout: &Layout, id: &str) -> Position {
        layout.position(&NodeId::from(id)).unwrap()
    }

    fn level(layout: &Layout, id: &str) -> usize {
        layout.level(&NodeId::from(id)).unwrap()
    }

    #[test]
    fn test_empty_graph() {
        let layout = compute_layout(&Vec::<Node>::new(), &Vec::<Edge>::new(), &LayoutConfig::default());
        assert!(layout.is_empty());
    }

    #[test]
    fn test_grid_without_edges() {
        let nodes = llms(&["a", "b", "c", "d", "e"]);
        let layout = compute_layout(&nodes, &Vec::<Edge>::new(), &LayoutConfig::default());

        assert_eq!(pos(&layout, "a"), Position::new(100.0, 100.0));
        assert_eq!(pos(&layout, "b"), Position::new(550.0, 100.0));
        assert_eq!(pos(&layout, "d"), Position::new(1450.0, 100.0));
        // Fifth node starts the second row
        assert_eq!(pos(&layout, "e"), Position::new(100.0, 350.0));
        assert!(layout.levels.is_empty());
    }

    #[test]
    fn test_grid_orders_by_kind() {
        let nodes = vec![
            node("out", NodeKind::Output),
            node("odd", NodeKind::Other("webhook".to_string())),
            node("in", NodeKind::Input),
            node("txt", NodeKind::Text),
            node("in2", NodeKind::Input),
        ];
        let layout = compute_layout(&nodes, &Vec::<Edge>::new(), &LayoutConfig::default());
        let order: Vec<_> = layout.positions.keys().map(NodeId::as_str).collect();
        assert_eq!(order, ["in", "in2", "txt", "out", "odd"]);
        assert_eq!(pos(&layout, "odd").y, 350.0);
    }

    #[test]
    fn test_chain_levels() {
        let nodes = llms(&["a", "b", "c"]);
        let layout = compute_layout(&nodes, &edges(&[("a", "b"), ("b", "c")]), &LayoutConfig::default());
        assert_eq!((level(&layout, "a"), level(&layout, "b"), level(&layout, "c")), (0, 1, 2));
        assert_eq!(pos(&layout, "a"), Position::new(100.0, 100.0));
        assert_eq!(pos(&layout, "b"), Position::new(550.0, 100.0));
        assert_eq!(pos(&layout, "c"), Position::new(1000.0, 100.0));
    }

    #[test]
    fn test_diamond_waits_for_all_parents() {
        let nodes = llms(&["a", "b", "c", "d"]);
        let e = edges(&[("a", "b"), ("b", "c"), ("a", "d"), ("c", "d")]);
        let layout = compute_layout(&nodes, &e, &LayoutConfig::default());
        assert_eq!(level(&layout, "d"), 3);
    }

    #[test]
    fn test_levels_are_centred() {
        let nodes = llms(&["root", "x", "y", "z"]);
        let e = edges(&[("root", "x"), ("root", "y"), ("root", "z")]);
        let layout = compute_layout(&nodes, &e, &LayoutConfig::default());

        assert_eq!(pos(&layout, "root"), Position::new(100.0, 350.0));
        assert_eq!(pos(&layout, "x"), Position::new(550.0, 100.0));
        assert_eq!(pos(&layout, "y"), Position::new(550.0, 350.0));
        assert_eq!(pos(&layout, "z"), Position::new(550.0, 600.0));
    }

    #[test]
    fn test_pure_cycle_terminates() {
        let nodes = llms(&["a", "b", "c"]);
        let e = edges(&[("a", "b"), ("b", "c"), ("c", "a")]);
        let layout = compute_layout(&nodes, &e, &LayoutConfig::default());
        assert_eq!((level(&layout, "a"), level(&layout, "b"), level(&layout, "c")), (0, 1, 2));
        assert!(layout.positions.values().all(|p| p.x.is_finite() && p.y.is_finite()));
    }

    #[test]
    fn test_cycle_behind_root_defaults_to_zero() {
        let nodes = llms(&["d", "a", "b", "c"]);
        let e = edges(&[("d", "a"), ("a", "b"), ("b", "c"), ("c", "a")]);
        let layout = compute_layout(&nodes, &e, &LayoutConfig::default());
        assert_eq!(layout.levels.len(), 4);
        assert!(layout.levels.values().all(|level| *level == 0));
    }

    #[test]
    fn test_self_loop_terminates() {
        let nodes = llms(&["a", "b"]);
        let e = edges(&[("a", "a"), ("a", "b")]);
        let layout = compute_layout(&nodes, &e, &LayoutConfig::default());
        assert_eq!(layout.positions.len(), 2);
    }

    #[test]
    fn test_disconnected_nodes_go_below() {
        let config = LayoutConfig::default();
        let nodes = vec![
            node("a", NodeKind::Llm),
            node("lonely", NodeKind::Output),
            node("b", NodeKind::Llm),
            node("c", NodeKind::Llm),
            node("first", NodeKind::Input),
        ];
        let e = edges(&[("a", "b"), ("a", "c")]);
        let layout = compute_layout(&nodes, &e, &config);

        // Connected region ends at c: y = 350, bottom edge 500
        assert_eq!(pos(&layout, "first"), Position::new(100.0, 700.0));
        assert_eq!(pos(&layout, "lonely"), Position::new(550.0, 700.0));

        let connected_bottom = ["a", "b", "c"]
            .iter()
            .map(|id| pos(&layout, id).y + config.node_height)
            .fold(f64::MIN, f64::max);
        for id in ["first", "lonely"] {
            assert!(pos(&layout, id).y > connected_bottom);
        }
        assert!(layout.level(&NodeId::from("lonely")).is_none());
    }

    #[test]
    fn test_stale_edges_are_ignored() {
        let nodes = llms(&["a", "b"]);
        let e = edges(&[("a", "ghost"), ("ghost", "b")]);
        let layout = compute_layout(&nodes, &e, &LayoutConfig::default());
        assert_eq!(layout.positions.len(), 2);
        assert_eq!(level(&layout, "a"), 0);
        assert_eq!(level(&layout, "b"), 0);

        let only_stale = compute_layout(&nodes, &edges(&[("x", "y")]), &LayoutConfig::default());
        assert!(only_stale.levels.is_empty());
        assert_eq!(pos(&only_stale, "a"), Position::new(100.0, 350.0));
        assert_eq!(pos(&only_stale, "b"), Position::new(550.0, 350.0));
    }

    #[test]
    fn test_deterministic() {
        let nodes = llms(&["a", "b", "c", "d", "e", "f"]);
        let e = edges(&[("a", "b"), ("c", "b"), ("b", "d"), ("d", "b"), ("e", "a")]);
        let config = LayoutConfig::default();
        assert_eq!(compute_layout(&nodes, &e, &config), compute_layout(&nodes, &e, &config));
    }

    #[test]
    fn test_auto_arrange_is_one_batch() {
        let mut store = GraphStore::new();
        let input = store.create_node(NodeKind::Input, Position::new(-50.0, 3.0));
        let llm = store.create_node(NodeKind::Llm, Position::new(900.0, 900.0));
        store.connect(Connection::new(input.clone(), llm.clone()));
        let before = store.revision();

        let layout = store.auto_arrange(&LayoutConfig::default());
        assert_eq!(store.revision(), before + 1);
        assert_eq!(store.node(&input).unwrap().position, layout.position(&input).unwrap());
        assert_eq!(store.node(&llm).unwrap().position, Position::new(550.0, 100.0));

        let again = store.auto_arrange(&LayoutConfig::default());
        assert_eq!(layout, again);
    }

    #[test]
    fn test_config_from_ron() {
        let config: LayoutConfig = ron::from_str("(columns: 2, origin: (x: 0.0, y: 0.0))").unwrap();
        assert_eq!(config.columns, 2);
        assert_eq!(config.node_width, 250.0);

        let nodes = llms(&["a", "b", "c"]);
        let layout = compute_layout(&nodes, &Vec::<Edge>::new(), &config);
        assert_eq!(pos(&layout, "c"), Position::new(0.0, 250.0));
    }
}
