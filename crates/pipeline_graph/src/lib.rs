// SPDX-License-Identifier: MIT OR Apache-2.0
//! Graph core for `PipelineStudio`.
//!
//! This crate holds the editable state of a pipeline canvas:
//! - Nodes of a fixed catalog of kinds, with static and variable handles
//! - Directed edges between handles, deduplicated on their endpoints
//! - Text nodes whose `{{variable}}` placeholders become input handles
//! - Structural analysis (roots, connectivity, acyclicity)
//! - A hierarchical auto-layout that tolerates cycles
//!
//! ## Architecture
//!
//! [`GraphStore`] owns nodes and edges and only changes through batched
//! change lists. Everything else reads snapshots of it:
//! - [`variables`] parses placeholders out of text
//! - [`sync`] drops edges whose variable handle disappeared
//! - [`analysis`] builds adjacency and answers structural queries
//! - [`layout`] turns the graph into a batch of position changes
//! - [`validation`] builds the payload sent to a validation service

pub mod analysis;
pub mod catalog;
pub mod edge;
pub mod handle;
pub mod layout;
pub mod node;
pub mod snapshot;
pub mod store;
pub mod sync;
pub mod validation;
pub mod variables;

pub use catalog::{NodeCatalog, NodeSchema};
pub use edge::{Connection, Edge, EdgeId};
pub use handle::{Handle, HandleDirection, HandleId};
pub use layout::{compute_layout, Layout, LayoutConfig};
pub use node::{Node, NodeData, NodeId, NodeKind, Position};
pub use snapshot::{GraphSnapshot, SnapshotError};
pub use store::{EdgeChange, GraphStore, NodeChange};
pub use sync::{set_node_text, TextUpdate};
pub use validation::{LocalValidator, PipelineSummary, ValidationError, ValidationPayload, ValidationService};
pub use variables::{extract_variables, VariableSet};
