// SPDX-License-Identifier: MIT OR Apache-2.0
//! Built-in node kinds and their handle schemas.

use crate::handle::{Handle, HandleId, HandleSpec};
use crate::node::{Node, NodeData, NodeId, NodeKind};
use crate::variables::extract_variables;
use indexmap::IndexMap;
use serde_json::Value;

/// Node kind definition
#[derive(Debug, Clone)]
pub struct NodeSchema {
    /// Kind this schema describes
    pub kind: NodeKind,
    /// Display name
    pub label: String,
    /// Description shown in the palette
    pub description: String,
    /// Static target handles
    pub inputs: Vec<HandleSpec>,
    /// Static source handles
    pub outputs: Vec<HandleSpec>,
    /// Field defaults copied into new nodes
    pub defaults: NodeData,
}

impl NodeSchema {
    /// Create a schema without handles or defaults
    pub fn new(kind: NodeKind, label: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            kind,
            label: label.into(),
            description: description.into(),
            inputs: Vec::new(),
            outputs: Vec::new(),
            defaults: NodeData::new(),
        }
    }

    /// Add target handles
    pub fn inputs<'a>(mut self, suffixes: impl IntoIterator<Item = &'a str>) -> Self {
        self.inputs.extend(suffixes.into_iter().map(HandleSpec::input));
        self
    }

    /// Add source handles
    pub fn outputs<'a>(mut self, suffixes: impl IntoIterator<Item = &'a str>) -> Self {
        self.outputs.extend(suffixes.into_iter().map(HandleSpec::output));
        self
    }

    /// Add a default field value
    pub fn default_field(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.defaults.insert(name.to_string(), value.into());
        self
    }
}

/// Registry of node kinds
#[derive(Debug, Clone)]
pub struct NodeCatalog {
    schemas: IndexMap<NodeKind, NodeSchema>,
}

impl NodeCatalog {
    /// Create an empty catalog
    pub fn new() -> Self {
        Self {
            schemas: IndexMap::new(),
        }
    }

    /// Catalog with every built-in pipeline node
    pub fn builtin() -> Self {
        let mut catalog = Self::new();

        catalog.register(
            NodeSchema::new(NodeKind::Input, "Input", "Input node for data ingestion")
                .outputs(["value"])
                .default_field("inputType", "Text"),
        );
        catalog.register(
            NodeSchema::new(NodeKind::Output, "Output", "Output node for data export")
                .inputs(["value"])
                .default_field("outputType", "Text"),
        );
        catalog.register(
            NodeSchema::new(NodeKind::Llm, "LLM", "Large language model call")
                .inputs(["system", "prompt"])
                .outputs(["response"]),
        );
        // Text inputs are derived from the text, see `handles_for`
        catalog.register(
            NodeSchema::new(NodeKind::Text, "Text", "Text input and manipulation node")
                .outputs(["output"])
                .default_field("text", "{{input}}"),
        );
        catalog.register(
            NodeSchema::new(NodeKind::Transform, "Transform", "Transform and process data")
                .inputs(["input"])
                .outputs(["output"])
                .default_field("operation", "uppercase"),
        );
        catalog.register(
            NodeSchema::new(NodeKind::Filter, "Filter", "Filter and route data based on conditions")
                .inputs(["input"])
                .outputs(["pass", "fail"])
                .default_field("condition", "contains")
                .default_field("filterValue", ""),
        );
        catalog.register(
            NodeSchema::new(NodeKind::Api, "API", "Make API calls and handle responses")
                .inputs(["params", "body"])
                .outputs(["response"])
                .default_field("method", "GET")
                .default_field("endpoint", ""),
        );
        catalog.register(
            NodeSchema::new(NodeKind::Database, "Database", "Database operations and queries")
                .inputs(["query", "data"])
                .outputs(["result"])
                .default_field("operation", "SELECT")
                .default_field("table", ""),
        );
        catalog.register(
            NodeSchema::new(NodeKind::Aggregator, "Aggregator", "Aggregate multiple data sources")
                .inputs(["input1", "input2", "input3"])
                .outputs(["output"])
                .default_field("aggregateType", "merge"),
        );

        catalog
    }

    /// Register a node kind, replacing any previous schema for it
    pub fn register(&mut self, schema: NodeSchema) {
        self.schemas.insert(schema.kind.clone(), schema);
    }

    /// Get a schema by kind
    pub fn get(&self, kind: &NodeKind) -> Option<&NodeSchema> {
        self.schemas.get(kind)
    }

    /// Get all registered schemas
    pub fn schemas(&self) -> impl Iterator<Item = &NodeSchema> {
        self.schemas.values()
    }

    /// Registered kinds, in registration order
    pub fn kinds(&self) -> impl Iterator<Item = &NodeKind> {
        self.schemas.keys()
    }

    /// Display name of a kind, falling back to its wire name
    pub fn label<'a>(&'a self, kind: &'a NodeKind) -> &'a str {
        self.get(kind).map_or(kind.as_str(), |schema| schema.label.as_str())
    }

    /// Initial data for a freshly created node
    pub fn initial_data(&self, kind: &NodeKind, id: &NodeId) -> NodeData {
        let mut data = NodeData::new();
        data.insert("id".to_string(), Value::String(id.to_string()));
        data.insert("nodeType".to_string(), Value::String(kind.to_string()));
        if let Some(schema) = self.get(kind) {
            for (name, value) in &schema.defaults {
                data.insert(name.clone(), value.clone());
            }
        }
        data
    }

    /// Text of a node, falling back to its kind's default when unset
    pub fn text_of<'a>(&'a self, node: &'a Node) -> &'a str {
        node.text()
            .or_else(|| {
                self.get(&node.kind)
                    .and_then(|schema| schema.defaults.get("text"))
                    .and_then(Value::as_str)
            })
            .unwrap_or_default()
    }

    /// Current handles of a node: variable inputs first, then static inputs, then outputs
    pub fn handles_for(&self, node: &Node) -> Vec<Handle> {
        let mut handles = Vec::new();

        if node.kind.has_dynamic_handles() {
            let variables = extract_variables(self.text_of(node));
            handles.extend(variables.iter().map(|name| Handle::variable(&node.id, name)));
        }

        if let Some(schema) = self.get(&node.kind) {
            handles.extend(schema.inputs.iter().map(|spec| spec.instantiate(&node.id)));
            handles.extend(schema.outputs.iter().map(|spec| spec.instantiate(&node.id)));
        }

        handles
    }

    /// Check if a node currently exposes a handle
    pub fn has_handle(&self, node: &Node, handle_id: &HandleId) -> bool {
        self.handles_for(node).iter().any(|h| h.id == *handle_id)
    }
}

impl Default for NodeCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}
