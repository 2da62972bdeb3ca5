// SPDX-License-Identifier: MIT OR Apache-2.0
//! `{{variable}}` placeholder extraction for text nodes.

use crate::handle::HandleId;
use crate::node::NodeId;
use indexmap::IndexSet;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

/// Two opening braces, an identifier with optional padding, two closing braces
static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{\s*([A-Za-z_$][A-Za-z0-9_$]*)\s*\}\}").expect("placeholder pattern is valid")
});

/// Ordered set of unique variable names found in a text
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VariableSet(Vec<String>);

impl VariableSet {
    /// Create an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Iterate names in first-occurrence order
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// Check if a name is present
    pub fn contains(&self, name: &str) -> bool {
        self.0.iter().any(|v| v == name)
    }

    /// Number of variables
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if there are no variables
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Borrow the names
    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    /// Handle IDs these variables expose on a node
    pub fn handle_ids<'a>(&'a self, node_id: &'a NodeId) -> impl Iterator<Item = HandleId> + 'a {
        self.iter().map(move |name| HandleId::for_node(node_id, name))
    }
}

impl<'a> FromIterator<&'a str> for VariableSet {
    fn from_iter<I: IntoIterator<Item = &'a str>>(iter: I) -> Self {
        let unique: IndexSet<&str> = iter.into_iter().collect();
        Self(unique.into_iter().map(str::to_string).collect())
    }
}

/// Extract the variables referenced by `text`.
///
/// Names are returned in order of first occurrence with duplicates removed.
/// Placeholders whose name is not an identifier (for example `{{1st}}`) are
/// plain text.
pub fn extract_variables(text: &str) -> VariableSet {
    PLACEHOLDER
        .captures_iter(text)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str())
        .collect()
}

/// Names in `previous` that are missing from `current`, in `previous` order
pub fn removed_variables(previous: &VariableSet, current: &VariableSet) -> Vec<String> {
    previous
        .iter()
        .filter(|name| !current.contains(name))
        .map(str::to_string)
        .collect()
}
