// SPDX-License-Identifier: MIT OR Apache-2.0
//! Editing session.
//!
//! Bundles the graph being edited with the project library, the validation
//! service and the configuration. Everything that changes the graph goes
//! through here.

use crate::config::StudioConfig;
use crate::project::{ProjectError, ProjectId, ProjectLibrary};
use pipeline_graph::{
    set_node_text, GraphSnapshot, GraphStore, Layout, LocalValidator, NodeId, PipelineSummary, TextUpdate,
    ValidationError, ValidationPayload, ValidationService,
};

/// The state of one editor window
#[derive(Debug)]
pub struct Session<V = LocalValidator> {
    store: GraphStore,
    library: ProjectLibrary,
    validator: V,
    config: StudioConfig,
}

impl<V: ValidationService> Session<V> {
    /// Create a session with an empty graph
    pub fn new(config: StudioConfig, library: ProjectLibrary, validator: V) -> Self {
        Self {
            store: GraphStore::new(),
            library,
            validator,
            config,
        }
    }

    /// The graph
    pub fn store(&self) -> &GraphStore {
        &self.store
    }

    /// The project library
    pub fn library(&self) -> &ProjectLibrary {
        &self.library
    }

    /// Replace the graph with a snapshot
    pub fn load_snapshot(&mut self, snapshot: GraphSnapshot) {
        self.store.load(snapshot);
    }

    /// Edit a text node, dropping edges into variables that went away
    pub fn set_text(&mut self, node_id: &NodeId, text: impl Into<String>) -> Option<TextUpdate> {
        set_node_text(&mut self.store, node_id, text)
    }

    /// Auto-layout the graph
    pub fn arrange(&mut self) -> Layout {
        self.store.auto_arrange(&self.config.layout)
    }

    /// Validate the current graph
    pub fn validate(&self) -> Result<PipelineSummary, ValidationError> {
        self.validator.validate(&ValidationPayload::from_store(&self.store))
    }

    /// Save the graph into the current project
    pub fn save(&mut self) -> Result<ProjectId, ProjectError> {
        self.library.update_current(self.store.snapshot());
        self.library.save_current()
    }

    /// Rename the current project
    pub fn rename(&mut self, name: impl Into<String>) {
        self.library.rename_current(name);
    }

    /// Rename a stored project, leaving the open graph alone
    pub fn rename_project(&mut self, id: &ProjectId, name: impl Into<String>) -> Result<(), ProjectError> {
        self.library.rename_project(id, name)
    }

    /// Start a new project with an empty graph
    pub fn new_project(&mut self) -> Result<ProjectId, ProjectError> {
        self.library.update_current(self.store.snapshot());
        let id = self.library.create_project()?;
        self.store.clear();
        Ok(id)
    }

    /// Open a stored project, saving the current one first if it has content
    pub fn open_project(&mut self, id: &ProjectId) -> Result<(), ProjectError> {
        if !self.store.is_empty() {
            self.save()?;
        }

        let snapshot = self.library.load_project(id)?;
        self.load_snapshot(snapshot);
        if self.config.arrange_on_open {
            self.arrange();
        }
        tracing::info!(
            "Opened project {id}: {} nodes, {} edges",
            self.store.node_count(),
            self.store.edge_count()
        );
        Ok(())
    }

    /// Delete every stored project and start over with an empty graph
    pub fn clear_projects(&mut self) -> Result<(), ProjectError> {
        self.library.clear_all()?;
        self.store.clear();
        Ok(())
    }

    /// Delete a stored project. Clears the graph if it was the open one.
    pub fn delete_project(&mut self, id: &ProjectId) -> Result<(), ProjectError> {
        if self.library.delete_project(id)? {
            self.store.clear();
        }
        Ok(())
    }
}
