// SPDX-License-Identifier: MIT OR Apache-2.0
//! Project library.
//!
//! Named pipeline snapshots, newest first, stored together in one RON file.
//! There is always a current project. It only gets an ID the first time it
//! is saved, unless it was created through [`ProjectLibrary::create_project`].

use pipeline_graph::{Edge, GraphSnapshot, Node};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

/// Current library file format version
pub const LIBRARY_FORMAT_VERSION: u32 = 1;

/// Name given to projects nobody has named yet
pub const UNTITLED_PROJECT: &str = "Untitled Workflow";

/// Result alias for library operations
pub type Result<T, E = ProjectError> = std::result::Result<T, E>;

/// Unique project identifier, `project_<uuid>`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProjectId(String);

impl ProjectId {
    /// Generate a fresh ID
    pub fn generate() -> Self {
        Self(format!("project_{}", Uuid::new_v4().simple()))
    }

    /// Get the ID as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ProjectId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// A saved pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    /// Unset until the project is first stored
    #[serde(default)]
    pub id: Option<ProjectId>,
    /// Display name
    pub name: String,
    /// Graph nodes
    #[serde(default)]
    pub nodes: Vec<Node>,
    /// Graph edges
    #[serde(default)]
    pub edges: Vec<Edge>,
    /// Creation time, milliseconds since the Unix epoch
    pub created_at: u64,
    /// Last modification time, milliseconds since the Unix epoch
    pub updated_at: u64,
}

impl Project {
    /// A new empty project
    pub fn untitled(name: impl Into<String>) -> Self {
        let now = now_millis();
        Self {
            id: None,
            name: name.into(),
            nodes: Vec::new(),
            edges: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Check if the project has no graph content
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }

    /// The project's graph
    pub fn snapshot(&self) -> GraphSnapshot {
        GraphSnapshot::new(self.nodes.clone(), self.edges.clone())
    }

    fn touch(&mut self) {
        self.updated_at = now_millis();
    }
}

/// On-disk layout of the library file
#[derive(Debug, Serialize, Deserialize)]
struct LibraryFile {
    version: u32,
    #[serde(default)]
    projects: Vec<Project>,
}

/// Projects stored in one file, plus the one being edited
#[derive(Debug)]
pub struct ProjectLibrary {
    path: PathBuf,
    projects: Vec<Project>,
    current: Project,
}

impl ProjectLibrary {
    /// Open the library at `path`, starting empty if the file does not exist
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let projects = if path.exists() {
            let file: LibraryFile = ron::from_str(&std::fs::read_to_string(&path)?)?;
            if file.version != LIBRARY_FORMAT_VERSION {
                return Err(ProjectError::UnsupportedVersion {
                    found: file.version,
                    supported: LIBRARY_FORMAT_VERSION,
                });
            }
            tracing::info!("Opened project library {} ({} projects)", path.display(), file.projects.len());
            file.projects
        } else {
            tracing::info!("No project library at {}, starting empty", path.display());
            Vec::new()
        };

        Ok(Self {
            path,
            projects,
            current: Project::untitled(UNTITLED_PROJECT),
        })
    }

    /// Stored projects, newest first
    pub fn projects(&self) -> &[Project] {
        &self.projects
    }

    /// Look up a stored project
    pub fn get(&self, id: &ProjectId) -> Option<&Project> {
        self.projects.iter().find(|p| p.id.as_ref() == Some(id))
    }

    /// The project being edited
    pub fn current(&self) -> &Project {
        &self.current
    }

    /// Replace the current project's graph
    pub fn update_current(&mut self, snapshot: GraphSnapshot) {
        self.current.nodes = snapshot.nodes;
        self.current.edges = snapshot.edges;
        self.current.touch();
    }

    /// Rename the current project. Stored on the next save.
    pub fn rename_current(&mut self, name: impl Into<String>) {
        self.current.name = name.into();
        self.current.touch();
    }

    /// Rename a stored project without touching its graph
    pub fn rename_project(&mut self, id: &ProjectId, name: impl Into<String>) -> Result<()> {
        let project = self
            .projects
            .iter_mut()
            .find(|p| p.id.as_ref() == Some(id))
            .ok_or_else(|| ProjectError::UnknownProject(id.clone()))?;
        project.name = name.into();
        project.touch();
        if self.current.id.as_ref() == Some(id) {
            self.current.name.clone_from(&project.name);
        }
        self.persist()?;
        tracing::info!("Renamed project {id}");
        Ok(())
    }

    /// Store the current project and write the library file.
    ///
    /// A project without an ID, or whose ID is no longer in the library,
    /// is stored as a new project at the front.
    pub fn save_current(&mut self) -> Result<ProjectId> {
        self.current.touch();
        let id = self.store_current();
        self.persist()?;
        tracing::info!("Saved project {} ({})", self.current.name, id);
        Ok(id)
    }

    /// Start a new empty project and make it current.
    ///
    /// A current project with an ID and some content is stored first.
    pub fn create_project(&mut self) -> Result<ProjectId> {
        if self.current.id.is_some() && !self.current.is_empty() {
            self.current.touch();
            self.store_current();
        }

        let id = ProjectId::generate();
        let mut project = Project::untitled(format!("{UNTITLED_PROJECT} {}", self.projects.len() + 1));
        project.id = Some(id.clone());
        self.projects.insert(0, project.clone());
        self.current = project;
        self.persist()?;

        tracing::info!("Created project {} ({id})", self.current.name);
        Ok(id)
    }

    /// Make a stored project current and return its graph
    pub fn load_project(&mut self, id: &ProjectId) -> Result<GraphSnapshot> {
        let project = self.get(id).ok_or_else(|| ProjectError::UnknownProject(id.clone()))?;
        self.current = project.clone();
        tracing::info!("Loaded project {} ({})", self.current.name, id);
        Ok(self.current.snapshot())
    }

    /// Delete a stored project.
    ///
    /// Deleting the current project replaces it with a fresh untitled one.
    /// Returns whether the current project was replaced.
    pub fn delete_project(&mut self, id: &ProjectId) -> Result<bool> {
        let before = self.projects.len();
        self.projects.retain(|p| p.id.as_ref() != Some(id));
        if self.projects.len() == before {
            return Err(ProjectError::UnknownProject(id.clone()));
        }

        let was_current = self.current.id.as_ref() == Some(id);
        if was_current {
            self.current = Project::untitled(UNTITLED_PROJECT);
        }
        self.persist()?;
        tracing::info!("Deleted project {id}");
        Ok(was_current)
    }

    /// Delete every stored project
    pub fn clear_all(&mut self) -> Result<()> {
        self.projects.clear();
        self.current = Project::untitled(format!("{UNTITLED_PROJECT} 1"));
        self.persist()?;
        tracing::info!("Cleared project library {}", self.path.display());
        Ok(())
    }

    /// Put the current project into the list, assigning an ID if needed
    fn store_current(&mut self) -> ProjectId {
        let existing = self
            .current
            .id
            .as_ref()
            .and_then(|id| self.projects.iter().position(|p| p.id.as_ref() == Some(id)));

        match (existing, self.current.id.clone()) {
            (Some(index), Some(id)) => {
                self.projects[index] = self.current.clone();
                id
            }
            _ => {
                let id = ProjectId::generate();
                self.current.id = Some(id.clone());
                self.current.created_at = self.current.updated_at;
                self.projects.insert(0, self.current.clone());
                id
            }
        }
    }

    fn persist(&self) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let file = LibraryFile {
            version: LIBRARY_FORMAT_VERSION,
            projects: self.projects.clone(),
        };
        let config = ron::ser::PrettyConfig::default()
            .struct_names(true)
            .enumerate_arrays(false);
        std::fs::write(&self.path, ron::ser::to_string_pretty(&file, config)?)?;
        Ok(())
    }
}

/// Error from the project library
#[derive(Debug, thiserror::Error)]
pub enum ProjectError {
    /// Reading or writing the library file failed
    #[error("Failed to access project library: {0}")]
    Io(#[from] std::io::Error),
    /// The library file is not valid RON
    #[error("Invalid project library: {0}")]
    Parse(#[from] ron::error::SpannedError),
    /// The library could not be encoded
    #[error("Failed to encode project library: {0}")]
    Encode(#[from] ron::Error),
    /// The file uses a format version this build does not read
    #[error("Project library version {found} is not supported (expected {supported})")]
    UnsupportedVersion {
        /// Version in the file
        found: u32,
        /// Version this build reads
        supported: u32,
    },
    /// No stored project has this ID
    #[error("Unknown project: {0}")]
    UnknownProject(ProjectId),
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
        .unwrap_or_default()
}
