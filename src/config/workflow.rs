//! Workflow definition loading from workflow.toml
//!
//! The approval graph is declared in a TOML file (nodes, transitions,
//! categories) and loaded exactly once at startup. Parsing and graph
//! validation both happen here, so a malformed workflow is fatal before the
//! server accepts any request.

use crate::{
    errors::{Error, Result},
    workflow::{Category, Node, Transition, Workflow},
};
use serde::Deserialize;
use std::path::Path;

/// Top-level structure of the workflow.toml file
#[derive(Debug, Deserialize)]
pub struct WorkflowFile {
    /// Declared states, in display order
    #[serde(default)]
    pub nodes: Vec<Node>,
    /// Declared edges, in display order
    #[serde(default)]
    pub transitions: Vec<Transition>,
    /// Optional timeline categories
    #[serde(default)]
    pub categories: Vec<Category>,
}

/// Parses a workflow definition from TOML text and validates the graph.
///
/// # Errors
/// Returns [`Error::Config`] on TOML syntax problems and
/// [`Error::WorkflowConfig`] when the graph itself is malformed.
pub fn parse_workflow(contents: &str) -> Result<Workflow> {
    let file: WorkflowFile = toml::from_str(contents).map_err(|e| Error::Config {
        message: format!("Failed to parse workflow definition: {e}"),
    })?;
    Workflow::new(file.nodes, file.transitions, file.categories)
}

/// Loads and validates the workflow definition from a TOML file.
pub fn load_workflow<P: AsRef<Path>>(path: P) -> Result<Workflow> {
    let contents = std::fs::read_to_string(path.as_ref()).map_err(|e| Error::Config {
        message: format!(
            "Failed to read workflow file {}: {e}",
            path.as_ref().display()
        ),
    })?;
    parse_workflow(&contents)
}
