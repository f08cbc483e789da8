//! Workflow definition - the immutable approval graph.
//!
//! A [`Workflow`] is loaded once at startup (see `config::workflow`),
//! validated, and then shared read-only by every request. Nodes are the
//! named states a budget process can sit on; transitions are the gated
//! edges between them. Declaration order is user-visible (the UI renders
//! transitions in the order they are declared) and is preserved by every
//! query on this type.

pub mod evaluate;

use crate::{
    entities::NO_STATE_KEY,
    errors::{Error, Result},
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// A named state in the approval graph.
///
/// `key` is `None` for the sentinel "no budget yet" pseudo-node, which is
/// stored on processes as [`NO_STATE_KEY`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    /// State key; `None` marks the initial sentinel node
    pub key: Option<String>,
    /// Display label
    pub label: String,
    /// Optional timeline category this node is grouped under
    #[serde(default, skip_serializing)]
    pub category: Option<String>,
}

impl Node {
    /// The key as stored on `BudgetProcess.current_state_key`.
    #[must_use]
    pub fn storage_key(&self) -> &str {
        self.key.as_deref().unwrap_or(NO_STATE_KEY)
    }
}

/// A named, gated edge between two nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transition {
    /// Unique key within its origin node
    pub key: String,
    /// Display label
    pub label: String,
    /// Origin node key (`-` for the sentinel)
    pub from_node: String,
    /// Destination node key
    pub to_node: String,
    /// Payload fields that must be present and non-empty to execute
    #[serde(default)]
    pub required_fields: Vec<String>,
    /// Payload fields the UI should display for this transition
    #[serde(default)]
    pub displayed_fields: Vec<String>,
    /// Teams whose members may execute this transition; empty = unrestricted
    #[serde(default)]
    pub teams_ids_can_transition: Vec<i64>,
    /// Teams notified when this transition executes
    #[serde(default)]
    pub emails_destination_team_ids: Vec<i64>,
    /// Optional UI color hint
    #[serde(default)]
    pub color: Option<String>,
    /// Optional help text shown next to the action
    #[serde(default)]
    pub help_text: String,
}

/// An optional higher-level grouping of nodes for the timeline display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    /// Category key referenced from `Node.category`
    pub key: String,
    /// Display label
    pub label: String,
}

/// The validated, immutable workflow graph.
#[derive(Debug, Clone)]
pub struct Workflow {
    nodes: Vec<Node>,
    transitions: Vec<Transition>,
    categories: Vec<Category>,
}

impl Workflow {
    /// Builds a workflow and validates it.
    ///
    /// # Errors
    /// Returns [`Error::WorkflowConfig`] if a transition references an
    /// undeclared node, if two transitions share the same
    /// `(from_node, key)` pair (ambiguous dispatch), or if a node points
    /// at an undeclared category.
    pub fn new(
        nodes: Vec<Node>,
        transitions: Vec<Transition>,
        categories: Vec<Category>,
    ) -> Result<Self> {
        let node_keys: HashSet<&str> = nodes.iter().map(Node::storage_key).collect();
        let category_keys: HashSet<&str> = categories.iter().map(|c| c.key.as_str()).collect();

        for transition in &transitions {
            for (side, key) in [
                ("from_node", transition.from_node.as_str()),
                ("to_node", transition.to_node.as_str()),
            ] {
                if !node_keys.contains(key) {
                    return Err(Error::WorkflowConfig {
                        message: format!(
                            "transition '{}' references undeclared {side} '{key}'",
                            transition.key
                        ),
                    });
                }
            }
        }

        let mut seen = HashSet::new();
        for transition in &transitions {
            if !seen.insert((transition.from_node.as_str(), transition.key.as_str())) {
                return Err(Error::WorkflowConfig {
                    message: format!(
                        "duplicate transition '{}' from node '{}'",
                        transition.key, transition.from_node
                    ),
                });
            }
        }

        for node in &nodes {
            if let Some(category) = &node.category {
                if !category_keys.contains(category.as_str()) {
                    return Err(Error::WorkflowConfig {
                        message: format!(
                            "node '{}' references undeclared category '{category}'",
                            node.storage_key()
                        ),
                    });
                }
            }
        }

        Ok(Self {
            nodes,
            transitions,
            categories,
        })
    }

    /// All declared nodes, in declaration order.
    #[must_use]
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// All declared transitions, in declaration order.
    #[must_use]
    pub fn transitions(&self) -> &[Transition] {
        &self.transitions
    }

    /// All declared timeline categories, in declaration order.
    #[must_use]
    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    /// Transitions originating from the given node key, in declaration
    /// order. Restartable and finite.
    pub fn transitions_from<'a>(
        &'a self,
        node_key: &'a str,
    ) -> impl Iterator<Item = &'a Transition> + 'a {
        self.transitions
            .iter()
            .filter(move |t| t.from_node == node_key)
    }

    /// Looks up a node by its storage key.
    #[must_use]
    pub fn node(&self, key: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.storage_key() == key)
    }

    /// Display label for a node key, if declared.
    #[must_use]
    pub fn node_label(&self, key: &str) -> Option<&str> {
        self.node(key).map(|n| n.label.as_str())
    }

    /// A node is terminal when no transition originates from it.
    #[must_use]
    pub fn is_terminal(&self, node_key: &str) -> bool {
        self.transitions_from(node_key).next().is_none()
    }
}
