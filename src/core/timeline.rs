//! Timeline projection - the read-side history view of a process.
//!
//! Groups the steps a process went through under the workflow-declared
//! categories ("Preparation", "Approval", ...). Pure function over already
//! loaded data; no mutation, no queries.

use crate::{entities::budget_step, workflow::Workflow};
use serde::Serialize;

/// The whole timeline as rendered in `fields=:all` responses.
#[derive(Debug, Clone, PartialEq, Serialize, Default)]
pub struct Timeline {
    /// Workflow categories in declaration order
    pub categories: Vec<TimelineCategory>,
}

/// One category with the steps that arrived at its nodes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimelineCategory {
    pub key: String,
    pub label: String,
    /// Whether the process currently sits on a node of this category
    pub active: bool,
    /// Steps that arrived at nodes of this category, in execution order
    pub items: Vec<TimelineItem>,
}

/// One executed step as shown on the timeline.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimelineItem {
    /// Id of the audit step
    pub step_id: i64,
    /// Key of the node the step arrived at
    pub node_key: String,
    /// Display label of that node
    pub label: String,
    /// User id that executed the transition
    pub performed_by: i64,
    /// When the transition was executed
    pub performed_at: chrono::DateTime<chrono::Utc>,
    /// Comment recorded on the step
    pub comment: Option<String>,
}

/// Projects a process's steps onto the workflow's categories.
#[must_use]
pub fn timeline(
    workflow: &Workflow,
    steps: &[budget_step::Model],
    current_state_key: &str,
) -> Timeline {
    let node_category = |key: &str| {
        workflow
            .node(key)
            .and_then(|node| node.category.as_deref())
    };
    let current_category = node_category(current_state_key);

    let categories = workflow
        .categories()
        .iter()
        .map(|category| {
            let items = steps
                .iter()
                .filter(|step| node_category(&step.node_key_to) == Some(category.key.as_str()))
                .map(|step| TimelineItem {
                    step_id: step.id,
                    node_key: step.node_key_to.clone(),
                    label: workflow
                        .node_label(&step.node_key_to)
                        .unwrap_or(&step.node_key_to)
                        .to_string(),
                    performed_by: step.created_by,
                    performed_at: step.created_at,
                    comment: step.comment.clone(),
                })
                .collect();

            TimelineCategory {
                key: category.key.clone(),
                label: category.label.clone(),
                active: current_category == Some(category.key.as_str()),
                items,
            }
        })
        .collect();

    Timeline { categories }
}
