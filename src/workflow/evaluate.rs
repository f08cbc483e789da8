//! Transition evaluator - decides which transitions are allowed right now.
//!
//! One pure function, [`check_allowed`], is shared by the read side (the
//! `next_transitions` listing) and the write side (the executor's server-side
//! re-check), so the two can never drift apart. The read side passes no
//! payload summary because required fields cannot be known before the form
//! is filled; the executor passes the actual payload.

use super::{Transition, Workflow};
use crate::errors::ReasonNotAllowed;
use serde::Serialize;

/// What the caller actually supplied with a transition request, reduced to
/// presence checks for the field names a workflow may require.
#[derive(Debug, Clone, Copy, Default)]
pub struct PayloadSummary {
    /// A non-empty comment was supplied
    pub has_comment: bool,
    /// Number of uploaded files
    pub file_count: usize,
    /// Number of attached links
    pub link_count: usize,
}

impl PayloadSummary {
    fn field_present(self, name: &str) -> bool {
        match name {
            "comment" => self.has_comment,
            "files" => self.file_count > 0,
            "links" => self.link_count > 0,
            // Unknown field names can never be satisfied; the workflow
            // author finds out on the first attempt rather than silently.
            _ => false,
        }
    }
}

/// Evaluates whether a single transition is allowed for the caller.
///
/// Returns `None` when allowed, or the first failing gate otherwise.
/// Gate order: required fields (when a payload is being validated), then
/// team membership. An empty `teams_ids_can_transition` means unrestricted.
#[must_use]
pub fn check_allowed(
    transition: &Transition,
    payload: Option<PayloadSummary>,
    user_team_ids: &[i64],
) -> Option<ReasonNotAllowed> {
    if let Some(summary) = payload {
        let missing: Vec<String> = transition
            .required_fields
            .iter()
            .filter(|f| !summary.field_present(f))
            .cloned()
            .collect();
        if !missing.is_empty() {
            return Some(ReasonNotAllowed::MissingFields { fields: missing });
        }
    }

    if !transition.teams_ids_can_transition.is_empty()
        && !transition
            .teams_ids_can_transition
            .iter()
            .any(|team| user_team_ids.contains(team))
    {
        return Some(ReasonNotAllowed::RoleNotPermitted);
    }

    None
}

/// A transition descriptor as rendered in API responses, optionally
/// enriched with the caller-specific `allowed` verdict.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransitionView {
    /// Transition key
    pub key: String,
    /// Display label
    pub label: String,
    /// Help text shown next to the action
    pub help_text: String,
    /// `Some(..)` on `next_transitions`, `None` on `possible_transitions`
    pub allowed: Option<bool>,
    /// Why the transition is not allowed, when it is not
    pub reason_not_allowed: Option<ReasonNotAllowed>,
    /// Payload fields required to execute
    pub required_fields: Vec<String>,
    /// Payload fields the UI should display
    pub displayed_fields: Vec<String>,
    /// UI color hint
    pub color: Option<String>,
    /// Teams notified on execution; only present on `next_transitions`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub emails_destination_team_ids: Option<Vec<i64>>,
}

impl TransitionView {
    fn base(transition: &Transition) -> Self {
        Self {
            key: transition.key.clone(),
            label: transition.label.clone(),
            help_text: transition.help_text.clone(),
            allowed: None,
            reason_not_allowed: None,
            required_fields: transition.required_fields.clone(),
            displayed_fields: transition.displayed_fields.clone(),
            color: transition.color.clone(),
            emails_destination_team_ids: None,
        }
    }
}

/// Transitions reachable from `current_state_key`, enriched with the
/// caller's `allowed` verdict. Order matches declaration order exactly.
#[must_use]
pub fn next_transitions(
    workflow: &Workflow,
    current_state_key: &str,
    user_team_ids: &[i64],
) -> Vec<TransitionView> {
    workflow
        .transitions_from(current_state_key)
        .map(|transition| {
            let reason = check_allowed(transition, None, user_team_ids);
            let mut view = TransitionView::base(transition);
            view.allowed = Some(reason.is_none());
            view.reason_not_allowed = reason;
            view.emails_destination_team_ids =
                Some(transition.emails_destination_team_ids.clone());
            view
        })
        .collect()
}

/// Every declared transition, without caller-specific enrichment.
#[must_use]
pub fn possible_transitions(workflow: &Workflow) -> Vec<TransitionView> {
    workflow.transitions().iter().map(TransitionView::base).collect()
}
