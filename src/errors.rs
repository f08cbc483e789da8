//! Unified error types for `budget-flow`.
//!
//! Workflow configuration problems are fatal at startup; transition lookup
//! and gating failures are user-visible request errors; `StaleState` signals
//! that a concurrent writer advanced the process first.

use serde::Serialize;
use thiserror::Error;

/// Machine-readable reason a transition is not allowed for the caller.
///
/// Deliberately a closed enum: the two conditions below are the only gates
/// the evaluator applies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "code", rename_all = "snake_case")]
pub enum ReasonNotAllowed {
    /// One or more `required_fields` were absent or empty in the payload.
    MissingFields {
        /// The missing field names, in the transition's declaration order.
        fields: Vec<String>,
    },
    /// The acting user belongs to none of the teams gating the transition.
    RoleNotPermitted,
}

impl std::fmt::Display for ReasonNotAllowed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingFields { fields } => {
                write!(f, "missing required fields: {}", fields.join(", "))
            }
            Self::RoleNotPermitted => write!(f, "user's teams cannot perform this transition"),
        }
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("Configuration error: {message}")]
    Config {
        /// Human-readable description of what failed to load or parse
        message: String,
    },

    #[error("Workflow configuration error: {message}")]
    WorkflowConfig {
        /// What is malformed in the workflow definition
        message: String,
    },

    #[error("Transition '{key}' does not originate from state '{from_node}'")]
    TransitionNotFound {
        /// The requested transition key
        key: String,
        /// The process's current state key
        from_node: String,
    },

    #[error("Transition '{key}' not allowed: {reason}")]
    TransitionNotAllowed {
        /// The requested transition key
        key: String,
        /// Why the gate rejected it
        reason: ReasonNotAllowed,
    },

    #[error("Budget process {process_id} moved away from state '{expected}' concurrently")]
    StaleState {
        /// The process whose state changed under us
        process_id: i64,
        /// The state the executor expected to advance from
        expected: String,
    },

    #[error("Invalid request: {message}")]
    Validation {
        /// What was malformed in the request payload
        message: String,
    },

    #[error("Budget process not found: {id}")]
    ProcessNotFound { id: i64 },

    #[error("Budget step not found: {id}")]
    StepNotFound { id: i64 },

    #[error("Budget step file not found: {id}")]
    StepFileNotFound { id: i64 },

    #[error("Round not found: {id}")]
    RoundNotFound { id: i64 },

    #[error("Round {id} already belongs to budget process {budget_process_id}")]
    RoundAlreadyAssigned { id: i64, budget_process_id: i64 },

    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
