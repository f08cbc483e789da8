//! Core business logic - framework-agnostic budget workflow operations.
//!
//! Everything here takes a database connection and validated inputs and
//! knows nothing about HTTP. The API layer is a thin shell over these
//! functions.

/// CSV export of the process list
pub mod export;
/// Process creation and read-side queries
pub mod process;
/// Timeline projection grouping steps under workflow categories
pub mod timeline;
/// The transition executor (state machine core)
pub mod transition;

/// The authenticated identity a request acts as.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActingUser {
    /// Stable user id, recorded on audit steps
    pub id: i64,
    /// Display name
    pub username: String,
    /// Teams the user belongs to, checked against transition gates
    pub team_ids: Vec<i64>,
}

impl ActingUser {
    /// Convenience constructor, mostly for tests and tooling.
    #[must_use]
    pub fn new(id: i64, username: impl Into<String>, team_ids: Vec<i64>) -> Self {
        Self {
            id,
            username: username.into(),
            team_ids,
        }
    }
}
