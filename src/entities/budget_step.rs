//! Budget step entity - the append-only audit record of one transition.
//!
//! A step is written exactly once, inside the same database transaction that
//! advances its process, and is never updated afterwards. Replaying a
//! process's steps in creation order reconstructs its full history.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Budget step database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "budget_steps")]
pub struct Model {
    /// Unique identifier for the step
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Process this step belongs to
    pub budget_process_id: i64,
    /// Key of the transition that was executed
    pub transition_key: String,
    /// Key of the node the process arrived at
    pub node_key_to: String,
    /// Free-text comment supplied with the transition
    pub comment: Option<String>,
    /// User id of whoever executed the transition
    pub created_by: i64,
    /// Execution timestamp (UTC)
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// Defines relationships between BudgetStep and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each step belongs to one budget process
    #[sea_orm(
        belongs_to = "super::budget_process::Entity",
        from = "Column::BudgetProcessId",
        to = "super::budget_process::Column::Id"
    )]
    BudgetProcess,
    /// One step owns zero or more uploaded files
    #[sea_orm(has_many = "super::budget_step_file::Entity")]
    Files,
    /// One step owns zero or more attached links
    #[sea_orm(has_many = "super::budget_step_link::Entity")]
    Links,
}

impl Related<super::budget_process::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::BudgetProcess.def()
    }
}

impl Related<super::budget_step_file::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Files.def()
    }
}

impl Related<super::budget_step_link::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Links.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
