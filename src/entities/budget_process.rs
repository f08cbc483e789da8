//! Budget process entity - one approval lifecycle per set of campaign rounds.
//!
//! `current_state_key` is only ever advanced by the transition executor and
//! always mirrors the `to_node` of the most recent budget step (or the
//! sentinel `-` before the first step). Processes are soft-deleted, never
//! removed.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Key stored while a process has received no transition yet.
pub const NO_STATE_KEY: &str = "-";

/// Budget process database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "budget_processes")]
pub struct Model {
    /// Unique identifier for the budget process
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Key of the workflow node the process currently sits on
    pub current_state_key: String,
    /// Denormalized display label of the current node
    pub current_state_label: String,
    /// User id of whoever created the process
    pub created_by: i64,
    /// Creation timestamp (UTC)
    pub created_at: chrono::DateTime<chrono::Utc>,
    /// Last transition timestamp (UTC)
    pub updated_at: chrono::DateTime<chrono::Utc>,
    /// Soft delete flag - if true, process is hidden but data is preserved
    pub is_deleted: bool,
}

/// Defines relationships between BudgetProcess and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One process accumulates many audit steps
    #[sea_orm(has_many = "super::budget_step::Entity")]
    BudgetSteps,
    /// One process may cover several campaign rounds
    #[sea_orm(has_many = "super::round::Entity")]
    Rounds,
}

impl Related<super::budget_step::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::BudgetSteps.def()
    }
}

impl Related<super::round::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Rounds.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
