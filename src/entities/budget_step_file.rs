//! Budget step file entity - a file uploaded alongside a transition.
//!
//! The bytes live in the file store; the row records where. `url` is the
//! public media URL the permanent per-step endpoint redirects to.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Budget step file database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "budget_step_files")]
pub struct Model {
    /// Unique identifier for the file record
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Step this file was uploaded with
    pub budget_step_id: i64,
    /// Original filename as uploaded
    pub filename: String,
    /// Path relative to the file store root
    pub path: String,
    /// Public URL the file is served from
    pub url: String,
}

/// Defines relationships between BudgetStepFile and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each file belongs to one budget step
    #[sea_orm(
        belongs_to = "super::budget_step::Entity",
        from = "Column::BudgetStepId",
        to = "super::budget_step::Column::Id"
    )]
    BudgetStep,
}

impl Related<super::budget_step::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::BudgetStep.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
