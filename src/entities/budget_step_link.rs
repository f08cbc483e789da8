//! Budget step link entity - a `{url, alias}` pair attached to a transition.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Budget step link database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "budget_step_links")]
pub struct Model {
    /// Unique identifier for the link record
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Step this link was attached to
    pub budget_step_id: i64,
    /// Target URL
    pub url: String,
    /// Display alias for the URL
    pub alias: String,
}

/// Defines relationships between BudgetStepLink and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each link belongs to one budget step
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
