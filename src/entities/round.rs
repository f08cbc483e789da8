//! Round entity - one numbered round of a campaign.
//!
//! A round optionally points at the budget process tracking its approval;
//! several rounds of the same campaign may share one process.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Round database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "rounds")]
pub struct Model {
    /// Unique identifier for the round
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Round number within its campaign (1, 2, ...)
    pub number: i32,
    /// Owning campaign
    pub campaign_id: i64,
    /// Budget process tracking this round, if any
    pub budget_process_id: Option<i64>,
}

/// Defines relationships between Round and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each round belongs to one campaign
    #[sea_orm(
        belongs_to = "super::campaign::Entity",
        from = "Column::CampaignId",
        to = "super::campaign::Column::Id"
    )]
    Campaign,
    /// Each round optionally belongs to one budget process
    #[sea_orm(
        belongs_to = "super::budget_process::Entity",
        from = "Column::BudgetProcessId",
        to = "super::budget_process::Column::Id"
    )]
    BudgetProcess,
}

impl Related<super::campaign::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Campaign.def()
    }
}

impl Related<super::budget_process::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::BudgetProcess.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
