//! Campaign entity - a vaccination campaign whose rounds carry budgets.
//!
//! Campaigns are referenced from list/detail responses for their OBR name
//! and country; budget state itself lives on [`super::budget_process`].

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Campaign database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "campaigns")]
pub struct Model {
    /// Unique identifier for the campaign
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Outbreak response name (e.g., "nopv2 campaign DRC-2024")
    pub obr_name: String,
    /// Name of the country the campaign targets
    pub country_name: String,
    /// Soft delete flag - if true, campaign is hidden but data is preserved
    pub is_deleted: bool,
}

/// Defines relationships between Campaign and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One campaign has many rounds
    #[sea_orm(has_many = "super::round::Entity")]
    Rounds,
}

impl Related<super::round::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Rounds.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
