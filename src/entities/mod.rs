//! Entity module - Contains all SeaORM entity definitions for the database.
//! These entities represent the database tables and their relationships.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod budget_process;
pub mod budget_step;
pub mod budget_step_file;
pub mod budget_step_link;
pub mod campaign;
pub mod round;

pub use budget_process::NO_STATE_KEY;

// Re-export specific types to avoid conflicts
pub use budget_process::{
    Column as BudgetProcessColumn, Entity as BudgetProcess, Model as BudgetProcessModel,
};
pub use budget_step::{Column as BudgetStepColumn, Entity as BudgetStep, Model as BudgetStepModel};
pub use budget_step_file::{
    Column as BudgetStepFileColumn, Entity as BudgetStepFile, Model as BudgetStepFileModel,
};
pub use budget_step_link::{
    Column as BudgetStepLinkColumn, Entity as BudgetStepLink, Model as BudgetStepLinkModel,
};
pub use campaign::{Column as CampaignColumn, Entity as Campaign, Model as CampaignModel};
pub use round::{Column as RoundColumn, Entity as Round, Model as RoundModel};
