//! Database configuration module for `budget-flow`.
//!
//! This module handles `SQLite` database connection and table creation using `SeaORM`.
//! It provides functions for establishing database connections and creating all necessary tables
//! based on the entity definitions. The module uses `SeaORM`'s `Schema::create_table_from_entity`
//! method to automatically generate SQL statements from the entity models, ensuring that the
//! database schema matches the Rust struct definitions without requiring manual SQL.

use crate::entities::{BudgetProcess, BudgetStep, BudgetStepFile, BudgetStepLink, Campaign, Round};
use crate::errors::Result;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Schema};

/// Gets the database URL from environment variable or returns default `SQLite` path.
///
/// This function looks for `DATABASE_URL` in the environment and falls back to
/// a default local `SQLite` file if not found.
#[must_use]
pub fn get_database_url() -> String {
    std::env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite://data/budget_flow.sqlite".to_string())
}

/// Establishes a connection to the `SQLite` database.
///
/// This function handles connection errors and provides a clean interface for database access
/// throughout the application.
pub async fn create_connection(database_url: &str) -> Result<DatabaseConnection> {
    Database::connect(database_url).await.map_err(Into::into)
}

/// Creates all necessary database tables using `SeaORM`'s schema generation from entity definitions.
///
/// This function uses the `DeriveEntityModel` macros to automatically generate proper SQL
/// statements for table creation, ensuring the database schema matches the Rust struct definitions.
/// It creates tables for campaigns, rounds, budget processes, steps, step files and step links.
pub async fn create_tables(db: &DatabaseConnection) -> Result<()> {
    let builder = db.get_database_backend();
    let schema = Schema::new(builder);

    let campaign_table = schema.create_table_from_entity(Campaign);
    let round_table = schema.create_table_from_entity(Round);
    let process_table = schema.create_table_from_entity(BudgetProcess);
    let step_table = schema.create_table_from_entity(BudgetStep);
    let step_file_table = schema.create_table_from_entity(BudgetStepFile);
    let step_link_table = schema.create_table_from_entity(BudgetStepLink);

    db.execute(builder.build(&campaign_table)).await?;
    db.execute(builder.build(&round_table)).await?;
    db.execute(builder.build(&process_table)).await?;
    db.execute(builder.build(&step_table)).await?;
    db.execute(builder.build(&step_file_table)).await?;
    db.execute(builder.build(&step_link_table)).await?;

    Ok(())
}
