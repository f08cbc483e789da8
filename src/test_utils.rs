//! Shared test utilities for `budget-flow`.
//!
//! This module provides common helper functions for setting up test
//! databases, building workflow fixtures and creating test entities with
//! sensible defaults. The sample workflow mirrors the canonical
//! submit/accept/reject approval graph.

use crate::{
    core::{ActingUser, process},
    entities,
    errors::Result,
    workflow::{Category, Node, Transition, Workflow},
};
use sea_orm::{DatabaseConnection, Set, prelude::*};

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// The default acting user: member of team 1.
#[must_use]
pub fn test_user() -> ActingUser {
    ActingUser::new(1, "test", vec![1])
}

fn node(key: Option<&str>, label: &str, category: Option<&str>) -> Node {
    Node {
        key: key.map(String::from),
        label: label.to_string(),
        category: category.map(String::from),
    }
}

fn transition(key: &str, label: &str, from: &str, to: &str, color: Option<&str>) -> Transition {
    Transition {
        key: key.to_string(),
        label: label.to_string(),
        from_node: from.to_string(),
        to_node: to.to_string(),
        required_fields: vec![],
        displayed_fields: vec!["comment".to_string()],
        teams_ids_can_transition: vec![],
        emails_destination_team_ids: vec![],
        color: color.map(String::from),
        help_text: String::new(),
    }
}

/// The canonical four-node approval graph:
/// `-` → `budget_submitted` → (`accepted` | `rejected`).
#[must_use]
#[allow(clippy::unwrap_used)]
pub fn sample_workflow() -> Workflow {
    Workflow::new(
        vec![
            node(None, "No budget", None),
            node(Some("budget_submitted"), "Budget submitted", None),
            node(Some("accepted"), "Budget accepted", None),
            node(Some("rejected"), "Budget rejected", None),
        ],
        vec![
            transition("submit_budget", "Submit budget", "-", "budget_submitted", None),
            transition(
                "accept_budget",
                "Accept budget",
                "budget_submitted",
                "accepted",
                Some("green"),
            ),
            transition(
                "reject_budget",
                "Provide feedback",
                "budget_submitted",
                "rejected",
                Some("primary"),
            ),
        ],
        vec![],
    )
    .unwrap()
}

/// The sample workflow with nodes grouped under two timeline categories.
#[must_use]
#[allow(clippy::unwrap_used)]
pub fn categorized_workflow() -> Workflow {
    Workflow::new(
        vec![
            node(None, "No budget", None),
            node(Some("budget_submitted"), "Budget submitted", Some("submission")),
            node(Some("accepted"), "Budget accepted", Some("approval")),
            node(Some("rejected"), "Budget rejected", Some("approval")),
        ],
        vec![
            transition("submit_budget", "Submit budget", "-", "budget_submitted", None),
            transition(
                "accept_budget",
                "Accept budget",
                "budget_submitted",
                "accepted",
                Some("green"),
            ),
            transition(
                "reject_budget",
                "Provide feedback",
                "budget_submitted",
                "rejected",
                Some("primary"),
            ),
        ],
        vec![
            Category {
                key: "submission".to_string(),
                label: "Submission".to_string(),
            },
            Category {
                key: "approval".to_string(),
                label: "Approval".to_string(),
            },
        ],
    )
    .unwrap()
}

/// Creates a test campaign.
pub async fn create_test_campaign(
    db: &DatabaseConnection,
    obr_name: &str,
    country_name: &str,
) -> Result<entities::campaign::Model> {
    entities::campaign::ActiveModel {
        obr_name: Set(obr_name.to_string()),
        country_name: Set(country_name.to_string()),
        is_deleted: Set(false),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(Into::into)
}

/// Creates a test round on a campaign.
pub async fn create_test_round(
    db: &DatabaseConnection,
    campaign_id: i64,
    number: i32,
) -> Result<entities::round::Model> {
    entities::round::ActiveModel {
        number: Set(number),
        campaign_id: Set(campaign_id),
        budget_process_id: Set(None),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(Into::into)
}

/// Sets up a complete test environment: db, "test campaign" in ANGOLA with
/// round 1, and a budget process covering that round.
/// Returns (db, process) for common test scenarios.
pub async fn setup_with_process() -> Result<(DatabaseConnection, entities::budget_process::Model)>
{
    let db = setup_test_db().await?;
    let campaign = create_test_campaign(&db, "test campaign", "ANGOLA").await?;
    let round = create_test_round(&db, campaign.id, 1).await?;
    let process = process::create_process(&db, &[round.id], &test_user()).await?;
    Ok((db, process))
}

/// Records a step directly, bypassing the executor. Only for read-side tests
/// that need history without exercising the state machine.
pub async fn record_test_step(
    db: &DatabaseConnection,
    budget_process_id: i64,
    transition_key: &str,
    node_key_to: &str,
) -> Result<entities::budget_step::Model> {
    entities::budget_step::ActiveModel {
        budget_process_id: Set(budget_process_id),
        transition_key: Set(transition_key.to_string()),
        node_key_to: Set(node_key_to.to_string()),
        comment: Set(None),
        created_by: Set(1),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(Into::into)
}

/// Records a file row on a step without touching the file store.
pub async fn record_test_file(
    db: &DatabaseConnection,
    budget_step_id: i64,
    filename: &str,
) -> Result<entities::budget_step_file::Model> {
    entities::budget_step_file::ActiveModel {
        budget_step_id: Set(budget_step_id),
        filename: Set(filename.to_string()),
        path: Set(format!("p1/{filename}")),
        url: Set(format!("/media/p1/{filename}")),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(Into::into)
}
