//! Budget process business logic - creation and read-side queries.
//!
//! A process is created for a set of campaign rounds and starts on the
//! sentinel "no budget" state; from then on it is only ever mutated by the
//! transition executor. The read side joins processes with their rounds and
//! campaign so API rows can show `obr_name`, `country_name` and the round
//! numbers.

use crate::{
    core::ActingUser,
    entities::{
        BudgetProcess, BudgetStep, BudgetStepFile, BudgetStepLink, Campaign, NO_STATE_KEY, Round,
        budget_process, budget_step, budget_step_file, budget_step_link, round,
    },
    errors::{Error, Result},
};
use sea_orm::{DatabaseConnection, QueryOrder, Set, TransactionTrait, prelude::*};

/// One process joined with its campaign context, as shown in list rows.
#[derive(Debug, Clone)]
pub struct ProcessRow {
    /// The process itself
    pub process: budget_process::Model,
    /// OBR name of the campaign the rounds belong to
    pub obr_name: String,
    /// Country of that campaign
    pub country_name: String,
    /// Numbers of the rounds covered by this process, ascending
    pub round_numbers: Vec<i32>,
}

/// A step joined with its attachments.
#[derive(Debug, Clone)]
pub struct StepDetail {
    /// The audit step
    pub step: budget_step::Model,
    /// Files uploaded with it
    pub files: Vec<budget_step_file::Model>,
    /// Links attached to it
    pub links: Vec<budget_step_link::Model>,
}

/// Creates a budget process covering the given rounds.
///
/// All rounds must exist and be unassigned; assignment happens in the same
/// database transaction as the process insert.
pub async fn create_process(
    db: &DatabaseConnection,
    round_ids: &[i64],
    user: &ActingUser,
) -> Result<budget_process::Model> {
    let now = chrono::Utc::now();
    let txn = db.begin().await?;

    let mut rounds = Vec::with_capacity(round_ids.len());
    for id in round_ids {
        let round = Round::find_by_id(*id)
            .one(&txn)
            .await?
            .ok_or(Error::RoundNotFound { id: *id })?;
        if let Some(existing) = round.budget_process_id {
            return Err(Error::RoundAlreadyAssigned {
                id: *id,
                budget_process_id: existing,
            });
        }
        rounds.push(round);
    }

    let process = budget_process::ActiveModel {
        current_state_key: Set(NO_STATE_KEY.to_string()),
        current_state_label: Set(NO_STATE_KEY.to_string()),
        created_by: Set(user.id),
        created_at: Set(now),
        updated_at: Set(now),
        is_deleted: Set(false),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    for round in rounds {
        let mut active: round::ActiveModel = round.into();
        active.budget_process_id = Set(Some(process.id));
        active.update(&txn).await?;
    }

    txn.commit().await?;
    Ok(process)
}

/// Soft-deletes a process; its audit trail stays behind.
pub async fn soft_delete_process(db: &DatabaseConnection, id: i64) -> Result<()> {
    let process = BudgetProcess::find_by_id(id)
        .one(db)
        .await?
        .ok_or(Error::ProcessNotFound { id })?;
    let mut active: budget_process::ActiveModel = process.into();
    active.is_deleted = Set(true);
    active.update(db).await?;
    Ok(())
}

async fn join_campaign_context(
    db: &DatabaseConnection,
    process: budget_process::Model,
) -> Result<ProcessRow> {
    let rounds = Round::find()
        .filter(round::Column::BudgetProcessId.eq(process.id))
        .order_by_asc(round::Column::Number)
        .all(db)
        .await?;

    let campaign = match rounds.first() {
        Some(round) => Campaign::find_by_id(round.campaign_id).one(db).await?,
        None => None,
    };
    let (obr_name, country_name) = campaign
        .map(|c| (c.obr_name, c.country_name))
        .unwrap_or_default();

    Ok(ProcessRow {
        process,
        obr_name,
        country_name,
        round_numbers: rounds.iter().map(|r| r.number).collect(),
    })
}

/// Lists all live processes with campaign context, oldest first.
pub async fn list_process_rows(db: &DatabaseConnection) -> Result<Vec<ProcessRow>> {
    let processes = BudgetProcess::find()
        .filter(budget_process::Column::IsDeleted.eq(false))
        .order_by_asc(budget_process::Column::Id)
        .all(db)
        .await?;

    let mut rows = Vec::with_capacity(processes.len());
    for process in processes {
        rows.push(join_campaign_context(db, process).await?);
    }
    Ok(rows)
}

/// Fetches one live process with campaign context.
pub async fn get_process_row(db: &DatabaseConnection, id: i64) -> Result<ProcessRow> {
    let process = BudgetProcess::find_by_id(id)
        .one(db)
        .await?
        .filter(|p| !p.is_deleted)
        .ok_or(Error::ProcessNotFound { id })?;
    join_campaign_context(db, process).await
}

/// All steps of a process in execution order.
pub async fn get_steps(
    db: &DatabaseConnection,
    process_id: i64,
) -> Result<Vec<budget_step::Model>> {
    BudgetStep::find()
        .filter(budget_step::Column::BudgetProcessId.eq(process_id))
        .order_by_asc(budget_step::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// One step with its files and links.
pub async fn get_step_detail(db: &DatabaseConnection, id: i64) -> Result<StepDetail> {
    let step = BudgetStep::find_by_id(id)
        .one(db)
        .await?
        .ok_or(Error::StepNotFound { id })?;

    let files = BudgetStepFile::find()
        .filter(budget_step_file::Column::BudgetStepId.eq(step.id))
        .order_by_asc(budget_step_file::Column::Id)
        .all(db)
        .await?;
    let links = BudgetStepLink::find()
        .filter(budget_step_link::Column::BudgetStepId.eq(step.id))
        .order_by_asc(budget_step_link::Column::Id)
        .all(db)
        .await?;

    Ok(StepDetail { step, files, links })
}

/// Looks up one file of one step, for the permanent-URL redirect.
pub async fn get_step_file(
    db: &DatabaseConnection,
    step_id: i64,
    file_id: i64,
) -> Result<budget_step_file::Model> {
    BudgetStepFile::find_by_id(file_id)
        .one(db)
        .await?
        .filter(|f| f.budget_step_id == step_id)
        .ok_or(Error::StepFileNotFound { id: file_id })
}
