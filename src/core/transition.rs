//! Transition executor - atomically applies one transition to one process.
//!
//! The executor never trusts the caller: it resolves the transition among
//! those reachable from the *current* persisted state and re-runs the
//! allowed-check server-side before writing anything. The audit step insert
//! and the state advance happen inside one database transaction, with the
//! advance guarded by a conditional update so concurrent writers cannot both
//! transition from the same origin state.

use crate::{
    core::ActingUser,
    entities::{BudgetProcess, budget_process, budget_step, budget_step_file, budget_step_link},
    errors::{Error, Result},
    notify::{NotificationEvent, Notifier},
    workflow::{
        Workflow,
        evaluate::{PayloadSummary, check_allowed},
    },
};
use sea_orm::{ConnectionTrait, DatabaseConnection, Set, TransactionTrait, prelude::*};
use serde::Deserialize;
use tracing::warn;

/// A file already written to the file store, to be recorded on the step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileAttachment {
    /// Original filename as uploaded
    pub filename: String,
    /// Path relative to the file store root
    pub path: String,
    /// Public URL the file is served from
    pub url: String,
}

/// A `{url, alias}` pair attached to the transition.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LinkAttachment {
    /// Target URL
    pub url: String,
    /// Display alias
    pub alias: String,
}

/// Validated input for one transition execution.
#[derive(Debug, Clone, Default)]
pub struct TransitionInput {
    /// Key of the transition to execute
    pub transition_key: String,
    /// Process to advance
    pub budget_process: i64,
    /// Free-text comment
    pub comment: Option<String>,
    /// Files uploaded with the request, already in the file store
    pub files: Vec<FileAttachment>,
    /// Links attached to the request
    pub links: Vec<LinkAttachment>,
}

impl TransitionInput {
    fn payload_summary(&self) -> PayloadSummary {
        PayloadSummary {
            has_comment: self
                .comment
                .as_deref()
                .is_some_and(|c| !c.trim().is_empty()),
            file_count: self.files.len(),
            link_count: self.links.len(),
        }
    }
}

/// Executes one transition against one budget process.
///
/// On success the returned step is the freshly written audit record and the
/// process's `current_state_key` equals the transition's `to_node`. The
/// notification side effect runs after commit; its failure is logged and
/// never surfaced.
///
/// # Errors
/// - [`Error::ProcessNotFound`] for unknown or soft-deleted processes
/// - [`Error::TransitionNotFound`] when the key does not originate from the
///   current state (covers skipped states and stale UI replays)
/// - [`Error::TransitionNotAllowed`] when a required field is missing or the
///   caller's teams fail the gate
/// - [`Error::StaleState`] when a concurrent writer advanced the process
///   between our read and our guarded update
pub async fn transition_to(
    db: &DatabaseConnection,
    workflow: &Workflow,
    input: TransitionInput,
    user: &ActingUser,
    notifier: &dyn Notifier,
) -> Result<budget_step::Model> {
    let process = BudgetProcess::find_by_id(input.budget_process)
        .one(db)
        .await?
        .filter(|p| !p.is_deleted)
        .ok_or(Error::ProcessNotFound {
            id: input.budget_process,
        })?;

    let current = process.current_state_key.clone();
    let transition = workflow
        .transitions_from(&current)
        .find(|t| t.key == input.transition_key)
        .ok_or_else(|| Error::TransitionNotFound {
            key: input.transition_key.clone(),
            from_node: current.clone(),
        })?;

    if let Some(reason) = check_allowed(transition, Some(input.payload_summary()), &user.team_ids)
    {
        return Err(Error::TransitionNotAllowed {
            key: transition.key.clone(),
            reason,
        });
    }

    let to_label = workflow
        .node_label(&transition.to_node)
        .unwrap_or(&transition.to_node)
        .to_string();
    let now = chrono::Utc::now();

    // Append-then-advance must be atomic: either the step exists and the
    // state moved, or neither is visible.
    let txn = db.begin().await?;

    let step = budget_step::ActiveModel {
        budget_process_id: Set(process.id),
        transition_key: Set(transition.key.clone()),
        node_key_to: Set(transition.to_node.clone()),
        comment: Set(input.comment.clone()),
        created_by: Set(user.id),
        created_at: Set(now),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    for file in &input.files {
        budget_step_file::ActiveModel {
            budget_step_id: Set(step.id),
            filename: Set(file.filename.clone()),
            path: Set(file.path.clone()),
            url: Set(file.url.clone()),
            ..Default::default()
        }
        .insert(&txn)
        .await?;
    }

    for link in &input.links {
        budget_step_link::ActiveModel {
            budget_step_id: Set(step.id),
            url: Set(link.url.clone()),
            alias: Set(link.alias.clone()),
            ..Default::default()
        }
        .insert(&txn)
        .await?;
    }

    let rows = advance_state_guarded(&txn, process.id, &current, &transition.to_node, &to_label, now)
        .await?;
    if rows == 0 {
        // A concurrent writer won the race; dropping the transaction rolls
        // the step insert back.
        return Err(Error::StaleState {
            process_id: process.id,
            expected: current,
        });
    }

    txn.commit().await?;

    let event = NotificationEvent {
        process_id: process.id,
        step_id: step.id,
        transition_key: &transition.key,
        transition_label: &transition.label,
        node_key_to: &transition.to_node,
        performed_by: &user.username,
        destination_team_ids: &transition.emails_destination_team_ids,
    };
    if let Err(e) = notifier.notify(&event) {
        warn!(
            process_id = process.id,
            step_id = step.id,
            error = %e,
            "notification side effect failed; transition already committed"
        );
    }

    Ok(step)
}

/// Advances `current_state_key/label` only if the process still sits on
/// `expected_from`. Returns the number of rows updated: zero means another
/// writer moved the process first.
pub(crate) async fn advance_state_guarded<C>(
    db: &C,
    process_id: i64,
    expected_from: &str,
    to_key: &str,
    to_label: &str,
    now: chrono::DateTime<chrono::Utc>,
) -> Result<u64>
where
    C: ConnectionTrait,
{
    use sea_orm::sea_query::Expr;

    let result = BudgetProcess::update_many()
        .col_expr(
            budget_process::Column::CurrentStateKey,
            Expr::value(to_key),
        )
        .col_expr(
            budget_process::Column::CurrentStateLabel,
            Expr::value(to_label),
        )
        .col_expr(budget_process::Column::UpdatedAt, Expr::value(now))
        .filter(budget_process::Column::Id.eq(process_id))
        .filter(budget_process::Column::CurrentStateKey.eq(expected_from))
        .exec(db)
        .await?;

    Ok(result.rows_affected)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::entities::{BudgetStep, BudgetStepFile, BudgetStepLink};
    use crate::errors::ReasonNotAllowed;
    use crate::notify::LogNotifier;
    use crate::test_utils::*;
    use crate::workflow::{Node, Transition, Workflow};
    use sea_orm::QueryOrder;

    fn submit_input(process_id: i64) -> TransitionInput {
        TransitionInput {
            transition_key: "submit_budget".to_string(),
            budget_process: process_id,
            comment: Some("first draft".to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_transition_advances_state_and_appends_step() -> crate::errors::Result<()> {
        let (db, process) = setup_with_process().await?;
        let workflow = sample_workflow();
        let user = test_user();

        let step =
            transition_to(&db, &workflow, submit_input(process.id), &user, &LogNotifier).await?;

        assert_eq!(step.budget_process_id, process.id);
        assert_eq!(step.transition_key, "submit_budget");
        assert_eq!(step.node_key_to, "budget_submitted");
        assert_eq!(step.comment.as_deref(), Some("first draft"));
        assert_eq!(step.created_by, user.id);

        let reloaded = crate::entities::BudgetProcess::find_by_id(process.id)
            .one(&db)
            .await?
            .unwrap();
        assert_eq!(reloaded.current_state_key, "budget_submitted");
        assert_eq!(reloaded.current_state_label, "Budget submitted");
        assert!(reloaded.updated_at >= process.updated_at);

        // Invariant: current state equals the latest step's to_node.
        let latest = BudgetStep::find()
            .filter(budget_step::Column::BudgetProcessId.eq(process.id))
            .order_by_desc(budget_step::Column::Id)
            .one(&db)
            .await?
            .unwrap();
        assert_eq!(latest.node_key_to, reloaded.current_state_key);

        Ok(())
    }

    #[tokio::test]
    async fn test_transition_not_originating_from_current_state() -> crate::errors::Result<()> {
        let (db, process) = setup_with_process().await?;
        let workflow = sample_workflow();

        // accept_budget starts from budget_submitted, not from the sentinel.
        let input = TransitionInput {
            transition_key: "accept_budget".to_string(),
            budget_process: process.id,
            comment: Some("valid payload otherwise".to_string()),
            ..Default::default()
        };
        let result = transition_to(&db, &workflow, input, &test_user(), &LogNotifier).await;
        assert!(matches!(
            result.unwrap_err(),
            Error::TransitionNotFound { ref key, ref from_node }
                if key == "accept_budget" && from_node == "-"
        ));

        // Nothing was written.
        let steps = BudgetStep::find().all(&db).await?;
        assert!(steps.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_unknown_process_rejected() -> crate::errors::Result<()> {
        let db = setup_test_db().await?;
        let workflow = sample_workflow();
        let result = transition_to(&db, &workflow, submit_input(999), &test_user(), &LogNotifier)
            .await;
        assert!(matches!(
            result.unwrap_err(),
            Error::ProcessNotFound { id: 999 }
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_missing_required_fields_rejected() -> crate::errors::Result<()> {
        let (db, process) = setup_with_process().await?;
        let workflow = workflow_requiring_files();

        let input = TransitionInput {
            transition_key: "submit_budget".to_string(),
            budget_process: process.id,
            comment: None,
            ..Default::default()
        };
        let result = transition_to(&db, &workflow, input, &test_user(), &LogNotifier).await;
        match result.unwrap_err() {
            Error::TransitionNotAllowed { key, reason } => {
                assert_eq!(key, "submit_budget");
                assert_eq!(
                    reason,
                    ReasonNotAllowed::MissingFields {
                        fields: vec!["files".to_string()]
                    }
                );
            }
            other => panic!("unexpected error: {other:?}"),
        }
        Ok(())
    }

    #[tokio::test]
    async fn test_role_gate_enforced_server_side() -> crate::errors::Result<()> {
        let (db, process) = setup_with_process().await?;
        let workflow = team_gated_workflow(&[5]);

        let outsider = ActingUser::new(2, "mallory", vec![99]);
        let result =
            transition_to(&db, &workflow, submit_input(process.id), &outsider, &LogNotifier)
                .await;
        assert!(matches!(
            result.unwrap_err(),
            Error::TransitionNotAllowed {
                reason: ReasonNotAllowed::RoleNotPermitted,
                ..
            }
        ));

        // A member of the gating team passes.
        let member = ActingUser::new(3, "carol", vec![5]);
        let step =
            transition_to(&db, &workflow, submit_input(process.id), &member, &LogNotifier)
                .await?;
        assert_eq!(step.node_key_to, "budget_submitted");
        Ok(())
    }

    #[tokio::test]
    async fn test_attachments_round_trip() -> crate::errors::Result<()> {
        let (db, process) = setup_with_process().await?;
        let workflow = sample_workflow();

        let mut input = submit_input(process.id);
        input.files = vec![FileAttachment {
            filename: "estimate.xlsx".to_string(),
            path: "p1/estimate.xlsx".to_string(),
            url: "/media/p1/estimate.xlsx".to_string(),
        }];
        input.links = vec![
            LinkAttachment {
                url: "http://helloworld".to_string(),
                alias: "hello world".to_string(),
            },
            LinkAttachment {
                url: "https://lien.com".to_string(),
                alias: "mon petit lien".to_string(),
            },
        ];

        let step = transition_to(&db, &workflow, input, &test_user(), &LogNotifier).await?;

        let files = BudgetStepFile::find()
            .filter(budget_step_file::Column::BudgetStepId.eq(step.id))
            .all(&db)
            .await?;
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].filename, "estimate.xlsx");
        assert_eq!(files[0].url, "/media/p1/estimate.xlsx");

        let links = BudgetStepLink::find()
            .filter(budget_step_link::Column::BudgetStepId.eq(step.id))
            .order_by_asc(budget_step_link::Column::Id)
            .all(&db)
            .await?;
        let pairs: Vec<(&str, &str)> = links
            .iter()
            .map(|l| (l.url.as_str(), l.alias.as_str()))
            .collect();
        assert_eq!(
            pairs,
            vec![
                ("http://helloworld", "hello world"),
                ("https://lien.com", "mon petit lien"),
            ]
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_terminal_state_offers_no_transitions() -> crate::errors::Result<()> {
        let (db, process) = setup_with_process().await?;
        let workflow = sample_workflow();
        let user = test_user();

        transition_to(&db, &workflow, submit_input(process.id), &user, &LogNotifier).await?;
        let accept = TransitionInput {
            transition_key: "accept_budget".to_string(),
            budget_process: process.id,
            comment: Some("approved".to_string()),
            ..Default::default()
        };
        transition_to(&db, &workflow, accept, &user, &LogNotifier).await?;

        // accepted is terminal; even replaying submit_budget must fail.
        let result =
            transition_to(&db, &workflow, submit_input(process.id), &user, &LogNotifier).await;
        assert!(matches!(
            result.unwrap_err(),
            Error::TransitionNotFound { .. }
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_guarded_advance_detects_stale_origin() -> crate::errors::Result<()> {
        let (db, process) = setup_with_process().await?;
        let now = chrono::Utc::now();

        let first =
            advance_state_guarded(&db, process.id, "-", "budget_submitted", "Budget submitted", now)
                .await?;
        assert_eq!(first, 1);

        // Same expected origin again: the row has moved on, nothing matches.
        let second =
            advance_state_guarded(&db, process.id, "-", "budget_submitted", "Budget submitted", now)
                .await?;
        assert_eq!(second, 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_concurrent_transitions_exactly_one_wins() -> crate::errors::Result<()> {
        let (db, process) = setup_with_process().await?;
        let workflow = sample_workflow();
        let user = test_user();

        let (a, b) = tokio::join!(
            transition_to(
                &db,
                &workflow,
                submit_input(process.id),
                &user,
                &LogNotifier
            ),
            transition_to(
                &db,
                &workflow,
                submit_input(process.id),
                &user,
                &LogNotifier
            ),
        );

        let successes = [a.is_ok(), b.is_ok()].iter().filter(|ok| **ok).count();
        assert_eq!(successes, 1, "exactly one concurrent transition may win");
        for result in [a, b] {
            if let Err(e) = result {
                assert!(
                    matches!(
                        e,
                        Error::TransitionNotFound { .. } | Error::StaleState { .. }
                    ),
                    "loser must observe a stale origin, got: {e:?}"
                );
            }
        }

        // Never two steps transitioning from the same origin state.
        let steps = BudgetStep::find()
            .filter(budget_step::Column::BudgetProcessId.eq(process.id))
            .all(&db)
            .await?;
        assert_eq!(steps.len(), 1);

        let reloaded = crate::entities::BudgetProcess::find_by_id(process.id)
            .one(&db)
            .await?
            .unwrap();
        assert_eq!(reloaded.current_state_key, "budget_submitted");
        Ok(())
    }

    fn workflow_requiring_files() -> Workflow {
        Workflow::new(
            vec![
                Node {
                    key: None,
                    label: "No budget".to_string(),
                    category: None,
                },
                Node {
                    key: Some("budget_submitted".to_string()),
                    label: "Budget submitted".to_string(),
                    category: None,
                },
            ],
            vec![Transition {
                key: "submit_budget".to_string(),
                label: "Submit budget".to_string(),
                from_node: "-".to_string(),
                to_node: "budget_submitted".to_string(),
                required_fields: vec!["files".to_string()],
                displayed_fields: vec!["comment".to_string()],
                teams_ids_can_transition: vec![],
                emails_destination_team_ids: vec![],
                color: None,
                help_text: String::new(),
            }],
            vec![],
        )
        .unwrap()
    }

    fn team_gated_workflow(teams: &[i64]) -> Workflow {
        let mut workflow = workflow_requiring_files();
        let mut transitions = workflow.transitions().to_vec();
        transitions[0].required_fields.clear();
        transitions[0].teams_ids_can_transition = teams.to_vec();
        workflow = Workflow::new(workflow.nodes().to_vec(), transitions, vec![]).unwrap();
        workflow
    }
}
