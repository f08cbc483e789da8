//! Budget process endpoints.
//!
//! The list/detail responses support the `fields=` query parameter: the
//! default shape is the 7 cheap fields, `:all` adds the workflow-derived
//! ones (possible states/transitions, the caller's next transitions and the
//! timeline), and an explicit comma list picks exactly those.

use crate::{
    api::{AppState, acting_user},
    core::{
        ActingUser, export, process,
        timeline::timeline,
        transition::{LinkAttachment, TransitionInput, transition_to as execute_transition},
    },
    errors::{Error, Result},
    workflow::evaluate,
};
use axum::{
    Json,
    extract::{FromRequest, Multipart, Path, Query, Request, State},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use serde_json::{Value, json};

/// Largest accepted JSON transition body. File uploads go through
/// multipart and are streamed, not buffered, so they are not bound by this.
const MAX_JSON_BODY: usize = 2 * 1024 * 1024;

const DEFAULT_FIELDS: &[&str] = &[
    "id",
    "obr_name",
    "country_name",
    "current_state",
    "round_numbers",
    "created_at",
    "updated_at",
];

const ALL_FIELDS: &[&str] = &[
    "id",
    "obr_name",
    "country_name",
    "current_state",
    "round_numbers",
    "created_at",
    "updated_at",
    "possible_states",
    "next_transitions",
    "possible_transitions",
    "timeline",
];

/// Query parameters shared by the list endpoints.
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    /// `:all`, a comma list of field names, or absent for the default shape
    pub fields: Option<String>,
    /// Maximum number of rows returned
    pub limit: Option<usize>,
    /// Rows skipped from the start
    pub offset: Option<usize>,
}

enum FieldSelection {
    Default,
    All,
    Explicit(Vec<String>),
}

impl FieldSelection {
    fn parse(param: Option<&str>) -> Self {
        match param {
            None | Some("") => Self::Default,
            Some(":all") => Self::All,
            Some(list) => {
                let picked: Vec<String> = list
                    .split(',')
                    .map(|f| f.trim().to_string())
                    .filter(|f| ALL_FIELDS.contains(&f.as_str()))
                    .collect();
                // Unknown names are dropped; a selection with nothing left
                // falls back to the default shape, like the CSV export does.
                if picked.is_empty() {
                    Self::Default
                } else {
                    Self::Explicit(picked)
                }
            }
        }
    }

    fn fields(&self) -> Vec<&str> {
        match self {
            Self::Default => DEFAULT_FIELDS.to_vec(),
            Self::All => ALL_FIELDS.to_vec(),
            Self::Explicit(fields) => fields.iter().map(String::as_str).collect(),
        }
    }
}

/// Renders one process row with exactly the selected fields. The
/// workflow-derived fields are only computed when asked for.
async fn process_payload(
    state: &AppState,
    row: &process::ProcessRow,
    user: &ActingUser,
    selection: &FieldSelection,
) -> Result<Value> {
    let mut object = serde_json::Map::new();
    for field in selection.fields() {
        let value = match field {
            "id" => json!(row.process.id),
            "obr_name" => json!(row.obr_name),
            "country_name" => json!(row.country_name),
            "current_state" => json!({
                "key": row.process.current_state_key,
                "label": row.process.current_state_label,
            }),
            "round_numbers" => json!(row.round_numbers),
            "created_at" => json!(row.process.created_at),
            "updated_at" => json!(row.process.updated_at),
            "possible_states" => json!(state.workflow.nodes()),
            "next_transitions" => json!(evaluate::next_transitions(
                &state.workflow,
                &row.process.current_state_key,
                &user.team_ids,
            )),
            "possible_transitions" => json!(evaluate::possible_transitions(&state.workflow)),
            "timeline" => {
                let steps = process::get_steps(&state.db, row.process.id).await?;
                json!(timeline(
                    &state.workflow,
                    &steps,
                    &row.process.current_state_key
                ))
            }
            _ => continue,
        };
        object.insert(field.to_string(), value);
    }
    Ok(Value::Object(object))
}

/// `GET /api/budget/`
pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
    headers: HeaderMap,
) -> Result<Json<Value>> {
    let user = acting_user(&state.users, &headers);
    let selection = FieldSelection::parse(query.fields.as_deref());

    let rows = process::list_process_rows(&state.db).await?;
    let count = rows.len();
    let offset = query.offset.unwrap_or(0);
    let limit = query.limit.unwrap_or(usize::MAX);

    let mut results = Vec::new();
    for row in rows.iter().skip(offset).take(limit) {
        results.push(process_payload(&state, row, &user, &selection).await?);
    }
    Ok(Json(json!({"count": count, "results": results})))
}

/// `GET /api/budget/{id}/`
pub async fn retrieve(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(query): Query<ListQuery>,
    headers: HeaderMap,
) -> Result<Json<Value>> {
    let user = acting_user(&state.users, &headers);
    let selection = FieldSelection::parse(query.fields.as_deref());
    let row = process::get_process_row(&state.db, id).await?;
    Ok(Json(process_payload(&state, &row, &user, &selection).await?))
}

/// Body of `POST /api/budget/`.
#[derive(Debug, Deserialize)]
pub struct CreateProcessBody {
    /// Ids of the rounds the new process covers
    pub rounds: Vec<i64>,
}

/// `POST /api/budget/`
pub async fn create(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<CreateProcessBody>,
) -> Result<(StatusCode, Json<Value>)> {
    let user = acting_user(&state.users, &headers);
    if body.rounds.is_empty() {
        return Err(Error::Validation {
            message: "a budget process needs at least one round".to_string(),
        });
    }
    let created = process::create_process(&state.db, &body.rounds, &user).await?;
    Ok((StatusCode::CREATED, Json(json!({"id": created.id}))))
}

/// `DELETE /api/budget/{id}/`
///
/// Soft delete: the process disappears from listings but its audit trail
/// stays queryable in the database.
pub async fn destroy(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode> {
    process::soft_delete_process(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
struct TransitionForm {
    transition_key: String,
    budget_process: i64,
    #[serde(default)]
    comment: Option<String>,
    #[serde(default)]
    links: Vec<LinkAttachment>,
}

/// `POST /api/budget/transition_to/`
///
/// Accepts either a JSON body or multipart form data; multipart is the
/// only way to attach files, which are streamed into the file store as
/// they arrive. When the transition itself fails, any files already
/// stored for it are removed again.
pub async fn transition_to(
    State(state): State<AppState>,
    headers: HeaderMap,
    request: Request,
) -> Result<(StatusCode, Json<Value>)> {
    let user = acting_user(&state.users, &headers);
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    let input = if content_type.starts_with("multipart/form-data") {
        let multipart = Multipart::from_request(request, &state).await.map_err(|e| {
            Error::Validation {
                message: format!("invalid multipart body: {e}"),
            }
        })?;
        parse_multipart(&state, multipart).await?
    } else {
        parse_json_body(request).await?
    };

    let files = input.files.clone();
    match execute_transition(
        &state.db,
        &state.workflow,
        input,
        &user,
        state.notifier.as_ref(),
    )
    .await
    {
        Ok(step) => Ok((
            StatusCode::CREATED,
            Json(json!({"result": "success", "id": step.id})),
        )),
        Err(e) => {
            for file in &files {
                state.store.remove(file).await;
            }
            Err(e)
        }
    }
}

async fn parse_json_body(request: Request) -> Result<TransitionInput> {
    let bytes = axum::body::to_bytes(request.into_body(), MAX_JSON_BODY)
        .await
        .map_err(|e| Error::Validation {
            message: format!("unreadable request body: {e}"),
        })?;
    let form: TransitionForm = serde_json::from_slice(&bytes).map_err(|e| Error::Validation {
        message: format!("invalid transition payload: {e}"),
    })?;
    Ok(TransitionInput {
        transition_key: form.transition_key,
        budget_process: form.budget_process,
        comment: form.comment,
        files: vec![],
        links: form.links,
    })
}

async fn parse_multipart(state: &AppState, mut multipart: Multipart) -> Result<TransitionInput> {
    let invalid = |e: axum::extract::multipart::MultipartError| Error::Validation {
        message: format!("malformed multipart field: {e}"),
    };

    let mut input = TransitionInput::default();
    let mut saw_transition_key = false;
    let mut saw_budget_process = false;

    while let Some(field) = multipart.next_field().await.map_err(invalid)? {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "transition_key" => {
                input.transition_key = field.text().await.map_err(invalid)?;
                saw_transition_key = true;
            }
            "budget_process" => {
                let text = field.text().await.map_err(invalid)?;
                input.budget_process =
                    text.trim().parse().map_err(|_| Error::Validation {
                        message: format!("budget_process is not an id: {text:?}"),
                    })?;
                saw_budget_process = true;
            }
            "comment" => {
                let text = field.text().await.map_err(invalid)?;
                if !text.is_empty() {
                    input.comment = Some(text);
                }
            }
            "links" => {
                let text = field.text().await.map_err(invalid)?;
                input.links =
                    serde_json::from_str(&text).map_err(|e| Error::Validation {
                        message: format!("links is not a JSON array of {{url, alias}}: {e}"),
                    })?;
            }
            "files" => {
                let filename = field
                    .file_name()
                    .unwrap_or("unnamed")
                    .to_string();
                let mut field = field;
                let mut pending = state.store.begin("uploads", &filename).await?;
                loop {
                    match field.chunk().await {
                        Ok(Some(chunk)) => pending.write_chunk(&chunk).await?,
                        Ok(None) => break,
                        Err(e) => {
                            pending.abort().await;
                            return Err(invalid(e));
                        }
                    }
                }
                input.files.push(pending.finish().await?);
            }
            // Unknown fields are ignored, like any lenient form handler.
            _ => {}
        }
    }

    if !saw_transition_key || !saw_budget_process {
        return Err(Error::Validation {
            message: "transition_key and budget_process are required".to_string(),
        });
    }
    Ok(input)
}

/// `GET /api/budget/export_csv/`
pub async fn export_csv(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Response> {
    let rows = process::list_process_rows(&state.db).await?;
    let columns = export::resolve_columns(query.fields.as_deref());
    let csv = export::export_csv(&rows, &columns);
    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/csv")],
        csv,
    )
        .into_response())
}
