//! Budget step endpoints.
//!
//! A step is the immutable audit record of one executed transition. The
//! detail response inlines its files and links; each file additionally gets
//! a permanent per-step URL that survives media relocations by redirecting
//! to wherever the bytes currently live.

use crate::{
    api::AppState,
    core::process,
    errors::Result,
};
use axum::{
    Json,
    extract::{Path, State},
    http::{StatusCode, header},
    response::Response,
};
use serde_json::{Value, json};

fn permanent_url(step_id: i64, file_id: i64) -> String {
    format!("/api/budgetsteps/{step_id}/files/{file_id}/")
}

/// `GET /api/budgetsteps/{id}/`
pub async fn retrieve(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Value>> {
    let detail = process::get_step_detail(&state.db, id).await?;

    let files: Vec<Value> = detail
        .files
        .iter()
        .map(|f| {
            json!({
                "id": f.id,
                "file": f.url,
                "filename": f.filename,
                "permanent_url": permanent_url(detail.step.id, f.id),
            })
        })
        .collect();
    let links: Vec<Value> = detail
        .links
        .iter()
        .map(|l| json!({"id": l.id, "url": l.url, "alias": l.alias}))
        .collect();

    Ok(Json(json!({
        "id": detail.step.id,
        "budget_process": detail.step.budget_process_id,
        "transition_key": detail.step.transition_key,
        "node_key_to": detail.step.node_key_to,
        "comment": detail.step.comment,
        "created_by": detail.step.created_by,
        "created_at": detail.step.created_at,
        "files": files,
        "links": links,
    })))
}

/// `GET /api/budgetsteps/{id}/files/{file_id}/`
///
/// 302 to the file's current location under `/media/`.
pub async fn file_redirect(
    State(state): State<AppState>,
    Path((step_id, file_id)): Path<(i64, i64)>,
) -> Result<Response> {
    let file = process::get_step_file(&state.db, step_id, file_id).await?;
    let response = Response::builder()
        .status(StatusCode::FOUND)
        .header(header::LOCATION, file.url)
        .body(axum::body::Body::empty())
        .map_err(|e| crate::errors::Error::Validation {
            message: format!("redirect response: {e}"),
        })?;
    Ok(response)
}
