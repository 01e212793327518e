use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};

use super::extract::{AuthUser, JsonBody};
use super::SharedState;
use crate::pdf::{self, PdfError};
use crate::permissions::Permission;
use crate::services::{quotations, ServiceError, ServiceResult};
use crate::types::Quotation;

pub fn routes() -> Router<SharedState> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/:id", get(show).put(update).delete(remove))
        .route("/:id/pdf", get(download_pdf))
}

async fn list(
    State(state): State<SharedState>,
    user: AuthUser,
) -> ServiceResult<Json<Vec<Quotation>>> {
    user.require(Permission::QuotationsView)?;
    let db = state.db.lock();
    Ok(Json(quotations::list(&db)?))
}

async fn show(
    State(state): State<SharedState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> ServiceResult<Json<Quotation>> {
    user.require(Permission::QuotationsView)?;
    let db = state.db.lock();
    Ok(Json(quotations::get(&db, &id)?))
}

async fn create(
    State(state): State<SharedState>,
    user: AuthUser,
    JsonBody(body): JsonBody<Value>,
) -> ServiceResult<(StatusCode, Json<Quotation>)> {
    user.require(Permission::QuotationsCreate)?;
    let db = state.db.lock();
    Ok((StatusCode::CREATED, Json(quotations::create(&db, &body)?)))
}

/// Editing needs `quotations:create`; moving the status needs `quotations:approve`.
async fn update(
    State(state): State<SharedState>,
    user: AuthUser,
    Path(id): Path<String>,
    JsonBody(patch): JsonBody<Value>,
) -> ServiceResult<Json<Quotation>> {
    let db = state.db.lock();
    let current = quotations::get(&db, &id)?;
    let status_change = patch
        .get("status")
        .and_then(Value::as_str)
        .is_some_and(|status| status != current.status.as_str());
    user.require(if status_change {
        Permission::QuotationsApprove
    } else {
        Permission::QuotationsCreate
    })?;
    Ok(Json(quotations::update(&db, &id, &patch)?))
}

async fn remove(
    State(state): State<SharedState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> ServiceResult<Json<Value>> {
    user.require(Permission::QuotationsCreate)?;
    let db = state.db.lock();
    quotations::delete(&db, &id)?;
    Ok(Json(json!({ "message": "Quotation deleted successfully" })))
}

async fn download_pdf(
    State(state): State<SharedState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> ServiceResult<Response> {
    user.require(Permission::QuotationsView)?;
    let quote = {
        let db = state.db.lock();
        quotations::get(&db, &id)?
    };

    let renderer = state.clone();
    let bytes = tokio::task::spawn_blocking(move || {
        pdf::render_quotation(&quote, &renderer.templates)
    })
    .await
    .map_err(|e| ServiceError::Pdf(PdfError::Write(e.to_string())))??;

    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", pdf::file_name(&id)),
            ),
            (
                header::ACCESS_CONTROL_EXPOSE_HEADERS,
                "Content-Disposition".to_string(),
            ),
        ],
        bytes,
    )
        .into_response())
}
