use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};

use super::extract::{AuthUser, JsonBody};
use super::SharedState;
use crate::permissions::Permission;
use crate::services::{amc, ServiceResult};
use crate::types::AmcContract;

pub fn routes() -> Router<SharedState> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/:id", get(show).put(update).delete(remove))
}

async fn list(
    State(state): State<SharedState>,
    user: AuthUser,
) -> ServiceResult<Json<Vec<AmcContract>>> {
    user.require(Permission::AmcView)?;
    let db = state.db.lock();
    Ok(Json(amc::list(&db)?))
}

async fn show(
    State(state): State<SharedState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> ServiceResult<Json<AmcContract>> {
    user.require(Permission::AmcView)?;
    let db = state.db.lock();
    Ok(Json(amc::get(&db, &id)?))
}

async fn create(
    State(state): State<SharedState>,
    user: AuthUser,
    JsonBody(body): JsonBody<Value>,
) -> ServiceResult<(StatusCode, Json<AmcContract>)> {
    user.require(Permission::AmcUpdate)?;
    let db = state.db.lock();
    Ok((StatusCode::CREATED, Json(amc::create(&db, &body)?)))
}

async fn update(
    State(state): State<SharedState>,
    user: AuthUser,
    Path(id): Path<String>,
    JsonBody(patch): JsonBody<Value>,
) -> ServiceResult<Json<AmcContract>> {
    user.require(Permission::AmcUpdate)?;
    let db = state.db.lock();
    Ok(Json(amc::update(&db, &id, &patch)?))
}

async fn remove(
    State(state): State<SharedState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> ServiceResult<Json<Value>> {
    user.require(Permission::AmcUpdate)?;
    let db = state.db.lock();
    amc::delete(&db, &id)?;
    Ok(Json(json!({ "message": "AMC contract deleted successfully" })))
}
