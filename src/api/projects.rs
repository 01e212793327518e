use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};

use super::extract::{AuthUser, JsonBody};
use super::SharedState;
use crate::permissions::Permission;
use crate::services::{projects, ServiceResult};
use crate::types::Project;

pub fn routes() -> Router<SharedState> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/:id", get(show).put(update).delete(remove))
}

async fn list(State(state): State<SharedState>, user: AuthUser) -> ServiceResult<Json<Vec<Project>>> {
    user.require(Permission::ProjectsView)?;
    let db = state.db.lock();
    Ok(Json(projects::list(&db)?))
}

async fn show(
    State(state): State<SharedState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> ServiceResult<Json<Project>> {
    user.require(Permission::ProjectsView)?;
    let db = state.db.lock();
    Ok(Json(projects::get(&db, &id)?))
}

async fn create(
    State(state): State<SharedState>,
    user: AuthUser,
    JsonBody(body): JsonBody<Value>,
) -> ServiceResult<(StatusCode, Json<Project>)> {
    user.require(Permission::ProjectsCreate)?;
    let db = state.db.lock();
    Ok((StatusCode::CREATED, Json(projects::create(&db, &body)?)))
}

async fn update(
    State(state): State<SharedState>,
    user: AuthUser,
    Path(id): Path<String>,
    JsonBody(patch): JsonBody<Value>,
) -> ServiceResult<Json<Project>> {
    user.require_any(&[Permission::ProjectsCreate, Permission::ProjectsAssign])?;
    let db = state.db.lock();
    Ok(Json(projects::update(&db, &id, &patch)?))
}

async fn remove(
    State(state): State<SharedState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> ServiceResult<Json<Value>> {
    user.require(Permission::ProjectsCreate)?;
    let db = state.db.lock();
    projects::delete(&db, &id)?;
    Ok(Json(json!({ "message": "Project deleted successfully" })))
}
