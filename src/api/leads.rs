use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};

use super::extract::{AuthUser, JsonBody};
use super::SharedState;
use crate::permissions::Permission;
use crate::services::{leads, ServiceResult};
use crate::types::{Lead, LeadInput};

pub fn routes() -> Router<SharedState> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/:id", get(show).put(update).delete(remove))
}

async fn list(State(state): State<SharedState>, user: AuthUser) -> ServiceResult<Json<Vec<Lead>>> {
    user.require(Permission::LeadsView)?;
    let db = state.db.lock();
    Ok(Json(leads::list(&db)?))
}

async fn show(
    State(state): State<SharedState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> ServiceResult<Json<Lead>> {
    user.require(Permission::LeadsView)?;
    let db = state.db.lock();
    Ok(Json(leads::get(&db, &id)?))
}

async fn create(
    State(state): State<SharedState>,
    user: AuthUser,
    JsonBody(input): JsonBody<LeadInput>,
) -> ServiceResult<(StatusCode, Json<Lead>)> {
    user.require(Permission::LeadsCreate)?;
    let db = state.db.lock();
    Ok((StatusCode::CREATED, Json(leads::create(&db, input)?)))
}

async fn update(
    State(state): State<SharedState>,
    user: AuthUser,
    Path(id): Path<String>,
    JsonBody(patch): JsonBody<Value>,
) -> ServiceResult<Json<Lead>> {
    user.require(Permission::LeadsEdit)?;
    let db = state.db.lock();
    let (lead, derivation) = leads::update(&db, &id, &patch)?;
    log::debug!("Lead {} updated by {}: {:?}", lead.id, user.0.email, derivation);
    Ok(Json(lead))
}

async fn remove(
    State(state): State<SharedState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> ServiceResult<Json<Value>> {
    user.require(Permission::LeadsDelete)?;
    let db = state.db.lock();
    leads::delete(&db, &id)?;
    Ok(Json(json!({ "message": "Lead deleted successfully" })))
}
