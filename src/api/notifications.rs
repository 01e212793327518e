use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{delete, get, patch};
use axum::{Json, Router};
use serde_json::{json, Value};

use super::extract::{AuthUser, JsonBody};
use super::SharedState;
use crate::services::notifications::{self, NewNotification};
use crate::services::ServiceResult;
use crate::types::Notification;

/// Any signed-in user may read and manage the shared feed.
pub fn routes() -> Router<SharedState> {
    Router::new()
        .route("/", get(feed).post(create))
        .route("/unread", get(unread))
        .route("/read-all", patch(mark_all_read))
        .route("/:id/read", patch(mark_read))
        .route("/:id", delete(remove))
}

async fn feed(
    State(state): State<SharedState>,
    user: AuthUser,
) -> ServiceResult<Json<Vec<Notification>>> {
    let db = state.db.lock();
    Ok(Json(notifications::feed(&db, &user.0.id)?))
}

async fn unread(State(state): State<SharedState>, user: AuthUser) -> ServiceResult<Json<Value>> {
    let db = state.db.lock();
    let count = notifications::unread_count(&db, &user.0.id)?;
    Ok(Json(json!({ "count": count })))
}

async fn mark_read(
    State(state): State<SharedState>,
    _user: AuthUser,
    Path(id): Path<String>,
) -> ServiceResult<Json<Notification>> {
    let db = state.db.lock();
    Ok(Json(notifications::mark_read(&db, &id)?))
}

async fn mark_all_read(
    State(state): State<SharedState>,
    user: AuthUser,
) -> ServiceResult<Json<Value>> {
    let db = state.db.lock();
    let changed = notifications::mark_all_read(&db, &user.0.id)?;
    log::debug!("Marked {} notification(s) read for {}", changed, user.0.email);
    Ok(Json(json!({ "message": "All notifications marked as read" })))
}

async fn create(
    State(state): State<SharedState>,
    _user: AuthUser,
    JsonBody(input): JsonBody<NewNotification>,
) -> ServiceResult<(StatusCode, Json<Notification>)> {
    let db = state.db.lock();
    Ok((StatusCode::CREATED, Json(notifications::create(&db, input)?)))
}

async fn remove(
    State(state): State<SharedState>,
    _user: AuthUser,
    Path(id): Path<String>,
) -> ServiceResult<Json<Value>> {
    let db = state.db.lock();
    notifications::delete(&db, &id)?;
    Ok(Json(json!({ "message": "Notification deleted successfully" })))
}
