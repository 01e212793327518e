use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{delete, get, put};
use axum::{Json, Router};
use serde_json::{json, Value};

use super::extract::{AuthUser, JsonBody};
use super::SharedState;
use crate::permissions::{permission_groups, Permission};
use crate::services::users::{self, NewUser, UserChanges};
use crate::services::ServiceResult;
use crate::types::User;

pub fn routes() -> Router<SharedState> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/permissions/list", get(permission_list))
        .route("/pending", get(pending))
        .route("/:id", get(show).put(update).delete(remove))
        .route("/:id/permissions", put(set_permissions))
        .route("/:id/approve", put(approve))
        .route("/:id/reject", delete(reject))
}

async fn list(State(state): State<SharedState>, user: AuthUser) -> ServiceResult<Json<Vec<User>>> {
    user.require(Permission::UsersView)?;
    let db = state.db.lock();
    Ok(Json(users::list(&db)?))
}

async fn permission_list(user: AuthUser) -> ServiceResult<Json<Value>> {
    user.require(Permission::UsersView)?;
    Ok(Json(json!({ "permissions": permission_groups() })))
}

async fn pending(State(state): State<SharedState>, user: AuthUser) -> ServiceResult<Json<Vec<User>>> {
    user.require(Permission::UsersManage)?;
    let db = state.db.lock();
    Ok(Json(users::list_pending(&db)?))
}

async fn show(
    State(state): State<SharedState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> ServiceResult<Json<User>> {
    if user.0.id != id {
        user.require(Permission::UsersView)?;
    }
    let db = state.db.lock();
    Ok(Json(users::get(&db, &id)?))
}

async fn create(
    State(state): State<SharedState>,
    user: AuthUser,
    JsonBody(input): JsonBody<NewUser>,
) -> ServiceResult<(StatusCode, Json<User>)> {
    user.require(Permission::UsersManage)?;
    let db = state.db.lock();
    Ok((StatusCode::CREATED, Json(users::create(&db, input)?)))
}

/// Managers edit anyone; other users may edit their own profile but not
/// their account status.
async fn update(
    State(state): State<SharedState>,
    user: AuthUser,
    Path(id): Path<String>,
    JsonBody(mut changes): JsonBody<UserChanges>,
) -> ServiceResult<Json<User>> {
    if !user.0.has_permission(Permission::UsersManage) {
        if user.0.id != id {
            user.require(Permission::UsersManage)?;
        }
        changes.status = None;
    }
    let db = state.db.lock();
    Ok(Json(users::update(&db, &user.0, &id, changes)?))
}

async fn set_permissions(
    State(state): State<SharedState>,
    user: AuthUser,
    Path(id): Path<String>,
    JsonBody(body): JsonBody<Value>,
) -> ServiceResult<Json<Value>> {
    user.require(Permission::UsersManage)?;
    let db = state.db.lock();
    let updated = users::set_permissions(&db, &id, &body)?;
    Ok(Json(json!({
        "success": true,
        "message": "Permissions updated successfully",
        "user": updated,
    })))
}

async fn approve(
    State(state): State<SharedState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> ServiceResult<Json<Value>> {
    user.require(Permission::UsersManage)?;
    let db = state.db.lock();
    let approved = users::approve(&db, &id)?;
    Ok(Json(json!({
        "success": true,
        "message": "User approved successfully",
        "user": approved,
    })))
}

async fn reject(
    State(state): State<SharedState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> ServiceResult<Json<Value>> {
    user.require(Permission::UsersManage)?;
    let db = state.db.lock();
    users::reject(&db, &id)?;
    Ok(Json(json!({
        "message": "Signup request rejected and user deleted successfully"
    })))
}

async fn remove(
    State(state): State<SharedState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> ServiceResult<Json<Value>> {
    user.require(Permission::UsersManage)?;
    let db = state.db.lock();
    users::delete(&db, &id)?;
    Ok(Json(json!({ "message": "User deleted successfully" })))
}
