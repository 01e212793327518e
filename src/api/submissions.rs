//! Website forms (`/contact`, `/demo`) and the admin overview (`/admin`).
//! Posting a form is public; everything else is guarded.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};

use super::extract::{AuthUser, JsonBody};
use super::SharedState;
use crate::permissions::Permission;
use crate::services::submissions::{self, ContactInput, DemoInput, SubmissionStats, Submissions};
use crate::services::ServiceResult;
use crate::types::{ContactMessage, DemoRequest};

pub fn contact_routes() -> Router<SharedState> {
    Router::new()
        .route("/", get(list_contacts).post(submit_contact))
        .route(
            "/:id",
            get(show_contact).put(update_contact).delete(delete_contact),
        )
}

pub fn demo_routes() -> Router<SharedState> {
    Router::new()
        .route("/", get(list_demos).post(submit_demo))
        .route("/:id", get(show_demo).put(update_demo).delete(delete_demo))
}

pub fn admin_routes() -> Router<SharedState> {
    Router::new()
        .route("/submissions", get(overview))
        .route("/contacts", get(list_contacts))
        .route("/demos", get(list_demos))
        .route("/stats", get(stats))
}

async fn submit_contact(
    State(state): State<SharedState>,
    JsonBody(input): JsonBody<ContactInput>,
) -> ServiceResult<(StatusCode, Json<Value>)> {
    let db = state.db.lock();
    let contact = submissions::submit_contact(&db, input)?;
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Contact message submitted successfully",
            "id": contact.id,
        })),
    ))
}

async fn list_contacts(
    State(state): State<SharedState>,
    user: AuthUser,
) -> ServiceResult<Json<Vec<ContactMessage>>> {
    user.require(Permission::FormSubmissionsView)?;
    let db = state.db.lock();
    Ok(Json(submissions::list_contacts(&db)?))
}

async fn show_contact(
    State(state): State<SharedState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> ServiceResult<Json<ContactMessage>> {
    user.require(Permission::FormSubmissionsView)?;
    let db = state.db.lock();
    Ok(Json(submissions::get_contact(&db, &id)?))
}

async fn update_contact(
    State(state): State<SharedState>,
    user: AuthUser,
    Path(id): Path<String>,
    JsonBody(patch): JsonBody<Value>,
) -> ServiceResult<Json<ContactMessage>> {
    user.require(Permission::FormSubmissionsView)?;
    let db = state.db.lock();
    Ok(Json(submissions::update_contact(&db, &id, &patch)?))
}

async fn delete_contact(
    State(state): State<SharedState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> ServiceResult<Json<Value>> {
    user.require(Permission::FormSubmissionsDelete)?;
    let db = state.db.lock();
    submissions::delete_contact(&db, &id)?;
    Ok(Json(json!({ "message": "Contact message deleted successfully" })))
}

async fn submit_demo(
    State(state): State<SharedState>,
    JsonBody(input): JsonBody<DemoInput>,
) -> ServiceResult<(StatusCode, Json<Value>)> {
    let db = state.db.lock();
    let demo = submissions::submit_demo(&db, input)?;
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Demo request submitted successfully",
            "id": demo.id,
            "success": true,
        })),
    ))
}

async fn list_demos(
    State(state): State<SharedState>,
    user: AuthUser,
) -> ServiceResult<Json<Vec<DemoRequest>>> {
    user.require(Permission::DemoRequestsView)?;
    let db = state.db.lock();
    Ok(Json(submissions::list_demos(&db)?))
}

async fn show_demo(
    State(state): State<SharedState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> ServiceResult<Json<DemoRequest>> {
    user.require(Permission::DemoRequestsView)?;
    let db = state.db.lock();
    Ok(Json(submissions::get_demo(&db, &id)?))
}

async fn update_demo(
    State(state): State<SharedState>,
    user: AuthUser,
    Path(id): Path<String>,
    JsonBody(patch): JsonBody<Value>,
) -> ServiceResult<Json<DemoRequest>> {
    user.require(Permission::DemoRequestsView)?;
    let db = state.db.lock();
    Ok(Json(submissions::update_demo(&db, &id, &patch)?))
}

async fn delete_demo(
    State(state): State<SharedState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> ServiceResult<Json<Value>> {
    user.require(Permission::DemoRequestsDelete)?;
    let db = state.db.lock();
    submissions::delete_demo(&db, &id)?;
    Ok(Json(json!({ "message": "Demo request deleted successfully" })))
}

async fn overview(
    State(state): State<SharedState>,
    user: AuthUser,
) -> ServiceResult<Json<Submissions>> {
    user.require(Permission::FormSubmissionsView)?;
    let db = state.db.lock();
    Ok(Json(submissions::submissions(&db)?))
}

async fn stats(
    State(state): State<SharedState>,
    user: AuthUser,
) -> ServiceResult<Json<SubmissionStats>> {
    user.require(Permission::FormSubmissionsView)?;
    let db = state.db.lock();
    Ok(Json(submissions::stats(&db)?))
}
