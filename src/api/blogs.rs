use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};

use super::extract::{bearer_token, AuthUser, JsonBody};
use super::SharedState;
use crate::permissions::Permission;
use crate::services::blogs::{self, BlogInput};
use crate::services::{auth, ServiceError, ServiceResult};
use crate::types::BlogPost;

pub fn routes() -> Router<SharedState> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/:id", get(show).put(update).delete(remove))
}

/// Blog ids are numeric; anything else cannot name a post.
fn post_id(raw: &str) -> ServiceResult<i64> {
    raw.parse().map_err(|_| ServiceError::NotFound("Blog post"))
}

#[derive(Debug, Default, Deserialize)]
struct ListQuery {
    #[serde(default)]
    admin: Option<String>,
}

/// Public listing. `?admin=true` with a valid token includes drafts.
async fn list(
    State(state): State<SharedState>,
    Query(query): Query<ListQuery>,
    headers: HeaderMap,
) -> ServiceResult<Json<Vec<BlogPost>>> {
    let db = state.db.lock();
    let include_unpublished = query.admin.as_deref() == Some("true");
    if include_unpublished {
        auth::authenticate(&db, bearer_token(&headers))?;
    }
    Ok(Json(blogs::list(&db, include_unpublished)?))
}

async fn show(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> ServiceResult<Json<BlogPost>> {
    let id = post_id(&id)?;
    let db = state.db.lock();
    Ok(Json(blogs::view(&db, id)?))
}

async fn create(
    State(state): State<SharedState>,
    user: AuthUser,
    JsonBody(input): JsonBody<BlogInput>,
) -> ServiceResult<(StatusCode, Json<BlogPost>)> {
    user.require(Permission::SettingsManage)?;
    let db = state.db.lock();
    Ok((StatusCode::CREATED, Json(blogs::create(&db, input)?)))
}

async fn update(
    State(state): State<SharedState>,
    user: AuthUser,
    Path(id): Path<String>,
    JsonBody(input): JsonBody<BlogInput>,
) -> ServiceResult<Json<BlogPost>> {
    user.require(Permission::SettingsManage)?;
    let id = post_id(&id)?;
    let db = state.db.lock();
    Ok(Json(blogs::update(&db, id, input)?))
}

async fn remove(
    State(state): State<SharedState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> ServiceResult<Json<Value>> {
    user.require(Permission::SettingsManage)?;
    let id = post_id(&id)?;
    let db = state.db.lock();
    blogs::delete(&db, id)?;
    Ok(Json(json!({ "success": true, "message": "Blog deleted successfully" })))
}
