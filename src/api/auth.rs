use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{json, Value};

use super::extract::{bearer_token, JsonBody};
use super::SharedState;
use crate::services::auth::{self, LoginRequest, LoginResponse, SignupRequest};
use crate::services::ServiceResult;

pub fn routes() -> Router<SharedState> {
    Router::new()
        .route("/login", post(login))
        .route("/signup", post(signup))
        .route("/verify", post(verify))
}

async fn login(
    State(state): State<SharedState>,
    JsonBody(request): JsonBody<LoginRequest>,
) -> ServiceResult<Json<LoginResponse>> {
    let db = state.db.lock();
    Ok(Json(auth::login(&db, request)?))
}

async fn signup(
    State(state): State<SharedState>,
    JsonBody(request): JsonBody<SignupRequest>,
) -> ServiceResult<(StatusCode, Json<Value>)> {
    let db = state.db.lock();
    auth::signup(&db, request)?;
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Signup request submitted successfully. Please wait for admin approval."
        })),
    ))
}

async fn verify(State(state): State<SharedState>, headers: HeaderMap) -> ServiceResult<Json<Value>> {
    let db = state.db.lock();
    let user = auth::authenticate(&db, bearer_token(&headers))?;
    Ok(Json(json!({ "valid": true, "user": user })))
}
