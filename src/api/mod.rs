//! REST surface under `/api`.
//!
//! Handlers are thin: extract, check the permission, lock the store, call
//! the service. Errors render through [`crate::services::ServiceError`]'s
//! `IntoResponse` impl.

mod amc;
mod auth;
mod blogs;
mod dashboard;
pub mod error;
pub mod extract;
mod leads;
mod notifications;
mod projects;
mod quotations;
mod submissions;
mod users;

use std::sync::Arc;

use axum::extract::{DefaultBodyLimit, Request};
use axum::http::{header, HeaderValue, Method, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};

use crate::state::AppState;

pub type SharedState = Arc<AppState>;

/// Meeting notes and contact reports can be large.
const BODY_LIMIT: usize = 50 * 1024 * 1024;

/// The complete application router.
pub fn router(state: SharedState) -> Router {
    let api = Router::new()
        .route("/health", get(health))
        .nest("/auth", auth::routes())
        .nest("/leads", leads::routes())
        .nest("/quotations", quotations::routes())
        .nest("/projects", projects::routes())
        .nest("/amc", amc::routes())
        .nest("/users", users::routes())
        .nest("/notifications", notifications::routes())
        .nest("/contact", submissions::contact_routes())
        .nest("/demo", submissions::demo_routes())
        .nest("/admin", submissions::admin_routes())
        .nest("/dashboard", dashboard::routes())
        .nest("/blogs", blogs::routes());

    Router::new()
        .nest("/api", api)
        .fallback(not_found)
        .layer(DefaultBodyLimit::max(BODY_LIMIT))
        .layer(middleware::from_fn(cors))
        .with_state(state)
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok", "message": "KAS CRM Backend API is running" }))
}

async fn not_found() -> (StatusCode, Json<Value>) {
    (StatusCode::NOT_FOUND, Json(json!({ "error": "Route not found" })))
}

/// CORS for the browser frontend: any origin is echoed back with
/// credentials allowed. Preflight requests are answered here without
/// reaching a route.
async fn cors(request: Request, next: Next) -> Response {
    let origin = request.headers().get(header::ORIGIN).cloned();
    let mut response = if request.method() == Method::OPTIONS {
        StatusCode::NO_CONTENT.into_response()
    } else {
        next.run(request).await
    };
    let headers = response.headers_mut();
    if let Some(origin) = origin {
        headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, origin);
        headers.insert(
            header::ACCESS_CONTROL_ALLOW_CREDENTIALS,
            HeaderValue::from_static("true"),
        );
        headers.insert(header::VARY, HeaderValue::from_static("Origin"));
    }
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("GET, POST, PUT, PATCH, DELETE, OPTIONS"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static("Content-Type, Authorization, X-Requested-With"),
    );
    response
}
