//! Request extractors: the authenticated user and JSON bodies that reject
//! with the API's error shape.

use std::sync::Arc;

use axum::async_trait;
use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, FromRequestParts, Request};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::http::HeaderMap;
use axum::Json;

use crate::permissions::{self, Permission};
use crate::services::{auth, ServiceError, ServiceResult};
use crate::state::AppState;
use crate::types::User;

/// Token from an `Authorization: Bearer <token>` header.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
}

/// The Active user behind the request's bearer token.
pub struct AuthUser(pub User);

impl AuthUser {
    /// Fail with 403 unless the user holds `permission`.
    pub fn require(&self, permission: Permission) -> ServiceResult<()> {
        auth::require(&self.0, permission)
    }

    /// Fail with 403 unless the user holds at least one of `required`.
    pub fn require_any(&self, required: &[Permission]) -> ServiceResult<()> {
        if permissions::has_any(self.0.role, &self.0.permissions, required) {
            return Ok(());
        }
        let names: Vec<&str> = required.iter().map(Permission::as_str).collect();
        Err(ServiceError::Forbidden(format!(
            "Insufficient permissions: one of {} required",
            names.join(", ")
        )))
    }
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for AuthUser {
    type Rejection = ServiceError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers);
        let db = state.db.lock();
        auth::authenticate(&db, token).map(AuthUser)
    }
}

/// `axum::Json` with malformed bodies reported as `{"error": ...}`.
pub struct JsonBody<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for JsonBody<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = ServiceError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(JsonBody(value)),
            Err(rejection) => Err(ServiceError::invalid_with(
                "Invalid request body",
                rejection.body_text(),
            )),
        }
    }
}
