use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};

use super::extract::AuthUser;
use super::SharedState;
use crate::permissions::Permission;
use crate::services::dashboard::{self, DashboardStats};
use crate::services::ServiceResult;

pub fn routes() -> Router<SharedState> {
    Router::new().route("/stats", get(stats))
}

async fn stats(
    State(state): State<SharedState>,
    user: AuthUser,
) -> ServiceResult<Json<DashboardStats>> {
    user.require(Permission::DashboardView)?;
    let db = state.db.lock();
    Ok(Json(dashboard::stats(&db)?))
}
