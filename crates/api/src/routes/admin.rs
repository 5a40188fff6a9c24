//! Maintenance routes for superusers.

use axum::{Json, Router, extract::State, response::IntoResponse, routing::post};
use efinance_db::{SessionRepository, TransactionRepository};
use serde_json::json;
use tracing::info;

use crate::{AppState, error::ApiError, middleware::AuthUser};

/// Creates the admin router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/admin/reconcile", post(reconcile))
        .route("/admin/sessions/cleanup", post(cleanup_sessions))
}

fn require_superuser(auth: &AuthUser) -> Result<(), ApiError> {
    if auth.is_superuser() {
        Ok(())
    } else {
        Err(ApiError::forbidden("Superuser access required"))
    }
}

/// POST /admin/reconcile - Recompute every cached balance and repair drift.
async fn reconcile(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<impl IntoResponse, ApiError> {
    require_superuser(&auth)?;
    info!(requested_by = %auth.user_id(), "Reconciliation requested");

    let report = TransactionRepository::new((*state.db).clone())
        .reconcile()
        .await?;
    Ok(Json(report))
}

/// POST /admin/sessions/cleanup - Delete expired refresh sessions.
async fn cleanup_sessions(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<impl IntoResponse, ApiError> {
    require_superuser(&auth)?;

    let deleted = SessionRepository::new((*state.db).clone())
        .cleanup_expired()
        .await?;
    info!(deleted, "Expired sessions removed");
    Ok(Json(json!({ "deleted": deleted })))
}
