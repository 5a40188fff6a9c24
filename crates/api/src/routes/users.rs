//! User listing routes.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    response::IntoResponse,
    routing::get,
};
use efinance_db::{UserFilter, UserRepository};
use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;

use super::require_self_or_superuser;
use crate::{AppState, error::ApiError, middleware::AuthUser};

/// Creates the users router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users))
        .route("/users/{user_id}", get(get_user))
}

/// Query parameters for listing users.
#[derive(Debug, Default, Deserialize)]
pub struct ListUsersQuery {
    /// Matches email, first or last name.
    pub search: Option<String>,
    /// Lowest personal balance included.
    pub min_balance: Option<Decimal>,
    /// Highest personal balance included.
    pub max_balance: Option<Decimal>,
    /// Active or disabled accounts only.
    pub is_active: Option<bool>,
}

/// GET /users - Superusers see everyone, others only themselves.
async fn list_users(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<ListUsersQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let user_repo = UserRepository::new((*state.db).clone());

    if !auth.is_superuser() {
        let me = user_repo
            .find_by_id(auth.user_id())
            .await?
            .ok_or_else(|| ApiError::not_found("User not found"))?;
        return Ok(Json(vec![me]));
    }

    let users = user_repo
        .list(&UserFilter {
            search: query.search,
            min_balance: query.min_balance,
            max_balance: query.max_balance,
            is_active: query.is_active,
        })
        .await?;
    Ok(Json(users))
}

/// GET `/users/{user_id}` - Self or superuser.
async fn get_user(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(user_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    require_self_or_superuser(&auth, user_id)?;

    let user = UserRepository::new((*state.db).clone())
        .find_by_id(user_id)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;
    Ok(Json(user))
}
