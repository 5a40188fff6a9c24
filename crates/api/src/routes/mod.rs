//! API route definitions.

use axum::{Router, middleware};
use chrono::{NaiveDate, Utc};
use efinance_core::membership::MemberRole;
use efinance_db::{GroupRepository, MemberRepository, entities::groups as group_entity};
use uuid::Uuid;

use crate::{
    AppState,
    error::ApiError,
    middleware::{AuthUser, auth_middleware},
};

pub mod admin;
pub mod auth;
pub mod categories;
pub mod groups;
pub mod health;
pub mod transactions;
pub mod users;

/// Creates the API router with public and protected routes.
#[allow(clippy::needless_pass_by_value)]
pub fn api_routes_with_state(state: AppState) -> Router<AppState> {
    let protected_routes = Router::new()
        .merge(auth::protected_routes())
        .merge(users::routes())
        .merge(groups::routes())
        .merge(categories::routes())
        .merge(transactions::routes())
        .merge(admin::routes())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .merge(health::routes())
        .merge(auth::routes())
        .merge(protected_routes)
}

/// Server-local calendar date used for the future-date rule.
pub(crate) fn today() -> NaiveDate {
    Utc::now().date_naive()
}

/// Loads a group the caller may read.
///
/// Members of any role pass; superusers pass without a membership, in which
/// case the returned role is `None`.
pub(crate) async fn require_group_member(
    state: &AppState,
    auth: &AuthUser,
    group_id: Uuid,
) -> Result<(group_entity::Model, Option<MemberRole>), ApiError> {
    let group = GroupRepository::new((*state.db).clone())
        .find_by_id(group_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Group not found"))?;

    let role = MemberRepository::new((*state.db).clone())
        .role_of(group_id, auth.user_id())
        .await?;

    if role.is_none() && !auth.is_superuser() {
        return Err(ApiError::forbidden("You are not a member of this group"));
    }
    Ok((group, role))
}

/// Loads a group the caller may manage (group admin or superuser).
pub(crate) async fn require_group_admin(
    state: &AppState,
    auth: &AuthUser,
    group_id: Uuid,
) -> Result<group_entity::Model, ApiError> {
    let (group, role) = require_group_member(state, auth, group_id).await?;
    let is_admin = role.is_some_and(MemberRole::can_manage_members);
    if !is_admin && !auth.is_superuser() {
        return Err(ApiError::forbidden("Only group admins can perform this action"));
    }
    Ok(group)
}

/// Rejects access to another user's data unless the caller is a superuser.
pub(crate) fn require_self_or_superuser(auth: &AuthUser, user_id: Uuid) -> Result<(), ApiError> {
    if auth.user_id() == user_id || auth.is_superuser() {
        Ok(())
    } else {
        Err(ApiError::forbidden("You do not have access to this user"))
    }
}
