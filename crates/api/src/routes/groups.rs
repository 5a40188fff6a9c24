//! Group, membership and group statistics routes.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use efinance_core::membership::MemberRole;
use efinance_core::stats::{by_category, member_contributions, recent_window, summarize};
use efinance_db::{
    AddMemberInput, GroupRepository, MemberRepository, StatsRepository, TransactionFilter,
    TransactionRepository, UpdateGroupInput, UpdateMemberInput, Visibility,
    entities::{groups, members, users},
};
use efinance_shared::types::{PageRequest, PageResponse};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use super::transactions::TransactionQuery;
use super::{require_group_admin, require_group_member, today};
use crate::{AppState, error::ApiError, middleware::AuthUser};

/// Creates the groups router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/groups", get(list_groups).post(create_group))
        .route(
            "/groups/{group_id}",
            get(get_group).patch(update_group).delete(delete_group),
        )
        .route("/groups/{group_id}/join", post(join_group))
        .route("/groups/{group_id}/leave", post(leave_group))
        .route("/groups/{group_id}/summary", get(group_summary))
        .route("/groups/{group_id}/activity", get(group_activity))
        .route("/groups/{group_id}/transactions", get(group_transactions))
        .route(
            "/groups/{group_id}/members",
            get(list_members).post(add_member),
        )
        .route(
            "/groups/{group_id}/members/{user_id}",
            axum::routing::patch(update_member).delete(remove_member),
        )
        .route(
            "/groups/{group_id}/members/{user_id}/activity",
            get(member_activity),
        )
        .route("/groups/{group_id}/contributions", get(contributions))
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request body for creating a group.
#[derive(Debug, Deserialize)]
pub struct CreateGroupRequest {
    /// Group name (at least 3 characters).
    pub name: String,
    /// Optional description.
    pub description: Option<String>,
}

/// Request body for updating a group.
#[derive(Debug, Deserialize)]
pub struct UpdateGroupRequest {
    /// New name.
    pub name: Option<String>,
    /// New description; `null` clears it.
    #[serde(default, with = "::serde_with::rust::double_option")]
    pub description: Option<Option<String>>,
}

/// Request body for adding a member.
#[derive(Debug, Deserialize)]
pub struct AddMemberRequest {
    /// User to add.
    pub user_id: Uuid,
    /// `admin`, `member` or `viewer` (default `member`).
    pub role: Option<String>,
    /// Optional note about the member.
    pub description: Option<String>,
    /// Informational contribution amount.
    #[serde(default)]
    pub personal_contribution_amount: Decimal,
}

/// Request body for updating a member.
#[derive(Debug, Deserialize)]
pub struct UpdateMemberRequest {
    /// New role.
    pub role: Option<String>,
    /// New note; `null` clears it.
    #[serde(default, with = "::serde_with::rust::double_option")]
    pub description: Option<Option<String>>,
    /// New contribution amount.
    pub personal_contribution_amount: Option<Decimal>,
}

/// A group together with the caller's role in it.
#[derive(Debug, Serialize)]
pub struct GroupResponse {
    /// Group row.
    #[serde(flatten)]
    pub group: groups::Model,
    /// Caller's role; absent for superusers outside the group.
    pub my_role: Option<MemberRole>,
}

/// Public fields of a member's user account.
#[derive(Debug, Serialize)]
pub struct MemberUser {
    /// User id.
    pub id: Uuid,
    /// Email.
    pub email: String,
    /// First name.
    pub first_name: String,
    /// Last name.
    pub last_name: String,
}

/// A membership row with its user.
#[derive(Debug, Serialize)]
pub struct MemberResponse {
    /// Membership row.
    #[serde(flatten)]
    pub member: members::Model,
    /// The member's account.
    pub user: MemberUser,
}

impl From<(members::Model, users::Model)> for MemberResponse {
    fn from((member, user): (members::Model, users::Model)) -> Self {
        Self {
            member,
            user: MemberUser {
                id: user.id,
                email: user.email,
                first_name: user.first_name,
                last_name: user.last_name,
            },
        }
    }
}

fn parse_role(role: Option<&str>) -> Result<Option<MemberRole>, ApiError> {
    Ok(role.map(str::parse::<MemberRole>).transpose()?)
}

fn group_filter(group_id: Uuid, query: &TransactionQuery) -> Result<TransactionFilter, ApiError> {
    let mut filter = query.filter()?;
    filter.group_id = Some(group_id);
    filter.scope = None;
    Ok(filter)
}

// ============================================================================
// Group handlers
// ============================================================================

/// POST /groups - Create a group; the caller becomes its admin.
async fn create_group(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<CreateGroupRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let (group, admin) = GroupRepository::new((*state.db).clone())
        .create_with_admin(auth.user_id(), &payload.name, payload.description)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(GroupResponse {
            group,
            my_role: Some(admin.role.into()),
        }),
    ))
}

/// GET /groups - Groups the caller belongs to.
async fn list_groups(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<impl IntoResponse, ApiError> {
    let groups: Vec<GroupResponse> = GroupRepository::new((*state.db).clone())
        .list_for_user(auth.user_id())
        .await?
        .into_iter()
        .map(|(group, role)| GroupResponse {
            group,
            my_role: Some(role),
        })
        .collect();
    Ok(Json(groups))
}

/// GET `/groups/{group_id}`.
async fn get_group(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(group_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let (group, my_role) = require_group_member(&state, &auth, group_id).await?;
    Ok(Json(GroupResponse { group, my_role }))
}

/// PATCH `/groups/{group_id}` - Rename or describe (admins).
async fn update_group(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(group_id): Path<Uuid>,
    Json(payload): Json<UpdateGroupRequest>,
) -> Result<impl IntoResponse, ApiError> {
    require_group_admin(&state, &auth, group_id).await?;

    let group = GroupRepository::new((*state.db).clone())
        .update(
            group_id,
            UpdateGroupInput {
                name: payload.name,
                description: payload.description,
            },
        )
        .await?;
    Ok(Json(group))
}

/// DELETE `/groups/{group_id}` - Remove the group with its transactions (admins).
async fn delete_group(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(group_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    require_group_admin(&state, &auth, group_id).await?;
    GroupRepository::new((*state.db).clone())
        .delete(group_id)
        .await?;
    info!(group_id = %group_id, deleted_by = %auth.user_id(), "Group deleted via API");
    Ok(StatusCode::NO_CONTENT)
}

/// POST `/groups/{group_id}/join` - Join as a regular member.
async fn join_group(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(group_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let member = MemberRepository::new((*state.db).clone())
        .join(group_id, auth.user_id())
        .await?;
    Ok((StatusCode::CREATED, Json(member)))
}

/// POST `/groups/{group_id}/leave`.
async fn leave_group(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(group_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    MemberRepository::new((*state.db).clone())
        .leave(group_id, auth.user_id())
        .await?;
    Ok(Json(json!({ "message": "You left the group" })))
}

// ============================================================================
// Statistics handlers
// ============================================================================

/// GET `/groups/{group_id}/summary` - Balance, totals and category split.
async fn group_summary(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(group_id): Path<Uuid>,
    Query(query): Query<TransactionQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let (group, _) = require_group_member(&state, &auth, group_id).await?;
    let period = query.period()?;

    let facts = StatsRepository::new((*state.db).clone())
        .facts(Visibility::All, &group_filter(group_id, &query)?)
        .await?;
    let members_count = MemberRepository::new((*state.db).clone())
        .list(group_id)
        .await?
        .len();

    Ok(Json(json!({
        "group_id": group.id,
        "name": group.name,
        "balance": group.balance,
        "members_count": members_count,
        "stats": summarize(&facts, &period),
        "by_category": by_category(&facts),
    })))
}

/// Days covered by the group activity feed.
const ACTIVITY_DAYS: u32 = 30;
/// Transactions shown in the activity feed.
const ACTIVITY_TRANSACTIONS: u32 = 20;
/// New members shown in the activity feed.
const ACTIVITY_MEMBERS: usize = 10;

/// GET `/groups/{group_id}/activity` - The last 30 days: newest transactions,
/// members who joined, and totals.
async fn group_activity(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(group_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let (group, _) = require_group_member(&state, &auth, group_id).await?;
    let window = recent_window(today(), ACTIVITY_DAYS)?;
    let filter = TransactionFilter {
        group_id: Some(group_id),
        date_from: window.start,
        date_to: window.end,
        ..Default::default()
    };

    let facts = StatsRepository::new((*state.db).clone())
        .facts(Visibility::All, &filter)
        .await?;
    let (recent, _) = TransactionRepository::new((*state.db).clone())
        .list(
            Visibility::All,
            &filter,
            PageRequest {
                page: 1,
                per_page: ACTIVITY_TRANSACTIONS,
            },
        )
        .await?;

    let members = MemberRepository::new((*state.db).clone())
        .list(group_id)
        .await?;
    let member_count = members.len();
    let mut joined: Vec<_> = members
        .into_iter()
        .filter(|(member, _)| window.contains(member.joined_at.date_naive()))
        .collect();
    joined.sort_by(|a, b| b.0.joined_at.cmp(&a.0.joined_at));
    let new_member_count = joined.len();
    let recent_members: Vec<MemberResponse> = joined
        .into_iter()
        .take(ACTIVITY_MEMBERS)
        .map(MemberResponse::from)
        .collect();

    Ok(Json(json!({
        "group_id": group.id,
        "recent_transactions": recent,
        "recent_members": recent_members,
        "group_stats": {
            "balance": group.balance,
            "member_count": member_count,
            "new_member_count": new_member_count,
            "stats": summarize(&facts, &window),
        },
    })))
}

/// GET `/groups/{group_id}/transactions`.
async fn group_transactions(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(group_id): Path<Uuid>,
    Query(query): Query<TransactionQuery>,
) -> Result<impl IntoResponse, ApiError> {
    require_group_member(&state, &auth, group_id).await?;
    let page = query.page();

    let (rows, total) = TransactionRepository::new((*state.db).clone())
        .list(Visibility::All, &group_filter(group_id, &query)?, page)
        .await?;
    Ok(Json(PageResponse::new(rows, page, total)))
}

/// GET `/groups/{group_id}/contributions` - Per-member income and expenses.
async fn contributions(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(group_id): Path<Uuid>,
    Query(query): Query<TransactionQuery>,
) -> Result<impl IntoResponse, ApiError> {
    require_group_member(&state, &auth, group_id).await?;

    let facts = StatsRepository::new((*state.db).clone())
        .facts(Visibility::All, &group_filter(group_id, &query)?)
        .await?;
    Ok(Json(member_contributions(&facts)))
}

// ============================================================================
// Member handlers
// ============================================================================

/// GET `/groups/{group_id}/members`.
async fn list_members(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(group_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    require_group_member(&state, &auth, group_id).await?;

    let members: Vec<MemberResponse> = MemberRepository::new((*state.db).clone())
        .list(group_id)
        .await?
        .into_iter()
        .map(MemberResponse::from)
        .collect();
    Ok(Json(members))
}

/// POST `/groups/{group_id}/members` - Add a user (admins).
async fn add_member(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(group_id): Path<Uuid>,
    Json(payload): Json<AddMemberRequest>,
) -> Result<impl IntoResponse, ApiError> {
    require_group_admin(&state, &auth, group_id).await?;
    let role = parse_role(payload.role.as_deref())?.unwrap_or_default();

    let member = MemberRepository::new((*state.db).clone())
        .add(
            group_id,
            AddMemberInput {
                user_id: payload.user_id,
                role,
                description: payload.description,
                personal_contribution_amount: payload.personal_contribution_amount,
            },
        )
        .await?;
    Ok((StatusCode::CREATED, Json(member)))
}

/// PATCH `/groups/{group_id}/members/{user_id}` - Change role or note (admins).
async fn update_member(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((group_id, user_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<UpdateMemberRequest>,
) -> Result<impl IntoResponse, ApiError> {
    require_group_admin(&state, &auth, group_id).await?;

    let member = MemberRepository::new((*state.db).clone())
        .update(
            group_id,
            user_id,
            UpdateMemberInput {
                role: parse_role(payload.role.as_deref())?,
                description: payload.description,
                personal_contribution_amount: payload.personal_contribution_amount,
            },
        )
        .await?;
    Ok(Json(member))
}

/// DELETE `/groups/{group_id}/members/{user_id}` - Remove a member (admins).
async fn remove_member(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((group_id, user_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, ApiError> {
    require_group_admin(&state, &auth, group_id).await?;
    MemberRepository::new((*state.db).clone())
        .remove(group_id, user_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET `/groups/{group_id}/members/{user_id}/activity` - One member's group totals.
async fn member_activity(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((group_id, user_id)): Path<(Uuid, Uuid)>,
    Query(query): Query<TransactionQuery>,
) -> Result<impl IntoResponse, ApiError> {
    require_group_member(&state, &auth, group_id).await?;
    let member = MemberRepository::new((*state.db).clone())
        .find(group_id, user_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Member not found"))?;

    let period = query.period()?;
    let mut filter = group_filter(group_id, &query)?;
    filter.user_id = Some(user_id);
    let facts = StatsRepository::new((*state.db).clone())
        .facts(Visibility::All, &filter)
        .await?;

    Ok(Json(json!({
        "user_id": user_id,
        "role": MemberRole::from(member.role),
        "stats": summarize(&facts, &period),
        "by_category": by_category(&facts),
    })))
}
