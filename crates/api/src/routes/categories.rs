//! Category routes.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use efinance_core::ledger::TransactionType;
use efinance_core::stats::{DEFAULT_MOST_USED, by_category, by_type, most_used};
use efinance_db::{
    CategoryFilter, CategoryRepository, CreateCategoryInput, MemberRepository, StatsRepository,
    TransactionFilter, TransactionRepository, UpdateCategoryInput, Visibility,
    entities::categories,
};
use efinance_shared::types::PageResponse;
use efinance_shared::types::pagination::MAX_PER_PAGE;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use super::require_group_member;
use super::transactions::TransactionQuery;
use crate::{AppState, error::ApiError, middleware::AuthUser};

/// Creates the categories router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/categories", get(list_categories).post(create_category))
        .route("/categories/stats", get(category_stats))
        .route("/categories/most_used", get(most_used_categories))
        .route("/categories/by_type", get(categories_by_type))
        .route(
            "/categories/{category_id}",
            get(get_category)
                .patch(update_category)
                .delete(delete_category),
        )
        .route(
            "/categories/{category_id}/transactions",
            get(category_transactions),
        )
}

/// Query parameters for listing categories.
#[derive(Debug, Default, Deserialize)]
pub struct ListCategoriesQuery {
    /// `income` or `expense`.
    #[serde(rename = "type")]
    pub kind: Option<String>,
    /// Only this group's categories.
    pub group_id: Option<Uuid>,
}

/// Query parameters for the most-used ranking.
#[derive(Debug, Default, Deserialize)]
pub struct MostUsedQuery {
    /// Number of categories returned (default 10).
    pub limit: Option<u32>,
    /// `income` or `expense`.
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

/// Request body for creating a category.
#[derive(Debug, Deserialize)]
pub struct CreateCategoryRequest {
    /// Display name (at least 2 characters).
    pub name: String,
    /// `income` or `expense`.
    #[serde(rename = "type")]
    pub kind: String,
    /// Owning group; personal when absent.
    pub group_id: Option<Uuid>,
}

/// Request body for updating a category.
#[derive(Debug, Deserialize)]
pub struct UpdateCategoryRequest {
    /// New name.
    pub name: Option<String>,
    /// New type; rejected while transactions use the category.
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

fn parse_kind(kind: Option<&str>) -> Result<Option<TransactionType>, ApiError> {
    Ok(kind.map(str::parse::<TransactionType>).transpose()?)
}

/// Loads a category the caller may read, or manage when `manage` is set.
///
/// Personal categories belong to their owner; group categories are readable
/// by members and managed by group admins.
async fn load_category(
    state: &AppState,
    auth: &AuthUser,
    category_id: Uuid,
    manage: bool,
) -> Result<categories::Model, ApiError> {
    let category = CategoryRepository::new((*state.db).clone())
        .find_by_id(category_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Category not found"))?;

    if auth.is_superuser() {
        return Ok(category);
    }

    let allowed = match category.group_id {
        Some(group_id) => MemberRepository::new((*state.db).clone())
            .role_of(group_id, auth.user_id())
            .await?
            .is_some_and(|role| !manage || role.can_manage_members()),
        None => category.user_id == auth.user_id(),
    };

    if allowed {
        Ok(category)
    } else {
        Err(ApiError::forbidden("You do not have access to this category"))
    }
}

/// GET /categories - Own personal categories and those of the caller's groups.
async fn list_categories(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<ListCategoriesQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let categories = CategoryRepository::new((*state.db).clone())
        .list_visible(
            auth.user_id(),
            &CategoryFilter {
                kind: parse_kind(query.kind.as_deref())?,
                group_id: query.group_id,
            },
        )
        .await?;
    Ok(Json(categories))
}

/// POST /categories.
///
/// Group categories can be created by members allowed to record transactions.
async fn create_category(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<CreateCategoryRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let kind: TransactionType = payload.kind.parse()?;

    if let Some(group_id) = payload.group_id {
        let (_, role) = require_group_member(&state, &auth, group_id).await?;
        let can_write = role.is_some_and(|r| r.can_write_transactions());
        if !can_write && !auth.is_superuser() {
            return Err(ApiError::forbidden(
                "Viewers cannot create categories in this group",
            ));
        }
    }

    let category = CategoryRepository::new((*state.db).clone())
        .create(CreateCategoryInput {
            name: payload.name,
            kind,
            user_id: auth.user_id(),
            group_id: payload.group_id,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(category)))
}

/// GET /categories/stats - Totals per category over the caller's transactions.
async fn category_stats(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<TransactionQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let facts = StatsRepository::new((*state.db).clone())
        .facts(Visibility::User(auth.user_id()), &query.filter()?)
        .await?;
    Ok(Json(by_category(&facts)))
}

/// GET `/categories/most_used` - The caller's categories ranked by use.
async fn most_used_categories(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<MostUsedQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let filter = TransactionFilter {
        kind: parse_kind(query.kind.as_deref())?,
        ..Default::default()
    };
    let limit = query
        .limit
        .map_or(DEFAULT_MOST_USED, |l| l.clamp(1, MAX_PER_PAGE) as usize);

    let facts = StatsRepository::new((*state.db).clone())
        .facts(Visibility::User(auth.user_id()), &filter)
        .await?;
    Ok(Json(most_used(&facts, limit)))
}

/// GET `/categories/by_type` - Income and expense category totals.
async fn categories_by_type(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<TransactionQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let facts = StatsRepository::new((*state.db).clone())
        .facts(Visibility::User(auth.user_id()), &query.filter()?)
        .await?;
    Ok(Json(by_type(&facts)))
}

/// GET `/categories/{category_id}` - The category and how many transactions use it.
async fn get_category(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(category_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let category = load_category(&state, &auth, category_id, false).await?;
    let transaction_count = CategoryRepository::new((*state.db).clone())
        .transaction_count(category_id)
        .await?;

    Ok(Json(json!({
        "category": category,
        "transaction_count": transaction_count,
    })))
}

/// PATCH `/categories/{category_id}`.
async fn update_category(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(category_id): Path<Uuid>,
    Json(payload): Json<UpdateCategoryRequest>,
) -> Result<impl IntoResponse, ApiError> {
    load_category(&state, &auth, category_id, true).await?;

    let category = CategoryRepository::new((*state.db).clone())
        .update(
            category_id,
            UpdateCategoryInput {
                name: payload.name,
                kind: parse_kind(payload.kind.as_deref())?,
            },
        )
        .await?;
    Ok(Json(category))
}

/// DELETE `/categories/{category_id}` - Rejected while transactions use it.
async fn delete_category(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(category_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    load_category(&state, &auth, category_id, true).await?;
    CategoryRepository::new((*state.db).clone())
        .delete(category_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET `/categories/{category_id}/transactions`.
async fn category_transactions(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(category_id): Path<Uuid>,
    Query(query): Query<TransactionQuery>,
) -> Result<impl IntoResponse, ApiError> {
    load_category(&state, &auth, category_id, false).await?;

    let mut filter = query.filter()?;
    filter.category_id = Some(category_id);
    let page = query.page();

    let (rows, total) = TransactionRepository::new((*state.db).clone())
        .list(Visibility::All, &filter, page)
        .await?;
    Ok(Json(PageResponse::new(rows, page, total)))
}
