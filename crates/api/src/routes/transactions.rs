//! Transaction routes and statistics.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use chrono::{Datelike, NaiveDate};
use efinance_core::ledger::TransactionType;
use efinance_core::stats::{
    DEFAULT_RECENT_DAYS, Period, by_category, monthly_summary, recent_window, summarize,
};
use efinance_db::{
    Actor, CreateTransactionInput, StatsRepository, TransactionFilter, TransactionRepository,
    TransactionScope, UpdateTransactionInput, Visibility, entities::transactions,
};
use efinance_shared::types::{PageRequest, PageResponse};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use super::today;
use crate::{AppState, error::ApiError, middleware::AuthUser};

/// Creates the transactions router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/transactions",
            get(list_transactions).post(create_transaction),
        )
        .route("/transactions/stats", get(transaction_stats))
        .route("/transactions/by-category", get(transactions_by_category))
        .route("/transactions/monthly-summary", get(monthly))
        .route("/transactions/recent", get(recent))
        .route(
            "/transactions/{transaction_id}",
            get(get_transaction)
                .patch(update_transaction)
                .delete(delete_transaction),
        )
}

// ============================================================================
// Request Types
// ============================================================================

/// Filters shared by every transaction listing.
#[derive(Debug, Default, Deserialize)]
pub struct TransactionQuery {
    /// `income` or `expense`.
    #[serde(rename = "type")]
    pub kind: Option<String>,
    /// Only this group's transactions.
    pub group_id: Option<Uuid>,
    /// Only this category's transactions.
    pub category_id: Option<Uuid>,
    /// `personal` or `group`.
    pub scope: Option<TransactionScope>,
    /// Earliest date included (YYYY-MM-DD).
    pub from: Option<NaiveDate>,
    /// Latest date included (YYYY-MM-DD).
    pub to: Option<NaiveDate>,
    /// Substring of the description.
    pub search: Option<String>,
    /// Page number (1-indexed).
    pub page: Option<u32>,
    /// Page size.
    pub per_page: Option<u32>,
}

impl TransactionQuery {
    /// The date range, rejecting inverted bounds.
    pub(crate) fn period(&self) -> Result<Period, ApiError> {
        Ok(Period::new(self.from, self.to)?)
    }

    /// Builds the repository filter.
    pub(crate) fn filter(&self) -> Result<TransactionFilter, ApiError> {
        let period = self.period()?;
        let kind = self
            .kind
            .as_deref()
            .map(str::parse::<TransactionType>)
            .transpose()?;

        Ok(TransactionFilter {
            kind,
            group_id: self.group_id,
            category_id: self.category_id,
            user_id: None,
            scope: self.scope,
            date_from: period.start,
            date_to: period.end,
            search: self.search.clone(),
        })
    }

    /// Requested page, clamped to sane bounds.
    pub(crate) fn page(&self) -> PageRequest {
        let default = PageRequest::default();
        PageRequest {
            page: self.page.unwrap_or(default.page),
            per_page: self.per_page.unwrap_or(default.per_page),
        }
        .normalized()
    }
}

/// Request body for creating a transaction.
#[derive(Debug, Deserialize)]
pub struct CreateTransactionRequest {
    /// Positive amount.
    pub amount: Decimal,
    /// `income` or `expense`.
    #[serde(rename = "type")]
    pub kind: String,
    /// Defaults to today.
    pub date: Option<NaiveDate>,
    /// Free text.
    #[serde(default)]
    pub description: String,
    /// Attachment reference.
    pub proof: Option<String>,
    /// Category with the same type.
    pub category_id: Uuid,
    /// Group whose balance is affected.
    pub group_id: Option<Uuid>,
}

/// Request body for updating a transaction.
///
/// `proof` and `group_id` distinguish an absent field from an explicit `null`.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateTransactionRequest {
    /// New amount.
    pub amount: Option<Decimal>,
    /// New type.
    #[serde(rename = "type")]
    pub kind: Option<String>,
    /// New date.
    pub date: Option<NaiveDate>,
    /// New description.
    pub description: Option<String>,
    /// New attachment reference; `null` clears it.
    #[serde(default, with = "::serde_with::rust::double_option")]
    pub proof: Option<Option<String>>,
    /// New category.
    pub category_id: Option<Uuid>,
    /// New group; `null` moves the transaction to the personal balance.
    #[serde(default, with = "::serde_with::rust::double_option")]
    pub group_id: Option<Option<Uuid>>,
}

/// Month selector for the monthly summary; defaults to the current month.
#[derive(Debug, Default, Deserialize)]
pub struct MonthQuery {
    /// Year.
    pub year: Option<i32>,
    /// Month (1-12).
    pub month: Option<u32>,
}

/// Window for recent transactions.
#[derive(Debug, Default, Deserialize)]
pub struct RecentQuery {
    /// Days back from today (default 7).
    pub days: Option<u32>,
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /transactions - Own and group transactions, newest first.
async fn list_transactions(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<TransactionQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let filter = query.filter()?;
    let page = query.page();

    let (rows, total) = TransactionRepository::new((*state.db).clone())
        .list(Visibility::User(auth.user_id()), &filter, page)
        .await?;
    Ok(Json(PageResponse::new(rows, page, total)))
}

/// POST /transactions - Record a transaction for the caller.
async fn create_transaction(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<CreateTransactionRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let kind: TransactionType = payload.kind.parse()?;
    let today = today();

    let transaction = TransactionRepository::new((*state.db).clone())
        .create(
            CreateTransactionInput {
                amount: payload.amount,
                kind,
                date: payload.date.unwrap_or(today),
                description: payload.description,
                proof: payload.proof,
                category_id: payload.category_id,
                user_id: auth.user_id(),
                group_id: payload.group_id,
            },
            today,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(transaction)))
}

/// Loads a transaction the caller may read.
async fn load_visible(
    state: &AppState,
    auth: &AuthUser,
    id: Uuid,
) -> Result<transactions::Model, ApiError> {
    let repo = TransactionRepository::new((*state.db).clone());
    let transaction = repo
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Transaction not found"))?;

    if auth.is_superuser() || repo.is_visible_to(&transaction, auth.user_id()).await? {
        Ok(transaction)
    } else {
        Err(ApiError::forbidden("You do not have access to this transaction"))
    }
}

/// The caller as the acting user of a transaction write.
fn actor(auth: &AuthUser) -> Actor {
    Actor {
        user_id: auth.user_id(),
        is_superuser: auth.is_superuser(),
    }
}

/// GET `/transactions/{transaction_id}`.
async fn get_transaction(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(transaction_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(load_visible(&state, &auth, transaction_id).await?))
}

/// PATCH `/transactions/{transaction_id}` - Partial update; balances follow.
async fn update_transaction(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(transaction_id): Path<Uuid>,
    Json(payload): Json<UpdateTransactionRequest>,
) -> Result<impl IntoResponse, ApiError> {
    load_visible(&state, &auth, transaction_id).await?;
    let kind = payload
        .kind
        .as_deref()
        .map(str::parse::<TransactionType>)
        .transpose()?;

    let transaction = TransactionRepository::new((*state.db).clone())
        .update(
            transaction_id,
            actor(&auth),
            UpdateTransactionInput {
                amount: payload.amount,
                kind,
                date: payload.date,
                description: payload.description,
                proof: payload.proof,
                category_id: payload.category_id,
                group_id: payload.group_id,
            },
            today(),
        )
        .await?;

    Ok(Json(transaction))
}

/// DELETE `/transactions/{transaction_id}` - Remove and reverse its effect.
async fn delete_transaction(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(transaction_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    load_visible(&state, &auth, transaction_id).await?;
    TransactionRepository::new((*state.db).clone())
        .delete(transaction_id, actor(&auth))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /transactions/stats - Totals over the filtered transactions.
async fn transaction_stats(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<TransactionQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let period = query.period()?;
    let facts = StatsRepository::new((*state.db).clone())
        .facts(Visibility::User(auth.user_id()), &query.filter()?)
        .await?;
    Ok(Json(summarize(&facts, &period)))
}

/// GET /transactions/by-category - Totals per category.
async fn transactions_by_category(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<TransactionQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let facts = StatsRepository::new((*state.db).clone())
        .facts(Visibility::User(auth.user_id()), &query.filter()?)
        .await?;
    Ok(Json(by_category(&facts)))
}

/// GET /transactions/monthly-summary - Totals and transactions of one month.
async fn monthly(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(month): Query<MonthQuery>,
    Query(query): Query<TransactionQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let today = today();
    let year = month.year.unwrap_or_else(|| today.year());
    let month = month.month.unwrap_or_else(|| today.month());
    let period = Period::month(year, month)?;

    let mut filter = query.filter()?;
    filter.date_from = period.start;
    filter.date_to = period.end;
    let visibility = Visibility::User(auth.user_id());

    let facts = StatsRepository::new((*state.db).clone())
        .facts(visibility, &filter)
        .await?;
    let summary = monthly_summary(&facts, year, month)?;
    let (transactions, _) = TransactionRepository::new((*state.db).clone())
        .list(visibility, &filter, query.page())
        .await?;

    Ok(Json(json!({
        "summary": summary,
        "transactions": transactions,
    })))
}

/// GET /transactions/recent - Transactions of the last `days` days.
async fn recent(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(window): Query<RecentQuery>,
    Query(query): Query<TransactionQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let period = recent_window(today(), window.days.unwrap_or(DEFAULT_RECENT_DAYS))?;

    let mut filter = query.filter()?;
    filter.date_from = period.start;
    filter.date_to = period.end;
    let page = query.page();

    let (rows, total) = TransactionRepository::new((*state.db).clone())
        .list(Visibility::User(auth.user_id()), &filter, page)
        .await?;
    Ok(Json(PageResponse::new(rows, page, total)))
}
