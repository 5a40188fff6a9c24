//! Loads transaction facts for the aggregation layer.

use chrono::{Datelike, NaiveDate};
use efinance_core::membership::MemberRole;
use efinance_core::stats::{MonthlySummary, StatsError, TransactionFact, monthly_summary};
use rust_decimal::Decimal;
use sea_orm::{DatabaseConnection, DbErr, EntityTrait, QueryOrder, QuerySelect};
use serde::Serialize;
use uuid::Uuid;

use super::group::GroupRepository;
use super::transaction::{TransactionFilter, TransactionScope, Visibility, fact_from, filtered};
use crate::entities::{categories, transactions, users};

/// Number of transactions shown on the dashboard.
pub const DASHBOARD_RECENT_LIMIT: u64 = 5;

/// Error types for statistics queries.
#[derive(Debug, thiserror::Error)]
pub enum StatsQueryError {
    /// Invalid aggregation parameters.
    #[error(transparent)]
    Stats(#[from] StatsError),

    /// User not found.
    #[error("User not found: {0}")]
    UserNotFound(Uuid),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// A group's balance as seen by one of its members.
#[derive(Debug, Clone, Serialize)]
pub struct GroupBalance {
    /// Group id.
    pub group_id: Uuid,
    /// Group name.
    pub name: String,
    /// Cached group balance.
    pub balance: Decimal,
    /// The member's role.
    pub my_role: MemberRole,
}

/// Landing-page overview for one user.
#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
    /// Cached personal balance.
    pub personal_balance: Decimal,
    /// Currency label.
    pub currency: String,
    /// Groups with their balances.
    pub groups: Vec<GroupBalance>,
    /// Personal totals for the current month.
    pub current_month: MonthlySummary,
    /// Latest visible transactions.
    pub recent_transactions: Vec<transactions::Model>,
}

/// Statistics repository.
#[derive(Debug, Clone)]
pub struct StatsRepository {
    db: DatabaseConnection,
}

impl StatsRepository {
    /// Creates a new statistics repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Loads the facts matching `filter`, oldest first, with category names.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn facts(
        &self,
        visibility: Visibility,
        filter: &TransactionFilter,
    ) -> Result<Vec<TransactionFact>, DbErr> {
        let rows = filtered(visibility, filter)
            .find_also_related(categories::Entity)
            .order_by_asc(transactions::Column::Date)
            .all(&self.db)
            .await?;

        Ok(rows
            .into_iter()
            .map(|(row, category)| {
                let name = category.map(|c| c.name).unwrap_or_default();
                fact_from(row, name)
            })
            .collect())
    }

    /// Builds the dashboard for `user_id` as of `today`.
    ///
    /// # Errors
    ///
    /// Returns `UserNotFound` or a database error.
    pub async fn dashboard(
        &self,
        user_id: Uuid,
        today: NaiveDate,
    ) -> Result<Dashboard, StatsQueryError> {
        let user = users::Entity::find_by_id(user_id)
            .one(&self.db)
            .await?
            .ok_or(StatsQueryError::UserNotFound(user_id))?;

        let groups = GroupRepository::new(self.db.clone())
            .list_for_user(user_id)
            .await?
            .into_iter()
            .map(|(group, role)| GroupBalance {
                group_id: group.id,
                name: group.name,
                balance: group.balance,
                my_role: role,
            })
            .collect();

        let personal = self
            .facts(
                Visibility::User(user_id),
                &TransactionFilter {
                    user_id: Some(user_id),
                    scope: Some(TransactionScope::Personal),
                    ..Default::default()
                },
            )
            .await?;
        let current_month = monthly_summary(&personal, today.year(), today.month())?;

        let recent_transactions = filtered(Visibility::User(user_id), &TransactionFilter::default())
            .order_by_desc(transactions::Column::Date)
            .order_by_desc(transactions::Column::CreatedAt)
            .limit(DASHBOARD_RECENT_LIMIT)
            .all(&self.db)
            .await?;

        Ok(Dashboard {
            personal_balance: user.balance,
            currency: user.currency,
            groups,
            current_month,
            recent_transactions,
        })
    }
}
