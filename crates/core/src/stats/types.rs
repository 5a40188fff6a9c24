//! Aggregation inputs and results.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use super::error::StatsError;
use crate::ledger::TransactionType;

/// One transaction as seen by the aggregation layer.
#[derive(Debug, Clone)]
pub struct TransactionFact {
    /// Transaction id.
    pub id: Uuid,
    /// Positive amount.
    pub amount: Decimal,
    /// Income or expense.
    pub kind: TransactionType,
    /// Transaction date.
    pub date: NaiveDate,
    /// Category id.
    pub category_id: Uuid,
    /// Category display name.
    pub category_name: String,
    /// Author.
    pub user_id: Uuid,
    /// Group, if the transaction is a group transaction.
    pub group_id: Option<Uuid>,
}

/// Inclusive date range. Missing bounds are open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Period {
    /// First day included.
    pub start: Option<NaiveDate>,
    /// Last day included.
    pub end: Option<NaiveDate>,
}

impl Period {
    /// Builds a period, rejecting inverted bounds.
    ///
    /// # Errors
    ///
    /// Returns `InvalidPeriod` when `start > end`.
    pub fn new(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Result<Self, StatsError> {
        if let (Some(s), Some(e)) = (start, end) {
            if s > e {
                return Err(StatsError::InvalidPeriod { start: s, end: e });
            }
        }
        Ok(Self { start, end })
    }

    /// The calendar month `year-month`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidMonth` for an out-of-range month.
    pub fn month(year: i32, month: u32) -> Result<Self, StatsError> {
        let invalid = || StatsError::InvalidMonth { year, month };
        let start = NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(invalid)?;
        let next = if month == 12 {
            NaiveDate::from_ymd_opt(year + 1, 1, 1)
        } else {
            NaiveDate::from_ymd_opt(year, month + 1, 1)
        }
        .ok_or_else(invalid)?;
        let end = next.pred_opt().ok_or_else(invalid)?;
        Ok(Self {
            start: Some(start),
            end: Some(end),
        })
    }

    /// Returns true if `date` falls inside the period.
    #[must_use]
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start.is_none_or(|s| date >= s) && self.end.is_none_or(|e| date <= e)
    }
}

/// Totals for a set of transactions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransactionStats {
    /// Sum of income amounts.
    pub total_income: Decimal,
    /// Sum of expense amounts.
    pub total_expenses: Decimal,
    /// Income minus expenses.
    pub balance: Decimal,
    /// Number of transactions.
    pub transaction_count: u64,
    /// Number of income transactions.
    pub income_count: u64,
    /// Number of expense transactions.
    pub expense_count: u64,
    /// Mean absolute amount, rounded to 2 dp.
    pub average_transaction: Decimal,
    /// Explicit start bound, or the earliest date seen.
    pub period_start: Option<NaiveDate>,
    /// Explicit end bound, or the latest date seen.
    pub period_end: Option<NaiveDate>,
}

/// Per-category totals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryBreakdown {
    /// Category id.
    pub category_id: Uuid,
    /// Category name.
    pub category_name: String,
    /// Category type.
    #[serde(rename = "type")]
    pub kind: TransactionType,
    /// Sum of amounts in the category.
    pub total_amount: Decimal,
    /// Number of transactions.
    pub transaction_count: u64,
    /// Share of the grand total, rounded to 2 dp.
    pub percentage: Decimal,
}

/// Category totals for one transaction type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TypeBucket {
    /// Sum of amounts of this type.
    pub total_amount: Decimal,
    /// Number of transactions of this type.
    pub transaction_count: u64,
    /// Number of categories used.
    pub category_count: usize,
    /// Per-category rows; percentages are shares of `total_amount`.
    pub categories: Vec<CategoryBreakdown>,
}

/// Income and expense category totals side by side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TypeBreakdown {
    /// Income categories.
    pub income: TypeBucket,
    /// Expense categories.
    pub expense: TypeBucket,
}

/// Totals for one calendar month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthlySummary {
    /// Year.
    pub year: i32,
    /// Month (1-12).
    pub month: u32,
    /// Sum of income amounts.
    pub total_income: Decimal,
    /// Sum of expense amounts.
    pub total_expenses: Decimal,
    /// Income minus expenses.
    pub balance: Decimal,
    /// Number of transactions.
    pub transaction_count: u64,
}

/// A member's activity inside one group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MemberContribution {
    /// Member's user id.
    pub user_id: Uuid,
    /// Number of group transactions authored.
    pub transaction_count: u64,
    /// Income the member recorded.
    pub total_income: Decimal,
    /// Expenses the member recorded.
    pub total_expenses: Decimal,
    /// Income minus expenses.
    pub net: Decimal,
    /// Share of the group's total income, rounded to 2 dp.
    pub income_share: Decimal,
}
