//! Domain types for income/expense transactions.

use chrono::NaiveDate;
use efinance_shared::types::{GroupId, UserId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::error::LedgerError;

/// Direction of a transaction. The stored amount is always positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    /// Money coming in.
    Income,
    /// Money going out.
    Expense,
}

impl TransactionType {
    /// Returns the lowercase wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::Expense => "expense",
        }
    }

    /// Signed effect of `amount` on the owner's balance.
    #[must_use]
    pub fn signed(self, amount: Decimal) -> Decimal {
        match self {
            Self::Income => amount,
            Self::Expense => -amount,
        }
    }
}

impl std::fmt::Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TransactionType {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "income" => Ok(Self::Income),
            "expense" => Ok(Self::Expense),
            other => Err(LedgerError::InvalidTransactionType(other.to_string())),
        }
    }
}

/// The single balance a transaction contributes to.
///
/// A transaction with a group affects that group's shared balance, otherwise
/// its author's personal balance. The derived ordering (personal balances
/// first, then groups, each by id) is the lock order for balance rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "lowercase")]
pub enum BalanceOwner {
    /// A user's personal balance.
    Personal(UserId),
    /// A group's shared balance.
    Group(GroupId),
}

impl BalanceOwner {
    /// Resolves the owner from a transaction's author and optional group.
    #[must_use]
    pub const fn resolve(author: UserId, group: Option<GroupId>) -> Self {
        match group {
            Some(group_id) => Self::Group(group_id),
            None => Self::Personal(author),
        }
    }
}

impl std::fmt::Display for BalanceOwner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Personal(id) => write!(f, "user:{id}"),
            Self::Group(id) => write!(f, "group:{id}"),
        }
    }
}

/// The balance-relevant part of a persisted or proposed transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransactionSnapshot {
    /// Whose balance the transaction affects.
    pub owner: BalanceOwner,
    /// Income or expense.
    pub kind: TransactionType,
    /// Positive amount.
    pub amount: Decimal,
}

impl TransactionSnapshot {
    /// Builds a snapshot, resolving the owner from author and group.
    #[must_use]
    pub const fn new(
        author: UserId,
        group: Option<GroupId>,
        kind: TransactionType,
        amount: Decimal,
    ) -> Self {
        Self {
            owner: BalanceOwner::resolve(author, group),
            kind,
            amount,
        }
    }

    /// Signed effect of this transaction on its owner's balance.
    #[must_use]
    pub fn delta(&self) -> Decimal {
        self.kind.signed(self.amount)
    }
}

/// Fields checked before any balance is touched.
#[derive(Debug, Clone)]
pub struct TransactionDraft {
    /// Proposed amount.
    pub amount: Decimal,
    /// Proposed type.
    pub kind: TransactionType,
    /// Proposed transaction date.
    pub date: NaiveDate,
    /// Type of the referenced category.
    pub category_type: TransactionType,
}
