//! Ledger error types for validation and state errors.

use chrono::NaiveDate;
use thiserror::Error;
use uuid::Uuid;

use super::types::TransactionType;

/// Errors that can occur during ledger operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    // ========== Validation Errors ==========
    /// Amount is zero or negative.
    #[error("Amount must be greater than zero")]
    NonPositiveAmount,

    /// Amount does not fit `NUMERIC(12, 2)`.
    #[error("Amount must have at most 10 integer digits and 2 decimal places")]
    AmountOutOfRange,

    /// Transaction dated after today.
    #[error("Transaction date {0} cannot be in the future")]
    FutureDate(NaiveDate),

    /// Category type differs from transaction type.
    #[error("Category type ({category}) must match transaction type ({transaction})")]
    CategoryTypeMismatch {
        /// Type of the referenced category.
        category: TransactionType,
        /// Type of the transaction.
        transaction: TransactionType,
    },

    /// Unknown type string.
    #[error("Invalid transaction type: {0}")]
    InvalidTransactionType(String),

    /// Category name shorter than two characters after trimming.
    #[error("Category name must be at least 2 characters")]
    InvalidCategoryName,

    /// Author is not a member of the transaction's group.
    #[error("You are not a member of this group")]
    NotGroupMember,

    /// Group viewers cannot write transactions.
    #[error("Viewers cannot record transactions in this group")]
    ReadOnlyMember,

    /// Only the author or a group admin may change a transaction.
    #[error("You cannot modify this transaction")]
    NotTransactionAuthor,

    // ========== State Errors ==========
    /// Category still referenced by transactions.
    #[error("Cannot delete category: {count} transaction(s) still use it")]
    CategoryInUse {
        /// Number of referencing transactions.
        count: u64,
    },

    /// Transaction not found.
    #[error("Transaction not found: {0}")]
    TransactionNotFound(Uuid),

    /// Category not found.
    #[error("Category not found: {0}")]
    CategoryNotFound(Uuid),

    /// Balance owner row not found.
    #[error("Balance owner not found: {0}")]
    OwnerNotFound(String),
}

impl LedgerError {
    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::NonPositiveAmount => "NON_POSITIVE_AMOUNT",
            Self::AmountOutOfRange => "AMOUNT_OUT_OF_RANGE",
            Self::FutureDate(_) => "FUTURE_DATE",
            Self::CategoryTypeMismatch { .. } => "CATEGORY_TYPE_MISMATCH",
            Self::InvalidTransactionType(_) => "INVALID_TRANSACTION_TYPE",
            Self::InvalidCategoryName => "INVALID_CATEGORY_NAME",
            Self::NotGroupMember => "NOT_GROUP_MEMBER",
            Self::ReadOnlyMember => "READ_ONLY_MEMBER",
            Self::NotTransactionAuthor => "NOT_TRANSACTION_AUTHOR",
            Self::CategoryInUse { .. } => "CATEGORY_IN_USE",
            Self::TransactionNotFound(_) => "TRANSACTION_NOT_FOUND",
            Self::CategoryNotFound(_) => "CATEGORY_NOT_FOUND",
            Self::OwnerNotFound(_) => "OWNER_NOT_FOUND",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn http_status_code(&self) -> u16 {
        match self {
            // 400 Bad Request - validation errors
            Self::NonPositiveAmount
            | Self::AmountOutOfRange
            | Self::FutureDate(_)
            | Self::CategoryTypeMismatch { .. }
            | Self::InvalidTransactionType(_)
            | Self::InvalidCategoryName
            | Self::CategoryInUse { .. } => 400,

            // 403 Forbidden - permission errors
            Self::NotGroupMember | Self::ReadOnlyMember | Self::NotTransactionAuthor => 403,

            // 404 Not Found
            Self::TransactionNotFound(_) | Self::CategoryNotFound(_) | Self::OwnerNotFound(_) => {
                404
            }
        }
    }
}
