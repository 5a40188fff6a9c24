//! Income/expense ledger logic.
//!
//! This module implements the balance-consistency rules:
//! - Transaction types and balance owner resolution
//! - Balance adjustment plans for create/update/delete
//! - Business rule validation run before any write
//! - Error types for ledger operations

pub mod balance;
pub mod error;
pub mod types;
pub mod validation;

#[cfg(test)]
mod balance_props;

pub use balance::{BalanceAdjustment, BalancePlan};
pub use error::LedgerError;
pub use types::{BalanceOwner, TransactionDraft, TransactionSnapshot, TransactionType};
pub use validation::{
    Standing, check_modify, normalize_category_name, validate_amount, validate_transaction,
};
