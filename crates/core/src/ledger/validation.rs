//! Business rule validation for transaction and category writes.
//!
//! Validation runs before any balance is adjusted, so a rejected write never
//! leaves a partial effect.

use chrono::NaiveDate;
use efinance_shared::types::UserId;
use efinance_shared::types::money::fits_money_column;
use rust_decimal::Decimal;

use super::error::LedgerError;
use super::types::TransactionDraft;
use crate::membership::MemberRole;

/// Minimum category name length after trimming.
pub const MIN_CATEGORY_NAME_LEN: usize = 2;

/// Validates a proposed transaction against `today`.
///
/// # Errors
///
/// Returns the first rule violated: non-positive amount, amount out of
/// column range, future date, or category/transaction type mismatch.
pub fn validate_transaction(draft: &TransactionDraft, today: NaiveDate) -> Result<(), LedgerError> {
    validate_amount(draft.amount)?;

    if draft.date > today {
        return Err(LedgerError::FutureDate(draft.date));
    }

    if draft.category_type != draft.kind {
        return Err(LedgerError::CategoryTypeMismatch {
            category: draft.category_type,
            transaction: draft.kind,
        });
    }

    Ok(())
}

/// Validates a transaction amount.
///
/// # Errors
///
/// Returns `NonPositiveAmount` or `AmountOutOfRange`.
pub fn validate_amount(amount: Decimal) -> Result<(), LedgerError> {
    if amount <= Decimal::ZERO {
        return Err(LedgerError::NonPositiveAmount);
    }
    if !fits_money_column(amount) {
        return Err(LedgerError::AmountOutOfRange);
    }
    Ok(())
}

/// Where a transaction being changed lives, as seen by the acting user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Standing {
    /// Personal transaction.
    Personal,
    /// Group transaction, with the actor's current role there (`None` if not a member).
    Group(Option<MemberRole>),
}

/// Decides whether `actor` may update or delete a transaction written by `author`.
///
/// Personal transactions belong to their author alone. In a group the actor
/// must be a current member: admins may change any transaction, members only
/// their own, viewers none.
///
/// # Errors
///
/// Returns `NotGroupMember`, `ReadOnlyMember` or `NotTransactionAuthor`.
pub fn check_modify(actor: UserId, author: UserId, standing: Standing) -> Result<(), LedgerError> {
    match standing {
        Standing::Personal if actor == author => Ok(()),
        Standing::Personal => Err(LedgerError::NotTransactionAuthor),
        Standing::Group(None) => Err(LedgerError::NotGroupMember),
        Standing::Group(Some(role)) if role.can_manage_members() => Ok(()),
        Standing::Group(Some(role)) if !role.can_write_transactions() => {
            Err(LedgerError::ReadOnlyMember)
        }
        Standing::Group(Some(_)) if actor == author => Ok(()),
        Standing::Group(Some(_)) => Err(LedgerError::NotTransactionAuthor),
    }
}

/// Trims and validates a category name.
///
/// # Errors
///
/// Returns `InvalidCategoryName` if fewer than two characters remain.
pub fn normalize_category_name(name: &str) -> Result<String, LedgerError> {
    let trimmed = name.trim();
    if trimmed.chars().count() < MIN_CATEGORY_NAME_LEN {
        return Err(LedgerError::InvalidCategoryName);
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::types::TransactionType;
    use rust_decimal_macros::dec;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 30).unwrap()
    }

    fn draft(amount: Decimal, date: NaiveDate) -> TransactionDraft {
        TransactionDraft {
            amount,
            kind: TransactionType::Expense,
            date,
            category_type: TransactionType::Expense,
        }
    }

    #[test]
    fn test_valid_transaction() {
        assert!(validate_transaction(&draft(dec!(25.50), today()), today()).is_ok());
    }

    #[test]
    fn test_zero_and_negative_amounts_rejected() {
        assert!(matches!(
            validate_transaction(&draft(Decimal::ZERO, today()), today()),
            Err(LedgerError::NonPositiveAmount)
        ));
        assert!(matches!(
            validate_transaction(&draft(dec!(-5), today()), today()),
            Err(LedgerError::NonPositiveAmount)
        ));
    }

    #[test]
    fn test_excess_precision_rejected() {
        assert!(matches!(
            validate_amount(dec!(1.001)),
            Err(LedgerError::AmountOutOfRange)
        ));
    }

    #[test]
    fn test_future_date_rejected() {
        let tomorrow = today().succ_opt().unwrap();
        assert!(matches!(
            validate_transaction(&draft(dec!(1), tomorrow), today()),
            Err(LedgerError::FutureDate(d)) if d == tomorrow
        ));
    }

    #[test]
    fn test_category_type_mismatch_rejected() {
        let mut d = draft(dec!(10), today());
        d.kind = TransactionType::Income;
        assert!(matches!(
            validate_transaction(&d, today()),
            Err(LedgerError::CategoryTypeMismatch { .. })
        ));
    }

    #[test]
    fn test_modify_permissions() {
        let author = UserId::new();
        let other = UserId::new();

        assert!(check_modify(author, author, Standing::Personal).is_ok());
        assert!(matches!(
            check_modify(other, author, Standing::Personal),
            Err(LedgerError::NotTransactionAuthor)
        ));

        let admin = Standing::Group(Some(MemberRole::Admin));
        let member = Standing::Group(Some(MemberRole::Member));
        let viewer = Standing::Group(Some(MemberRole::Viewer));
        assert!(check_modify(other, author, admin).is_ok());
        assert!(check_modify(author, author, member).is_ok());
        assert!(matches!(
            check_modify(other, author, member),
            Err(LedgerError::NotTransactionAuthor)
        ));
        assert!(matches!(
            check_modify(author, author, viewer),
            Err(LedgerError::ReadOnlyMember)
        ));
        assert!(matches!(
            check_modify(author, author, Standing::Group(None)),
            Err(LedgerError::NotGroupMember)
        ));
    }

    #[test]
    fn test_category_name_is_trimmed() {
        assert_eq!(normalize_category_name("  Food ").unwrap(), "Food");
        assert!(normalize_category_name(" a ").is_err());
    }
}
