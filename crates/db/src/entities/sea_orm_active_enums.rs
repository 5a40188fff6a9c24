//! String-backed enums stored in the database.
//!
//! Stored as short strings rather than native enum types so the same schema
//! runs on PostgreSQL and SQLite.

use efinance_core::{ledger, membership};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Stored transaction/category type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    /// Money coming in.
    #[sea_orm(string_value = "income")]
    Income,
    /// Money going out.
    #[sea_orm(string_value = "expense")]
    Expense,
}

impl From<TransactionType> for ledger::TransactionType {
    fn from(value: TransactionType) -> Self {
        match value {
            TransactionType::Income => Self::Income,
            TransactionType::Expense => Self::Expense,
        }
    }
}

impl From<ledger::TransactionType> for TransactionType {
    fn from(value: ledger::TransactionType) -> Self {
        match value {
            ledger::TransactionType::Income => Self::Income,
            ledger::TransactionType::Expense => Self::Expense,
        }
    }
}

/// Stored group member role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
pub enum MemberRole {
    /// Group administrator.
    #[sea_orm(string_value = "admin")]
    Admin,
    /// Regular member.
    #[sea_orm(string_value = "member")]
    Member,
    /// Read-only member.
    #[sea_orm(string_value = "viewer")]
    Viewer,
}

impl From<MemberRole> for membership::MemberRole {
    fn from(value: MemberRole) -> Self {
        match value {
            MemberRole::Admin => Self::Admin,
            MemberRole::Member => Self::Member,
            MemberRole::Viewer => Self::Viewer,
        }
    }
}

impl From<membership::MemberRole> for MemberRole {
    fn from(value: membership::MemberRole) -> Self {
        match value {
            membership::MemberRole::Admin => Self::Admin,
            membership::MemberRole::Member => Self::Member,
            membership::MemberRole::Viewer => Self::Viewer,
        }
    }
}
