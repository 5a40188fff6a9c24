//! Core business logic for E-Finance.
//!
//! This crate contains pure business logic with ZERO web or database dependencies.
//! All domain types, validation rules, and calculations live here.
//!
//! # Modules
//!
//! - `ledger` - Income/expense transactions and the balance adjustment plan
//! - `membership` - Group roles and the last-admin guard
//! - `stats` - Aggregations over transaction facts
//! - `auth` - Password hashing and password reset codes

pub mod auth;
pub mod ledger;
pub mod membership;
pub mod stats;
