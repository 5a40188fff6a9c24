//! Database layer with `SeaORM` entities and repositories.
//!
//! This crate provides:
//! - `SeaORM` entity definitions
//! - Repository abstractions for data access
//! - Database migrations
//!
//! Every write that touches a cached balance runs inside one database
//! transaction holding row locks on the balance owners it adjusts.

pub mod entities;
pub mod migration;
pub mod repositories;

pub use repositories::{
    Actor, AddMemberInput, CategoryError, CategoryFilter, CategoryRepository, CreateCategoryInput,
    CreateTransactionInput, CreateUserInput, Dashboard, GroupError, GroupRepository,
    MemberError, MemberRepository, PasswordResetRepository, ReconcileReport, SessionRepository,
    StatsQueryError, StatsRepository, TransactionError, TransactionFilter, TransactionRepository,
    TransactionScope, UpdateCategoryInput, UpdateGroupInput, UpdateMemberInput,
    UpdateProfileInput, UpdateTransactionInput, UserFilter, UserRepository, Visibility,
};

use std::time::Duration;

use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};

/// Establishes a pooled connection with explicit pool bounds.
///
/// # Errors
///
/// Returns an error if the connection cannot be established.
pub async fn connect_with_pool(
    database_url: &str,
    max_connections: u32,
    min_connections: u32,
) -> Result<DatabaseConnection, DbErr> {
    let mut options = ConnectOptions::new(database_url);
    options
        .max_connections(max_connections)
        .min_connections(min_connections)
        .connect_timeout(Duration::from_secs(10))
        .sqlx_logging(false);
    Database::connect(options).await
}
