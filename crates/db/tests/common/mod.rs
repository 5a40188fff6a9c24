//! Shared fixtures for repository integration tests.
//!
//! Each test gets its own in-memory SQLite database with the full schema.

#![allow(dead_code)]

use chrono::NaiveDate;
use efinance_core::ledger::TransactionType;
use efinance_db::migration::{Migrator, MigratorTrait};
use efinance_db::{
    CategoryRepository, CreateCategoryInput, CreateTransactionInput, CreateUserInput,
    GroupRepository, TransactionRepository, UserRepository, entities::users,
};
use fake::Fake;
use fake::faker::name::en::{FirstName, LastName};
use rust_decimal::Decimal;
use sea_orm::{ConnectOptions, Database, DatabaseConnection, EntityTrait};
use uuid::Uuid;

/// A fixed "today" so date validation is deterministic.
pub fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 1, 31).unwrap()
}

/// A date comfortably in the past.
pub fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 1, d).unwrap()
}

/// Connects to a fresh in-memory database and runs all migrations.
pub async fn setup_db() -> DatabaseConnection {
    let mut options = ConnectOptions::new("sqlite::memory:");
    options
        .max_connections(1)
        .min_connections(1)
        .sqlx_logging(false);
    let db = Database::connect(options)
        .await
        .expect("Failed to open in-memory database");
    Migrator::up(&db, None)
        .await
        .expect("Failed to run migrations");
    db
}

/// Creates a user with a random name.
pub async fn create_user(db: &DatabaseConnection) -> users::Model {
    let first: String = FirstName().fake();
    let last: String = LastName().fake();
    UserRepository::new(db.clone())
        .create(CreateUserInput {
            email: format!("{}.{}@example.com", first, Uuid::new_v4().simple()),
            password_hash: "$argon2id$test".to_string(),
            first_name: first,
            last_name: last,
            currency: None,
        })
        .await
        .expect("Failed to create user")
}

/// Creates a group administered by `admin`, returning its id.
pub async fn create_group(db: &DatabaseConnection, admin: Uuid) -> Uuid {
    let (group, _) = GroupRepository::new(db.clone())
        .create_with_admin(admin, "Household", None)
        .await
        .expect("Failed to create group");
    group.id
}

/// Creates a category of `kind`.
pub async fn create_category(
    db: &DatabaseConnection,
    owner: Uuid,
    group_id: Option<Uuid>,
    kind: TransactionType,
) -> Uuid {
    CategoryRepository::new(db.clone())
        .create(CreateCategoryInput {
            name: format!("{kind} category"),
            kind,
            user_id: owner,
            group_id,
        })
        .await
        .expect("Failed to create category")
        .id
}

/// Builds a transaction input dated in the past.
pub fn input(
    user_id: Uuid,
    group_id: Option<Uuid>,
    category_id: Uuid,
    kind: TransactionType,
    amount: Decimal,
) -> CreateTransactionInput {
    CreateTransactionInput {
        amount,
        kind,
        date: day(15),
        description: format!("{kind} of {amount}"),
        proof: None,
        category_id,
        user_id,
        group_id,
    }
}

/// Records a transaction, panicking on failure.
pub async fn record(db: &DatabaseConnection, input: CreateTransactionInput) -> Uuid {
    TransactionRepository::new(db.clone())
        .create(input, today())
        .await
        .expect("Failed to create transaction")
        .id
}

/// Reads a user's cached balance.
pub async fn user_balance(db: &DatabaseConnection, id: Uuid) -> Decimal {
    users::Entity::find_by_id(id)
        .one(db)
        .await
        .unwrap()
        .expect("user exists")
        .balance
}

/// Reads a group's cached balance.
pub async fn group_balance(db: &DatabaseConnection, id: Uuid) -> Decimal {
    efinance_db::entities::groups::Entity::find_by_id(id)
        .one(db)
        .await
        .unwrap()
        .expect("group exists")
        .balance
}
