//! Integration tests for categories.

mod common;

use common::{create_category, create_group, create_user, input, record, setup_db};
use efinance_core::ledger::{LedgerError, TransactionType};
use efinance_db::{
    CategoryError, CategoryFilter, CategoryRepository, CreateCategoryInput, UpdateCategoryInput,
};
use rust_decimal_macros::dec;

#[tokio::test]
async fn test_category_in_use_cannot_be_deleted() {
    let db = setup_db().await;
    let user = create_user(&db).await;
    let category = create_category(&db, user.id, None, TransactionType::Expense).await;
    record(&db, input(user.id, None, category, TransactionType::Expense, dec!(9))).await;

    let repo = CategoryRepository::new(db.clone());
    assert!(matches!(
        repo.delete(category).await,
        Err(CategoryError::Ledger(LedgerError::CategoryInUse { count: 1 }))
    ));
    assert!(repo.find_by_id(category).await.unwrap().is_some());
}

#[tokio::test]
async fn test_unused_category_can_be_deleted() {
    let db = setup_db().await;
    let user = create_user(&db).await;
    let category = create_category(&db, user.id, None, TransactionType::Income).await;

    let repo = CategoryRepository::new(db.clone());
    repo.delete(category).await.unwrap();
    assert!(repo.find_by_id(category).await.unwrap().is_none());
}

#[tokio::test]
async fn test_type_change_locked_while_used() {
    let db = setup_db().await;
    let user = create_user(&db).await;
    let category = create_category(&db, user.id, None, TransactionType::Expense).await;
    let repo = CategoryRepository::new(db.clone());

    let renamed = repo
        .update(
            category,
            UpdateCategoryInput {
                name: Some(" Groceries ".into()),
                kind: Some(TransactionType::Income),
            },
        )
        .await
        .unwrap();
    assert_eq!(renamed.name, "Groceries");
    assert_eq!(TransactionType::from(renamed.kind), TransactionType::Income);

    record(&db, input(user.id, None, category, TransactionType::Income, dec!(3))).await;
    let locked = repo
        .update(
            category,
            UpdateCategoryInput {
                kind: Some(TransactionType::Expense),
                ..Default::default()
            },
        )
        .await;
    assert!(matches!(locked, Err(CategoryError::TypeLocked(1))));
}

#[tokio::test]
async fn test_short_name_rejected() {
    let db = setup_db().await;
    let user = create_user(&db).await;

    let result = CategoryRepository::new(db.clone())
        .create(CreateCategoryInput {
            name: " x ".into(),
            kind: TransactionType::Income,
            user_id: user.id,
            group_id: None,
        })
        .await;
    assert!(matches!(
        result,
        Err(CategoryError::Ledger(LedgerError::InvalidCategoryName))
    ));
}

#[tokio::test]
async fn test_visible_categories_include_group_ones() {
    let db = setup_db().await;
    let alice = create_user(&db).await;
    let bob = create_user(&db).await;
    let group = create_group(&db, alice.id).await;

    create_category(&db, alice.id, None, TransactionType::Income).await;
    create_category(&db, alice.id, Some(group), TransactionType::Expense).await;
    create_category(&db, bob.id, None, TransactionType::Expense).await;

    let repo = CategoryRepository::new(db.clone());
    let mine = repo
        .list_visible(alice.id, &CategoryFilter::default())
        .await
        .unwrap();
    assert_eq!(mine.len(), 2);

    let expenses = repo
        .list_visible(
            alice.id,
            &CategoryFilter {
                kind: Some(TransactionType::Expense),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(expenses.len(), 1);
    assert_eq!(expenses[0].group_id, Some(group));

    let bobs = repo
        .list_visible(bob.id, &CategoryFilter::default())
        .await
        .unwrap();
    assert_eq!(bobs.len(), 1);
}
