//! Integration tests for statistics queries and transaction listings.

mod common;

use common::{create_category, create_group, create_user, day, input, record, setup_db, today};
use efinance_core::ledger::TransactionType::{Expense, Income};
use efinance_core::stats::{Period, by_category, member_contributions, net_balance, summarize};
use efinance_db::{
    MemberRepository, StatsRepository, TransactionFilter, TransactionRepository,
    TransactionScope, Visibility,
};
use efinance_shared::types::PageRequest;
use rust_decimal_macros::dec;

#[tokio::test]
async fn test_listing_respects_visibility_and_filters() {
    let db = setup_db().await;
    let alice = create_user(&db).await;
    let bob = create_user(&db).await;
    let group = create_group(&db, alice.id).await;
    MemberRepository::new(db.clone())
        .join(group, bob.id)
        .await
        .unwrap();

    let alice_income = create_category(&db, alice.id, None, Income).await;
    let bob_expense = create_category(&db, bob.id, None, Expense).await;
    let group_expense = create_category(&db, alice.id, Some(group), Expense).await;

    record(&db, input(alice.id, None, alice_income, Income, dec!(100))).await;
    record(&db, input(bob.id, None, bob_expense, Expense, dec!(7))).await;
    let mut shared = input(bob.id, Some(group), group_expense, Expense, dec!(20));
    shared.description = "Weekly groceries".into();
    shared.date = day(3);
    record(&db, shared).await;

    let repo = TransactionRepository::new(db.clone());
    let everything = TransactionFilter::default();

    let (alice_sees, total) = repo
        .list(Visibility::User(alice.id), &everything, PageRequest::default())
        .await
        .unwrap();
    assert_eq!(total, 2);
    assert_eq!(alice_sees.len(), 2);

    let (_, bob_total) = repo
        .list(Visibility::User(bob.id), &everything, PageRequest::default())
        .await
        .unwrap();
    assert_eq!(bob_total, 2);

    let personal = TransactionFilter {
        scope: Some(TransactionScope::Personal),
        ..Default::default()
    };
    let (rows, _) = repo
        .list(Visibility::User(alice.id), &personal, PageRequest::default())
        .await
        .unwrap();
    assert!(rows.iter().all(|t| t.group_id.is_none()));

    let search = TransactionFilter {
        search: Some("groceries".into()),
        date_to: Some(day(10)),
        ..Default::default()
    };
    let (rows, _) = repo
        .list(Visibility::All, &search, PageRequest::default())
        .await
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].group_id, Some(group));
}

#[tokio::test]
async fn test_pagination_reports_total() {
    let db = setup_db().await;
    let user = create_user(&db).await;
    let category = create_category(&db, user.id, None, Income).await;
    for amount in 1..=5 {
        record(&db, input(user.id, None, category, Income, amount.into())).await;
    }

    let (rows, total) = TransactionRepository::new(db.clone())
        .list(
            Visibility::User(user.id),
            &TransactionFilter::default(),
            PageRequest {
                page: 2,
                per_page: 2,
            },
        )
        .await
        .unwrap();
    assert_eq!(total, 5);
    assert_eq!(rows.len(), 2);
}

#[tokio::test]
async fn test_facts_agree_with_cached_balances() {
    let db = setup_db().await;
    let alice = create_user(&db).await;
    let bob = create_user(&db).await;
    let group = create_group(&db, alice.id).await;
    MemberRepository::new(db.clone())
        .join(group, bob.id)
        .await
        .unwrap();
    let income = create_category(&db, alice.id, Some(group), Income).await;
    let expense = create_category(&db, alice.id, Some(group), Expense).await;

    record(&db, input(alice.id, Some(group), income, Income, dec!(300))).await;
    record(&db, input(bob.id, Some(group), income, Income, dec!(100))).await;
    record(&db, input(bob.id, Some(group), expense, Expense, dec!(50.5))).await;

    let facts = StatsRepository::new(db.clone())
        .facts(
            Visibility::All,
            &TransactionFilter {
                group_id: Some(group),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(net_balance(&facts), common::group_balance(&db, group).await);

    let stats = summarize(&facts, &Period::default());
    assert_eq!(stats.total_income, dec!(400));
    assert_eq!(stats.total_expenses, dec!(50.5));
    assert_eq!(stats.transaction_count, 3);

    let categories = by_category(&facts);
    assert_eq!(categories[0].category_id, income);
    assert_eq!(categories[0].total_amount, dec!(400));

    let contributions = member_contributions(&facts);
    assert_eq!(contributions[0].user_id, alice.id);
    assert_eq!(contributions[0].income_share, dec!(75));
    assert_eq!(contributions[1].net, dec!(49.5));
}

#[tokio::test]
async fn test_dashboard_overview() {
    let db = setup_db().await;
    let user = create_user(&db).await;
    let group = create_group(&db, user.id).await;
    let income = create_category(&db, user.id, None, Income).await;
    let shared = create_category(&db, user.id, Some(group), Income).await;

    record(&db, input(user.id, None, income, Income, dec!(60))).await;
    record(&db, input(user.id, Some(group), shared, Income, dec!(25))).await;

    let dashboard = StatsRepository::new(db.clone())
        .dashboard(user.id, today())
        .await
        .unwrap();

    assert_eq!(dashboard.personal_balance, dec!(60));
    assert_eq!(dashboard.groups.len(), 1);
    assert_eq!(dashboard.groups[0].balance, dec!(25));
    assert_eq!(dashboard.current_month.total_income, dec!(60));
    assert_eq!(dashboard.recent_transactions.len(), 2);
}
