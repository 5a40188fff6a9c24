//! Property-based tests for aggregations.
//!
//! - Property 1: balance always equals income minus expenses
//! - Property 2: per-category counts and totals add up to the overall figures
//! - Property 3: `net_balance` agrees with `summarize`

use chrono::NaiveDate;
use proptest::prelude::*;
use rust_decimal::Decimal;
use uuid::Uuid;

use super::service::{by_category, net_balance, summarize};
use super::types::{Period, TransactionFact};
use crate::ledger::TransactionType;

fn fact_strategy() -> impl Strategy<Value = TransactionFact> {
    (
        1i64..1_000_000i64,
        prop_oneof![Just(TransactionType::Income), Just(TransactionType::Expense)],
        0u32..365,
        0u128..4,
    )
        .prop_map(|(cents, kind, day, category)| TransactionFact {
            id: Uuid::new_v4(),
            amount: Decimal::new(cents, 2),
            kind,
            date: NaiveDate::from_ymd_opt(2025, 1, 1)
                .unwrap()
                .checked_add_days(chrono::Days::new(u64::from(day)))
                .unwrap(),
            category_id: Uuid::from_u128(category),
            category_name: format!("category-{category}"),
            user_id: Uuid::from_u128(100),
            group_id: None,
        })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn prop_balance_is_income_minus_expenses(facts in prop::collection::vec(fact_strategy(), 0..50)) {
        let stats = summarize(&facts, &Period::default());
        prop_assert_eq!(stats.balance, stats.total_income - stats.total_expenses);
        prop_assert_eq!(stats.transaction_count, stats.income_count + stats.expense_count);
        prop_assert_eq!(stats.transaction_count as usize, facts.len());
    }

    #[test]
    fn prop_categories_partition_totals(facts in prop::collection::vec(fact_strategy(), 1..50)) {
        let rows = by_category(&facts);
        let count: u64 = rows.iter().map(|r| r.transaction_count).sum();
        let total: Decimal = rows.iter().map(|r| r.total_amount).sum();
        let expected: Decimal = facts.iter().map(|f| f.amount).sum();

        prop_assert_eq!(count as usize, facts.len());
        prop_assert_eq!(total, expected);
        prop_assert!(rows.iter().all(|r| r.percentage >= Decimal::ZERO && r.percentage <= Decimal::ONE_HUNDRED));
    }

    #[test]
    fn prop_net_balance_matches_summary(facts in prop::collection::vec(fact_strategy(), 0..50)) {
        prop_assert_eq!(net_balance(&facts), summarize(&facts, &Period::default()).balance);
    }
}
