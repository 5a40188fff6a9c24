//! Property-based tests for balance plans.
//!
//! - Property 1: create followed by delete leaves every balance unchanged
//! - Property 2: update equals delete of the old row plus create of the new one
//! - Property 3: after any operation sequence, each cached balance equals the
//!   signed sum of the transactions it owns

use std::collections::HashMap;

use efinance_shared::types::{GroupId, UserId};
use proptest::prelude::*;
use rust_decimal::Decimal;
use uuid::Uuid;

use super::balance::BalancePlan;
use super::types::{BalanceOwner, TransactionSnapshot, TransactionType};

/// Strategy to generate positive decimal amounts (0.01 to 10,000.00).
fn positive_amount() -> impl Strategy<Value = Decimal> {
    (1i64..1_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

fn kind_strategy() -> impl Strategy<Value = TransactionType> {
    prop_oneof![Just(TransactionType::Income), Just(TransactionType::Expense)]
}

fn users() -> [UserId; 2] {
    [
        UserId::from_uuid(Uuid::from_u128(1)),
        UserId::from_uuid(Uuid::from_u128(2)),
    ]
}

fn groups() -> [GroupId; 2] {
    [
        GroupId::from_uuid(Uuid::from_u128(10)),
        GroupId::from_uuid(Uuid::from_u128(11)),
    ]
}

/// Strategy for a snapshot owned by one of two users or one of two groups.
fn snapshot_strategy() -> impl Strategy<Value = TransactionSnapshot> {
    (0usize..2, prop::option::of(0usize..2), kind_strategy(), positive_amount()).prop_map(
        |(user, group, kind, amount)| {
            TransactionSnapshot::new(users()[user], group.map(|g| groups()[g]), kind, amount)
        },
    )
}

#[derive(Debug, Clone)]
enum Op {
    Create(TransactionSnapshot),
    Update(usize, TransactionSnapshot),
    Delete(usize),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => snapshot_strategy().prop_map(Op::Create),
        2 => (any::<usize>(), snapshot_strategy()).prop_map(|(i, s)| Op::Update(i, s)),
        1 => any::<usize>().prop_map(Op::Delete),
    ]
}

fn apply(balances: &mut HashMap<BalanceOwner, Decimal>, plan: &BalancePlan) {
    for adj in plan.adjustments() {
        *balances.entry(adj.owner).or_default() += adj.delta;
    }
}

fn oracle(rows: &[TransactionSnapshot]) -> HashMap<BalanceOwner, Decimal> {
    let mut out = HashMap::new();
    for row in rows {
        *out.entry(row.owner).or_insert(Decimal::ZERO) += row.delta();
    }
    out
}

fn assert_consistent(
    balances: &HashMap<BalanceOwner, Decimal>,
    rows: &[TransactionSnapshot],
) -> Result<(), TestCaseError> {
    let expected = oracle(rows);
    let owners = users()
        .into_iter()
        .map(BalanceOwner::Personal)
        .chain(groups().into_iter().map(BalanceOwner::Group));
    for owner in owners {
        let cached = balances.get(&owner).copied().unwrap_or_default();
        let computed = expected.get(&owner).copied().unwrap_or_default();
        prop_assert_eq!(cached, computed, "drift on {}", owner);
    }
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Property 1: create then delete is a no-op on every balance.
    #[test]
    fn prop_create_then_delete_restores_balance(snap in snapshot_strategy()) {
        let mut balances = HashMap::new();
        apply(&mut balances, &BalancePlan::for_create(&snap));
        apply(&mut balances, &BalancePlan::for_delete(&snap));
        prop_assert!(balances.values().all(Decimal::is_zero));
    }

    /// Property 2: an update nets to (new delta) - (old delta) per owner.
    #[test]
    fn prop_update_matches_delete_plus_create(
        before in snapshot_strategy(),
        after in snapshot_strategy(),
    ) {
        let plan = BalancePlan::for_update(&before, &after);

        let mut via_update = HashMap::new();
        apply(&mut via_update, &plan);

        let mut via_steps = HashMap::new();
        apply(&mut via_steps, &BalancePlan::for_delete(&before));
        apply(&mut via_steps, &BalancePlan::for_create(&after));

        for owner in [before.owner, after.owner] {
            prop_assert_eq!(
                via_update.get(&owner).copied().unwrap_or_default(),
                via_steps.get(&owner).copied().unwrap_or_default()
            );
        }
        prop_assert!(plan.adjustments().len() <= 2);
        prop_assert!(plan.adjustments().windows(2).all(|w| w[0].owner < w[1].owner));
    }

    /// Property 3: random operation sequences never drift from the oracle.
    #[test]
    fn prop_sequences_keep_cached_balances_exact(ops in prop::collection::vec(op_strategy(), 1..60)) {
        let mut balances: HashMap<BalanceOwner, Decimal> = HashMap::new();
        let mut rows: Vec<TransactionSnapshot> = Vec::new();

        for op in ops {
            match op {
                Op::Create(snap) => {
                    apply(&mut balances, &BalancePlan::for_create(&snap));
                    rows.push(snap);
                }
                Op::Update(i, next) if !rows.is_empty() => {
                    let idx = i % rows.len();
                    apply(&mut balances, &BalancePlan::for_update(&rows[idx], &next));
                    rows[idx] = next;
                }
                Op::Delete(i) if !rows.is_empty() => {
                    let idx = i % rows.len();
                    let removed = rows.swap_remove(idx);
                    apply(&mut balances, &BalancePlan::for_delete(&removed));
                }
                Op::Update(..) | Op::Delete(_) => {}
            }
            assert_consistent(&balances, &rows)?;
        }
    }
}
