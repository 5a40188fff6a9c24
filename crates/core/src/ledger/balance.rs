//! Balance adjustment planning.
//!
//! Every transaction write maps to a small set of signed deltas against
//! balance owners. An update first reverses the persisted snapshot and then
//! applies the new one; deltas on the same owner are netted into one write.
//! The plan is ordered by [`BalanceOwner`] so concurrent writers always lock
//! owner rows in the same order.

use std::collections::BTreeMap;

use rust_decimal::Decimal;

use super::types::{BalanceOwner, TransactionSnapshot};

/// A signed change to one owner's cached balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BalanceAdjustment {
    /// The balance to change.
    pub owner: BalanceOwner,
    /// Amount added to the balance (negative for a decrease).
    pub delta: Decimal,
}

/// The ordered set of adjustments for one transaction write.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BalancePlan {
    adjustments: Vec<BalanceAdjustment>,
}

impl BalancePlan {
    fn from_deltas(deltas: impl IntoIterator<Item = (BalanceOwner, Decimal)>) -> Self {
        let mut merged: BTreeMap<BalanceOwner, Decimal> = BTreeMap::new();
        for (owner, delta) in deltas {
            *merged.entry(owner).or_default() += delta;
        }

        let adjustments = merged
            .into_iter()
            .filter(|(_, delta)| !delta.is_zero())
            .map(|(owner, delta)| BalanceAdjustment { owner, delta })
            .collect();

        Self { adjustments }
    }

    /// Plan for inserting `created`.
    #[must_use]
    pub fn for_create(created: &TransactionSnapshot) -> Self {
        Self::from_deltas([(created.owner, created.delta())])
    }

    /// Plan for replacing the persisted `previous` with `next`.
    ///
    /// `previous` must be the row as currently stored, read under lock in the
    /// same database transaction as the write.
    #[must_use]
    pub fn for_update(previous: &TransactionSnapshot, next: &TransactionSnapshot) -> Self {
        Self::from_deltas([
            (previous.owner, -previous.delta()),
            (next.owner, next.delta()),
        ])
    }

    /// Plan for deleting the persisted `deleted`.
    #[must_use]
    pub fn for_delete(deleted: &TransactionSnapshot) -> Self {
        Self::from_deltas([(deleted.owner, -deleted.delta())])
    }

    /// Adjustments in lock order. Owners with a zero net change are omitted.
    #[must_use]
    pub fn adjustments(&self) -> &[BalanceAdjustment] {
        &self.adjustments
    }

    /// Returns true if no balance changes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.adjustments.is_empty()
    }

    /// Returns the net change for `owner`, zero if untouched.
    #[must_use]
    pub fn delta_for(&self, owner: BalanceOwner) -> Decimal {
        self.adjustments
            .iter()
            .find(|adj| adj.owner == owner)
            .map_or(Decimal::ZERO, |adj| adj.delta)
    }
}
