//! Aggregation functions.

use std::collections::HashMap;

use chrono::{Duration, NaiveDate};
use efinance_shared::types::money::{percentage_of, round_money};
use rust_decimal::Decimal;
use uuid::Uuid;

use super::error::StatsError;
use super::types::{
    CategoryBreakdown, MemberContribution, MonthlySummary, Period, TransactionFact,
    TransactionStats, TypeBreakdown, TypeBucket,
};
use crate::ledger::TransactionType;

/// Default window for "recent" listings.
pub const DEFAULT_RECENT_DAYS: u32 = 7;

/// Default length of the most-used category ranking.
pub const DEFAULT_MOST_USED: usize = 10;

#[derive(Default)]
struct Totals {
    income: Decimal,
    expenses: Decimal,
    income_count: u64,
    expense_count: u64,
}

impl Totals {
    fn add(&mut self, fact: &TransactionFact) {
        match fact.kind {
            TransactionType::Income => {
                self.income += fact.amount;
                self.income_count += 1;
            }
            TransactionType::Expense => {
                self.expenses += fact.amount;
                self.expense_count += 1;
            }
        }
    }

    const fn count(&self) -> u64 {
        self.income_count + self.expense_count
    }

    fn balance(&self) -> Decimal {
        self.income - self.expenses
    }
}

/// Summarizes the facts that fall inside `period`.
#[must_use]
pub fn summarize(facts: &[TransactionFact], period: &Period) -> TransactionStats {
    let mut totals = Totals::default();
    let mut first: Option<NaiveDate> = None;
    let mut last: Option<NaiveDate> = None;

    for fact in facts.iter().filter(|f| period.contains(f.date)) {
        totals.add(fact);
        first = Some(first.map_or(fact.date, |d| d.min(fact.date)));
        last = Some(last.map_or(fact.date, |d| d.max(fact.date)));
    }

    let count = totals.count();
    let average = round_money((totals.income + totals.expenses) / Decimal::from(count.max(1)));

    TransactionStats {
        total_income: totals.income,
        total_expenses: totals.expenses,
        balance: totals.balance(),
        transaction_count: count,
        income_count: totals.income_count,
        expense_count: totals.expense_count,
        average_transaction: average,
        period_start: period.start.or(first),
        period_end: period.end.or(last),
    }
}

/// Groups facts by category, largest total first.
#[must_use]
pub fn by_category(facts: &[TransactionFact]) -> Vec<CategoryBreakdown> {
    let grand_total: Decimal = facts.iter().map(|f| f.amount).sum();
    let mut rows: HashMap<Uuid, CategoryBreakdown> = HashMap::new();

    for fact in facts {
        let row = rows
            .entry(fact.category_id)
            .or_insert_with(|| CategoryBreakdown {
                category_id: fact.category_id,
                category_name: fact.category_name.clone(),
                kind: fact.kind,
                total_amount: Decimal::ZERO,
                transaction_count: 0,
                percentage: Decimal::ZERO,
            });
        row.total_amount += fact.amount;
        row.transaction_count += 1;
    }

    let mut out: Vec<CategoryBreakdown> = rows
        .into_values()
        .map(|mut row| {
            row.percentage = percentage_of(row.total_amount, grand_total);
            row
        })
        .collect();
    out.sort_by(|a, b| {
        b.total_amount
            .cmp(&a.total_amount)
            .then_with(|| a.category_name.cmp(&b.category_name))
    });
    out
}

/// Ranks categories by number of transactions, keeping the first `limit`.
///
/// Ties go to the larger total, then to the name.
#[must_use]
pub fn most_used(facts: &[TransactionFact], limit: usize) -> Vec<CategoryBreakdown> {
    let mut rows = by_category(facts);
    rows.sort_by(|a, b| {
        b.transaction_count
            .cmp(&a.transaction_count)
            .then_with(|| b.total_amount.cmp(&a.total_amount))
            .then_with(|| a.category_name.cmp(&b.category_name))
    });
    rows.truncate(limit);
    rows
}

/// Splits the category breakdown into income and expense buckets.
#[must_use]
pub fn by_type(facts: &[TransactionFact]) -> TypeBreakdown {
    let (income, expense): (Vec<TransactionFact>, Vec<TransactionFact>) = facts
        .iter()
        .cloned()
        .partition(|f| f.kind == TransactionType::Income);

    TypeBreakdown {
        income: bucket(&income),
        expense: bucket(&expense),
    }
}

fn bucket(facts: &[TransactionFact]) -> TypeBucket {
    let categories = by_category(facts);
    TypeBucket {
        total_amount: facts.iter().map(|f| f.amount).sum(),
        transaction_count: categories.iter().map(|c| c.transaction_count).sum(),
        category_count: categories.len(),
        categories,
    }
}

/// Totals for the calendar month `year-month`.
///
/// # Errors
///
/// Returns `InvalidMonth` for an out-of-range month.
pub fn monthly_summary(
    facts: &[TransactionFact],
    year: i32,
    month: u32,
) -> Result<MonthlySummary, StatsError> {
    let period = Period::month(year, month)?;
    let mut totals = Totals::default();
    for fact in facts.iter().filter(|f| period.contains(f.date)) {
        totals.add(fact);
    }

    Ok(MonthlySummary {
        year,
        month,
        total_income: totals.income,
        total_expenses: totals.expenses,
        balance: totals.balance(),
        transaction_count: totals.count(),
    })
}

/// Per-author activity for a group's facts, largest income first.
#[must_use]
pub fn member_contributions(facts: &[TransactionFact]) -> Vec<MemberContribution> {
    let group_income: Decimal = facts
        .iter()
        .filter(|f| f.kind == TransactionType::Income)
        .map(|f| f.amount)
        .sum();

    let mut by_user: HashMap<Uuid, Totals> = HashMap::new();
    for fact in facts {
        by_user.entry(fact.user_id).or_default().add(fact);
    }

    let mut out: Vec<MemberContribution> = by_user
        .into_iter()
        .map(|(user_id, totals)| MemberContribution {
            user_id,
            transaction_count: totals.count(),
            total_income: totals.income,
            total_expenses: totals.expenses,
            net: totals.balance(),
            income_share: percentage_of(totals.income, group_income),
        })
        .collect();
    out.sort_by(|a, b| {
        b.total_income
            .cmp(&a.total_income)
            .then_with(|| a.user_id.cmp(&b.user_id))
    });
    out
}

/// Signed sum of the facts, recomputed from scratch.
#[must_use]
pub fn net_balance(facts: &[TransactionFact]) -> Decimal {
    facts.iter().map(|f| f.kind.signed(f.amount)).sum()
}

/// The inclusive window covering the last `days` days up to `today`.
///
/// # Errors
///
/// Returns `InvalidDays` when `days` is zero or over a year.
pub fn recent_window(today: NaiveDate, days: u32) -> Result<Period, StatsError> {
    if !(1..=366).contains(&days) {
        return Err(StatsError::InvalidDays);
    }
    let start = today - Duration::days(i64::from(days));
    Ok(Period {
        start: Some(start),
        end: Some(today),
    })
}
