//! Aggregations over transaction facts.
//!
//! The database layer loads [`TransactionFact`]s for a scope (user, group,
//! category, date range); everything computed from them lives here so it can
//! be tested without a database.

pub mod error;
pub mod service;
pub mod types;

#[cfg(test)]
mod service_props;

pub use error::StatsError;
pub use service::{
    DEFAULT_MOST_USED, DEFAULT_RECENT_DAYS, by_category, by_type, member_contributions,
    monthly_summary, most_used, net_balance, recent_window, summarize,
};
pub use types::{
    CategoryBreakdown, MemberContribution, MonthlySummary, Period, TransactionFact,
    TransactionStats, TypeBreakdown, TypeBucket,
};
