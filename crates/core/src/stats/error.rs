//! Aggregation error types.

use chrono::NaiveDate;
use thiserror::Error;

/// Errors raised while building aggregation scopes.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StatsError {
    /// Month outside 1..=12 or year out of calendar range.
    #[error("Invalid month: {year}-{month}")]
    InvalidMonth {
        /// Requested year.
        year: i32,
        /// Requested month.
        month: u32,
    },

    /// Period start after period end.
    #[error("start_date ({start}) must not be after end_date ({end})")]
    InvalidPeriod {
        /// Requested start.
        start: NaiveDate,
        /// Requested end.
        end: NaiveDate,
    },

    /// Recent window must cover at least one day.
    #[error("days must be between 1 and 366")]
    InvalidDays,
}

impl StatsError {
    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidMonth { .. } => "INVALID_MONTH",
            Self::InvalidPeriod { .. } => "INVALID_PERIOD",
            Self::InvalidDays => "INVALID_DAYS",
        }
    }
}
