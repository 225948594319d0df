//! Unified error type for the EMI ledger.
//!
//! Every fallible operation in the crate returns [`Result`]. Variants fall into four
//! groups: validation failures, not-found lookups, missing identity, and storage or
//! configuration failures. The HTTP layer maps each group to a status code.

use chrono::NaiveDate;
use sea_orm::DbErr;
use thiserror::Error;

/// Errors produced by the EMI ledger.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration could not be loaded or parsed
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration problem
        message: String,
    },

    /// Generic input validation failure (missing or blank fields)
    #[error("{message}")]
    Validation {
        /// Human-readable reason for the rejection
        message: String,
    },

    /// Amount was zero, negative, or not a finite number
    #[error("Amount must be a positive number (got {amount})")]
    InvalidAmount {
        /// The rejected amount
        amount: f64,
    },

    /// Day of month outside 1..=31
    #[error("Day of month must be between 1 and 31 (got {day})")]
    InvalidDayOfMonth {
        /// The rejected day
        day: i32,
    },

    /// End date is not strictly after the start date
    #[error("End date must be after start date ({start} .. {end})")]
    InvalidDateRange {
        /// Start of the rejected range
        start: NaiveDate,
        /// End of the rejected range
        end: NaiveDate,
    },

    /// Month outside 1..=12
    #[error("Month must be between 1 and 12 (got {month})")]
    InvalidMonth {
        /// The rejected month
        month: u32,
    },

    /// Year that cannot be represented as a calendar date
    #[error("Year {year} is out of range")]
    InvalidYear {
        /// The rejected year
        year: i32,
    },

    /// Attempt to edit a field that an EMI-generated expense keeps in sync with its EMI
    #[error("Field '{field}' of an EMI-generated expense cannot be edited")]
    ReadOnlyField {
        /// Name of the protected field
        field: &'static str,
    },

    /// EMI does not exist or belongs to another user
    #[error("EMI not found")]
    EmiNotFound {
        /// Requested EMI id
        id: i64,
    },

    /// Expense does not exist or belongs to another user
    #[error("Expense not found")]
    ExpenseNotFound {
        /// Requested expense id
        id: i64,
    },

    /// Request carried no usable identity
    #[error("Unauthorized - Invalid token")]
    Unauthenticated,

    /// Error raised by the database layer
    #[error("Database error: {0}")]
    Database(#[from] DbErr),

    /// I/O failure (config file, socket binding)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Builds a [`Error::Validation`] from any message.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// True for errors caused by bad caller input.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::Validation { .. }
                | Self::InvalidAmount { .. }
                | Self::InvalidDayOfMonth { .. }
                | Self::InvalidDateRange { .. }
                | Self::InvalidMonth { .. }
                | Self::InvalidYear { .. }
                | Self::ReadOnlyField { .. }
        )
    }

    /// True for lookups that found nothing visible to the caller.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::EmiNotFound { .. } | Self::ExpenseNotFound { .. })
    }
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
