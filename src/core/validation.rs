//! Field-level validation shared by the EMI and expense operations.

use crate::errors::{Error, Result};
use chrono::NaiveDate;

/// Trims `value` and rejects it if nothing is left.
pub fn require_text(value: &str, field: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(Error::validation(format!("{field} is required")));
    }
    Ok(trimmed.to_string())
}

/// Amounts must be finite and strictly positive.
pub fn validate_amount(amount: f64) -> Result<f64> {
    if !amount.is_finite() || amount <= 0.0 {
        return Err(Error::InvalidAmount { amount });
    }
    Ok(amount)
}

/// Days of month must lie in 1..=31.
pub fn validate_day_of_month(day: i32) -> Result<i32> {
    if !(1..=31).contains(&day) {
        return Err(Error::InvalidDayOfMonth { day });
    }
    Ok(day)
}

/// The end of a range must be strictly after its start.
pub fn validate_date_range(start: NaiveDate, end: NaiveDate) -> Result<()> {
    if end <= start {
        return Err(Error::InvalidDateRange { start, end });
    }
    Ok(())
}
