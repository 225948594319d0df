//! EMI progress reporting.
//!
//! Progress is calendar-based: an installment counts as paid once its due date has
//! passed, whether or not its month has been materialized. Months are walked with the
//! materializer's due-date rule, so clamping and partial first and last months agree
//! with what the ledger would generate.

use crate::{
    core::{emi::get_emi, materializer::due_occurrence, period::MonthPeriod},
    entities::emi,
    errors::Result,
};
use chrono::NaiveDate;
use sea_orm::ConnectionTrait;

/// Repayment progress of a single EMI.
#[derive(Debug, Clone)]
pub struct EmiProgress {
    /// The EMI being reported on
    pub emi: emi::Model,
    /// Installments over the whole life of the EMI
    pub total_installments: u32,
    /// Installments whose due date has arrived
    pub installments_paid: u32,
    /// Installments still to come
    pub installments_remaining: u32,
    /// Sum of all installments
    pub total_amount: f64,
    /// Sum of installments already due
    pub amount_paid: f64,
    /// Sum of installments still to come
    pub amount_remaining: f64,
    /// Share of the total already paid (0-100)
    pub progress_percent: f64,
    /// Date of the next installment, if any remain
    pub next_due: Option<NaiveDate>,
}

/// Generates the progress report for one EMI owned by `user_id`.
///
/// # Errors
/// [`crate::errors::Error::EmiNotFound`] if the EMI is not visible to `user_id`.
pub async fn generate_emi_progress<C>(
    db: &C,
    user_id: &str,
    emi_id: i64,
    today: NaiveDate,
) -> Result<EmiProgress>
where
    C: ConnectionTrait,
{
    let emi = get_emi(db, user_id, emi_id).await?;
    Ok(compute_progress(emi, today))
}

/// Computes progress for `emi` as of `today`.
#[must_use]
pub fn compute_progress(emi: emi::Model, today: NaiveDate) -> EmiProgress {
    let mut total_installments = 0_u32;
    let mut installments_paid = 0_u32;
    let mut next_due = None;

    let mut period = Some(MonthPeriod::containing(emi.start_date));
    while let Some(current) = period {
        if current.first_day() > emi.end_date {
            break;
        }
        if let Ok(occurrence) = due_occurrence(&emi, &current, NaiveDate::MAX) {
            total_installments += 1;
            if occurrence <= today {
                installments_paid += 1;
            } else if next_due.is_none() {
                next_due = Some(occurrence);
            }
        }
        period = current.next();
    }

    let installments_remaining = total_installments - installments_paid;
    let total_amount = f64::from(total_installments) * emi.amount;
    let amount_paid = f64::from(installments_paid) * emi.amount;

    EmiProgress {
        total_installments,
        installments_paid,
        installments_remaining,
        total_amount,
        amount_paid,
        amount_remaining: total_amount - amount_paid,
        progress_percent: calculate_progress(amount_paid, total_amount),
        next_due: if emi.is_active { next_due } else { None },
        emi,
    }
}

/// Percentage of `whole` that `part` represents; 0 when `whole` is zero.
#[must_use]
pub fn calculate_progress(part: f64, whole: f64) -> f64 {
    if whole == 0.0 {
        return 0.0;
    }

    (part / whole) * 100.0
}

/// Generates a progress bar string for visual representation.
///
/// Creates a text-based progress bar like: `[████████░░] 80.0%`
///
/// # Arguments
/// * `progress_percent` - Progress percentage (0-100)
/// * `bar_length` - Length of the progress bar in characters (default 10)
#[must_use]
pub fn format_progress_bar(progress_percent: f64, bar_length: Option<usize>) -> String {
    let length = bar_length.unwrap_or(10);
    let clamped_progress = progress_percent.clamp(0.0, 100.0);

    // clamped_progress is in [0, 100] and length is small, so the cast stays in [0, length]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
    let filled = ((clamped_progress / 100.0) * length as f64).round() as usize;
    let empty = length.saturating_sub(filled);

    let filled_str = "█".repeat(filled);
    let empty_str = "░".repeat(empty);

    format!("[{filled_str}{empty_str}] {progress_percent:.1}%")
}
