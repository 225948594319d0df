//! EMI materialization - Turns due EMI occurrences into expense records.
//!
//! For a target month, every active EMI of the user is checked against the month
//! window. An EMI produces at most one expense per month, dated on its (clamped)
//! day-of-month at midday UTC, and only once that day has arrived. Creation is an
//! insert-if-absent keyed by `(user_id, emi_id, emi_month)`, backed by a unique index,
//! so concurrent or repeated calls for the same month never duplicate an expense.

use crate::{
    core::{emi::get_active_emis, period::MonthPeriod},
    entities::{Expense, emi, expense, expense::EMI_CATEGORY},
    errors::Result,
};
use chrono::{NaiveDate, Utc};
use sea_orm::{Set, prelude::*, sea_query::OnConflict};
use std::fmt;
use tracing::{debug, info};

/// Why an active EMI produced no expense for a month.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The EMI's date range does not touch the month at all
    OutsideWindow,
    /// The occurrence falls before the EMI's start date
    BeforeStart,
    /// The occurrence falls after the EMI's end date
    AfterEnd,
    /// The occurrence is later than today
    NotYetDue,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::OutsideWindow => "outside EMI period",
            Self::BeforeStart => "before start date",
            Self::AfterEnd => "after end date",
            Self::NotYetDue => "not yet due",
        };
        f.write_str(text)
    }
}

/// What happened to one EMI during materialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// A new expense was written
    Created,
    /// The month's expense already existed
    AlreadyPresent,
    /// No expense is due this month
    Skipped(SkipReason),
}

/// Result of materializing a single EMI.
#[derive(Debug, Clone)]
pub struct Occurrence {
    /// EMI that was evaluated
    pub emi_id: i64,
    /// EMI title at evaluation time
    pub title: String,
    /// Clamped occurrence date, when the EMI overlaps the month
    pub occurrence_date: Option<NaiveDate>,
    /// What was done
    pub outcome: Outcome,
}

/// Result of materializing all active EMIs of a user for one month.
#[derive(Debug, Clone)]
pub struct MaterializationResult {
    /// Month that was processed
    pub period: MonthPeriod,
    /// One entry per active EMI
    pub occurrences: Vec<Occurrence>,
}

impl MaterializationResult {
    /// Number of expenses written by this run.
    #[must_use]
    pub fn created_count(&self) -> usize {
        self.occurrences
            .iter()
            .filter(|o| o.outcome == Outcome::Created)
            .count()
    }
}

/// Decides whether `emi` is due in `period` as of `today`.
///
/// Returns the occurrence date when due, or the reason it is not. All comparisons are
/// between calendar dates, so an occurrence dated today is always due regardless of
/// the time of day.
///
/// # Errors
/// The `Err` side carries the skip reason together with the computed occurrence date,
/// if the EMI overlapped the month far enough to compute one.
pub fn due_occurrence(
    emi: &emi::Model,
    period: &MonthPeriod,
    today: NaiveDate,
) -> std::result::Result<NaiveDate, (SkipReason, Option<NaiveDate>)> {
    if !period.overlaps(emi.start_date, emi.end_date) {
        return Err((SkipReason::OutsideWindow, None));
    }

    let occurrence = period.occurrence_date(emi.day_of_month);
    if occurrence < emi.start_date {
        return Err((SkipReason::BeforeStart, Some(occurrence)));
    }
    if occurrence > emi.end_date {
        return Err((SkipReason::AfterEnd, Some(occurrence)));
    }
    if occurrence > today {
        return Err((SkipReason::NotYetDue, Some(occurrence)));
    }

    Ok(occurrence)
}

/// Creates the expense for every active EMI of `user_id` that is due in `period`.
///
/// Idempotent: calling it again for the same month writes nothing new. Inactive EMIs
/// are ignored and expenses generated earlier are never modified.
///
/// # Arguments
/// * `db` - Database connection
/// * `user_id` - Owner whose EMIs are processed
/// * `period` - Target month
/// * `today` - Current calendar date; later occurrences are not generated yet
pub async fn materialize_month<C>(
    db: &C,
    user_id: &str,
    period: &MonthPeriod,
    today: NaiveDate,
) -> Result<MaterializationResult>
where
    C: ConnectionTrait,
{
    let emis = get_active_emis(db, user_id).await?;
    let mut occurrences = Vec::with_capacity(emis.len());

    for emi in emis {
        let (occurrence_date, outcome) = match due_occurrence(&emi, period, today) {
            Ok(date) => {
                let created = insert_if_absent(db, &emi, period, date).await?;
                let outcome = if created {
                    Outcome::Created
                } else {
                    Outcome::AlreadyPresent
                };
                (Some(date), outcome)
            }
            Err((reason, date)) => (date, Outcome::Skipped(reason)),
        };

        occurrences.push(Occurrence {
            emi_id: emi.id,
            title: emi.title,
            occurrence_date,
            outcome,
        });
    }

    let result = MaterializationResult {
        period: *period,
        occurrences,
    };

    if result.created_count() > 0 {
        info!(
            user_id,
            month = %period.key(),
            created = result.created_count(),
            "Materialized EMI expenses"
        );
    }
    debug!("{}", format_materialization_summary(&result));

    Ok(result)
}

/// Writes the month's expense for `emi` unless one already exists.
///
/// Returns `true` when a row was inserted. A conflict on the
/// `(user_id, emi_id, emi_month)` index is silently ignored.
async fn insert_if_absent<C>(
    db: &C,
    emi: &emi::Model,
    period: &MonthPeriod,
    occurrence: NaiveDate,
) -> Result<bool>
where
    C: ConnectionTrait,
{
    let model = expense::ActiveModel {
        user_id: Set(emi.user_id.clone()),
        title: Set(format!("{} (EMI)", emi.title)),
        amount: Set(emi.amount),
        category: Set(EMI_CATEGORY.to_string()),
        date: Set(crate::core::period::at_neutral_time(occurrence)),
        description: Set(Some(format!("Auto-generated EMI payment for {}", emi.title))),
        emi_id: Set(Some(emi.id)),
        emi_month: Set(Some(period.key())),
        created_at: Set(Utc::now().naive_utc()),
        ..Default::default()
    };

    let inserted = Expense::insert(model)
        .on_conflict(
            OnConflict::columns([
                expense::Column::UserId,
                expense::Column::EmiId,
                expense::Column::EmiMonth,
            ])
            .do_nothing()
            .to_owned(),
        )
        .exec_without_returning(db)
        .await?;

    Ok(inserted > 0)
}

/// Formats a materialization result into a human-readable summary string.
#[must_use]
pub fn format_materialization_summary(result: &MaterializationResult) -> String {
    use std::fmt::Write;

    let mut summary = format!(
        "EMI materialization - {} - {} EMIs, {} created\n",
        result.period,
        result.occurrences.len(),
        result.created_count()
    );

    for occurrence in &result.occurrences {
        let date = occurrence
            .occurrence_date
            .map_or_else(|| "-".to_string(), |d| d.format("%Y-%m-%d").to_string());
        let status = match occurrence.outcome {
            Outcome::Created => "created".to_string(),
            Outcome::AlreadyPresent => "already present".to_string(),
            Outcome::Skipped(reason) => format!("skipped ({reason})"),
        };
        // Writing to a String cannot fail
        let _ = writeln!(summary, "  {} [{}] {} | {}", occurrence.title, occurrence.emi_id, date, status);
    }

    summary
}
