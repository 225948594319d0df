//! Monthly ledger - The complete expense picture of one month.
//!
//! Reading a month first materializes the EMIs due in it, so the ledger never shows a
//! month that is missing an EMI payment that has already come due.

use crate::{
    core::{expense::get_expenses_in_window, materializer::materialize_month, period::MonthPeriod},
    entities::expense,
    errors::Result,
};
use chrono::{Datelike, NaiveDate};
use sea_orm::ConnectionTrait;
use std::collections::BTreeMap;

/// Aggregated view of a user's expenses for one month.
#[derive(Debug, Clone)]
pub struct MonthSummary {
    /// Calendar month, 1-12
    pub month: u32,
    /// Calendar year
    pub year: i32,
    /// Number of expenses in the month
    pub total_expenses: usize,
    /// Sum of all expense amounts
    pub total_amount: f64,
    /// Mean expense amount, 0 for an empty month
    pub average_amount: f64,
    /// All expenses, oldest first
    pub expenses: Vec<expense::Model>,
    /// Expenses grouped by ISO date (`YYYY-MM-DD`)
    pub expenses_by_date: BTreeMap<String, Vec<expense::Model>>,
    /// Total amount per day of month; days without expenses are absent
    pub daily_totals: BTreeMap<u32, f64>,
}

/// Loads the month for `user_id`, materializing due EMIs first.
///
/// # Arguments
/// * `db` - Database connection
/// * `user_id` - Owner of the ledger
/// * `month` - Calendar month, 1-12
/// * `year` - Calendar year
/// * `today` - Current calendar date, forwarded to the materializer
///
/// # Errors
/// Returns [`crate::errors::Error::InvalidMonth`] before touching the database when
/// `month` is out of range, and propagates materialization or query failures.
pub async fn get_month<C>(
    db: &C,
    user_id: &str,
    month: u32,
    year: i32,
    today: NaiveDate,
) -> Result<MonthSummary>
where
    C: ConnectionTrait,
{
    let period = MonthPeriod::new(year, month)?;

    materialize_month(db, user_id, &period, today).await?;

    let expenses = get_expenses_in_window(db, user_id, &period.window()).await?;
    Ok(summarize(&period, expenses))
}

/// Folds a month's expenses (already sorted by date) into a [`MonthSummary`].
#[must_use]
pub fn summarize(period: &MonthPeriod, expenses: Vec<expense::Model>) -> MonthSummary {
    let mut expenses_by_date: BTreeMap<String, Vec<expense::Model>> = BTreeMap::new();
    let mut daily_totals: BTreeMap<u32, f64> = BTreeMap::new();
    let mut total_amount = 0.0;

    for expense in &expenses {
        let date_key = expense.date.format("%Y-%m-%d").to_string();
        expenses_by_date
            .entry(date_key)
            .or_default()
            .push(expense.clone());
        *daily_totals.entry(expense.date.day()).or_insert(0.0) += expense.amount;
        total_amount += expense.amount;
    }

    let total_expenses = expenses.len();
    #[allow(clippy::cast_precision_loss)]
    let average_amount = if total_expenses == 0 {
        0.0
    } else {
        total_amount / total_expenses as f64
    };

    MonthSummary {
        month: period.month(),
        year: period.year(),
        total_expenses,
        total_amount,
        average_amount,
        expenses,
        expenses_by_date,
        daily_totals,
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::errors::Error;
    use crate::entities::Expense;
    use crate::test_utils::*;
    use chrono::{TimeZone, Utc};
    use sea_orm::{ActiveModelTrait, EntityTrait, PaginatorTrait, Set};

    #[tokio::test]
    async fn test_get_month_rejects_invalid_month() -> Result<()> {
        // The EMI is due every month of 2024, so a call that passed validation would write
        let (db, _emi) = setup_with_emi().await?;

        let result = get_month(&db, TEST_USER, 13, 2024, date(2024, 12, 31)).await;
        assert!(matches!(result.unwrap_err(), Error::InvalidMonth { month: 13 }));

        let result = get_month(&db, TEST_USER, 0, 2024, date(2024, 12, 31)).await;
        assert!(matches!(result.unwrap_err(), Error::InvalidMonth { month: 0 }));

        assert_eq!(Expense::find().count(&db).await?, 0);

        Ok(())
    }

    #[tokio::test]
    async fn test_aggregation_totals() -> Result<()> {
        let db = setup_test_db().await?;
        create_test_expense(&db, TEST_USER, "Groceries", 100.0, date(2024, 5, 3)).await?;
        create_test_expense(&db, TEST_USER, "Shoes", 250.0, date(2024, 5, 11)).await?;
        create_test_expense(&db, TEST_USER, "Taxi", 50.0, date(2024, 5, 27)).await?;

        let summary = get_month(&db, TEST_USER, 5, 2024, date(2024, 6, 1)).await?;

        assert_eq!(summary.month, 5);
        assert_eq!(summary.year, 2024);
        assert_eq!(summary.total_expenses, 3);
        assert_eq!(summary.total_amount, 400.0);
        assert_eq!(summary.daily_totals.values().sum::<f64>(), 400.0);
        assert_eq!(summary.daily_totals.get(&11), Some(&250.0));
        assert!(summary.daily_totals.get(&12).is_none());
        assert_eq!(summary.expenses_by_date.len(), 3);
        assert_eq!(summary.expenses_by_date["2024-05-03"][0].title, "Groceries");

        Ok(())
    }

    #[tokio::test]
    async fn test_same_day_expenses_grouped() -> Result<()> {
        let db = setup_test_db().await?;
        create_test_expense(&db, TEST_USER, "Coffee", 4.0, date(2024, 5, 3)).await?;
        create_test_expense(&db, TEST_USER, "Lunch", 16.0, date(2024, 5, 3)).await?;

        let summary = get_month(&db, TEST_USER, 5, 2024, date(2024, 6, 1)).await?;

        assert_eq!(summary.daily_totals.get(&3), Some(&20.0));
        let titles: Vec<&str> = summary.expenses_by_date["2024-05-03"]
            .iter()
            .map(|e| e.title.as_str())
            .collect();
        assert_eq!(titles, vec!["Coffee", "Lunch"]);
        assert_eq!(summary.average_amount, 10.0);

        Ok(())
    }

    #[tokio::test]
    async fn test_get_month_includes_due_emi() -> Result<()> {
        let (db, emi) = setup_with_emi().await?;
        create_test_expense(&db, TEST_USER, "Groceries", 100.0, date(2024, 8, 3)).await?;

        let summary = get_month(&db, TEST_USER, 8, 2024, date(2024, 8, 31)).await?;
        assert_eq!(summary.total_expenses, 2);
        assert_eq!(summary.total_amount, 600.0);
        assert_eq!(summary.expenses[1].emi_id, Some(emi.id));
        assert_eq!(summary.daily_totals.get(&15), Some(&500.0));

        // Reading again does not duplicate the EMI expense
        let again = get_month(&db, TEST_USER, 8, 2024, date(2024, 8, 31)).await?;
        assert_eq!(again.total_expenses, 2);

        Ok(())
    }

    #[tokio::test]
    async fn test_last_instant_of_month_belongs_to_that_month() -> Result<()> {
        let db = setup_test_db().await?;
        let last_instant = Utc
            .with_ymd_and_hms(2024, 3, 31, 23, 59, 59)
            .unwrap()
            .checked_add_signed(chrono::Duration::microseconds(999_500))
            .unwrap();

        expense::ActiveModel {
            user_id: Set(TEST_USER.to_string()),
            title: Set("Late night taxi".to_string()),
            amount: Set(42.0),
            category: Set("Travel".to_string()),
            date: Set(last_instant),
            created_at: Set(last_instant.naive_utc()),
            ..Default::default()
        }
        .insert(&db)
        .await?;

        let march = get_month(&db, TEST_USER, 3, 2024, date(2024, 4, 1)).await?;
        let april = get_month(&db, TEST_USER, 4, 2024, date(2024, 4, 1)).await?;
        assert_eq!(march.total_expenses, 1);
        assert_eq!(march.daily_totals.get(&31), Some(&42.0));
        assert_eq!(april.total_expenses, 0);

        Ok(())
    }

    #[tokio::test]
    async fn test_empty_month() -> Result<()> {
        let db = setup_test_db().await?;

        let summary = get_month(&db, TEST_USER, 2, 2024, date(2024, 3, 1)).await?;
        assert_eq!(summary.total_expenses, 0);
        assert_eq!(summary.total_amount, 0.0);
        assert_eq!(summary.average_amount, 0.0);
        assert!(summary.daily_totals.is_empty());
        assert!(summary.expenses_by_date.is_empty());

        Ok(())
    }

    #[tokio::test]
    async fn test_other_users_expenses_excluded() -> Result<()> {
        let db = setup_test_db().await?;
        create_test_expense(&db, TEST_USER, "Mine", 10.0, date(2024, 5, 3)).await?;
        create_test_expense(&db, OTHER_USER, "Theirs", 99.0, date(2024, 5, 3)).await?;

        let summary = get_month(&db, TEST_USER, 5, 2024, date(2024, 6, 1)).await?;
        assert_eq!(summary.total_expenses, 1);
        assert_eq!(summary.total_amount, 10.0);

        Ok(())
    }
}
