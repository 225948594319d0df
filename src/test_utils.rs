//! Shared test utilities for the EMI ledger.
//!
//! This module provides common helper functions for setting up test databases
//! and creating test records with sensible defaults.

use crate::{
    core::{
        emi::{self, NewEmi},
        expense::{self, NewExpense},
    },
    entities,
    errors::Result,
};
use chrono::NaiveDate;
use sea_orm::DatabaseConnection;

/// Owner used by most tests
pub const TEST_USER: &str = "user-1";

/// A second owner for isolation tests
pub const OTHER_USER: &str = "user-2";

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Shorthand for building a calendar date in tests.
///
/// # Panics
/// Panics on an invalid date; test inputs are literals.
#[allow(clippy::unwrap_used)]
#[must_use]
pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

/// Creates a test EMI for [`TEST_USER`] with custom terms.
pub async fn create_test_emi(
    db: &DatabaseConnection,
    title: &str,
    amount: f64,
    start_date: NaiveDate,
    end_date: NaiveDate,
    day_of_month: i32,
) -> Result<entities::emi::Model> {
    emi::create_emi(
        db,
        TEST_USER,
        NewEmi {
            title: title.to_string(),
            amount,
            start_date,
            end_date,
            day_of_month,
        },
    )
    .await
}

/// Creates a manual test expense for `user_id`.
///
/// # Defaults
/// * `category`: "Food"
/// * `description`: None
pub async fn create_test_expense(
    db: &DatabaseConnection,
    user_id: &str,
    title: &str,
    amount: f64,
    on: NaiveDate,
) -> Result<entities::expense::Model> {
    expense::create_expense(
        db,
        user_id,
        NewExpense {
            title: title.to_string(),
            amount,
            category: "Food".to_string(),
            date: Some(on),
            description: None,
        },
    )
    .await
}

/// Sets up a database with a single year-long EMI due on the 15th.
/// Returns (db, emi) for common materializer scenarios.
pub async fn setup_with_emi() -> Result<(DatabaseConnection, entities::emi::Model)> {
    let db = setup_test_db().await?;
    let emi = create_test_emi(
        &db,
        "Car Loan",
        500.0,
        date(2024, 1, 1),
        date(2024, 12, 31),
        15,
    )
    .await?;
    Ok((db, emi))
}
