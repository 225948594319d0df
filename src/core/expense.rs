//! Expense business logic - Manual expense entry and owner-scoped lookups.
//!
//! Expenses generated from EMIs live in the same table. Their title, amount, category
//! and date mirror the EMI terms they were generated from, so updates touching those
//! fields are refused; only the description of a generated expense may change.

use crate::{
    core::{
        emi,
        period::{MonthWindow, at_neutral_time},
        validation::{require_text, validate_amount},
    },
    entities::{Expense, emi as emi_entity, expense},
    errors::{Error, Result},
};
use chrono::{NaiveDate, SubsecRound};
use sea_orm::{QueryOrder, Set, prelude::*};
use serde::Deserialize;
use tracing::info;

/// A manually entered expense.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NewExpense {
    /// Short title
    pub title: String,
    /// Positive amount
    pub amount: f64,
    /// Free-form category
    pub category: String,
    /// Day the expense belongs to; defaults to now
    pub date: Option<NaiveDate>,
    /// Optional longer description
    pub description: Option<String>,
}

/// Partial update of an expense. Absent fields keep their stored value.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ExpenseChanges {
    /// New title
    pub title: Option<String>,
    /// New amount
    pub amount: Option<f64>,
    /// New category
    pub category: Option<String>,
    /// New day
    pub date: Option<NaiveDate>,
    /// New description
    pub description: Option<String>,
}

impl ExpenseChanges {
    /// First field set here that a generated expense does not allow editing.
    fn locked_field(&self) -> Option<&'static str> {
        if self.title.is_some() {
            Some("title")
        } else if self.amount.is_some() {
            Some("amount")
        } else if self.category.is_some() {
            Some("category")
        } else if self.date.is_some() {
            Some("date")
        } else {
            None
        }
    }
}

/// Where an expense came from.
#[derive(Debug, Clone, PartialEq)]
pub enum ExpenseSource {
    /// Entered by the user
    Manual,
    /// Generated from an EMI that still exists
    Linked(emi_entity::Model),
    /// Generated from an EMI that has since been deleted
    Orphaned(i64),
}

/// Records a manual expense.
///
/// A missing date means "now"; a supplied calendar date is stored at midday UTC so it
/// reads as the same day everywhere.
///
/// # Errors
/// Returns an error if the title or category is blank, the amount is not a positive
/// finite number, or the insert fails.
pub async fn create_expense<C>(db: &C, user_id: &str, new_expense: NewExpense) -> Result<expense::Model>
where
    C: ConnectionTrait,
{
    let title = require_text(&new_expense.title, "Title")?;
    let category = require_text(&new_expense.category, "Category")?;
    let amount = validate_amount(new_expense.amount)?;

    // Stored instants carry millisecond precision
    let now = chrono::Utc::now().trunc_subsecs(3);
    let date = new_expense.date.map_or(now, at_neutral_time);

    let model = expense::ActiveModel {
        user_id: Set(user_id.to_string()),
        title: Set(title),
        amount: Set(amount),
        category: Set(category),
        date: Set(date),
        description: Set(new_expense.description),
        emi_id: Set(None),
        emi_month: Set(None),
        created_at: Set(now.naive_utc()),
        ..Default::default()
    };

    let created = model.insert(db).await?;
    info!(user_id, expense_id = created.id, "Created expense '{}'", created.title);
    Ok(created)
}

/// Finds an expense by id, returning None if it does not exist or belongs to someone else.
pub async fn find_expense<C>(db: &C, user_id: &str, expense_id: i64) -> Result<Option<expense::Model>>
where
    C: ConnectionTrait,
{
    Expense::find_by_id(expense_id)
        .filter(expense::Column::UserId.eq(user_id))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Retrieves an expense owned by `user_id`.
///
/// # Errors
/// [`Error::ExpenseNotFound`] if the expense is missing or owned by another user.
pub async fn get_expense<C>(db: &C, user_id: &str, expense_id: i64) -> Result<expense::Model>
where
    C: ConnectionTrait,
{
    find_expense(db, user_id, expense_id)
        .await?
        .ok_or(Error::ExpenseNotFound { id: expense_id })
}

/// All expenses of a user inside the half-open `window`, oldest first, ties in
/// insertion order.
pub async fn get_expenses_in_window<C>(
    db: &C,
    user_id: &str,
    window: &MonthWindow,
) -> Result<Vec<expense::Model>>
where
    C: ConnectionTrait,
{
    Expense::find()
        .filter(expense::Column::UserId.eq(user_id))
        .filter(expense::Column::Date.gte(window.start))
        .filter(expense::Column::Date.lt(window.end))
        .order_by_asc(expense::Column::Date)
        .order_by_asc(expense::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Applies a partial update to an expense.
///
/// # Errors
/// Returns a validation error for a blank title/category or non-positive amount,
/// [`Error::ReadOnlyField`] when editing a protected field of a generated expense, and
/// [`Error::ExpenseNotFound`] if the expense is not visible to `user_id`.
pub async fn update_expense<C>(
    db: &C,
    user_id: &str,
    expense_id: i64,
    changes: ExpenseChanges,
) -> Result<expense::Model>
where
    C: ConnectionTrait,
{
    let title = changes
        .title
        .as_deref()
        .map(|t| require_text(t, "Title"))
        .transpose()?;
    let category = changes
        .category
        .as_deref()
        .map(|c| require_text(c, "Category"))
        .transpose()?;
    let amount = changes.amount.map(validate_amount).transpose()?;

    let existing = get_expense(db, user_id, expense_id).await?;
    if existing.is_emi() {
        if let Some(field) = changes.locked_field() {
            return Err(Error::ReadOnlyField { field });
        }
    }

    let mut active: expense::ActiveModel = existing.into();
    if let Some(title) = title {
        active.title = Set(title);
    }
    if let Some(amount) = amount {
        active.amount = Set(amount);
    }
    if let Some(category) = category {
        active.category = Set(category);
    }
    if let Some(date) = changes.date {
        active.date = Set(at_neutral_time(date));
    }
    if let Some(description) = changes.description {
        active.description = Set(Some(description));
    }

    active.update(db).await.map_err(Into::into)
}

/// Permanently deletes an expense.
///
/// Deleting a generated expense frees its month slot, so the next materialization of
/// that month recreates it while the EMI is still active.
///
/// # Errors
/// [`Error::ExpenseNotFound`] if nothing owned by `user_id` matched.
pub async fn delete_expense<C>(db: &C, user_id: &str, expense_id: i64) -> Result<()>
where
    C: ConnectionTrait,
{
    let result = Expense::delete_many()
        .filter(expense::Column::Id.eq(expense_id))
        .filter(expense::Column::UserId.eq(user_id))
        .exec(db)
        .await?;

    if result.rows_affected == 0 {
        return Err(Error::ExpenseNotFound { id: expense_id });
    }

    info!(user_id, expense_id, "Deleted expense");
    Ok(())
}

/// Resolves the EMI an expense was generated from, if any.
pub async fn resolve_source<C>(db: &C, expense: &expense::Model) -> Result<ExpenseSource>
where
    C: ConnectionTrait,
{
    let Some(emi_id) = expense.emi_id else {
        return Ok(ExpenseSource::Manual);
    };

    Ok(emi::find_emi(db, &expense.user_id, emi_id)
        .await?
        .map_or(ExpenseSource::Orphaned(emi_id), ExpenseSource::Linked))
}
