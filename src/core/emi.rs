//! EMI business logic - Create, read, update and delete recurring installments.
//!
//! Every operation is scoped to an owning user. Looking up an EMI that belongs to
//! someone else behaves exactly like looking up one that does not exist, so callers
//! cannot probe for other users' records.

use crate::{
    core::validation::{require_text, validate_amount, validate_date_range, validate_day_of_month},
    entities::{Emi, emi},
    errors::{Error, Result},
};
use chrono::NaiveDate;
use sea_orm::{QueryOrder, Set, prelude::*};
use serde::Deserialize;
use tracing::info;

/// Terms of a new EMI.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NewEmi {
    /// Display title
    pub title: String,
    /// Monthly amount
    pub amount: f64,
    /// First day in effect (inclusive)
    pub start_date: NaiveDate,
    /// Last day in effect (inclusive)
    pub end_date: NaiveDate,
    /// Nominal day of month, 1-31
    pub day_of_month: i32,
}

/// Partial update of an EMI. Absent fields keep their stored value.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct EmiChanges {
    /// New title
    pub title: Option<String>,
    /// New monthly amount
    pub amount: Option<f64>,
    /// New start date
    pub start_date: Option<NaiveDate>,
    /// New end date
    pub end_date: Option<NaiveDate>,
    /// New nominal day of month
    pub day_of_month: Option<i32>,
    /// Activate or deactivate the EMI
    pub is_active: Option<bool>,
}

/// Creates a new active EMI after validating its terms.
///
/// # Errors
/// Returns an error if:
/// - The title is empty or whitespace-only
/// - The amount is not a positive finite number
/// - The day of month is outside 1..=31
/// - The end date is not after the start date
/// - The database insert fails
pub async fn create_emi<C>(db: &C, user_id: &str, new_emi: NewEmi) -> Result<emi::Model>
where
    C: ConnectionTrait,
{
    let title = require_text(&new_emi.title, "Title")?;
    let amount = validate_amount(new_emi.amount)?;
    let day_of_month = validate_day_of_month(new_emi.day_of_month)?;
    validate_date_range(new_emi.start_date, new_emi.end_date)?;

    let now = chrono::Utc::now().naive_utc();
    let model = emi::ActiveModel {
        user_id: Set(user_id.to_string()),
        title: Set(title),
        amount: Set(amount),
        start_date: Set(new_emi.start_date),
        end_date: Set(new_emi.end_date),
        day_of_month: Set(day_of_month),
        is_active: Set(true),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };

    let created = model.insert(db).await?;
    info!(user_id, emi_id = created.id, "Created EMI '{}'", created.title);
    Ok(created)
}

/// Lists all EMIs of a user, newest first.
pub async fn list_emis<C>(db: &C, user_id: &str) -> Result<Vec<emi::Model>>
where
    C: ConnectionTrait,
{
    Emi::find()
        .filter(emi::Column::UserId.eq(user_id))
        .order_by_desc(emi::Column::CreatedAt)
        .order_by_desc(emi::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Lists the EMIs of a user that still generate expenses.
pub async fn get_active_emis<C>(db: &C, user_id: &str) -> Result<Vec<emi::Model>>
where
    C: ConnectionTrait,
{
    Emi::find()
        .filter(emi::Column::UserId.eq(user_id))
        .filter(emi::Column::IsActive.eq(true))
        .order_by_asc(emi::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Finds an EMI by id, returning None if it does not exist or belongs to someone else.
pub async fn find_emi<C>(db: &C, user_id: &str, emi_id: i64) -> Result<Option<emi::Model>>
where
    C: ConnectionTrait,
{
    Emi::find_by_id(emi_id)
        .filter(emi::Column::UserId.eq(user_id))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Retrieves an EMI owned by `user_id`.
///
/// # Errors
/// [`Error::EmiNotFound`] if the EMI is missing or owned by another user.
pub async fn get_emi<C>(db: &C, user_id: &str, emi_id: i64) -> Result<emi::Model>
where
    C: ConnectionTrait,
{
    find_emi(db, user_id, emi_id)
        .await?
        .ok_or(Error::EmiNotFound { id: emi_id })
}

/// Applies a partial update to an EMI.
///
/// Each supplied field is validated on its own, then the start/end ordering is checked
/// against the merged record so a partial update can never store `end <= start`.
///
/// # Errors
/// Returns a validation error for any invalid field or merged range, and
/// [`Error::EmiNotFound`] if the EMI is not visible to `user_id`.
pub async fn update_emi<C>(
    db: &C,
    user_id: &str,
    emi_id: i64,
    changes: EmiChanges,
) -> Result<emi::Model>
where
    C: ConnectionTrait,
{
    let title = changes
        .title
        .as_deref()
        .map(|t| require_text(t, "Title"))
        .transpose()?;
    let amount = changes.amount.map(validate_amount).transpose()?;
    let day_of_month = changes.day_of_month.map(validate_day_of_month).transpose()?;

    let existing = get_emi(db, user_id, emi_id).await?;

    let start_date = changes.start_date.unwrap_or(existing.start_date);
    let end_date = changes.end_date.unwrap_or(existing.end_date);
    validate_date_range(start_date, end_date)?;

    let mut active: emi::ActiveModel = existing.into();
    if let Some(title) = title {
        active.title = Set(title);
    }
    if let Some(amount) = amount {
        active.amount = Set(amount);
    }
    if let Some(day_of_month) = day_of_month {
        active.day_of_month = Set(day_of_month);
    }
    if let Some(is_active) = changes.is_active {
        active.is_active = Set(is_active);
    }
    active.start_date = Set(start_date);
    active.end_date = Set(end_date);
    active.updated_at = Set(chrono::Utc::now().naive_utc());

    active.update(db).await.map_err(Into::into)
}

/// Permanently deletes an EMI. Expenses it already generated are kept.
///
/// # Errors
/// [`Error::EmiNotFound`] if nothing owned by `user_id` matched.
pub async fn delete_emi<C>(db: &C, user_id: &str, emi_id: i64) -> Result<()>
where
    C: ConnectionTrait,
{
    let result = Emi::delete_many()
        .filter(emi::Column::Id.eq(emi_id))
        .filter(emi::Column::UserId.eq(user_id))
        .exec(db)
        .await?;

    if result.rows_affected == 0 {
        return Err(Error::EmiNotFound { id: emi_id });
    }

    info!(user_id, emi_id, "Deleted EMI");
    Ok(())
}
