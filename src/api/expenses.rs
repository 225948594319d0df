//! `/expenses` handlers.

use super::{
    AppState,
    auth::CurrentUser,
    views::{ExpenseView, MonthSummaryView},
};
use crate::{
    core::{
        expense::{self, ExpenseChanges, NewExpense},
        ledger,
    },
    errors::Result,
};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::{Datelike, Utc};
use serde::Deserialize;
use serde_json::{Value, json};

/// Query parameters of the month listing. Missing values default to the current month.
#[derive(Debug, Deserialize)]
pub struct MonthQuery {
    month: Option<u32>,
    year: Option<i32>,
}

/// `POST /expenses`
pub async fn create_expense(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Json(payload): Json<NewExpense>,
) -> Result<(StatusCode, Json<Value>)> {
    let created = expense::create_expense(&state.db, &user_id, payload).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Expense created successfully",
            "expense": ExpenseView::from(created),
        })),
    ))
}

/// `GET /expenses?month=&year=`
///
/// Materializes the month's due EMIs before listing.
pub async fn get_month(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Query(query): Query<MonthQuery>,
) -> Result<Json<MonthSummaryView>> {
    let today = Utc::now().date_naive();
    let month = query.month.unwrap_or_else(|| today.month());
    let year = query.year.unwrap_or_else(|| today.year());

    let summary = ledger::get_month(&state.db, &user_id, month, year, today).await?;
    Ok(Json(summary.into()))
}

/// `GET /expenses/{id}`
pub async fn get_expense(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Path(expense_id): Path<i64>,
) -> Result<Json<Value>> {
    let found = expense::get_expense(&state.db, &user_id, expense_id).await?;
    Ok(Json(json!({ "expense": ExpenseView::from(found) })))
}

/// `PATCH /expenses/{id}`
pub async fn update_expense(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Path(expense_id): Path<i64>,
    Json(changes): Json<ExpenseChanges>,
) -> Result<Json<Value>> {
    let updated = expense::update_expense(&state.db, &user_id, expense_id, changes).await?;
    Ok(Json(json!({
        "message": "Expense updated successfully",
        "expense": ExpenseView::from(updated),
    })))
}

/// `DELETE /expenses/{id}`
pub async fn delete_expense(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Path(expense_id): Path<i64>,
) -> Result<Json<Value>> {
    expense::delete_expense(&state.db, &user_id, expense_id).await?;
    Ok(Json(json!({
        "message": "Expense deleted successfully",
        "id": expense_id,
    })))
}
