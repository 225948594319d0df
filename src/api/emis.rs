//! `/emis` handlers.

use super::{AppState, auth::CurrentUser, views::{EmiProgressView, EmiView}};
use crate::{
    core::{
        emi::{self, EmiChanges, NewEmi},
        report,
    },
    errors::Result,
};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::Utc;
use serde_json::{Value, json};

/// `POST /emis`
pub async fn create_emi(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Json(payload): Json<NewEmi>,
) -> Result<(StatusCode, Json<Value>)> {
    let created = emi::create_emi(&state.db, &user_id, payload).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "EMI created successfully",
            "emi": EmiView::from(created),
        })),
    ))
}

/// `GET /emis`
pub async fn list_emis(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
) -> Result<Json<Value>> {
    let emis: Vec<EmiView> = emi::list_emis(&state.db, &user_id)
        .await?
        .into_iter()
        .map(Into::into)
        .collect();
    Ok(Json(json!({ "emis": emis })))
}

/// `GET /emis/{id}`
pub async fn get_emi(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Path(emi_id): Path<i64>,
) -> Result<Json<Value>> {
    let found = emi::get_emi(&state.db, &user_id, emi_id).await?;
    Ok(Json(json!({ "emi": EmiView::from(found) })))
}

/// `PATCH /emis/{id}`
pub async fn update_emi(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Path(emi_id): Path<i64>,
    Json(changes): Json<EmiChanges>,
) -> Result<Json<Value>> {
    let updated = emi::update_emi(&state.db, &user_id, emi_id, changes).await?;
    Ok(Json(json!({
        "message": "EMI updated successfully",
        "emi": EmiView::from(updated),
    })))
}

/// `DELETE /emis/{id}`
pub async fn delete_emi(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Path(emi_id): Path<i64>,
) -> Result<Json<Value>> {
    emi::delete_emi(&state.db, &user_id, emi_id).await?;
    Ok(Json(json!({
        "message": "EMI deleted successfully",
        "id": emi_id,
    })))
}

/// `GET /emis/{id}/progress`
pub async fn emi_progress(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Path(emi_id): Path<i64>,
) -> Result<Json<EmiProgressView>> {
    let today = Utc::now().date_naive();
    let progress = report::generate_emi_progress(&state.db, &user_id, emi_id, today).await?;
    Ok(Json(progress.into()))
}
