//! JSON shapes returned by the HTTP layer.
//!
//! Keys are camelCase to match what the web client expects.
#![allow(missing_docs)]

use crate::{
    core::{ledger::MonthSummary, report::EmiProgress},
    entities::{emi, expense},
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

/// An EMI as returned to clients.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmiView {
    pub id: i64,
    pub title: String,
    pub amount: f64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub day_of_month: i32,
    pub is_active: bool,
}

impl From<emi::Model> for EmiView {
    fn from(model: emi::Model) -> Self {
        Self {
            id: model.id,
            title: model.title,
            amount: model.amount,
            start_date: model.start_date,
            end_date: model.end_date,
            day_of_month: model.day_of_month,
            is_active: model.is_active,
        }
    }
}

/// An expense as returned to clients.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseView {
    pub id: i64,
    pub title: String,
    pub amount: f64,
    pub category: String,
    pub date: DateTime<Utc>,
    pub description: Option<String>,
    pub emi_id: Option<i64>,
    pub is_emi: bool,
}

impl From<expense::Model> for ExpenseView {
    fn from(model: expense::Model) -> Self {
        Self {
            is_emi: model.is_emi(),
            id: model.id,
            title: model.title,
            amount: model.amount,
            category: model.category,
            date: model.date,
            description: model.description,
            emi_id: model.emi_id,
        }
    }
}

/// A month of expenses as returned to clients.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthSummaryView {
    pub month: u32,
    pub year: i32,
    pub total_expenses: usize,
    pub total_amount: f64,
    pub average_amount: f64,
    pub expenses: Vec<ExpenseView>,
    pub expenses_by_date: BTreeMap<String, Vec<ExpenseView>>,
    pub daily_totals: BTreeMap<u32, f64>,
}

impl From<MonthSummary> for MonthSummaryView {
    fn from(summary: MonthSummary) -> Self {
        Self {
            month: summary.month,
            year: summary.year,
            total_expenses: summary.total_expenses,
            total_amount: summary.total_amount,
            average_amount: summary.average_amount,
            expenses: summary.expenses.into_iter().map(Into::into).collect(),
            expenses_by_date: summary
                .expenses_by_date
                .into_iter()
                .map(|(day, items)| (day, items.into_iter().map(Into::into).collect()))
                .collect(),
            daily_totals: summary.daily_totals,
        }
    }
}

/// Repayment progress of an EMI as returned to clients.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmiProgressView {
    pub emi: EmiView,
    pub total_installments: u32,
    pub installments_paid: u32,
    pub installments_remaining: u32,
    pub total_amount: f64,
    pub amount_paid: f64,
    pub amount_remaining: f64,
    pub progress_percent: f64,
    pub progress_bar: String,
    pub next_due: Option<NaiveDate>,
}

impl From<EmiProgress> for EmiProgressView {
    fn from(progress: EmiProgress) -> Self {
        Self {
            progress_bar: crate::core::report::format_progress_bar(progress.progress_percent, None),
            emi: progress.emi.into(),
            total_installments: progress.total_installments,
            installments_paid: progress.installments_paid,
            installments_remaining: progress.installments_remaining,
            total_amount: progress.total_amount,
            amount_paid: progress.amount_paid,
            amount_remaining: progress.amount_remaining,
            progress_percent: progress.progress_percent,
            next_due: progress.next_due,
        }
    }
}
