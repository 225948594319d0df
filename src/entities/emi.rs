//! EMI entity - A recurring fixed-amount installment owned by a user.
//!
//! Each EMI charges `amount` once per calendar month on `day_of_month`, for every
//! month between `start_date` and `end_date` (both inclusive). Deactivated EMIs are
//! kept but no longer generate expenses.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// EMI database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "emis")]
pub struct Model {
    /// Unique identifier for the EMI
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Identity of the owning user
    pub user_id: String,
    /// Human-readable name (e.g., "Car Loan")
    pub title: String,
    /// Amount charged each month
    pub amount: f64,
    /// First day the EMI is in effect (inclusive)
    pub start_date: Date,
    /// Last day the EMI is in effect (inclusive), always after `start_date`
    pub end_date: Date,
    /// Nominal day of the month the charge falls on (1-31)
    pub day_of_month: i32,
    /// Whether the EMI still generates monthly expenses
    pub is_active: bool,
    /// When the EMI was created
    pub created_at: DateTime,
    /// When the EMI was last modified
    pub updated_at: DateTime,
}

/// EMIs are only referenced weakly by expenses, so no relations are declared
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
