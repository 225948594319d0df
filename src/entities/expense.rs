//! Expense entity - A single dated expense owned by a user.
//!
//! Expenses are either entered manually or generated from an EMI. Generated expenses
//! carry the `emi_id` of their source and the `emi_month` key (`YYYY-MM`) of the month
//! they were generated for; the unique index over `(user_id, emi_id, emi_month)`
//! guarantees one generated expense per EMI per month.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Category assigned to every EMI-generated expense
pub const EMI_CATEGORY: &str = "EMI";

/// Expense database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "expenses")]
pub struct Model {
    /// Unique identifier for the expense
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Identity of the owning user
    pub user_id: String,
    /// Short title shown in the ledger
    pub title: String,
    /// Expense amount, always positive
    pub amount: f64,
    /// Free-form category; `"EMI"` for generated expenses
    pub category: String,
    /// Instant the expense is attributed to
    pub date: DateTimeUtc,
    /// Optional longer description
    pub description: Option<String>,
    /// Source EMI for generated expenses (weak reference, the EMI may be gone)
    pub emi_id: Option<i64>,
    /// Month key (`YYYY-MM`) of the generation window for EMI expenses
    pub emi_month: Option<String>,
    /// When the record was inserted
    pub created_at: DateTime,
}

impl Model {
    /// Whether this expense was generated from an EMI.
    #[must_use]
    pub const fn is_emi(&self) -> bool {
        self.emi_id.is_some()
    }
}

/// `Expense` has no enforced relationships; `emi_id` is resolved by lookup
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
