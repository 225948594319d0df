//! Database configuration module for the EMI ledger.
//!
//! This module handles `SQLite` database connection and table creation using `SeaORM`.
//! Tables are generated from the entity definitions with `Schema::create_table_from_entity`,
//! so the schema always matches the Rust structs. The one constraint the entities cannot
//! express, the composite unique index that allows a single generated expense per EMI per
//! month, is created here as well.

use crate::entities::{Emi, Expense, expense};
use crate::errors::Result;
use sea_orm::{
    ConnectionTrait, Database, DatabaseConnection, Schema,
    sea_query::{Index, IndexCreateStatement},
};
use std::path::Path;
use tracing::info;

/// Name of the index guarding one generated expense per EMI per month
pub const EMI_MONTH_INDEX: &str = "idx_expenses_user_emi_month";

/// Establishes a connection to the database at `database_url`.
///
/// The returned handle is a pool; clone it freely and call
/// [`DatabaseConnection::close`] once on shutdown.
pub async fn create_connection(database_url: &str) -> Result<DatabaseConnection> {
    info!("Connecting to database at {database_url}");
    Database::connect(database_url).await.map_err(Into::into)
}

/// Creates the parent directory of a file-backed `SQLite` URL.
///
/// `sqlite://data/ledger.sqlite?mode=rwc` creates the file but not `data/`. In-memory
/// and non-SQLite URLs are left alone.
pub fn ensure_sqlite_parent_dir(database_url: &str) -> Result<()> {
    let Some(rest) = database_url.strip_prefix("sqlite:") else {
        return Ok(());
    };
    let rest = rest.trim_start_matches("//");
    let file = rest.split('?').next().unwrap_or_default();
    if file.is_empty() || file == ":memory:" {
        return Ok(());
    }

    if let Some(parent) = Path::new(file).parent().filter(|p| !p.as_os_str().is_empty()) {
        if !parent.exists() {
            info!("Creating database directory {}", parent.display());
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

/// Creates all tables and indexes if they do not already exist.
///
/// Safe to run on every startup.
pub async fn create_tables(db: &DatabaseConnection) -> Result<()> {
    let builder = db.get_database_backend();
    let schema = Schema::new(builder);

    let mut emi_table = schema.create_table_from_entity(Emi);
    emi_table.if_not_exists();
    let mut expense_table = schema.create_table_from_entity(Expense);
    expense_table.if_not_exists();

    db.execute(builder.build(&emi_table)).await?;
    db.execute(builder.build(&expense_table)).await?;
    db.execute(builder.build(&emi_month_index())).await?;

    Ok(())
}

/// Unique index over `(user_id, emi_id, emi_month)`.
///
/// Manual expenses leave `emi_id` and `emi_month` NULL, and NULLs never collide in a
/// unique index, so the constraint only binds generated expenses.
fn emi_month_index() -> IndexCreateStatement {
    Index::create()
        .name(EMI_MONTH_INDEX)
        .table(Expense)
        .col(expense::Column::UserId)
        .col(expense::Column::EmiId)
        .col(expense::Column::EmiMonth)
        .unique()
        .if_not_exists()
        .to_owned()
}
