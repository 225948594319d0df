//! Entity module - Contains all SeaORM entity definitions for the database.
//! These entities represent the database tables. Each entity has a Model struct
//! for data and an Entity struct for operations.

pub mod emi;
pub mod expense;

// Re-export specific types to avoid conflicts
pub use emi::{Column as EmiColumn, Entity as Emi, Model as EmiModel};
pub use expense::{Column as ExpenseColumn, Entity as Expense, Model as ExpenseModel};
