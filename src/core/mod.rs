//! Core business logic - framework-agnostic EMI, expense and ledger operations.
//!
//! Every function takes the database handle explicitly and scopes its queries to the
//! owning user id it is given.

/// EMI create/read/update/delete
pub mod emi;
/// Manual expense operations and owner-scoped lookups
pub mod expense;
/// Month summaries built on top of materialization
pub mod ledger;
/// Generation of expenses from due EMIs
pub mod materializer;
/// Calendar month windows and day clamping
pub mod period;
/// EMI repayment progress
pub mod report;
/// Shared field validation
pub mod validation;
