//! Database module: models, schema and the expense store.
//!
//! Layout:
//! - `models.rs`: typed rows decoded at the store boundary
//! - `schema.rs`: SQL DDL for initializing the database (SQLite)
//! - `store.rs`: all SQL behind `ExpenseStore`

pub mod models;
pub mod schema;
pub mod store;

pub use models::{Expense, NewExpense, Role, User};
pub use schema::SQLITE_INIT;
pub use store::{ExpenseStore, SqlitePool};
