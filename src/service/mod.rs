//! Pure domain services: everything here operates on already-fetched
//! data and never touches the database.

pub mod aggregate;
pub mod budget;
pub mod export;
pub mod password;

pub use aggregate::{AggregateReport, ExpenseFilter, MonthTotal, aggregate, monthly_trend_window};
pub use budget::{BudgetReport, BudgetStatus, evaluate_budget, validate_budget};
