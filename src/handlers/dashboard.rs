use axum::extract::{Query, State};
use axum::Json;
use chrono::{Datelike, Local};
use serde::Serialize;

use crate::error::AppError;
use crate::middleware::auth::CurrentUser;
use crate::router::AppState;
use crate::service::aggregate::{
    aggregate, monthly_trend_window, AggregateReport, ExpenseFilter, MonthTotal,
    TREND_WINDOW_MONTHS,
};
use crate::service::budget::{evaluate_budget, BudgetReport};

#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    /// Aggregates over the requested filter (or everything, unfiltered).
    pub summary: AggregateReport,
    /// Budget status for the current calendar month, independent of the
    /// view filter.
    pub budget: BudgetReport,
    /// Fixed 12-month trend ending at the current month; months without
    /// expenses contribute zero.
    pub trend_window: Vec<MonthTotal>,
}

/// GET /api/dashboard -> aggregates plus budget status for the caller.
pub async fn dashboard(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(filter): Query<ExpenseFilter>,
) -> Result<Json<DashboardResponse>, AppError> {
    let expenses = state.store.list_expenses(user.id).await?;
    let summary = aggregate(&expenses, &filter)?;

    let today = Local::now().date_naive();
    let current_month = aggregate(&expenses, &ExpenseFilter::month_of(today.year(), today.month()))?;
    let budget = evaluate_budget(user.budget, current_month.grand_total);

    let trend_window =
        monthly_trend_window(&expenses, today.year(), today.month(), TREND_WINDOW_MONTHS)?;

    Ok(Json(DashboardResponse {
        summary,
        budget,
        trend_window,
    }))
}
