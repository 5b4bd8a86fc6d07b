//! Admin-only views: user listing and the cross-user spending overview.

use axum::extract::{Query, State};
use axum::Json;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::db::models::{Expense, UserSummary};
use crate::error::AppError;
use crate::middleware::auth::RequireAdmin;
use crate::router::AppState;
use crate::service::aggregate::{aggregate, AggregateReport, ExpenseFilter};

/// GET /api/admin/users
pub async fn list_users(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> Result<Json<Vec<UserSummary>>, AppError> {
    let users = state.store.list_users().await?;
    Ok(Json(users.into_iter().map(UserSummary::from).collect()))
}

/// GET /api/admin/expenses -> raw expense rows across every user,
/// filterable like the per-user listing.
pub async fn list_expenses(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Query(filter): Query<ExpenseFilter>,
) -> Result<Json<Vec<Expense>>, AppError> {
    let expenses = state.store.list_all_expenses().await?;
    let filtered = filter.apply(&expenses)?;
    Ok(Json(filtered.into_iter().cloned().collect()))
}

#[derive(Debug, Serialize)]
pub struct UserTotal {
    pub user_id: i64,
    pub username: String,
    pub grand_total: Decimal,
}

#[derive(Debug, Serialize)]
pub struct AdminOverview {
    /// Aggregates over the pooled expense set of every user.
    pub system: AggregateReport,
    pub per_user: Vec<UserTotal>,
}

/// GET /api/admin/overview -> system-wide totals plus one grand total
/// per user, over the same optional date filter.
pub async fn overview(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Query(filter): Query<ExpenseFilter>,
) -> Result<Json<AdminOverview>, AppError> {
    let all_expenses = state.store.list_all_expenses().await?;
    let system = aggregate(&all_expenses, &filter)?;

    let users = state.store.list_users().await?;
    let mut per_user = Vec::with_capacity(users.len());
    for user in users {
        let slice: Vec<_> = all_expenses
            .iter()
            .filter(|e| e.user_id == user.id)
            .cloned()
            .collect();
        let report = aggregate(&slice, &filter)?;
        per_user.push(UserTotal {
            user_id: user.id,
            username: user.username,
            grand_total: report.grand_total,
        });
    }

    Ok(Json(AdminOverview { system, per_user }))
}
