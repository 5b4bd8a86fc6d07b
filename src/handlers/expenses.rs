use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use tracing::info;

use crate::db::models::{Expense, NewExpense, User};
use crate::error::AppError;
use crate::middleware::auth::CurrentUser;
use crate::router::AppState;
use crate::service::aggregate::ExpenseFilter;
use crate::service::export;

/// GET /api/expenses -> the caller's expenses, optionally filtered by
/// `start`, `end`, `year` and/or `month` query parameters.
pub async fn list(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(filter): Query<ExpenseFilter>,
) -> Result<Json<Vec<Expense>>, AppError> {
    let expenses = state.store.list_expenses(user.id).await?;
    let filtered = filter.apply(&expenses)?;
    Ok(Json(filtered.into_iter().cloned().collect()))
}

/// POST /api/expenses -> records a new expense for the caller.
pub async fn create(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(payload): Json<NewExpense>,
) -> Result<impl IntoResponse, AppError> {
    let payload = payload.validated()?;
    let expense = state.store.insert_expense(user.id, &payload).await?;
    info!(user_id = user.id, expense_id = expense.id, "expense created");
    Ok((StatusCode::CREATED, Json(expense)))
}

/// PUT /api/expenses/{id} -> updates an owned expense (admins may edit any).
pub async fn update(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
    Json(payload): Json<NewExpense>,
) -> Result<Json<Expense>, AppError> {
    let payload = payload.validated()?;
    let existing = load_owned(&state, &user, id).await?;
    if !state.store.update_expense(existing.id, &payload).await? {
        // deleted between the ownership check and the write
        return Err(AppError::NotFound("expense"));
    }
    Ok(Json(Expense {
        id: existing.id,
        user_id: existing.user_id,
        date: payload.date,
        category: payload.category,
        amount: payload.amount,
        note: payload.note,
    }))
}

/// DELETE /api/expenses/{id}
pub async fn remove(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    let existing = load_owned(&state, &user, id).await?;
    state.store.delete_expense(existing.id).await?;
    info!(user_id = user.id, expense_id = id, "expense deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/expenses/export -> the caller's (filtered) expenses as CSV.
pub async fn export(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(filter): Query<ExpenseFilter>,
) -> Result<impl IntoResponse, AppError> {
    let expenses = state.store.list_expenses(user.id).await?;
    let filtered = filter.apply(&expenses)?;
    let body = export::expenses_to_csv(&filtered)?;
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"expenses.csv\"",
            ),
        ],
        body,
    ))
}

/// Fetch an expense the caller is allowed to touch. A row owned by
/// someone else reads as absent, so ids cannot be probed for existence.
async fn load_owned(state: &AppState, user: &User, id: i64) -> Result<Expense, AppError> {
    let expense = state
        .store
        .get_expense(id)
        .await?
        .ok_or(AppError::NotFound("expense"))?;
    if expense.user_id != user.id && !user.is_admin() {
        return Err(AppError::NotFound("expense"));
    }
    Ok(expense)
}
