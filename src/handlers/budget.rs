use std::str::FromStr;

use axum::extract::State;
use axum::Json;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use crate::error::AppError;
use crate::middleware::auth::CurrentUser;
use crate::router::AppState;
use crate::service::budget::validate_budget;

#[derive(Debug, Deserialize)]
pub struct SetBudgetRequest {
    /// `null` clears the budget. Accepted as a JSON number or a numeric
    /// string; anything else maps to `InvalidBudget` here, never at
    /// evaluation time. Negative amounts are rejected the same way.
    #[serde(default)]
    pub amount: Option<Value>,
}

/// GET /api/budget
pub async fn get_budget(
    CurrentUser(user): CurrentUser,
) -> Json<serde_json::Value> {
    Json(json!({ "budget": user.budget }))
}

/// PUT /api/budget
pub async fn set_budget(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(req): Json<SetBudgetRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    let budget = req
        .amount
        .as_ref()
        .map(parse_budget)
        .transpose()?
        .map(validate_budget)
        .transpose()?;
    state.store.set_budget(user.id, budget).await?;
    info!(user_id = user.id, "budget updated");
    Ok(Json(json!({ "budget": budget })))
}

fn parse_budget(value: &Value) -> Result<Decimal, AppError> {
    let parsed = match value {
        Value::String(s) => Decimal::from_str(s.trim()).ok(),
        Value::Number(n) => Decimal::from_str(&n.to_string()).ok(),
        _ => None,
    };
    parsed.ok_or_else(|| AppError::InvalidBudget(format!("not a number: {value}")))
}
