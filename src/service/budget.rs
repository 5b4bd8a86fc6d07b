//! Budget evaluator: compares the current month's spending against the
//! user's configured monthly budget.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;

use crate::db::models::AMOUNT_SCALE;
use crate::error::AppError;

/// Alert policy: usage below `WARNING_RATIO` is fine, at or above it is
/// a warning, and at or above `EXCEEDED_RATIO` the budget is blown.
pub const WARNING_RATIO: Decimal = dec!(0.8);
pub const EXCEEDED_RATIO: Decimal = dec!(1.0);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BudgetStatus {
    /// No budget configured for this user.
    Unset,
    Ok,
    Warning,
    Exceeded,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BudgetReport {
    pub status: BudgetStatus,
    pub budget: Option<Decimal>,
    pub spent: Decimal,
    /// Spent ÷ budget, unbounded above 1.0. `None` when no budget is
    /// configured or the budget is zero.
    pub ratio: Option<Decimal>,
}

/// Evaluate the budget against the current month's total. The budget is
/// assumed already validated non-negative (`validate_budget` ran when it
/// was set); evaluation itself cannot fail.
pub fn evaluate_budget(budget: Option<Decimal>, spent: Decimal) -> BudgetReport {
    let Some(budget) = budget else {
        return BudgetReport {
            status: BudgetStatus::Unset,
            budget: None,
            spent,
            ratio: None,
        };
    };

    if budget.is_zero() {
        // Any spending at all exceeds a zero budget; the ratio is undefined.
        let status = if spent.is_zero() {
            BudgetStatus::Ok
        } else {
            BudgetStatus::Exceeded
        };
        return BudgetReport {
            status,
            budget: Some(budget),
            spent,
            ratio: None,
        };
    }

    let ratio = spent / budget;
    let status = if ratio >= EXCEEDED_RATIO {
        BudgetStatus::Exceeded
    } else if ratio >= WARNING_RATIO {
        BudgetStatus::Warning
    } else {
        BudgetStatus::Ok
    };
    BudgetReport {
        status,
        budget: Some(budget),
        spent,
        ratio: Some(ratio),
    }
}

/// Validate a budget amount where the user sets it: negative values are
/// rejected, valid ones normalized to currency precision.
pub fn validate_budget(amount: Decimal) -> Result<Decimal, AppError> {
    if amount < Decimal::ZERO {
        return Err(AppError::InvalidBudget(
            "budget must be non-negative".to_string(),
        ));
    }
    Ok(amount.round_dp(AMOUNT_SCALE))
}
