use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Currency precision: all stored amounts carry two decimal places.
pub const AMOUNT_SCALE: u32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "user" => Some(Role::User),
            "admin" => Some(Role::Admin),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub password_hash: String,
    pub role: Role,
    /// Monthly budget; `None` means no budget configured, which is
    /// distinct from a zero budget.
    pub budget: Option<Decimal>,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// User shape safe to expose over the API (no password hash).
#[derive(Debug, Clone, Serialize)]
pub struct UserSummary {
    pub id: i64,
    pub username: String,
    pub role: Role,
    pub budget: Option<Decimal>,
}

impl From<User> for UserSummary {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            username: u.username,
            role: u.role,
            budget: u.budget,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Expense {
    pub id: i64,
    pub user_id: i64,
    pub date: NaiveDate,
    pub category: String,
    pub amount: Decimal,
    pub note: Option<String>,
}

/// Validated input for creating or updating an expense.
///
/// Validation happens here, at the store boundary, so the aggregation
/// core only ever sees well-formed rows.
#[derive(Debug, Clone, Deserialize)]
pub struct NewExpense {
    pub date: NaiveDate,
    pub category: String,
    pub amount: Decimal,
    pub note: Option<String>,
}

impl NewExpense {
    /// Enforce the expense invariants: strictly positive amount,
    /// non-empty category. Normalizes the amount to currency precision
    /// and trims the category label.
    pub fn validated(mut self) -> Result<Self, AppError> {
        if self.amount <= Decimal::ZERO {
            return Err(AppError::Validation(
                "amount must be strictly positive".to_string(),
            ));
        }
        self.amount = self.amount.round_dp(AMOUNT_SCALE);
        if self.amount.is_zero() {
            // e.g. 0.004 rounds down to 0.00
            return Err(AppError::Validation(
                "amount rounds to zero at currency precision".to_string(),
            ));
        }
        self.category = self.category.trim().to_string();
        if self.category.is_empty() {
            return Err(AppError::Validation(
                "category must not be empty".to_string(),
            ));
        }
        self.note = self.note.filter(|n| !n.trim().is_empty());
        Ok(self)
    }
}
