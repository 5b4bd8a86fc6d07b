use std::str::FromStr;

use rust_decimal::Decimal;
use sqlx::sqlite::SqliteRow;
use sqlx::{Pool, Row, Sqlite};

use crate::db::models::{Expense, NewExpense, Role, User};
use crate::db::schema::SQLITE_INIT;
use crate::error::AppError;

pub type SqlitePool = Pool<Sqlite>;

#[derive(Clone)]
pub struct ExpenseStore {
    pool: SqlitePool,
}

impl ExpenseStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Initialize the schema by executing the bundled DDL.
    pub async fn init_schema(&self) -> Result<(), AppError> {
        // execute multiple statements safely (SQLite supports multi-commands but sqlx::query doesn't)
        for stmt in SQLITE_INIT.split(';') {
            let s = stmt.trim();
            if s.is_empty() {
                continue;
            }
            sqlx::query(s).execute(&self.pool).await?;
        }
        Ok(())
    }

    /* ---------- users ---------- */

    pub async fn create_user(
        &self,
        username: &str,
        password_hash: &str,
        role: Role,
    ) -> Result<i64, AppError> {
        let row = sqlx::query(
            r#"INSERT INTO users (username, password_hash, role)
               VALUES (?, ?, ?) RETURNING id"#,
        )
        .bind(username)
        .bind(password_hash)
        .bind(role.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e.as_database_error() {
            Some(db) if db.is_unique_violation() => AppError::UsernameTaken,
            _ => AppError::Database(e),
        })?;
        Ok(row.get("id"))
    }

    pub async fn get_user_by_id(&self, id: i64) -> Result<Option<User>, AppError> {
        let row = sqlx::query(
            r#"SELECT id, username, password_hash, role, budget FROM users WHERE id = ?"#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(Self::row_to_user).transpose()
    }

    pub async fn get_user_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        let row = sqlx::query(
            r#"SELECT id, username, password_hash, role, budget FROM users WHERE username = ?"#,
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;
        row.map(Self::row_to_user).transpose()
    }

    pub async fn list_users(&self) -> Result<Vec<User>, AppError> {
        let rows = sqlx::query(
            r#"SELECT id, username, password_hash, role, budget FROM users ORDER BY id ASC"#,
        )
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(Self::row_to_user).collect()
    }

    /// Set or clear the user's monthly budget. The amount must already
    /// be validated non-negative (see `service::budget::validate_budget`).
    pub async fn set_budget(&self, user_id: i64, budget: Option<Decimal>) -> Result<(), AppError> {
        let result = sqlx::query(r#"UPDATE users SET budget = ? WHERE id = ?"#)
            .bind(budget.map(|b| b.to_string()))
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("user"));
        }
        Ok(())
    }

    /* ---------- expenses ---------- */

    pub async fn insert_expense(
        &self,
        user_id: i64,
        expense: &NewExpense,
    ) -> Result<Expense, AppError> {
        let row = sqlx::query(
            r#"INSERT INTO expenses (user_id, date, category, amount, note)
               VALUES (?, ?, ?, ?, ?) RETURNING id"#,
        )
        .bind(user_id)
        .bind(expense.date)
        .bind(&expense.category)
        .bind(expense.amount.to_string())
        .bind(expense.note.as_deref())
        .fetch_one(&self.pool)
        .await?;
        Ok(Expense {
            id: row.get("id"),
            user_id,
            date: expense.date,
            category: expense.category.clone(),
            amount: expense.amount,
            note: expense.note.clone(),
        })
    }

    pub async fn get_expense(&self, id: i64) -> Result<Option<Expense>, AppError> {
        let row = sqlx::query(
            r#"SELECT id, user_id, date, category, amount, note FROM expenses WHERE id = ?"#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(Self::row_to_expense).transpose()
    }

    pub async fn update_expense(&self, id: i64, expense: &NewExpense) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"UPDATE expenses SET date = ?, category = ?, amount = ?, note = ? WHERE id = ?"#,
        )
        .bind(expense.date)
        .bind(&expense.category)
        .bind(expense.amount.to_string())
        .bind(expense.note.as_deref())
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn delete_expense(&self, id: i64) -> Result<bool, AppError> {
        let result = sqlx::query(r#"DELETE FROM expenses WHERE id = ?"#)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// All expenses belonging to one user, oldest first.
    pub async fn list_expenses(&self, user_id: i64) -> Result<Vec<Expense>, AppError> {
        let rows = sqlx::query(
            r#"SELECT id, user_id, date, category, amount, note
               FROM expenses WHERE user_id = ? ORDER BY date ASC, id ASC"#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(Self::row_to_expense).collect()
    }

    /// All expenses across every user, for the admin overview.
    pub async fn list_all_expenses(&self) -> Result<Vec<Expense>, AppError> {
        let rows = sqlx::query(
            r#"SELECT id, user_id, date, category, amount, note
               FROM expenses ORDER BY date ASC, id ASC"#,
        )
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(Self::row_to_expense).collect()
    }

    /* ---------- row decoding ---------- */

    fn row_to_user(row: SqliteRow) -> Result<User, AppError> {
        let role_text: String = row.get("role");
        let role = Role::parse(&role_text).ok_or_else(|| {
            AppError::Database(sqlx::Error::Decode(
                format!("unknown role: {role_text}").into(),
            ))
        })?;
        let budget_text: Option<String> = row.get("budget");
        let budget = budget_text
            .map(|b| Self::parse_amount(&b, "budget"))
            .transpose()?;
        Ok(User {
            id: row.get("id"),
            username: row.get("username"),
            password_hash: row.get("password_hash"),
            role,
            budget,
        })
    }

    fn row_to_expense(row: SqliteRow) -> Result<Expense, AppError> {
        let amount_text: String = row.get("amount");
        Ok(Expense {
            id: row.get("id"),
            user_id: row.get("user_id"),
            date: row.get("date"),
            category: row.get("category"),
            amount: Self::parse_amount(&amount_text, "amount")?,
            note: row.get("note"),
        })
    }

    fn parse_amount(text: &str, column: &str) -> Result<Decimal, AppError> {
        Decimal::from_str(text).map_err(|e| {
            AppError::Database(sqlx::Error::Decode(
                format!("invalid decimal in {column}: {e}").into(),
            ))
        })
    }
}
