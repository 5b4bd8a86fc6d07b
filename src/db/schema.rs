//! SQL DDL for initializing the expense storage.
//! SQLite-first design; can be adapted for other RDBMS.

/// SQLite schema:
/// - `users.username` UNIQUE (creates an index implicitly)
/// - `users.budget` TEXT NULL: decimal monthly budget, NULL means unset
/// - monetary amounts stored as TEXT and parsed as `Decimal` on read
/// - `expenses.date` TEXT in `YYYY-MM-DD`, so lexicographic order is
///   chronological order
pub const SQLITE_INIT: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    username TEXT NOT NULL UNIQUE,
    password_hash TEXT NOT NULL,
    role TEXT NOT NULL DEFAULT 'user',
    budget TEXT NULL
);

CREATE TABLE IF NOT EXISTS expenses (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    date TEXT NOT NULL,
    category TEXT NOT NULL,
    amount TEXT NOT NULL,
    note TEXT NULL
);

CREATE INDEX IF NOT EXISTS idx_expenses_user_id ON expenses(user_id);
CREATE INDEX IF NOT EXISTS idx_expenses_date ON expenses(date);
"#;
