//! CSV export of raw expense rows (not aggregates): one row per
//! expense with a `date,category,amount,note` header.

use crate::db::models::Expense;
use crate::error::AppError;

pub const CSV_HEADER: [&str; 4] = ["date", "category", "amount", "note"];

pub fn expenses_to_csv(expenses: &[&Expense]) -> Result<String, AppError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(CSV_HEADER)?;
    for expense in expenses {
        writer.write_record([
            expense.date.to_string(),
            expense.category.clone(),
            expense.amount.to_string(),
            expense.note.clone().unwrap_or_default(),
        ])?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| AppError::Csv(e.into_error().into()))?;
    String::from_utf8(bytes).map_err(|e| AppError::Internal(format!("CSV was not UTF-8: {e}")))
}
