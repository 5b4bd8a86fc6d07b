//! Aggregation engine: turns a slice of expense rows into category
//! totals, a chronological monthly trend and a grand total.
//!
//! Pure functions over their inputs. The engine never queries the
//! store itself; callers hand it whatever rows they fetched, which is
//! also how the admin overview reuses it across all users.

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::db::models::Expense;
use crate::error::AppError;

/// Number of months in the dashboard's fixed trend window.
pub const TREND_WINDOW_MONTHS: u32 = 12;

/// Date filter over an expense set. Fields compose by logical AND:
/// a month given together with a year pins a single calendar month,
/// a month alone matches that month in any year, a year alone matches
/// the whole year, and `start`/`end` bound an inclusive date range.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExpenseFilter {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    pub year: Option<i32>,
    pub month: Option<u32>,
}

impl ExpenseFilter {
    /// Filter matching exactly one (year, month).
    pub fn month_of(year: i32, month: u32) -> Self {
        Self {
            year: Some(year),
            month: Some(month),
            ..Self::default()
        }
    }

    /// Reject malformed filters instead of reinterpreting them.
    pub fn validate(&self) -> Result<(), AppError> {
        if let Some(month) = self.month
            && !(1..=12).contains(&month)
        {
            return Err(AppError::InvalidFilter(format!(
                "month must be between 1 and 12, got {month}"
            )));
        }
        if let (Some(start), Some(end)) = (self.start, self.end)
            && end < start
        {
            return Err(AppError::InvalidFilter(format!(
                "end date {end} is before start date {start}"
            )));
        }
        Ok(())
    }

    fn matches(&self, date: NaiveDate) -> bool {
        if let Some(start) = self.start
            && date < start
        {
            return false;
        }
        if let Some(end) = self.end
            && date > end
        {
            return false;
        }
        if let Some(year) = self.year
            && date.year() != year
        {
            return false;
        }
        if let Some(month) = self.month
            && date.month() != month
        {
            return false;
        }
        true
    }

    /// Validate, then keep only the expenses whose date matches.
    pub fn apply<'a>(&self, expenses: &'a [Expense]) -> Result<Vec<&'a Expense>, AppError> {
        self.validate()?;
        Ok(expenses.iter().filter(|e| self.matches(e.date)).collect())
    }
}

/// One point of the monthly trend series, keyed `YYYY-MM`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthTotal {
    pub month: String,
    pub total: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateReport {
    pub category_totals: BTreeMap<String, Decimal>,
    pub monthly_trend: Vec<MonthTotal>,
    pub grand_total: Decimal,
}

fn month_key(year: i32, month: u32) -> String {
    format!("{year:04}-{month:02}")
}

/// Aggregate the filtered expense set. An empty result set yields
/// empty totals and a grand total of zero, never an error.
pub fn aggregate(
    expenses: &[Expense],
    filter: &ExpenseFilter,
) -> Result<AggregateReport, AppError> {
    let filtered = filter.apply(expenses)?;

    let mut category_totals: BTreeMap<String, Decimal> = BTreeMap::new();
    // BTreeMap keyed by zero-padded `YYYY-MM` keeps months chronological.
    let mut monthly: BTreeMap<String, Decimal> = BTreeMap::new();
    let mut grand_total = Decimal::ZERO;

    for expense in filtered {
        *category_totals
            .entry(expense.category.clone())
            .or_insert(Decimal::ZERO) += expense.amount;
        let key = month_key(expense.date.year(), expense.date.month());
        *monthly.entry(key).or_insert(Decimal::ZERO) += expense.amount;
        grand_total += expense.amount;
    }

    let monthly_trend = monthly
        .into_iter()
        .map(|(month, total)| MonthTotal { month, total })
        .collect();

    Ok(AggregateReport {
        category_totals,
        monthly_trend,
        grand_total,
    })
}

/// Fixed trend window ending at (`end_year`, `end_month`), inclusive.
/// Unlike the sparse trend in `aggregate`, months without expenses
/// contribute zero, so the series always has `months` entries.
pub fn monthly_trend_window(
    expenses: &[Expense],
    end_year: i32,
    end_month: u32,
    months: u32,
) -> Result<Vec<MonthTotal>, AppError> {
    if !(1..=12).contains(&end_month) {
        return Err(AppError::InvalidFilter(format!(
            "month must be between 1 and 12, got {end_month}"
        )));
    }

    let mut window = Vec::with_capacity(months as usize);
    let (mut year, mut month) = (end_year, end_month);
    for _ in 0..months {
        window.push((year, month));
        (year, month) = if month == 1 { (year - 1, 12) } else { (year, month - 1) };
    }
    window.reverse();

    let mut totals: BTreeMap<String, Decimal> = window
        .iter()
        .map(|&(y, m)| (month_key(y, m), Decimal::ZERO))
        .collect();
    for expense in expenses {
        let key = month_key(expense.date.year(), expense.date.month());
        if let Some(total) = totals.get_mut(&key) {
            *total += expense.amount;
        }
    }

    Ok(window
        .into_iter()
        .map(|(y, m)| {
            let month = month_key(y, m);
            let total = totals[&month];
            MonthTotal { month, total }
        })
        .collect())
}
