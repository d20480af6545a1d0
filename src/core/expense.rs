//! Expense business logic - Recording spending and summarizing it per category.
//!
//! The per-category summary is what the budget recommendation sends to the
//! generative service as the user's spending history.

use crate::{
    core::targets::round_to_cents,
    entities::{Expense, expense},
    errors::{Error, Result},
};
use chrono::{DateTime, Datelike, Months, TimeZone, Utc};
use sea_orm::{QueryOrder, Set, prelude::*};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, instrument};

/// Longest lookback window a spending summary may cover.
pub const MAX_LOOKBACK_MONTHS: u32 = 120;

/// Spending in one category over the lookback window.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategorySpending {
    /// Category name
    pub category: String,
    /// Total spent in the window, rounded to cents
    pub total: f64,
    /// `total / lookback_months`, rounded to cents
    pub monthly_average: f64,
    /// Number of expenses in the window
    pub expense_count: usize,
}

/// Normalizes a category name for storage and grouping.
fn normalize_category(category: &str) -> Result<String> {
    let normalized = category.trim().to_lowercase();
    if normalized.is_empty() {
        return Err(Error::validation("Expense category cannot be empty"));
    }
    Ok(normalized)
}

/// Records one expense for `user_id`.
#[instrument(skip(db, description))]
pub async fn record_expense(
    db: &DatabaseConnection,
    user_id: &str,
    category: &str,
    amount: f64,
    description: Option<String>,
    spent_at: DateTime<Utc>,
) -> Result<expense::Model> {
    if !amount.is_finite() || amount <= 0.0 {
        return Err(Error::InvalidAmount { amount });
    }
    let category = normalize_category(category)?;

    let expense = expense::ActiveModel {
        user_id: Set(user_id.to_string()),
        category: Set(category),
        amount: Set(amount),
        description: Set(description),
        spent_at: Set(spent_at),
        ..Default::default()
    };

    expense.insert(db).await.map_err(Into::into)
}

/// Lists the expenses of `user_id`, newest first, optionally only those since a point in time.
pub async fn list_expenses(
    db: &DatabaseConnection,
    user_id: &str,
    since: Option<DateTime<Utc>>,
) -> Result<Vec<expense::Model>> {
    let mut query = Expense::find().filter(expense::Column::UserId.eq(user_id));
    if let Some(since) = since {
        query = query.filter(expense::Column::SpentAt.gte(since));
    }

    query
        .order_by_desc(expense::Column::SpentAt)
        .order_by_desc(expense::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Checks that a lookback window is between 1 and [`MAX_LOOKBACK_MONTHS`] months.
pub fn validate_lookback(lookback_months: u32) -> Result<()> {
    if !(1..=MAX_LOOKBACK_MONTHS).contains(&lookback_months) {
        return Err(Error::validation(format!(
            "lookback_months must be between 1 and {MAX_LOOKBACK_MONTHS}, got {lookback_months}"
        )));
    }
    Ok(())
}

/// Start of the lookback window: the first day of the month `lookback_months - 1`
/// months before the month containing `now`.
pub fn lookback_start(now: DateTime<Utc>, lookback_months: u32) -> Result<DateTime<Utc>> {
    validate_lookback(lookback_months)?;
    let first_of_month = Utc
        .with_ymd_and_hms(now.year(), now.month(), 1, 0, 0, 0)
        .single()
        .ok_or_else(|| Error::validation(format!("No first of month for {now}")))?;

    first_of_month
        .checked_sub_months(Months::new(lookback_months - 1))
        .ok_or_else(|| {
            Error::validation(format!(
                "A {lookback_months}-month window before {now} is out of range"
            ))
        })
}

/// Summarizes spending per category over the last `lookback_months` calendar months,
/// including the current one. Categories are sorted alphabetically.
#[instrument(skip(db))]
pub async fn spending_by_category(
    db: &DatabaseConnection,
    user_id: &str,
    now: DateTime<Utc>,
    lookback_months: u32,
) -> Result<Vec<CategorySpending>> {
    let since = lookback_start(now, lookback_months)?;
    let expenses = Expense::find()
        .filter(expense::Column::UserId.eq(user_id))
        .filter(expense::Column::SpentAt.gte(since))
        .filter(expense::Column::SpentAt.lte(now))
        .all(db)
        .await?;

    let mut by_category: BTreeMap<String, (f64, usize)> = BTreeMap::new();
    for expense in &expenses {
        let entry = by_category.entry(expense.category.clone()).or_default();
        entry.0 += expense.amount;
        entry.1 += 1;
    }

    debug!(
        "Summarized {} expenses into {} categories",
        expenses.len(),
        by_category.len()
    );

    Ok(by_category
        .into_iter()
        .map(|(category, (total, expense_count))| CategorySpending {
            category,
            total: round_to_cents(total),
            monthly_average: round_to_cents(total / f64::from(lookback_months)),
            expense_count,
        })
        .collect())
}
