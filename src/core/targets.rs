//! Monthly target aggregation.
//!
//! For one user this rolls up every `Active` goal into the amount that has to be saved
//! per month to hit all deadlines, and compares it with what the user contributed
//! to those goals this calendar month and overall. Gifts and anonymous contributions
//! raise a goal's balance but are not counted as the user's own saving. Everything is recomputed from stored rows on each
//! call; nothing is cached.

use crate::{
    entities::{Goal, GoalContribution, GoalStatus, goal, goal_contribution},
    errors::Result,
};
use chrono::{DateTime, Datelike, NaiveDate, TimeZone, Utc};
use sea_orm::{QueryOrder, prelude::*};
use serde::Serialize;
use tracing::{debug, instrument};

/// Monthly target of a single goal.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GoalMonthlyTarget {
    /// Goal id
    pub goal_id: i64,
    /// Goal title
    pub title: String,
    /// Amount to reach
    pub target_amount: f64,
    /// Running balance
    pub current_amount: f64,
    /// Months left until the deadline, never less than 1
    pub months_remaining: u32,
    /// `target_amount / months_remaining`, rounded to cents
    pub monthly_target: f64,
}

/// Per-user roll-up of monthly targets against actual contributions.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyTargetSummary {
    /// Sum of the monthly targets of all active goals
    pub total_monthly_target: f64,
    /// The user's own contributions to active goals in the current calendar month
    pub current_month_contributions: f64,
    /// The user's own contributions ever recorded against active goals
    pub total_contributions: f64,
    /// Number of active goals considered
    pub active_goals: usize,
    /// Per-goal breakdown, soonest deadline first
    pub goals: Vec<GoalMonthlyTarget>,
}

/// Rounds a dollar amount to two decimal places.
#[must_use]
pub fn round_to_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Number of months left between `today` and `deadline`, counting a partial month.
///
/// The difference of the `year * 12 + month` components, plus one when the deadline's
/// day of month is later than today's, clamped to at least 1. A deadline in the past or
/// in the current month therefore still yields 1, so the result is always a safe divisor.
#[must_use]
pub fn months_remaining(today: NaiveDate, deadline: NaiveDate) -> u32 {
    let month_index = |d: NaiveDate| i64::from(d.year()) * 12 + i64::from(d.month());

    let mut months = month_index(deadline) - month_index(today);
    if deadline.day() > today.day() {
        months += 1;
    }

    u32::try_from(months.max(1)).unwrap_or(u32::MAX)
}

/// Monthly amount needed to reach `target_amount` by `deadline`, rounded to cents.
#[must_use]
pub fn monthly_target(target_amount: f64, today: NaiveDate, deadline: NaiveDate) -> f64 {
    round_to_cents(target_amount / f64::from(months_remaining(today, deadline)))
}

/// Start of the calendar month containing `now` and start of the following month (UTC).
fn month_bounds(now: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
    let first_of_month = |year: i32, month: u32| {
        Utc.with_ymd_and_hms(year, month, 1, 0, 0, 0)
            .single()
            .unwrap_or(now)
    };

    let start = first_of_month(now.year(), now.month());
    let end = if now.month() == 12 {
        first_of_month(now.year() + 1, 1)
    } else {
        first_of_month(now.year(), now.month() + 1)
    };
    (start, end)
}

/// Computes the monthly target summary for `user_id` as of `now`.
#[instrument(skip(db))]
pub async fn monthly_target_summary(
    db: &DatabaseConnection,
    user_id: &str,
    now: DateTime<Utc>,
) -> Result<MonthlyTargetSummary> {
    let today = now.date_naive();

    let active_goals = Goal::find()
        .filter(goal::Column::CreatedBy.eq(user_id))
        .filter(goal::Column::Status.eq(GoalStatus::Active))
        .order_by_asc(goal::Column::Deadline)
        .order_by_asc(goal::Column::Id)
        .all(db)
        .await?;

    let goals: Vec<GoalMonthlyTarget> = active_goals
        .iter()
        .map(|g| {
            let months = months_remaining(today, g.deadline);
            GoalMonthlyTarget {
                goal_id: g.id,
                title: g.title.clone(),
                target_amount: g.target_amount,
                current_amount: g.current_amount,
                months_remaining: months,
                monthly_target: round_to_cents(g.target_amount / f64::from(months)),
            }
        })
        .collect();

    // Sum the unrounded per-goal targets; only the total is rounded
    let total_monthly_target: f64 = active_goals
        .iter()
        .map(|g| g.target_amount / f64::from(months_remaining(today, g.deadline)))
        .sum();

    let goal_ids: Vec<i64> = active_goals.iter().map(|g| g.id).collect();
    let contributions = if goal_ids.is_empty() {
        Vec::new()
    } else {
        GoalContribution::find()
            .filter(goal_contribution::Column::GoalId.is_in(goal_ids))
            .filter(goal_contribution::Column::ContributorId.eq(user_id))
            .all(db)
            .await?
    };

    let (month_start, month_end) = month_bounds(now);
    let total_contributions: f64 = contributions.iter().map(|c| c.contribution_amount).sum();
    let current_month_contributions: f64 = contributions
        .iter()
        .filter(|c| c.created_at >= month_start && c.created_at < month_end)
        .map(|c| c.contribution_amount)
        .sum();

    debug!(
        "User {} has {} active goals and made {} contributions to them",
        user_id,
        goals.len(),
        contributions.len()
    );

    Ok(MonthlyTargetSummary {
        total_monthly_target: round_to_cents(total_monthly_target),
        current_month_contributions: round_to_cents(current_month_contributions),
        total_contributions: round_to_cents(total_contributions),
        active_goals: goals.len(),
        goals,
    })
}
