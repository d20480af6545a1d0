//! Balance reconciliation.
//!
//! A goal's `current_amount` must always equal the sum of its contributions. Normal
//! operation keeps that true, but rows written outside this crate can break it. This
//! recomputes the sum from the contribution rows and overwrites the stored balance.

use crate::{
    core::{goal::get_goal_for_owner, targets::round_to_cents},
    entities::{GoalContribution, goal, goal_contribution},
    errors::Result,
};
use chrono::Utc;
use sea_orm::{Set, TransactionTrait, prelude::*};
use serde::Serialize;
use tracing::{info, instrument, warn};

/// Differences below this are treated as floating-point noise.
const DRIFT_TOLERANCE: f64 = 1e-6;

/// Result of a reconciliation run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReconcileReport {
    /// Goal that was checked
    pub goal_id: i64,
    /// Balance stored before the run
    pub previous_amount: f64,
    /// Sum of the goal's contributions
    pub recomputed_amount: f64,
    /// `recomputed_amount - previous_amount`, rounded to cents
    pub drift: f64,
    /// Whether the stored balance was rewritten
    pub corrected: bool,
}

/// Recomputes the balance of a goal owned by `owner` from its contributions.
///
/// Reading the contributions and writing the balance share one transaction, so a
/// contribution recorded concurrently is either fully counted or not seen at all.
#[instrument(skip(db))]
pub async fn reconcile_goal(
    db: &DatabaseConnection,
    goal_id: i64,
    owner: &str,
) -> Result<ReconcileReport> {
    let txn = db.begin().await?;

    let existing = get_goal_for_owner(&txn, goal_id, owner).await?;
    let contributions = GoalContribution::find()
        .filter(goal_contribution::Column::GoalId.eq(goal_id))
        .all(&txn)
        .await?;
    let recomputed_amount: f64 = contributions.iter().map(|c| c.contribution_amount).sum();

    let previous_amount = existing.current_amount;
    let corrected = (recomputed_amount - previous_amount).abs() > DRIFT_TOLERANCE;

    if corrected {
        let mut active_model: goal::ActiveModel = existing.into();
        active_model.current_amount = Set(recomputed_amount);
        active_model.updated_at = Set(Utc::now());
        active_model.update(&txn).await?;

        warn!(
            goal_id,
            previous_amount, recomputed_amount, "Corrected drifted goal balance"
        );
    } else {
        info!(goal_id, "Goal balance matches its contributions");
    }

    txn.commit().await?;

    Ok(ReconcileReport {
        goal_id,
        previous_amount,
        recomputed_amount,
        drift: round_to_cents(recomputed_amount - previous_amount),
        corrected,
    })
}
