//! Contribution business logic - Recording money applied toward a goal.
//!
//! Recording a contribution and crediting it to the goal happen in one database
//! transaction. The goal's balance is moved with a single SQL expression
//! (`current_amount = current_amount + amount`) rather than a read-modify-write, so
//! concurrent contributions to the same goal cannot overwrite each other.
//! Contributions are immutable: there is no update or delete path.

use crate::{
    entities::{Goal, GoalContribution, PaymentMethod, goal, goal_contribution},
    errors::{Error, Result},
};
use chrono::Utc;
use sea_orm::{QueryOrder, Set, SqlErr, TransactionTrait, prelude::*, sea_query::Expr};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

/// Smallest amount a single contribution may carry.
pub const MIN_CONTRIBUTION_AMOUNT: f64 = 1.0;

/// Input for [`apply_contribution`].
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NewContribution {
    /// Goal receiving the money
    pub goal_id: i64,
    /// Amount in dollars, at least [`MIN_CONTRIBUTION_AMOUNT`]
    pub contribution_amount: f64,
    /// How the money was moved
    pub payment_method: PaymentMethod,
    /// Contributor, `None` for anonymous contributions
    #[serde(default)]
    pub contributor_id: Option<String>,
    /// Optional external reference; must be unique
    #[serde(default)]
    pub transaction_id: Option<String>,
    /// Free-form notes
    #[serde(default)]
    pub notes: Option<String>,
}

/// Outcome of a recorded contribution.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContributionReceipt {
    /// The stored contribution
    pub contribution: goal_contribution::Model,
    /// The goal after the contribution was credited
    pub goal: goal::Model,
    /// Whether the goal's running balance now meets its target
    pub goal_reached: bool,
}

fn validate(new: &NewContribution) -> Result<()> {
    let amount = new.contribution_amount;
    if !amount.is_finite() || amount < MIN_CONTRIBUTION_AMOUNT {
        return Err(Error::InvalidAmount { amount });
    }
    if let Some(reference) = &new.transaction_id {
        if reference.trim().is_empty() {
            return Err(Error::validation("Transaction id cannot be blank"));
        }
    }
    Ok(())
}

/// Records a contribution and credits its amount to the owning goal.
///
/// Runs inside a single database transaction:
/// 1. the goal's `current_amount` is incremented atomically (`GoalNotFound` if no row
///    matched),
/// 2. the `transaction_id`, if any, must be unused (`DuplicateTransaction` otherwise),
/// 3. the contribution row is inserted,
/// 4. the credited goal is read back.
///
/// The write comes first so the transaction holds the write lock before it reads
/// anything; concurrent contributions queue on that lock instead of failing. If any
/// step fails the transaction rolls back, so a contribution is never stored without
/// being reflected in the goal's balance.
#[instrument(skip(db, new), fields(goal_id = new.goal_id, amount = new.contribution_amount))]
pub async fn apply_contribution(
    db: &DatabaseConnection,
    new: NewContribution,
) -> Result<ContributionReceipt> {
    validate(&new)?;

    let txn = db.begin().await?;

    let goal_id = new.goal_id;
    increment_goal_balance(&txn, goal_id, new.contribution_amount).await?;

    if let Some(reference) = &new.transaction_id {
        let taken = GoalContribution::find()
            .filter(goal_contribution::Column::TransactionId.eq(reference.as_str()))
            .count(&txn)
            .await?;
        if taken > 0 {
            warn!("Rejected contribution with duplicate transaction id {}", reference);
            txn.rollback().await?;
            return Err(Error::DuplicateTransaction {
                transaction_id: reference.clone(),
            });
        }
    }

    let now = Utc::now();
    let transaction_id = new.transaction_id.clone();
    let contribution = goal_contribution::ActiveModel {
        goal_id: Set(goal_id),
        contributor_id: Set(new.contributor_id),
        contribution_amount: Set(new.contribution_amount),
        payment_method: Set(new.payment_method),
        transaction_id: Set(new.transaction_id),
        notes: Set(new.notes),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&txn)
    .await
    .map_err(|e| match (e.sql_err(), transaction_id) {
        (Some(SqlErr::UniqueConstraintViolation(_)), Some(transaction_id)) => {
            Error::DuplicateTransaction { transaction_id }
        }
        _ => Error::from(e),
    })?;

    let goal = Goal::find_by_id(goal_id)
        .one(&txn)
        .await?
        .ok_or(Error::GoalNotFound { id: goal_id })?;

    txn.commit().await?;

    let goal_reached = goal.current_amount >= goal.target_amount;
    info!(
        contribution_id = contribution.id,
        new_balance = goal.current_amount,
        goal_reached,
        "Recorded contribution"
    );

    Ok(ContributionReceipt {
        contribution,
        goal,
        goal_reached,
    })
}

/// Adds `amount` to a goal's running balance with a single atomic UPDATE.
pub(crate) async fn increment_goal_balance<C>(db: &C, goal_id: i64, amount: f64) -> Result<()>
where
    C: ConnectionTrait,
{
    let updated = Goal::update_many()
        .col_expr(
            goal::Column::CurrentAmount,
            Expr::col(goal::Column::CurrentAmount).add(amount),
        )
        .col_expr(goal::Column::UpdatedAt, Expr::value(Utc::now()))
        .filter(goal::Column::Id.eq(goal_id))
        .exec(db)
        .await?;

    if updated.rows_affected == 0 {
        return Err(Error::GoalNotFound { id: goal_id });
    }
    Ok(())
}

/// Lists a goal's contributions, oldest first.
pub async fn list_contributions_for_goal(
    db: &DatabaseConnection,
    goal_id: i64,
) -> Result<Vec<goal_contribution::Model>> {
    GoalContribution::find()
        .filter(goal_contribution::Column::GoalId.eq(goal_id))
        .order_by_asc(goal_contribution::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Retrieves a specific contribution by its id.
pub async fn get_contribution_by_id(
    db: &DatabaseConnection,
    contribution_id: i64,
) -> Result<Option<goal_contribution::Model>> {
    GoalContribution::find_by_id(contribution_id)
        .one(db)
        .await
        .map_err(Into::into)
}
