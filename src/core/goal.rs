//! Goal business logic - Creating, reading, editing and transitioning savings goals.
//!
//! Every lookup is scoped to the owner: a goal owned by someone else is reported as
//! not found so ids of other users' goals cannot be discovered. None of these functions
//! touch `current_amount`; only contributions and reconciliation do.

use crate::{
    entities::{Goal, GoalContribution, GoalStatus, goal, goal_contribution},
    errors::{Error, Result},
};
use chrono::{NaiveDate, Utc};
use sea_orm::{QueryOrder, QuerySelect, Set, prelude::*};
use serde::Serialize;
use tracing::{info, instrument};

/// A goal together with the ordered ids of its contributions.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GoalWithContributions {
    /// The goal itself
    #[serde(flatten)]
    pub goal: goal::Model,
    /// Contribution ids in the order they were recorded
    pub contribution_ids: Vec<i64>,
}

/// Optional fields for an administrative edit of a goal.
#[derive(Debug, Clone, Default)]
pub struct GoalDetailsUpdate {
    /// New title
    pub title: Option<String>,
    /// New target amount
    pub target_amount: Option<f64>,
    /// New deadline
    pub deadline: Option<NaiveDate>,
}

fn validate_title(title: &str) -> Result<String> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(Error::validation("Goal title cannot be empty"));
    }
    Ok(trimmed.to_string())
}

fn validate_target(target_amount: f64) -> Result<f64> {
    if !target_amount.is_finite() || target_amount <= 0.0 {
        return Err(Error::InvalidAmount {
            amount: target_amount,
        });
    }
    Ok(target_amount)
}

/// Creates a new `Active` goal for `owner` with a zero running balance.
///
/// The title is trimmed and must not be empty; the target must be a positive, finite amount.
#[instrument(skip(db))]
pub async fn create_goal(
    db: &DatabaseConnection,
    owner: &str,
    title: &str,
    target_amount: f64,
    deadline: NaiveDate,
) -> Result<goal::Model> {
    let title = validate_title(title)?;
    let target_amount = validate_target(target_amount)?;

    let now = Utc::now();
    let goal = goal::ActiveModel {
        created_by: Set(owner.to_string()),
        title: Set(title),
        target_amount: Set(target_amount),
        deadline: Set(deadline),
        current_amount: Set(0.0),
        status: Set(GoalStatus::Active),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };

    let result = goal.insert(db).await?;
    info!(goal_id = result.id, "Created goal '{}' for {}", result.title, owner);
    Ok(result)
}

/// Finds a goal by id regardless of owner.
pub async fn get_goal_by_id<C>(db: &C, goal_id: i64) -> Result<Option<goal::Model>>
where
    C: ConnectionTrait,
{
    Goal::find_by_id(goal_id).one(db).await.map_err(Into::into)
}

/// Finds a goal by id, failing with `GoalNotFound` unless it belongs to `owner`.
pub async fn get_goal_for_owner<C>(db: &C, goal_id: i64, owner: &str) -> Result<goal::Model>
where
    C: ConnectionTrait,
{
    Goal::find_by_id(goal_id)
        .filter(goal::Column::CreatedBy.eq(owner))
        .one(db)
        .await?
        .ok_or(Error::GoalNotFound { id: goal_id })
}

/// Lists the owner's goals, soonest deadline first, optionally filtered by status.
pub async fn list_goals_for_owner(
    db: &DatabaseConnection,
    owner: &str,
    status: Option<GoalStatus>,
) -> Result<Vec<goal::Model>> {
    let mut query = Goal::find().filter(goal::Column::CreatedBy.eq(owner));
    if let Some(status) = status {
        query = query.filter(goal::Column::Status.eq(status));
    }

    query
        .order_by_asc(goal::Column::Deadline)
        .order_by_asc(goal::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Loads a goal and the ids of its contributions in insertion order.
pub async fn get_goal_with_contributions(
    db: &DatabaseConnection,
    goal_id: i64,
    owner: &str,
) -> Result<GoalWithContributions> {
    let goal = get_goal_for_owner(db, goal_id, owner).await?;

    let contribution_ids: Vec<i64> = GoalContribution::find()
        .select_only()
        .column(goal_contribution::Column::Id)
        .filter(goal_contribution::Column::GoalId.eq(goal_id))
        .order_by_asc(goal_contribution::Column::Id)
        .into_tuple()
        .all(db)
        .await?;

    Ok(GoalWithContributions {
        goal,
        contribution_ids,
    })
}

/// Applies an administrative edit to title, target and/or deadline.
///
/// Fields left as `None` keep their value. The running balance is never changed here.
#[instrument(skip(db))]
pub async fn update_goal_details(
    db: &DatabaseConnection,
    goal_id: i64,
    owner: &str,
    changes: GoalDetailsUpdate,
) -> Result<goal::Model> {
    let title = changes.title.as_deref().map(validate_title).transpose()?;
    let target_amount = changes.target_amount.map(validate_target).transpose()?;

    let existing = get_goal_for_owner(db, goal_id, owner).await?;
    let mut active_model: goal::ActiveModel = existing.into();

    if let Some(title) = title {
        active_model.title = Set(title);
    }
    if let Some(target_amount) = target_amount {
        active_model.target_amount = Set(target_amount);
    }
    if let Some(deadline) = changes.deadline {
        active_model.deadline = Set(deadline);
    }
    active_model.updated_at = Set(Utc::now());

    active_model.update(db).await.map_err(Into::into)
}

/// Moves a goal to a new lifecycle status.
#[instrument(skip(db))]
pub async fn set_goal_status(
    db: &DatabaseConnection,
    goal_id: i64,
    owner: &str,
    status: GoalStatus,
) -> Result<goal::Model> {
    let existing = get_goal_for_owner(db, goal_id, owner).await?;
    let previous = existing.status;

    let mut active_model: goal::ActiveModel = existing.into();
    active_model.status = Set(status);
    active_model.updated_at = Set(Utc::now());
    let updated = active_model.update(db).await?;

    info!(goal_id, ?previous, ?status, "Goal status changed");
    Ok(updated)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::test_utils::*;
    use sea_orm::{DatabaseBackend, MockDatabase};

    #[tokio::test]
    async fn test_create_goal_validation() -> Result<()> {
        let db = MockDatabase::new(DatabaseBackend::Sqlite).into_connection();
        let deadline = NaiveDate::from_ymd_opt(2030, 1, 1).unwrap();

        // Empty title
        let result = create_goal(&db, "alice", "   ", 1000.0, deadline).await;
        assert!(matches!(result.unwrap_err(), Error::Validation { message: _ }));

        // Zero target
        let result = create_goal(&db, "alice", "Car", 0.0, deadline).await;
        assert!(matches!(
            result.unwrap_err(),
            Error::InvalidAmount { amount: 0.0 }
        ));

        // Negative target
        let result = create_goal(&db, "alice", "Car", -10.0, deadline).await;
        assert!(matches!(
            result.unwrap_err(),
            Error::InvalidAmount { amount: -10.0 }
        ));

        // NaN target
        let result = create_goal(&db, "alice", "Car", f64::NAN, deadline).await;
        assert!(matches!(result.unwrap_err(), Error::InvalidAmount { amount: _ }));

        Ok(())
    }

    #[tokio::test]
    async fn test_create_goal_integration() -> Result<()> {
        let db = setup_test_db().await?;

        let goal = create_custom_goal(&db, "alice", "  Emergency fund ", 5000.0, date(2030, 6, 1))
            .await?;

        assert_eq!(goal.title, "Emergency fund");
        assert_eq!(goal.created_by, "alice");
        assert_eq!(goal.target_amount, 5000.0);
        assert_eq!(goal.current_amount, 0.0);
        assert_eq!(goal.status, GoalStatus::Active);
        assert_eq!(goal.deadline, date(2030, 6, 1));

        Ok(())
    }

    #[tokio::test]
    async fn test_get_goal_for_owner_hides_other_users_goals() -> Result<()> {
        let db = setup_test_db().await?;
        let goal = create_test_goal(&db, "alice", "Vacation").await?;

        let found = get_goal_for_owner(&db, goal.id, "alice").await?;
        assert_eq!(found, goal);

        let result = get_goal_for_owner(&db, goal.id, "bob").await;
        assert!(matches!(result.unwrap_err(), Error::GoalNotFound { id } if id == goal.id));

        let result = get_goal_for_owner(&db, 999, "alice").await;
        assert!(matches!(result.unwrap_err(), Error::GoalNotFound { id: 999 }));

        Ok(())
    }

    #[tokio::test]
    async fn test_list_goals_for_owner_ordering_and_filter() -> Result<()> {
        let db = setup_test_db().await?;

        let later = create_custom_goal(&db, "alice", "House", 50000.0, date(2035, 1, 1)).await?;
        let sooner = create_custom_goal(&db, "alice", "Laptop", 2000.0, date(2027, 1, 1)).await?;
        create_test_goal(&db, "bob", "Bike").await?;

        let goals = list_goals_for_owner(&db, "alice", None).await?;
        assert_eq!(goals.len(), 2);
        assert_eq!(goals[0].id, sooner.id);
        assert_eq!(goals[1].id, later.id);

        set_goal_status(&db, later.id, "alice", GoalStatus::Abandoned).await?;
        let active = list_goals_for_owner(&db, "alice", Some(GoalStatus::Active)).await?;
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, sooner.id);

        let abandoned = list_goals_for_owner(&db, "alice", Some(GoalStatus::Abandoned)).await?;
        assert_eq!(abandoned.len(), 1);
        assert_eq!(abandoned[0].status, GoalStatus::Abandoned);

        Ok(())
    }

    #[tokio::test]
    async fn test_get_goal_with_contributions_in_insertion_order() -> Result<()> {
        let db = setup_test_db().await?;
        let goal = create_test_goal(&db, "alice", "Vacation").await?;

        let first = create_test_contribution(&db, goal.id, 50.0).await?;
        let second = create_test_contribution(&db, goal.id, 25.0).await?;

        let view = get_goal_with_contributions(&db, goal.id, "alice").await?;
        assert_eq!(
            view.contribution_ids,
            vec![first.contribution.id, second.contribution.id]
        );
        assert_eq!(view.goal.current_amount, 75.0);

        Ok(())
    }

    #[tokio::test]
    async fn test_update_goal_details_keeps_current_amount() -> Result<()> {
        let db = setup_test_db().await?;
        let goal = create_test_goal(&db, "alice", "Vacation").await?;
        create_test_contribution(&db, goal.id, 40.0).await?;

        let updated = update_goal_details(
            &db,
            goal.id,
            "alice",
            GoalDetailsUpdate {
                title: Some("Summer vacation".to_string()),
                target_amount: Some(2400.0),
                deadline: None,
            },
        )
        .await?;

        assert_eq!(updated.title, "Summer vacation");
        assert_eq!(updated.target_amount, 2400.0);
        assert_eq!(updated.deadline, goal.deadline);
        assert_eq!(updated.current_amount, 40.0);

        Ok(())
    }

    #[tokio::test]
    async fn test_update_goal_details_rejects_invalid_target() -> Result<()> {
        let db = setup_test_db().await?;
        let goal = create_test_goal(&db, "alice", "Vacation").await?;

        let result = update_goal_details(
            &db,
            goal.id,
            "alice",
            GoalDetailsUpdate {
                target_amount: Some(0.0),
                ..Default::default()
            },
        )
        .await;
        assert!(matches!(result.unwrap_err(), Error::InvalidAmount { amount: _ }));

        Ok(())
    }

    #[tokio::test]
    async fn test_set_goal_status_wrong_owner() -> Result<()> {
        let db = setup_test_db().await?;
        let goal = create_test_goal(&db, "alice", "Vacation").await?;

        let result = set_goal_status(&db, goal.id, "mallory", GoalStatus::Completed).await;
        assert!(matches!(result.unwrap_err(), Error::GoalNotFound { id: _ }));

        let unchanged = get_goal_by_id(&db, goal.id).await?.unwrap();
        assert_eq!(unchanged.status, GoalStatus::Active);

        Ok(())
    }
}
