//! Goal entity - A user-owned savings target.
//!
//! Each goal has a title, a target amount, a deadline and a running `current_amount`
//! that is kept equal to the sum of its contributions. Goals are never deleted; they
//! move between the `Active`, `Completed` and `Abandoned` statuses instead.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Lifecycle status of a goal
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
pub enum GoalStatus {
    /// Still being saved for; counted by the monthly target aggregation
    #[sea_orm(string_value = "Active")]
    Active,
    /// Target reached and closed by the owner
    #[sea_orm(string_value = "Completed")]
    Completed,
    /// Given up by the owner
    #[sea_orm(string_value = "Abandoned")]
    Abandoned,
}

/// Goal database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "goals")]
pub struct Model {
    /// Unique identifier for the goal
    #[sea_orm(primary_key)]
    pub id: i64,
    /// User id of the owner
    pub created_by: String,
    /// Human-readable title (e.g., "Emergency fund")
    pub title: String,
    /// Amount to reach, in dollars
    pub target_amount: f64,
    /// Date by which the target should be reached
    pub deadline: Date,
    /// Running total of all contributions, in dollars
    pub current_amount: f64,
    /// Lifecycle status
    pub status: GoalStatus,
    /// When the goal was created
    pub created_at: DateTimeUtc,
    /// When the goal was last modified (including balance increments)
    pub updated_at: DateTimeUtc,
}

/// Defines relationships between Goal and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One goal has many contributions
    #[sea_orm(has_many = "super::goal_contribution::Entity")]
    Contributions,
}

impl Related<super::goal_contribution::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Contributions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
