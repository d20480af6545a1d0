//! Goal contribution entity - Money applied toward a goal.
//!
//! Contributions are append-only: once recorded they are never updated or deleted.
//! Recording one increments the parent goal's `current_amount` in the same database
//! transaction (see `core::contribution::apply_contribution`).

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// How the money for a contribution was moved
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
pub enum PaymentMethod {
    /// Scheduled automatic debit
    #[sea_orm(string_value = "Auto-Debit")]
    #[serde(rename = "Auto-Debit")]
    AutoDebit,
    /// Cash handed in
    #[sea_orm(string_value = "Cash Deposit")]
    #[serde(rename = "Cash Deposit")]
    CashDeposit,
    /// Paid by credit card
    #[sea_orm(string_value = "Credit Card")]
    #[serde(rename = "Credit Card")]
    CreditCard,
    /// Wire or ACH transfer
    #[sea_orm(string_value = "Bank Transfer")]
    #[serde(rename = "Bank Transfer")]
    BankTransfer,
}

/// Goal contribution database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "goal_contributions")]
pub struct Model {
    /// Unique identifier for the contribution
    #[sea_orm(primary_key)]
    pub id: i64,
    /// ID of the goal this contribution belongs to
    pub goal_id: i64,
    /// User id of the contributor, `None` for anonymous contributions
    pub contributor_id: Option<String>,
    /// Contributed amount in dollars (at least 1)
    pub contribution_amount: f64,
    /// How the money was moved
    pub payment_method: PaymentMethod,
    /// Optional external reference, unique across all contributions
    #[sea_orm(unique)]
    pub transaction_id: Option<String>,
    /// Free-form notes
    pub notes: Option<String>,
    /// When the contribution was recorded
    pub created_at: DateTimeUtc,
    /// Equal to `created_at`; contributions are immutable
    pub updated_at: DateTimeUtc,
}

/// Defines relationships between `GoalContribution` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each contribution belongs to one goal
    #[sea_orm(
        belongs_to = "super::goal::Entity",
        from = "Column::GoalId",
        to = "super::goal::Column::Id"
    )]
    Goal,
}

impl Related<super::goal::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Goal.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
