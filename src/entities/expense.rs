//! Expense entity - Historical spending records.
//!
//! Expenses are summarized per category to give the budget recommendation
//! a picture of how the user actually spends.
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Expense database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "expenses")]
pub struct Model {
    /// Unique identifier for the expense
    #[sea_orm(primary_key)]
    pub id: i64,
    /// User who spent the money
    pub user_id: String,
    /// Spending category, stored trimmed and lower-cased (e.g., `"groceries"`)
    pub category: String,
    /// Amount spent in dollars
    pub amount: f64,
    /// Optional description
    pub description: Option<String>,
    /// When the money was spent
    pub spent_at: DateTimeUtc,
}

/// `Expense` has no relationships with other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
