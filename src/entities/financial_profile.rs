//! Financial profile entity - Per-user preferences consumed by the recommendation pipeline.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Financial profile database model (one row per user)
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "financial_profiles")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Owner of the profile
    #[sea_orm(unique)]
    pub user_id: String,
    /// Net monthly income in dollars
    pub monthly_income: f64,
    /// Rent, loans, insurance and other fixed monthly costs
    pub fixed_expenses: f64,
    /// Number of dependents
    pub dependents: i32,
    /// Share of income the user wants to save, 0-100
    pub desired_savings_percentage: f64,
    /// Age in years
    pub age: Option<i32>,
    /// Occupation label
    pub occupation: Option<String>,
    /// City tier label (e.g., "Tier_1")
    pub city_tier: Option<String>,
    /// When the profile was last written
    pub updated_at: DateTimeUtc,
}

/// `FinancialProfile` has no relationships with other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
