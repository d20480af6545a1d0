//! Financial profile business logic - the preferences recommendations are built from.

use crate::{
    entities::{FinancialProfile, financial_profile},
    errors::{Error, Result},
};
use chrono::Utc;
use sea_orm::{Set, prelude::*};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

/// User-supplied financial preferences.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinancialPreferences {
    /// Net monthly income in dollars
    pub monthly_income: f64,
    /// Fixed monthly costs in dollars
    pub fixed_expenses: f64,
    /// Number of dependents
    #[serde(default)]
    pub dependents: u32,
    /// Share of income to save, 0-100
    pub desired_savings_percentage: f64,
    /// Age in years
    #[serde(default)]
    pub age: Option<u32>,
    /// Occupation label
    #[serde(default)]
    pub occupation: Option<String>,
    /// City tier label
    #[serde(default)]
    pub city_tier: Option<String>,
}

impl FinancialPreferences {
    /// Checks that the numbers can feed the recommendation formulas.
    ///
    /// # Errors
    /// Returns [`Error::Validation`] describing the first offending field.
    pub fn validate(&self) -> Result<()> {
        if !self.monthly_income.is_finite() || self.monthly_income <= 0.0 {
            return Err(Error::validation("monthly_income must be greater than zero"));
        }
        if !self.fixed_expenses.is_finite() || self.fixed_expenses < 0.0 {
            return Err(Error::validation("fixed_expenses cannot be negative"));
        }
        if !(0.0..=100.0).contains(&self.desired_savings_percentage) {
            return Err(Error::validation(
                "desired_savings_percentage must be between 0 and 100",
            ));
        }
        Ok(())
    }
}

impl From<financial_profile::Model> for FinancialPreferences {
    fn from(model: financial_profile::Model) -> Self {
        Self {
            monthly_income: model.monthly_income,
            fixed_expenses: model.fixed_expenses,
            dependents: u32::try_from(model.dependents).unwrap_or(0),
            desired_savings_percentage: model.desired_savings_percentage,
            age: model.age.and_then(|age| u32::try_from(age).ok()),
            occupation: model.occupation,
            city_tier: model.city_tier,
        }
    }
}

fn to_db_int(value: u32, field: &str) -> Result<i32> {
    i32::try_from(value).map_err(|_| Error::validation(format!("{field} is out of range")))
}

/// Finds the profile of `user_id`, if one was saved.
pub async fn get_profile(
    db: &DatabaseConnection,
    user_id: &str,
) -> Result<Option<financial_profile::Model>> {
    FinancialProfile::find()
        .filter(financial_profile::Column::UserId.eq(user_id))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Loads the preferences of `user_id`, failing with `ProfileNotFound` if none exist.
pub async fn require_preferences(
    db: &DatabaseConnection,
    user_id: &str,
) -> Result<FinancialPreferences> {
    get_profile(db, user_id)
        .await?
        .map(FinancialPreferences::from)
        .ok_or_else(|| Error::ProfileNotFound {
            user_id: user_id.to_string(),
        })
}

/// Creates or replaces the profile of `user_id`.
#[instrument(skip(db, preferences))]
pub async fn upsert_profile(
    db: &DatabaseConnection,
    user_id: &str,
    preferences: FinancialPreferences,
) -> Result<financial_profile::Model> {
    preferences.validate()?;

    let dependents = to_db_int(preferences.dependents, "dependents")?;
    let age = preferences
        .age
        .map(|age| to_db_int(age, "age"))
        .transpose()?;

    let existing = get_profile(db, user_id).await?;
    let is_new = existing.is_none();
    let mut active_model: financial_profile::ActiveModel = match existing {
        Some(existing) => existing.into(),
        None => financial_profile::ActiveModel {
            user_id: Set(user_id.to_string()),
            ..Default::default()
        },
    };

    active_model.monthly_income = Set(preferences.monthly_income);
    active_model.fixed_expenses = Set(preferences.fixed_expenses);
    active_model.dependents = Set(dependents);
    active_model.desired_savings_percentage = Set(preferences.desired_savings_percentage);
    active_model.age = Set(age);
    active_model.occupation = Set(preferences.occupation);
    active_model.city_tier = Set(preferences.city_tier);
    active_model.updated_at = Set(Utc::now());

    let saved = if is_new {
        active_model.insert(db).await?
    } else {
        active_model.update(db).await?
    };
    info!("Saved financial profile for {}", user_id);
    Ok(saved)
}
