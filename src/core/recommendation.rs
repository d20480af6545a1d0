//! Goal recommendation - feature engineering plus an external prediction call.
//!
//! The user's preferences and a prospective goal are turned into a flat feature
//! vector, which is sent to the prediction service. Its confidence score and narrative
//! insights are relayed back together with the features and a naive linear plan
//! (`target / months_remaining`).

use crate::{
    core::{
        profile::FinancialPreferences,
        targets::{months_remaining, round_to_cents},
    },
    errors::{Error, Result},
};
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

/// Number of dependents that maps to a full dependents impact of 1.0.
pub const DEPENDENTS_NORMALIZATION: f64 = 6.0;

/// Flat feature vector sent to the prediction service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionFeatures {
    /// Monthly income
    pub income: f64,
    /// Fixed monthly expenses
    pub expenses: f64,
    /// Goal target amount
    pub goal_target: f64,
    /// Months until the goal deadline, at least 1
    pub months_remaining: u32,
    /// `expenses / income`
    pub expense_ratio: f64,
    /// Desired savings percentage as a fraction
    pub savings_rate: f64,
    /// Weighted score, see [`financial_health_score`]
    pub financial_health_score: f64,
    /// `dependents / 6`
    pub dependents_impact: f64,
    /// `goal_target / months_remaining`
    pub suggested_monthly_savings: f64,
    /// Number of dependents
    pub dependents: u32,
    /// Age in years
    pub age: Option<u32>,
    /// Occupation label
    pub occupation: Option<String>,
    /// City tier label
    pub city_tier: Option<String>,
}

/// What the prediction service answers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    /// Likelihood of reaching the goal, 0.0-1.0
    pub confidence: f64,
    /// Narrative insights produced by the service
    pub gemini_insights: String,
}

/// Recommendation relayed to the caller.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GoalRecommendation {
    /// Features the prediction was made from
    pub features: PredictionFeatures,
    /// Naive linear plan, rounded to cents
    pub suggested_monthly_savings: f64,
    /// Confidence from the prediction service
    pub confidence: f64,
    /// Narrative insights from the prediction service
    pub insights: String,
}

/// External service that scores a feature vector.
#[async_trait]
pub trait PredictionService: Send + Sync {
    /// Scores the features; any transport or decoding failure is an error.
    async fn predict(&self, features: &PredictionFeatures) -> Result<Prediction>;
}

/// `0.4 * (1 - expense_ratio) + 0.4 * savings_rate + 0.2 * (1 - dependents_impact)`
#[must_use]
pub fn financial_health_score(expense_ratio: f64, savings_rate: f64, dependents_impact: f64) -> f64 {
    0.4 * (1.0 - expense_ratio) + 0.4 * savings_rate + 0.2 * (1.0 - dependents_impact)
}

/// Derives the prediction feature vector for a goal of `target_amount` due on `deadline`.
///
/// # Errors
/// Returns a validation error when the preferences are unusable (e.g. zero income)
/// or the target is not a positive amount.
pub fn build_prediction_features(
    preferences: &FinancialPreferences,
    target_amount: f64,
    deadline: NaiveDate,
    today: NaiveDate,
) -> Result<PredictionFeatures> {
    preferences.validate()?;
    if !target_amount.is_finite() || target_amount <= 0.0 {
        return Err(Error::InvalidAmount {
            amount: target_amount,
        });
    }

    let months = months_remaining(today, deadline);
    let expense_ratio = preferences.fixed_expenses / preferences.monthly_income;
    let savings_rate = preferences.desired_savings_percentage / 100.0;
    let dependents_impact = f64::from(preferences.dependents) / DEPENDENTS_NORMALIZATION;

    Ok(PredictionFeatures {
        income: preferences.monthly_income,
        expenses: preferences.fixed_expenses,
        goal_target: target_amount,
        months_remaining: months,
        expense_ratio,
        savings_rate,
        financial_health_score: financial_health_score(
            expense_ratio,
            savings_rate,
            dependents_impact,
        ),
        dependents_impact,
        suggested_monthly_savings: target_amount / f64::from(months),
        dependents: preferences.dependents,
        age: preferences.age,
        occupation: preferences.occupation.clone(),
        city_tier: preferences.city_tier.clone(),
    })
}

/// Builds the features, asks the prediction service, and relays its answer.
///
/// An out-of-range confidence is treated as an upstream failure.
#[instrument(skip(prediction, preferences))]
pub async fn recommend_goal_plan(
    prediction: &dyn PredictionService,
    preferences: &FinancialPreferences,
    target_amount: f64,
    deadline: NaiveDate,
    today: NaiveDate,
) -> Result<GoalRecommendation> {
    let features = build_prediction_features(preferences, target_amount, deadline, today)?;

    let answer = prediction.predict(&features).await?;
    if !(0.0..=1.0).contains(&answer.confidence) {
        return Err(Error::upstream(format!(
            "prediction confidence {} is outside 0..1",
            answer.confidence
        )));
    }

    info!(
        confidence = answer.confidence,
        months_remaining = features.months_remaining,
        "Goal recommendation ready"
    );

    Ok(GoalRecommendation {
        suggested_monthly_savings: round_to_cents(features.suggested_monthly_savings),
        confidence: answer.confidence,
        insights: answer.gemini_insights,
        features,
    })
}
