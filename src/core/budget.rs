//! Budget recommendation via the generative-text service.
//!
//! The user's preferences and recent spending per category are packed into a
//! [`BudgetRequest`]. The advisor is asked for JSON matching a fixed schema, and the
//! answer is parsed strictly by [`parse_budget_plan`]: the whole payload must be valid,
//! and a single bad allocation rejects the plan instead of being skipped.

use crate::{
    core::{
        expense::{CategorySpending, spending_by_category},
        profile::{FinancialPreferences, require_preferences},
        targets::round_to_cents,
    },
    errors::{Error, Result},
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{info, instrument, warn};

/// Everything the advisor needs to propose a budget.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BudgetRequest {
    /// The user's stated preferences
    pub preferences: FinancialPreferences,
    /// Spending per category over the lookback window
    pub spending_history: Vec<CategorySpending>,
    /// Length of the lookback window in months
    pub lookback_months: u32,
    /// `monthly_income * desired_savings_percentage / 100`, rounded to cents
    pub savings_target: f64,
}

/// Budgeted amount for one category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CategoryAllocation {
    /// Category name
    pub category: String,
    /// Monthly amount in dollars
    pub amount: f64,
}

/// A budget plan as returned by the advisor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BudgetPlan {
    /// Monthly amount per category
    pub allocations: Vec<CategoryAllocation>,
    /// Monthly amount to set aside as savings
    pub savings: f64,
    /// Optional free-text explanation
    #[serde(default)]
    pub notes: Option<String>,
}

impl BudgetPlan {
    /// Sum of all allocations plus savings.
    #[must_use]
    pub fn total(&self) -> f64 {
        self.allocations.iter().map(|a| a.amount).sum::<f64>() + self.savings
    }
}

/// External service that proposes a budget.
#[async_trait]
pub trait BudgetAdvisor: Send + Sync {
    /// Returns the raw JSON text produced for the request.
    async fn propose_budget(&self, request: &BudgetRequest) -> Result<String>;
}

/// JSON schema the advisor's answer must follow.
#[must_use]
pub fn budget_plan_schema() -> serde_json::Value {
    serde_json::json!({
        "type": "object",
        "properties": {
            "allocations": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "category": { "type": "string" },
                        "amount": { "type": "number" }
                    },
                    "required": ["category", "amount"]
                }
            },
            "savings": { "type": "number" },
            "notes": { "type": "string" }
        },
        "required": ["allocations", "savings"]
    })
}

/// Parses and validates the advisor's JSON answer.
///
/// # Errors
/// Returns [`Error::Upstream`] when the text is not valid JSON for [`BudgetPlan`], when
/// a category is blank or repeated, or when an amount is negative or not finite.
pub fn parse_budget_plan(text: &str) -> Result<BudgetPlan> {
    let mut plan: BudgetPlan = serde_json::from_str(text.trim())
        .map_err(|e| Error::upstream(format!("malformed budget plan: {e}")))?;

    if !plan.savings.is_finite() || plan.savings < 0.0 {
        return Err(Error::upstream(format!(
            "malformed budget plan: invalid savings amount {}",
            plan.savings
        )));
    }

    let mut seen = HashSet::new();
    for allocation in &mut plan.allocations {
        let category = allocation.category.trim().to_lowercase();
        if category.is_empty() {
            return Err(Error::upstream("malformed budget plan: blank category"));
        }
        if !allocation.amount.is_finite() || allocation.amount < 0.0 {
            return Err(Error::upstream(format!(
                "malformed budget plan: invalid amount {} for '{category}'",
                allocation.amount
            )));
        }
        if !seen.insert(category.clone()) {
            return Err(Error::upstream(format!(
                "malformed budget plan: category '{category}' listed twice"
            )));
        }
        allocation.category = category;
    }

    Ok(plan)
}

/// Builds the advisor request from the user's stored profile and spending history.
pub async fn build_budget_request(
    db: &DatabaseConnection,
    user_id: &str,
    now: DateTime<Utc>,
    lookback_months: u32,
) -> Result<BudgetRequest> {
    let preferences = require_preferences(db, user_id).await?;
    let spending_history = spending_by_category(db, user_id, now, lookback_months).await?;
    let savings_target =
        round_to_cents(preferences.monthly_income * preferences.desired_savings_percentage / 100.0);

    Ok(BudgetRequest {
        preferences,
        spending_history,
        lookback_months,
        savings_target,
    })
}

/// Asks the advisor for a budget for `user_id` and returns the validated plan.
#[instrument(skip(db, advisor))]
pub async fn recommend_budget(
    db: &DatabaseConnection,
    advisor: &dyn BudgetAdvisor,
    user_id: &str,
    now: DateTime<Utc>,
    lookback_months: u32,
) -> Result<BudgetPlan> {
    let request = build_budget_request(db, user_id, now, lookback_months).await?;

    let raw = advisor.propose_budget(&request).await?;
    let plan = parse_budget_plan(&raw).inspect_err(|e| warn!("Rejected budget plan: {}", e))?;

    if plan.total() > request.preferences.monthly_income {
        warn!(
            "Budget plan for {} allocates {:.2} against an income of {:.2}",
            user_id,
            plan.total(),
            request.preferences.monthly_income
        );
    }

    info!(
        categories = plan.allocations.len(),
        savings = plan.savings,
        "Budget recommendation ready"
    );
    Ok(plan)
}
