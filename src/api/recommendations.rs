use super::{AppState, auth::CurrentUser, error::ApiResult};
use crate::core::{
    budget::{BudgetPlan, recommend_budget},
    profile::{FinancialPreferences, require_preferences},
    recommendation::{GoalRecommendation, recommend_goal_plan},
};
use axum::{
    Json, Router,
    extract::{Query, State},
    routing::post,
};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use std::sync::Arc;

#[derive(Deserialize)]
struct GoalRecommendationRequest {
    target_amount: f64,
    deadline: NaiveDate,
    /// Overrides the stored profile for a what-if calculation
    #[serde(default)]
    preferences: Option<FinancialPreferences>,
}

#[derive(Deserialize)]
struct BudgetQuery {
    months: Option<u32>,
}

async fn recommend_goal(
    user: CurrentUser,
    State(state): State<Arc<AppState>>,
    Json(payload): Json<GoalRecommendationRequest>,
) -> ApiResult<Json<GoalRecommendation>> {
    let preferences = match payload.preferences {
        Some(preferences) => preferences,
        None => require_preferences(&state.db, user.id()).await?,
    };

    let recommendation = recommend_goal_plan(
        state.prediction.as_ref(),
        &preferences,
        payload.target_amount,
        payload.deadline,
        Utc::now().date_naive(),
    )
    .await?;
    Ok(Json(recommendation))
}

async fn recommend_budget_plan(
    user: CurrentUser,
    State(state): State<Arc<AppState>>,
    Query(query): Query<BudgetQuery>,
) -> ApiResult<Json<BudgetPlan>> {
    let months = query
        .months
        .unwrap_or(state.config.budget.lookback_months);
    let plan = recommend_budget(
        &state.db,
        state.advisor.as_ref(),
        user.id(),
        Utc::now(),
        months,
    )
    .await?;
    Ok(Json(plan))
}

/// Routes for goal and budget recommendations.
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/recommendations/goal", post(recommend_goal))
        .route("/recommendations/budget", post(recommend_budget_plan))
}
