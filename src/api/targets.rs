use super::{AppState, auth::CurrentUser, error::ApiResult};
use crate::core::targets::{MonthlyTargetSummary, monthly_target_summary};
use axum::{Json, Router, extract::State, routing::get};
use chrono::Utc;
use std::sync::Arc;

async fn monthly_targets(
    user: CurrentUser,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<MonthlyTargetSummary>> {
    let summary = monthly_target_summary(&state.db, user.id(), Utc::now()).await?;
    Ok(Json(summary))
}

/// Routes for the monthly target summary.
pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/targets/monthly", get(monthly_targets))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use crate::test_utils::*;
    use axum::http::StatusCode;
    use chrono::{Months, Utc};

    #[tokio::test]
    async fn test_monthly_targets_for_caller() {
        let db = setup_test_db().await.unwrap();
        let deadline = Utc::now()
            .date_naive()
            .checked_add_months(Months::new(12))
            .unwrap();
        let goal = create_custom_goal(&db, "alice", "Car", 12000.0, deadline)
            .await
            .unwrap();
        create_custom_contribution(&db, goal.id, 250.0, Some("alice"))
            .await
            .unwrap();
        // A gift raises the balance but is not the caller's own saving
        create_custom_contribution(&db, goal.id, 40.0, Some("bob"))
            .await
            .unwrap();
        create_custom_goal(&db, "bob", "Other", 600.0, deadline)
            .await
            .unwrap();
        let app = test_app_with(db, StubPrediction::failing(), StubAdvisor::failing());

        let (status, summary) = send(app, get_as("alice", "/api/v1/targets/monthly")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(summary["total_monthly_target"], 1000.0);
        assert_eq!(summary["current_month_contributions"], 250.0);
        assert_eq!(summary["total_contributions"], 250.0);
        assert_eq!(summary["active_goals"], 1);
        assert_eq!(summary["goals"][0]["months_remaining"], 12);
        assert_eq!(summary["goals"][0]["current_amount"], 290.0);
    }
}
