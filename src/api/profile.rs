use super::{AppState, auth::CurrentUser, error::ApiResult};
use crate::{
    core::profile::{FinancialPreferences, get_profile, upsert_profile},
    entities::FinancialProfileModel,
    errors::Error,
};
use axum::{Json, Router, extract::State, routing::get};
use std::sync::Arc;

async fn read_profile(
    user: CurrentUser,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<FinancialProfileModel>> {
    let profile = get_profile(&state.db, user.id())
        .await?
        .ok_or_else(|| Error::ProfileNotFound {
            user_id: user.id().to_string(),
        })?;
    Ok(Json(profile))
}

async fn save_profile(
    user: CurrentUser,
    State(state): State<Arc<AppState>>,
    Json(preferences): Json<FinancialPreferences>,
) -> ApiResult<Json<FinancialProfileModel>> {
    let saved = upsert_profile(&state.db, user.id(), preferences).await?;
    Ok(Json(saved))
}

/// Routes for reading and saving the caller's financial profile.
pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/profile", get(read_profile).put(save_profile))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use crate::test_utils::*;
    use axum::http::StatusCode;
    use serde_json::json;

    #[tokio::test]
    async fn test_profile_round_trip() {
        let app = test_app().await.unwrap();

        let (status, _) = send(app.clone(), get_as("alice", "/api/v1/profile")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, saved) = send(
            app.clone(),
            json_as(
                "PUT",
                "alice",
                "/api/v1/profile",
                &json!({
                    "monthly_income": 4200.0,
                    "fixed_expenses": 1800.0,
                    "dependents": 2,
                    "desired_savings_percentage": 15.0
                }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(saved["user_id"], "alice");
        assert_eq!(saved["dependents"], 2);

        let (status, fetched) = send(app, get_as("alice", "/api/v1/profile")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(fetched["monthly_income"], 4200.0);
        assert_eq!(fetched["age"], serde_json::Value::Null);
    }

    #[tokio::test]
    async fn test_profile_validation() {
        let app = test_app().await.unwrap();

        let (status, body) = send(
            app,
            json_as(
                "PUT",
                "alice",
                "/api/v1/profile",
                &json!({
                    "monthly_income": 4200.0,
                    "fixed_expenses": 1800.0,
                    "desired_savings_percentage": 150.0
                }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["message"].as_str().unwrap().contains("desired_savings_percentage"));
    }
}
