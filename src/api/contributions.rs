use super::{AppState, auth::CurrentUser, error::ApiResult};
use crate::{
    core::contribution::{ContributionReceipt, NewContribution, apply_contribution},
    entities::PaymentMethod,
};
use axum::{Json, Router, extract::State, http::StatusCode, routing::post};
use serde::Deserialize;
use std::sync::Arc;

/// Body of `POST /contributions`. The contributor is the caller unless the
/// contribution is marked anonymous.
#[derive(Deserialize)]
struct ContributionRequest {
    goal_id: i64,
    contribution_amount: f64,
    payment_method: PaymentMethod,
    #[serde(default)]
    transaction_id: Option<String>,
    #[serde(default)]
    notes: Option<String>,
    #[serde(default)]
    anonymous: bool,
}

async fn record_contribution(
    user: CurrentUser,
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ContributionRequest>,
) -> ApiResult<(StatusCode, Json<ContributionReceipt>)> {
    let contributor_id = (!payload.anonymous).then(|| user.id().to_string());
    let receipt = apply_contribution(
        &state.db,
        NewContribution {
            goal_id: payload.goal_id,
            contribution_amount: payload.contribution_amount,
            payment_method: payload.payment_method,
            contributor_id,
            transaction_id: payload.transaction_id,
            notes: payload.notes,
        },
    )
    .await?;
    Ok((StatusCode::CREATED, Json(receipt)))
}

/// Routes for recording contributions.
pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/contributions", post(record_contribution))
}
