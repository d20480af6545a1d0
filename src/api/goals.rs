use super::{AppState, auth::CurrentUser, error::ApiResult};
use crate::{
    core::{
        contribution::list_contributions_for_goal,
        goal::{self, GoalDetailsUpdate, GoalWithContributions},
        reconcile::{ReconcileReport, reconcile_goal},
    },
    entities::{GoalContributionModel, GoalModel, GoalStatus},
};
use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post, put},
};
use chrono::NaiveDate;
use serde::Deserialize;
use std::sync::Arc;

#[derive(Deserialize)]
struct ListGoalsQuery {
    status: Option<GoalStatus>,
}

#[derive(Deserialize)]
struct CreateGoalRequest {
    title: String,
    target_amount: f64,
    deadline: NaiveDate,
}

#[derive(Deserialize)]
struct UpdateGoalRequest {
    title: Option<String>,
    target_amount: Option<f64>,
    deadline: Option<NaiveDate>,
}

#[derive(Deserialize)]
struct StatusRequest {
    status: GoalStatus,
}

async fn list_goals(
    user: CurrentUser,
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListGoalsQuery>,
) -> ApiResult<Json<Vec<GoalModel>>> {
    let goals = goal::list_goals_for_owner(&state.db, user.id(), query.status).await?;
    Ok(Json(goals))
}

async fn create_goal(
    user: CurrentUser,
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateGoalRequest>,
) -> ApiResult<(StatusCode, Json<GoalModel>)> {
    let created = goal::create_goal(
        &state.db,
        user.id(),
        &payload.title,
        payload.target_amount,
        payload.deadline,
    )
    .await?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn get_goal(
    user: CurrentUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> ApiResult<Json<GoalWithContributions>> {
    let view = goal::get_goal_with_contributions(&state.db, id, user.id()).await?;
    Ok(Json(view))
}

async fn update_goal(
    user: CurrentUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateGoalRequest>,
) -> ApiResult<Json<GoalModel>> {
    let changes = GoalDetailsUpdate {
        title: payload.title,
        target_amount: payload.target_amount,
        deadline: payload.deadline,
    };
    let updated = goal::update_goal_details(&state.db, id, user.id(), changes).await?;
    Ok(Json(updated))
}

async fn set_status(
    user: CurrentUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(payload): Json<StatusRequest>,
) -> ApiResult<Json<GoalModel>> {
    let updated = goal::set_goal_status(&state.db, id, user.id(), payload.status).await?;
    Ok(Json(updated))
}

async fn list_contributions(
    user: CurrentUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Vec<GoalContributionModel>>> {
    goal::get_goal_for_owner(&state.db, id, user.id()).await?;
    let contributions = list_contributions_for_goal(&state.db, id).await?;
    Ok(Json(contributions))
}

async fn reconcile(
    user: CurrentUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> ApiResult<Json<ReconcileReport>> {
    let report = reconcile_goal(&state.db, id, user.id()).await?;
    Ok(Json(report))
}

/// Routes for goal management, contribution history and reconciliation.
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/goals", get(list_goals).post(create_goal))
        .route("/goals/{id}", get(get_goal).put(update_goal))
        .route("/goals/{id}/status", put(set_status))
        .route("/goals/{id}/contributions", get(list_contributions))
        .route("/goals/{id}/reconcile", post(reconcile))
}
