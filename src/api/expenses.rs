use super::{AppState, auth::CurrentUser, error::ApiResult};
use crate::{
    core::expense::{CategorySpending, list_expenses, record_expense, spending_by_category},
    entities::ExpenseModel,
};
use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    routing::get,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::sync::Arc;

#[derive(Deserialize)]
struct ListExpensesQuery {
    since: Option<DateTime<Utc>>,
}

#[derive(Deserialize)]
struct NewExpenseRequest {
    category: String,
    amount: f64,
    #[serde(default)]
    description: Option<String>,
    /// Defaults to the time of the request
    #[serde(default)]
    spent_at: Option<DateTime<Utc>>,
}

#[derive(Deserialize)]
struct SummaryQuery {
    months: Option<u32>,
}

async fn get_expenses(
    user: CurrentUser,
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListExpensesQuery>,
) -> ApiResult<Json<Vec<ExpenseModel>>> {
    let expenses = list_expenses(&state.db, user.id(), query.since).await?;
    Ok(Json(expenses))
}

async fn create_expense(
    user: CurrentUser,
    State(state): State<Arc<AppState>>,
    Json(payload): Json<NewExpenseRequest>,
) -> ApiResult<(StatusCode, Json<ExpenseModel>)> {
    let expense = record_expense(
        &state.db,
        user.id(),
        &payload.category,
        payload.amount,
        payload.description,
        payload.spent_at.unwrap_or_else(Utc::now),
    )
    .await?;
    Ok((StatusCode::CREATED, Json(expense)))
}

async fn summary(
    user: CurrentUser,
    State(state): State<Arc<AppState>>,
    Query(query): Query<SummaryQuery>,
) -> ApiResult<Json<Vec<CategorySpending>>> {
    let months = query
        .months
        .unwrap_or(state.config.budget.lookback_months);
    let spending = spending_by_category(&state.db, user.id(), Utc::now(), months).await?;
    Ok(Json(spending))
}

/// Routes for recording, listing and summarizing expenses.
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/expenses", get(get_expenses).post(create_expense))
        .route("/expenses/summary", get(summary))
}
