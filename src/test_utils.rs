//! Shared test utilities for `GoalBuddy`.
//!
//! This module provides common helper functions for setting up test databases,
//! creating test entities with sensible defaults, and stand-ins for the external
//! services.

use crate::{
    core::{
        budget::{BudgetAdvisor, BudgetRequest},
        contribution::{self, ContributionReceipt, NewContribution},
        goal,
        profile::FinancialPreferences,
        recommendation::{Prediction, PredictionFeatures, PredictionService},
    },
    entities::{self, PaymentMethod},
    errors::{Error, Result},
};
use async_trait::async_trait;
use chrono::NaiveDate;
use sea_orm::{ConnectOptions, DatabaseConnection};
use std::sync::Mutex;
use tempfile::TempDir;

/// Routes `tracing` output through the test harness. Safe to call repeatedly.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new("debug"))
        .with_test_writer()
        .try_init();
}

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    init_test_tracing();
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Creates a file-backed `SQLite` database in a fresh temporary directory.
///
/// Unlike [`setup_test_db`] the pool holds several connections, so concurrent tasks
/// really run overlapping transactions. Keep the returned directory alive for as long
/// as the connection is used.
pub async fn setup_file_test_db() -> Result<(TempDir, DatabaseConnection)> {
    init_test_tracing();
    let dir = tempfile::tempdir()?;
    let url = format!("sqlite://{}?mode=rwc", dir.path().join("test.sqlite").display());

    let mut options = ConnectOptions::new(url);
    options.max_connections(8).sqlx_logging(false);
    let db = sea_orm::Database::connect(options).await?;
    crate::config::database::create_tables(&db).await?;
    Ok((dir, db))
}

/// Shorthand for a calendar date in tests.
///
/// # Panics
/// Panics if the date does not exist.
#[allow(clippy::unwrap_used)]
#[must_use]
pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

/// Creates a test goal with sensible defaults.
///
/// # Defaults
/// * `target_amount`: 1000.0
/// * `deadline`: 2030-12-31
pub async fn create_test_goal(
    db: &DatabaseConnection,
    owner: &str,
    title: &str,
) -> Result<entities::goal::Model> {
    goal::create_goal(db, owner, title, 1000.0, date(2030, 12, 31)).await
}

/// Creates a test goal with custom parameters.
pub async fn create_custom_goal(
    db: &DatabaseConnection,
    owner: &str,
    title: &str,
    target_amount: f64,
    deadline: NaiveDate,
) -> Result<entities::goal::Model> {
    goal::create_goal(db, owner, title, target_amount, deadline).await
}

/// Fresh database plus one default goal owned by `"alice"`.
pub async fn setup_with_goal() -> Result<(DatabaseConnection, entities::goal::Model)> {
    let db = setup_test_db().await?;
    let goal = create_test_goal(&db, "alice", "Vacation").await?;
    Ok((db, goal))
}

/// Records a test contribution through the normal contribution path.
///
/// # Defaults
/// * `payment_method`: Bank Transfer
/// * `contributor_id`: `"test_user"`
/// * no transaction id, no notes
pub async fn create_test_contribution(
    db: &DatabaseConnection,
    goal_id: i64,
    amount: f64,
) -> Result<ContributionReceipt> {
    create_custom_contribution(db, goal_id, amount, Some("test_user")).await
}

/// Records a contribution made by `contributor`, or anonymously when `None`.
pub async fn create_custom_contribution(
    db: &DatabaseConnection,
    goal_id: i64,
    amount: f64,
    contributor: Option<&str>,
) -> Result<ContributionReceipt> {
    contribution::apply_contribution(
        db,
        NewContribution {
            goal_id,
            contribution_amount: amount,
            payment_method: PaymentMethod::BankTransfer,
            contributor_id: contributor.map(str::to_string),
            transaction_id: None,
            notes: None,
        },
    )
    .await
}

/// A plausible, valid set of preferences.
#[must_use]
pub fn test_preferences() -> FinancialPreferences {
    FinancialPreferences {
        monthly_income: 5000.0,
        fixed_expenses: 2000.0,
        dependents: 1,
        desired_savings_percentage: 20.0,
        age: Some(34),
        occupation: Some("Engineer".to_string()),
        city_tier: Some("Tier_1".to_string()),
    }
}

/// Prediction service that answers from memory and records what it was asked.
#[derive(Debug, Default)]
pub struct StubPrediction {
    answer: Option<Prediction>,
    /// Every feature vector received, in call order
    pub seen: Mutex<Vec<PredictionFeatures>>,
}

impl StubPrediction {
    /// Always answers with the given confidence and insights.
    #[must_use]
    pub fn answering(confidence: f64, insights: &str) -> Self {
        Self {
            answer: Some(Prediction {
                confidence,
                gemini_insights: insights.to_string(),
            }),
            seen: Mutex::default(),
        }
    }

    /// Always fails as if the service timed out.
    #[must_use]
    pub fn failing() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PredictionService for StubPrediction {
    async fn predict(&self, features: &PredictionFeatures) -> Result<Prediction> {
        if let Ok(mut seen) = self.seen.lock() {
            seen.push(features.clone());
        }
        self.answer
            .clone()
            .ok_or(Error::UpstreamTimeout { seconds: 20 })
    }
}

/// Budget advisor that answers with fixed text and records what it was asked.
#[derive(Debug, Default)]
pub struct StubAdvisor {
    answer: Option<String>,
    /// Every request received, in call order
    pub seen: Mutex<Vec<BudgetRequest>>,
}

impl StubAdvisor {
    /// Always answers with `text`.
    #[must_use]
    pub fn answering(text: &str) -> Self {
        Self {
            answer: Some(text.to_string()),
            seen: Mutex::default(),
        }
    }

    /// Always fails with an upstream error.
    #[must_use]
    pub fn failing() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BudgetAdvisor for StubAdvisor {
    async fn propose_budget(&self, request: &BudgetRequest) -> Result<String> {
        if let Ok(mut seen) = self.seen.lock() {
            seen.push(request.clone());
        }
        self.answer
            .clone()
            .ok_or_else(|| Error::upstream("advisor unavailable"))
    }
}

/// Router over a fresh database with stub services and default settings.
pub async fn test_app() -> Result<axum::Router> {
    let db = setup_test_db().await?;
    Ok(test_app_with(
        db,
        StubPrediction::answering(0.75, "Looks achievable."),
        StubAdvisor::answering(
            r#"{"allocations":[{"category":"groceries","amount":400}],"savings":1000,"notes":"Keep it up"}"#,
        ),
    ))
}

/// Router over the given database and stub services.
pub fn test_app_with(
    db: DatabaseConnection,
    prediction: StubPrediction,
    advisor: StubAdvisor,
) -> axum::Router {
    crate::api::app_router(std::sync::Arc::new(crate::api::AppState {
        db,
        prediction: std::sync::Arc::new(prediction),
        advisor: std::sync::Arc::new(advisor),
        config: std::sync::Arc::new(crate::config::AppConfig::default()),
    }))
}

/// A `GET` request made by `user`.
///
/// # Panics
/// Panics if the request cannot be built.
#[allow(clippy::unwrap_used)]
#[must_use]
pub fn get_as(user: &str, uri: &str) -> axum::http::Request<axum::body::Body> {
    axum::http::Request::builder()
        .uri(uri)
        .header(crate::api::auth::USER_ID_HEADER, user)
        .body(axum::body::Body::empty())
        .unwrap()
}

/// A request with a JSON body made by `user`.
///
/// # Panics
/// Panics if the request cannot be built.
#[allow(clippy::unwrap_used)]
#[must_use]
pub fn json_as(
    method: &str,
    user: &str,
    uri: &str,
    body: &serde_json::Value,
) -> axum::http::Request<axum::body::Body> {
    axum::http::Request::builder()
        .method(method)
        .uri(uri)
        .header(crate::api::auth::USER_ID_HEADER, user)
        .header(axum::http::header::CONTENT_TYPE, "application/json")
        .body(axum::body::Body::from(body.to_string()))
        .unwrap()
}

/// Sends one request and returns the status with the JSON body (`Null` when the body
/// is empty or not JSON).
///
/// # Panics
/// Panics if the router fails or the body cannot be read.
#[allow(clippy::unwrap_used)]
pub async fn send(
    app: axum::Router,
    request: axum::http::Request<axum::body::Body>,
) -> (axum::http::StatusCode, serde_json::Value) {
    use tower::ServiceExt;

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
    (status, body)
}
