//! Gemini-style generative-text client used as the budget advisor.
//!
//! The request asks for `application/json` output constrained by
//! [`budget_plan_schema`], so the answer can be parsed strictly instead of scraped
//! out of free text.

use super::{build_client, join_url, transport_error};
use crate::{
    config::settings::GenerativeConfig,
    core::budget::{BudgetAdvisor, BudgetRequest, budget_plan_schema},
    errors::{Error, Result},
};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::fmt::Write as _;
use tracing::{debug, error};

const SERVICE_NAME: &str = "generative service";
const API_KEY_HEADER: &str = "x-goog-api-key";

/// Budget advisor backed by a `generateContent` endpoint.
#[derive(Clone)]
pub struct GeminiBudgetAdvisor {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
    timeout_secs: u64,
}

impl std::fmt::Debug for GeminiBudgetAdvisor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiBudgetAdvisor")
            .field("endpoint", &self.endpoint)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("timeout_secs", &self.timeout_secs)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

impl GeminiBudgetAdvisor {
    /// Creates an advisor for the configured model.
    ///
    /// Without an API key every call fails with a configuration error, so the rest of
    /// the service can still start.
    ///
    /// # Errors
    /// Returns [`Error::Config`] if the HTTP client cannot be built.
    pub fn new(config: &GenerativeConfig, api_key: Option<String>) -> Result<Self> {
        let path = format!("v1beta/models/{}:generateContent", config.model);
        Ok(Self {
            client: build_client(config.timeout_secs)?,
            endpoint: join_url(&config.base_url, &path),
            api_key: api_key.filter(|key| !key.trim().is_empty()),
            timeout_secs: config.timeout_secs,
        })
    }

    /// Full URL generation requests are posted to.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

/// Renders the instructions sent to the model.
pub(crate) fn budget_prompt(request: &BudgetRequest) -> String {
    let prefs = &request.preferences;
    let mut prompt = String::from(
        "You are a personal finance assistant. Propose a monthly budget as JSON.\n",
    );

    let _ = writeln!(prompt, "Monthly income: {:.2}", prefs.monthly_income);
    let _ = writeln!(prompt, "Fixed expenses: {:.2}", prefs.fixed_expenses);
    let _ = writeln!(prompt, "Dependents: {}", prefs.dependents);
    let _ = writeln!(
        prompt,
        "Desired savings: {}% ({:.2} per month)",
        prefs.desired_savings_percentage, request.savings_target
    );
    if let Some(city_tier) = &prefs.city_tier {
        let _ = writeln!(prompt, "City tier: {city_tier}");
    }

    if request.spending_history.is_empty() {
        prompt.push_str("No spending history is available.\n");
    } else {
        let _ = writeln!(
            prompt,
            "Average monthly spending over the last {} months:",
            request.lookback_months
        );
        for spending in &request.spending_history {
            let _ = writeln!(
                prompt,
                "- {}: {:.2}",
                spending.category, spending.monthly_average
            );
        }
    }

    prompt.push_str(
        "Allocate an amount to each spending category, keep savings at or above the \
         desired amount, and do not exceed the monthly income.",
    );
    prompt
}

/// Request body for `generateContent` with schema-constrained JSON output.
pub(crate) fn generate_content_body(prompt: &str) -> serde_json::Value {
    serde_json::json!({
        "contents": [
            { "role": "user", "parts": [{ "text": prompt }] }
        ],
        "generationConfig": {
            "responseMimeType": "application/json",
            "responseSchema": budget_plan_schema()
        }
    })
}

/// Pulls the text of the first part of the first candidate.
fn first_candidate_text(response: GenerateContentResponse) -> Result<String> {
    response
        .candidates
        .into_iter()
        .next()
        .and_then(|candidate| candidate.content)
        .and_then(|content| content.parts.into_iter().next())
        .and_then(|part| part.text)
        .ok_or_else(|| Error::upstream(format!("{SERVICE_NAME} returned no candidate text")))
}

#[async_trait]
impl BudgetAdvisor for GeminiBudgetAdvisor {
    async fn propose_budget(&self, request: &BudgetRequest) -> Result<String> {
        let Some(api_key) = &self.api_key else {
            return Err(Error::Config {
                message: "GENERATIVE_API_KEY is not set".to_string(),
            });
        };

        let body = generate_content_body(&budget_prompt(request));
        debug!("Requesting budget plan from {}", self.endpoint);

        let response = self
            .client
            .post(&self.endpoint)
            .header(API_KEY_HEADER, api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| transport_error(SERVICE_NAME, self.timeout_secs, &e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("Generative service answered {}: {}", status, body);
            return Err(Error::upstream(format!(
                "{SERVICE_NAME} answered with status {status}"
            )));
        }

        let decoded = response
            .json::<GenerateContentResponse>()
            .await
            .map_err(|e| transport_error(SERVICE_NAME, self.timeout_secs, &e))?;
        first_candidate_text(decoded)
    }
}
