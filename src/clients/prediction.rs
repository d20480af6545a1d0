use super::{build_client, join_url, transport_error};
use crate::{
    config::settings::PredictionConfig,
    core::recommendation::{Prediction, PredictionFeatures, PredictionService},
    errors::{Error, Result},
};
use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, error};

const SERVICE_NAME: &str = "prediction service";

/// Prediction service reached over HTTP at `{base_url}/predict`.
#[derive(Debug, Clone)]
pub struct HttpPredictionService {
    client: Client,
    endpoint: String,
    timeout_secs: u64,
}

impl HttpPredictionService {
    /// Creates a client for the configured prediction service.
    ///
    /// # Errors
    /// Returns [`Error::Config`] if the HTTP client cannot be built.
    pub fn new(config: &PredictionConfig) -> Result<Self> {
        Ok(Self {
            client: build_client(config.timeout_secs)?,
            endpoint: join_url(&config.base_url, "predict"),
            timeout_secs: config.timeout_secs,
        })
    }

    /// Full URL predictions are posted to.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl PredictionService for HttpPredictionService {
    async fn predict(&self, features: &PredictionFeatures) -> Result<Prediction> {
        debug!("Posting features to {}", self.endpoint);

        let response = self
            .client
            .post(&self.endpoint)
            .json(features)
            .send()
            .await
            .map_err(|e| transport_error(SERVICE_NAME, self.timeout_secs, &e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("Prediction service answered {}: {}", status, body);
            return Err(Error::upstream(format!(
                "{SERVICE_NAME} answered with status {status}"
            )));
        }

        response
            .json::<Prediction>()
            .await
            .map_err(|e| transport_error(SERVICE_NAME, self.timeout_secs, &e))
    }
}
