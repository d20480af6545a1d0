//! HTTP clients for the external services behind the recommendation traits.

pub mod generative;
pub mod prediction;

pub use generative::GeminiBudgetAdvisor;
pub use prediction::HttpPredictionService;

use crate::errors::{Error, Result};
use reqwest::Client;
use std::time::Duration;

/// Builds a client whose every request is bounded by `timeout_secs`.
fn build_client(timeout_secs: u64) -> Result<Client> {
    Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| Error::Config {
            message: format!("Failed to create HTTP client: {e}"),
        })
}

/// Maps a transport or decoding failure to the crate error.
fn transport_error(service: &str, timeout_secs: u64, err: &reqwest::Error) -> Error {
    if err.is_timeout() {
        Error::UpstreamTimeout {
            seconds: timeout_secs,
        }
    } else if err.is_decode() {
        Error::upstream(format!("{service} returned an unreadable response: {err}"))
    } else {
        Error::upstream(format!("{service} request failed: {err}"))
    }
}

/// Joins a base URL and a path without doubling the slash.
fn join_url(base_url: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}
