//! Application settings loading from config.toml
//!
//! Every section of the file is optional and falls back to defaults, so a fresh
//! checkout runs without any configuration. Secrets (the generative API key) are
//! never read from this file; they come from the environment right before use.

use crate::{
    core::expense::MAX_LOOKBACK_MONTHS,
    errors::{Error, Result},
};
use serde::Deserialize;
use std::{net::SocketAddr, path::Path, time::Duration};
use tracing::{debug, warn};

/// Environment variable that overrides the config file location.
pub const CONFIG_PATH_ENV: &str = "GOAL_BUDDY_CONFIG";

/// Configuration structure representing the entire config.toml file
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// HTTP listener settings
    pub server: ServerConfig,
    /// External prediction service used by goal recommendations
    pub prediction: PredictionConfig,
    /// External generative-text service used by budget recommendations
    pub generative: GenerativeConfig,
    /// Budget recommendation tuning
    pub budget: BudgetConfig,
}

/// HTTP listener settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address the API listens on
    pub listen_addr: SocketAddr,
    /// Upper bound for handling one request, in seconds
    pub request_timeout_secs: u64,
    /// Allowed CORS origins; `"*"` allows any
    pub cors_allow_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([127, 0, 0, 1], 8080)),
            request_timeout_secs: 60,
            cors_allow_origins: vec!["*".to_string()],
        }
    }
}

impl ServerConfig {
    /// Request timeout as a [`Duration`]
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Prediction service settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PredictionConfig {
    /// Base URL; requests go to `{base_url}/predict`
    pub base_url: String,
    /// Timeout for one prediction call, in seconds
    pub timeout_secs: u64,
}

impl Default for PredictionConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:5000".to_string(),
            timeout_secs: 20,
        }
    }
}

/// Generative-text service settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GenerativeConfig {
    /// Base URL of the Gemini-compatible API
    pub base_url: String,
    /// Model name used in `/v1beta/models/{model}:generateContent`
    pub model: String,
    /// Timeout for one generation call, in seconds
    pub timeout_secs: u64,
}

impl Default for GenerativeConfig {
    fn default() -> Self {
        Self {
            base_url: "https://generativelanguage.googleapis.com".to_string(),
            model: "gemini-1.5-flash".to_string(),
            timeout_secs: 30,
        }
    }
}

/// Budget recommendation tuning
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BudgetConfig {
    /// How many calendar months of spending history feed the recommendation
    pub lookback_months: u32,
}

impl Default for BudgetConfig {
    fn default() -> Self {
        Self { lookback_months: 3 }
    }
}

/// Parses application settings from TOML text.
///
/// # Errors
/// Returns [`Error::Config`] if the TOML is invalid or a value has the wrong type.
pub fn parse_config(contents: &str) -> Result<AppConfig> {
    let config: AppConfig = toml::from_str(contents).map_err(|e| Error::Config {
        message: format!("Failed to parse config.toml: {e}"),
    })?;

    let lookback = config.budget.lookback_months;
    if !(1..=MAX_LOOKBACK_MONTHS).contains(&lookback) {
        return Err(Error::Config {
            message: format!(
                "budget.lookback_months must be between 1 and {MAX_LOOKBACK_MONTHS}, got {lookback}"
            ),
        });
    }

    Ok(config)
}

/// Loads application settings from a TOML file
///
/// # Errors
/// Returns an error if the file cannot be read or its contents are invalid.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<AppConfig> {
    let path_ref = path.as_ref();
    debug!("Loading configuration from {:?}", path_ref);
    let contents = std::fs::read_to_string(path_ref).map_err(|e| Error::Config {
        message: format!("Failed to read config file {}: {e}", path_ref.display()),
    })?;
    parse_config(&contents)
}

/// Loads settings from `GOAL_BUDDY_CONFIG` (or `./config.toml`).
///
/// A missing file is not an error: defaults are used and a warning is logged.
/// A file that exists but cannot be parsed is an error.
pub fn load_default_config() -> Result<AppConfig> {
    let path = std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| "config.toml".to_string());
    if Path::new(&path).exists() {
        load_config(&path)
    } else {
        warn!("Config file {} not found, using defaults", path);
        Ok(AppConfig::default())
    }
}
