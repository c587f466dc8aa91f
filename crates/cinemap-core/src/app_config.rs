use std::path::PathBuf;

use crate::config::{DEFAULT_GEOCODING_BASE_URL, DEFAULT_PLACES_BASE_URL};
use crate::ConfigError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

/// A provider API key. Never printed by `Debug`.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiCredential(String);

impl ApiCredential {
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for ApiCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ApiCredential([redacted])")
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub log_level: String,
    pub database_url: String,
    pub places_base_url: String,
    pub places_api_key: Option<ApiCredential>,
    pub geocoding_base_url: String,
    pub geocoding_api_key: Option<ApiCredential>,
    pub fallback_path: Option<PathBuf>,
    pub user_agent: String,
    pub search_radius_meters: u32,
    pub max_search_radius_meters: u32,
    pub provider_timeout_secs: u64,
    pub provider_max_retries: u32,
    pub provider_retry_backoff_ms: u64,
    pub provider_max_concurrent: usize,
    pub cache_ttl_secs: u64,
    pub cache_max_reuse_km: f64,
    pub cache_capacity: usize,
    pub cache_bucket_degrees: f64,
    pub research_threshold_meters: f64,
}

impl AppConfig {
    /// Credential for the places provider, or `None` when a proxy base URL
    /// supplies it.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingEnvVar`] when the public endpoint is
    /// configured without a key.
    pub fn places_credential(&self) -> Result<Option<&ApiCredential>, ConfigError> {
        required_for_public(
            self.places_api_key.as_ref(),
            &self.places_base_url,
            DEFAULT_PLACES_BASE_URL,
            "CINEMAP_PLACES_API_KEY",
        )
    }

    /// Credential for the geocoding provider, or `None` when a proxy base URL
    /// supplies it.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingEnvVar`] when the public endpoint is
    /// configured without a key.
    pub fn geocoding_credential(&self) -> Result<Option<&ApiCredential>, ConfigError> {
        required_for_public(
            self.geocoding_api_key.as_ref(),
            &self.geocoding_base_url,
            DEFAULT_GEOCODING_BASE_URL,
            "CINEMAP_GEOCODING_API_KEY",
        )
    }
}

fn required_for_public<'a>(
    key: Option<&'a ApiCredential>,
    configured: &str,
    public: &str,
    var: &str,
) -> Result<Option<&'a ApiCredential>, ConfigError> {
    if key.is_none() && configured.trim_end_matches('/') == public {
        return Err(ConfigError::MissingEnvVar(var.to_string()));
    }
    Ok(key)
}
