use std::str::FromStr;

use crate::app_config::{ApiCredential, AppConfig, Environment};
use crate::ConfigError;

pub const DEFAULT_PLACES_BASE_URL: &str = "https://maps.googleapis.com";
pub const DEFAULT_GEOCODING_BASE_URL: &str = "https://api.mapbox.com";

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a value is invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if a value is invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Provider credentials are optional here. Commands that call a provider
/// check them through [`AppConfig::places_credential`] and
/// [`AppConfig::geocoding_credential`].
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::path::PathBuf;

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let env = parse_environment(&or_default("CINEMAP_ENV", "development"))?;
    let log_level = or_default("CINEMAP_LOG_LEVEL", "info");
    let database_url = or_default("CINEMAP_DATABASE_URL", "sqlite://cinemap.db?mode=rwc");

    let places_base_url = or_default("CINEMAP_PLACES_BASE_URL", DEFAULT_PLACES_BASE_URL);
    let places_api_key = optional_credential(&lookup, "CINEMAP_PLACES_API_KEY");

    let geocoding_base_url = or_default("CINEMAP_GEOCODING_BASE_URL", DEFAULT_GEOCODING_BASE_URL);
    let geocoding_api_key = optional_credential(&lookup, "CINEMAP_GEOCODING_API_KEY");

    let fallback_path = lookup("CINEMAP_FALLBACK_PATH").ok().map(PathBuf::from);
    let user_agent = or_default("CINEMAP_USER_AGENT", "cinemap/0.1 (theatre-discovery)");

    let search_radius_meters =
        parse_number::<u32, _>(&lookup, "CINEMAP_SEARCH_RADIUS_METERS", "10000")?;
    let max_search_radius_meters =
        parse_number::<u32, _>(&lookup, "CINEMAP_MAX_SEARCH_RADIUS_METERS", "30000")?;
    if max_search_radius_meters < search_radius_meters {
        return Err(ConfigError::InvalidEnvVar {
            var: "CINEMAP_MAX_SEARCH_RADIUS_METERS".to_string(),
            reason: format!(
                "{max_search_radius_meters} is below CINEMAP_SEARCH_RADIUS_METERS ({search_radius_meters})"
            ),
        });
    }

    let provider_timeout_secs =
        parse_number::<u64, _>(&lookup, "CINEMAP_PROVIDER_TIMEOUT_SECS", "10")?;
    let provider_max_retries =
        parse_number::<u32, _>(&lookup, "CINEMAP_PROVIDER_MAX_RETRIES", "2")?;
    let provider_retry_backoff_ms =
        parse_number::<u64, _>(&lookup, "CINEMAP_PROVIDER_RETRY_BACKOFF_MS", "250")?;
    let provider_max_concurrent =
        parse_number::<usize, _>(&lookup, "CINEMAP_PROVIDER_MAX_CONCURRENT", "4")?;

    let cache_ttl_secs = parse_number::<u64, _>(&lookup, "CINEMAP_CACHE_TTL_SECS", "3600")?;
    let cache_max_reuse_km = parse_positive_f64(&lookup, "CINEMAP_CACHE_MAX_REUSE_KM", "5")?;
    let cache_capacity = parse_number::<usize, _>(&lookup, "CINEMAP_CACHE_CAPACITY", "8")?;
    let cache_bucket_degrees =
        parse_positive_f64(&lookup, "CINEMAP_CACHE_BUCKET_DEGREES", "0.1")?;
    let research_threshold_meters =
        parse_positive_f64(&lookup, "CINEMAP_RESEARCH_THRESHOLD_METERS", "2000")?;

    Ok(AppConfig {
        env,
        log_level,
        database_url,
        places_base_url,
        places_api_key,
        geocoding_base_url,
        geocoding_api_key,
        fallback_path,
        user_agent,
        search_radius_meters,
        max_search_radius_meters,
        provider_timeout_secs,
        provider_max_retries,
        provider_retry_backoff_ms,
        provider_max_concurrent,
        cache_ttl_secs,
        cache_max_reuse_km,
        cache_capacity,
        cache_bucket_degrees,
        research_threshold_meters,
    })
}

fn optional_credential<F>(lookup: &F, var: &str) -> Option<ApiCredential>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    lookup(var)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .map(ApiCredential::new)
}

fn parse_number<T, F>(lookup: &F, var: &str, default: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let raw = lookup(var).unwrap_or_else(|_| default.to_string());
    raw.parse::<T>().map_err(|e| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason: e.to_string(),
    })
}

fn parse_positive_f64<F>(lookup: &F, var: &str, default: &str) -> Result<f64, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let value = parse_number::<f64, _>(lookup, var, default)?;
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: format!("expected a positive number, got {value}"),
        })
    }
}

/// Parse a string into an `Environment` variant.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "CINEMAP_ENV".to_string(),
            reason: format!("unknown environment '{other}'"),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
