//! Shared HTTP plumbing for the provider clients.
//!
//! Each client owns one [`ApiHttp`], which carries the `reqwest` client, the
//! normalised base URL, the optional credential, and the retry settings.

use std::time::Duration;

use cinemap_core::ApiCredential;
use reqwest::{Client, Url};
use serde::de::DeserializeOwned;

use crate::error::PlacesError;
use crate::retry::retry_with_backoff;

pub const DEFAULT_USER_AGENT: &str = "cinemap/0.1 (theatre-discovery)";

/// Transport settings shared by every provider client.
#[derive(Debug, Clone)]
pub struct ClientSettings {
    pub timeout_secs: u64,
    pub max_retries: u32,
    pub backoff_base_ms: u64,
    /// Upper bound on concurrent requests in detail and keyword fan-outs.
    pub max_concurrent: usize,
    pub user_agent: String,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            timeout_secs: 10,
            max_retries: 2,
            backoff_base_ms: 250,
            max_concurrent: 4,
            user_agent: DEFAULT_USER_AGENT.to_owned(),
        }
    }
}

impl ClientSettings {
    #[must_use]
    pub fn from_config(config: &cinemap_core::AppConfig) -> Self {
        Self {
            timeout_secs: config.provider_timeout_secs,
            max_retries: config.provider_max_retries,
            backoff_base_ms: config.provider_retry_backoff_ms,
            max_concurrent: config.provider_max_concurrent.max(1),
            user_agent: config.user_agent.clone(),
        }
    }
}

pub(crate) struct ApiHttp {
    client: Client,
    base_url: Url,
    /// Query parameter the provider expects the credential under.
    key_param: &'static str,
    api_key: Option<ApiCredential>,
    max_retries: u32,
    backoff_base_ms: u64,
}

impl ApiHttp {
    pub(crate) fn new(
        base_url: &str,
        key_param: &'static str,
        api_key: Option<&ApiCredential>,
        settings: &ClientSettings,
    ) -> Result<Self, PlacesError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .connect_timeout(Duration::from_secs(settings.timeout_secs.min(10)))
            .user_agent(settings.user_agent.clone())
            .build()?;

        // Exactly one trailing slash so relative endpoint paths join under any
        // proxy prefix instead of replacing its last segment.
        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let parsed = Url::parse(&normalised).map_err(|e| PlacesError::InvalidBaseUrl {
            url: base_url.to_owned(),
            reason: e.to_string(),
        })?;
        if parsed.cannot_be_a_base() {
            return Err(PlacesError::InvalidBaseUrl {
                url: base_url.to_owned(),
                reason: "URL cannot be used as a base".to_owned(),
            });
        }

        Ok(Self {
            client,
            base_url: parsed,
            key_param,
            api_key: api_key.cloned(),
            max_retries: settings.max_retries,
            backoff_base_ms: settings.backoff_base_ms,
        })
    }

    /// Builds `{base}{path}?{params}&{key_param}={key}`. The credential is
    /// appended only when one is configured.
    pub(crate) fn build_url(&self, path: &str, params: &[(&str, &str)]) -> Result<Url, PlacesError> {
        let mut url = self
            .base_url
            .join(path)
            .map_err(|e| PlacesError::InvalidBaseUrl {
                url: format!("{}{path}", self.base_url),
                reason: e.to_string(),
            })?;
        {
            let mut pairs = url.query_pairs_mut();
            for (k, v) in params {
                pairs.append_pair(k, v);
            }
            if let Some(key) = &self.api_key {
                pairs.append_pair(self.key_param, key.expose());
            }
        }
        Ok(url)
    }

    /// GETs `url` and parses the body as JSON, retrying transient failures.
    ///
    /// The error context uses the path only so credentials never reach logs.
    pub(crate) async fn get_json(&self, url: &Url) -> Result<serde_json::Value, PlacesError> {
        self.get_checked(url, url.path(), |_| Ok(())).await
    }

    /// GETs `url`, deserializes the body into `T` and runs `check` on it,
    /// all inside one retried attempt. A status envelope rejected by `check`
    /// with a transient status is therefore retried like an HTTP failure.
    pub(crate) async fn get_checked<T, F>(
        &self,
        url: &Url,
        context: &str,
        check: F,
    ) -> Result<T, PlacesError>
    where
        T: DeserializeOwned,
        F: Fn(&T) -> Result<(), PlacesError>,
    {
        let check = &check;
        retry_with_backoff(self.max_retries, self.backoff_base_ms, || async move {
            let response = self.client.get(url.clone()).send().await?;
            let response = response.error_for_status()?;
            let body = response.text().await?;
            let parsed: T = serde_json::from_str(&body).map_err(|e| PlacesError::Deserialize {
                context: context.to_owned(),
                source: e,
            })?;
            check(&parsed)?;
            Ok(parsed)
        })
        .await
    }
}
