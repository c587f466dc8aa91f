use thiserror::Error;

/// Errors returned by the places and geocoding clients.
#[derive(Debug, Error)]
pub enum PlacesError {
    /// Network, TLS, timeout, or non-2xx HTTP failure.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The provider answered 200 but reported a failure status in the body.
    #[error("{provider} API returned status {status}: {}", message.as_deref().unwrap_or("no message"))]
    ApiStatus {
        provider: &'static str,
        status: String,
        message: Option<String>,
    },

    /// The response body could not be deserialized into the expected type.
    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    /// Every keyword in a sweep failed; nothing was returned.
    #[error("all {attempted} keyword searches failed")]
    SweepFailed { attempted: usize },

    #[error("no route found between the requested points")]
    NoRoute,
}
