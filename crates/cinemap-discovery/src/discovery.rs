//! Discovery orchestrator: cache, primary provider, secondary provider, then
//! static fallback.
//!
//! Stages run strictly in order and exactly one stage supplies the returned
//! list. Results from different stages are never merged. Live provider results
//! are written through to the cache; cached and static results are not.

use std::sync::Arc;
use std::time::Duration;

use cinemap_core::{AppConfig, Coordinate, Theatre};
use cinemap_places::{ClientSettings, GeocodingClient, PlacesClient, TheatreProvider};
use cinemap_store::{CacheOptions, KeyValueStore, TheatreCache};
use serde::Serialize;

use crate::fallback::FallbackCatalog;
use crate::DiscoveryError;

/// Stage that produced a [`DiscoveryOutcome`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultSource {
    Cache,
    Primary,
    Secondary,
    StaticFallback,
    /// Every stage was empty or failed and no fallback region matched.
    Exhausted,
}

impl std::fmt::Display for ResultSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResultSource::Cache => write!(f, "cache"),
            ResultSource::Primary => write!(f, "primary"),
            ResultSource::Secondary => write!(f, "secondary"),
            ResultSource::StaticFallback => write!(f, "static_fallback"),
            ResultSource::Exhausted => write!(f, "exhausted"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct DiscoveryOutcome {
    /// Sorted ascending by `distance` from the query origin.
    pub theatres: Vec<Theatre>,
    pub source: ResultSource,
}

impl DiscoveryOutcome {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.theatres.is_empty()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct DiscoveryOptions {
    pub cache_ttl: Duration,
    pub max_reuse_km: f64,
    /// Budget for one provider stage, retries and fan-out included.
    pub stage_timeout: Duration,
}

impl Default for DiscoveryOptions {
    fn default() -> Self {
        Self {
            cache_ttl: Duration::from_secs(3600),
            max_reuse_km: 5.0,
            stage_timeout: Duration::from_secs(30),
        }
    }
}

impl DiscoveryOptions {
    /// Each stage may issue several requests, so its budget is three request
    /// timeouts.
    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            cache_ttl: Duration::from_secs(config.cache_ttl_secs),
            max_reuse_km: config.cache_max_reuse_km,
            stage_timeout: Duration::from_secs(config.provider_timeout_secs.saturating_mul(3)),
        }
    }
}

pub struct Discovery {
    cache: TheatreCache,
    primary: Arc<dyn TheatreProvider>,
    secondary: Arc<dyn TheatreProvider>,
    fallback: FallbackCatalog,
    options: DiscoveryOptions,
}

impl Discovery {
    #[must_use]
    pub fn new(
        cache: TheatreCache,
        primary: Arc<dyn TheatreProvider>,
        secondary: Arc<dyn TheatreProvider>,
        fallback: FallbackCatalog,
        options: DiscoveryOptions,
    ) -> Self {
        Self {
            cache,
            primary,
            secondary,
            fallback,
            options,
        }
    }

    /// Wires the production providers, cache, and fallback catalog from
    /// `config` on top of an initialised key-value store.
    ///
    /// # Errors
    ///
    /// Returns [`DiscoveryError`] if a provider credential is missing, a
    /// provider client cannot be built, or the fallback catalog fails to load.
    pub fn from_config(
        config: &AppConfig,
        store: Arc<dyn KeyValueStore>,
    ) -> Result<Self, DiscoveryError> {
        let settings = ClientSettings::from_config(config);
        let primary = PlacesClient::with_base_url(
            &config.places_base_url,
            config.places_credential()?,
            &settings,
        )?
        .with_radius_ceiling(config.max_search_radius_meters);
        let secondary = GeocodingClient::with_base_url(
            &config.geocoding_base_url,
            config.geocoding_credential()?,
            &settings,
        )?;
        let fallback = match &config.fallback_path {
            Some(path) => FallbackCatalog::load(path)?,
            None => FallbackCatalog::builtin()?,
        };
        let cache = TheatreCache::new(
            store,
            CacheOptions {
                capacity: config.cache_capacity,
                bucket_degrees: config.cache_bucket_degrees,
            },
        );

        Ok(Self::new(
            cache,
            Arc::new(primary),
            Arc::new(secondary),
            fallback,
            DiscoveryOptions::from_config(config),
        ))
    }

    /// Finds theatres around `origin`. Never fails: an empty list with
    /// [`ResultSource::Exhausted`] is the only failure signal.
    pub async fn discover(&self, origin: Coordinate, radius_meters: u32) -> DiscoveryOutcome {
        if let Some(entry) = self
            .cache
            .get(&origin, self.options.cache_ttl, self.options.max_reuse_km)
            .await
        {
            if !entry.results.is_empty() {
                tracing::debug!(count = entry.results.len(), %origin, "serving theatres from cache");
                return DiscoveryOutcome {
                    theatres: entry.results,
                    source: ResultSource::Cache,
                };
            }
        }

        for (source, provider) in [
            (ResultSource::Primary, &self.primary),
            (ResultSource::Secondary, &self.secondary),
        ] {
            if let Some(theatres) = self.run_stage(provider.as_ref(), origin, radius_meters).await {
                self.cache.put(&theatres, &origin, radius_meters).await;
                tracing::info!(%source, count = theatres.len(), %origin, "discovery succeeded");
                return DiscoveryOutcome { theatres, source };
            }
        }

        let theatres = self.fallback.theatres_near(&origin);
        if theatres.is_empty() {
            tracing::warn!(%origin, "all discovery stages exhausted");
            DiscoveryOutcome {
                theatres,
                source: ResultSource::Exhausted,
            }
        } else {
            tracing::info!(count = theatres.len(), %origin, "serving static fallback theatres");
            DiscoveryOutcome {
                theatres,
                source: ResultSource::StaticFallback,
            }
        }
    }

    /// Writes a locally edited theatre back into every cached slot holding
    /// its id. Returns the number of slots updated.
    pub async fn write_back(&self, theatre: &Theatre) -> usize {
        self.cache.update_theatre(theatre).await
    }

    pub async fn clear_cache(&self) {
        self.cache.clear().await;
    }

    /// `None` when the stage errored, timed out, or found nothing.
    async fn run_stage(
        &self,
        provider: &dyn TheatreProvider,
        origin: Coordinate,
        radius_meters: u32,
    ) -> Option<Vec<Theatre>> {
        let provider_kind = provider.kind();
        let result = tokio::time::timeout(
            self.options.stage_timeout,
            provider.find_nearby(origin, radius_meters),
        )
        .await;

        match result {
            Ok(Ok(mut theatres)) => {
                theatres.retain(|t| t.location.is_valid());
                if theatres.is_empty() {
                    tracing::debug!(provider = %provider_kind, radius_m = radius_meters, "provider returned no theatres");
                    None
                } else {
                    Some(theatres)
                }
            }
            Ok(Err(e)) => {
                tracing::warn!(provider = %provider_kind, error = %e, "provider failed, falling through");
                None
            }
            Err(_) => {
                tracing::warn!(
                    provider = %provider_kind,
                    timeout_ms = u64::try_from(self.options.stage_timeout.as_millis()).unwrap_or(u64::MAX),
                    "provider timed out, falling through"
                );
                None
            }
        }
    }
}
