//! Theatre discovery policy and the map screen's interaction model.
//!
//! [`Discovery`] sequences the cache, the two live providers, and the static
//! fallback catalog. [`MapController`] sits on top of it and owns viewport
//! state, re-search detection, and local review/photo edits.

pub mod cluster;
pub mod controller;
pub mod discovery;
pub mod fallback;
pub mod location;

pub use cluster::{cluster_theatres, MarkerCluster};
pub use controller::{ControllerOptions, MapController, SearchTicket};
pub use discovery::{Discovery, DiscoveryOptions, DiscoveryOutcome, ResultSource};
pub use fallback::{FallbackCatalog, FallbackRegion, FallbackTheatre};
pub use location::{FixedLocation, LocationError, LocationSource, LocationWarning, DEFAULT_REGION};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read fallback catalog at {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse fallback catalog: {0}")]
    Parse(#[source] serde_yaml::Error),

    #[error("fallback catalog validation error: {0}")]
    Validation(String),
}

/// Errors raised while wiring a [`Discovery`] from configuration. Discovery
/// itself never fails once built.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error(transparent)]
    Config(#[from] cinemap_core::ConfigError),

    #[error(transparent)]
    Places(#[from] cinemap_places::PlacesError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),
}
