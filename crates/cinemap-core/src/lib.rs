pub mod app_config;
pub mod config;
pub mod geo;
pub mod theatre;

pub use app_config::{ApiCredential, AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env};
pub use geo::{distance_meters, BoundingBox, Coordinate, EARTH_RADIUS_KM};
pub use theatre::{
    sort_by_distance, CacheEntry, OpeningHours, Provenance, ProviderKind, Review, Theatre,
    Viewport,
};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for environment variable {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}
