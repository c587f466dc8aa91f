//! Device geolocation collaborator.

use async_trait::async_trait;
use cinemap_core::Coordinate;
use thiserror::Error;

/// Where discovery starts when the device position is unavailable
/// (Hong Kong, Tsim Sha Tsui).
pub const DEFAULT_REGION: Coordinate = Coordinate::new(22.3193, 114.1694);

/// Why the device position could not be read. Services-disabled and
/// permission-denied are distinct so the UI can point the user at the right
/// setting.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LocationError {
    #[error("location services are disabled")]
    ServicesDisabled,

    #[error("location permission was denied")]
    PermissionDenied,

    #[error("could not determine position: {0}")]
    PositionUnavailable(String),
}

/// A non-fatal, user-visible notice that discovery ran from `fallback`
/// instead of the device position.
#[derive(Debug, Clone, PartialEq)]
pub struct LocationWarning {
    pub reason: LocationError,
    pub fallback: Coordinate,
}

impl std::fmt::Display for LocationWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}; showing theatres near {}", self.reason, self.fallback)
    }
}

#[async_trait]
pub trait LocationSource: Send + Sync {
    async fn current_position(&self) -> Result<Coordinate, LocationError>;
}

/// A source that always reports the same answer. Used by the CLI, where the
/// "device" position is whatever the user passed on the command line.
pub struct FixedLocation(pub Result<Coordinate, LocationError>);

#[async_trait]
impl LocationSource for FixedLocation {
    async fn current_position(&self) -> Result<Coordinate, LocationError> {
        self.0.clone()
    }
}
