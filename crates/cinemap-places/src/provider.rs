use async_trait::async_trait;
use cinemap_core::{Coordinate, ProviderKind, Theatre};

use crate::error::PlacesError;

/// A remote source that can list theatres around a point.
///
/// Implementations return results sorted ascending by distance from `origin`
/// with `distance` populated. An empty list is a valid answer.
#[async_trait]
pub trait TheatreProvider: Send + Sync {
    fn kind(&self) -> ProviderKind;

    async fn find_nearby(
        &self,
        origin: Coordinate,
        radius_meters: u32,
    ) -> Result<Vec<Theatre>, PlacesError>;
}
