//! Theatre records, cache entries, and the map viewport.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::geo::{BoundingBox, Coordinate};

/// Which data source produced a [`Theatre`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    /// Category search with per-place detail enrichment.
    Places,
    /// Keyword sweep over a geocoding API.
    Geocoding,
    /// Curated regional list shipped with the application.
    StaticFallback,
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProviderKind::Places => write!(f, "places"),
            ProviderKind::Geocoding => write!(f, "geocoding"),
            ProviderKind::StaticFallback => write!(f, "static_fallback"),
        }
    }
}

/// Provenance tag: the provider and, for keyword sweeps, the keyword that
/// first surfaced the record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Provenance {
    pub provider: ProviderKind,
    #[serde(default)]
    pub search_term: Option<String>,
}

impl Provenance {
    #[must_use]
    pub fn provider(provider: ProviderKind) -> Self {
        Self {
            provider,
            search_term: None,
        }
    }

    #[must_use]
    pub fn keyword(term: &str) -> Self {
        Self {
            provider: ProviderKind::Geocoding,
            search_term: Some(term.to_owned()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub author: String,
    /// Star rating in `[0, 5]`.
    pub rating: f64,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpeningHours {
    #[serde(default)]
    pub open_now: Option<bool>,
    #[serde(default)]
    pub weekday_text: Vec<String>,
}

/// A normalized movie theatre.
///
/// `rating` is `None` when the provider did not report one; it is never
/// synthesized. The enrichment-only fields (`opening_hours`, `website`,
/// `phone_number`) are populated only when a detail fetch succeeded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Theatre {
    pub id: String,
    pub name: String,
    pub location: Coordinate,
    pub address: String,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub photos: Vec<String>,
    #[serde(default)]
    pub reviews: Vec<Review>,
    /// Meters from the origin of the query that produced this copy.
    #[serde(default)]
    pub distance: f64,
    #[serde(default)]
    pub opening_hours: Option<OpeningHours>,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub phone_number: Option<String>,
    pub provenance: Provenance,
}

impl Theatre {
    /// Recompute `distance` relative to `origin`.
    pub fn annotate_distance(&mut self, origin: &Coordinate) {
        self.distance = origin.distance_to(&self.location);
    }

    /// `true` once a detail fetch has filled any enrichment-only field.
    #[must_use]
    pub fn is_enriched(&self) -> bool {
        self.opening_hours.is_some() || self.website.is_some() || self.phone_number.is_some()
    }
}

/// Annotate every theatre with its distance from `origin` and sort ascending.
pub fn sort_by_distance(theatres: &mut [Theatre], origin: &Coordinate) {
    for theatre in theatres.iter_mut() {
        theatre.annotate_distance(origin);
    }
    theatres.sort_by(|a, b| a.distance.total_cmp(&b.distance));
}

/// One stored discovery result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntry {
    pub timestamp: DateTime<Utc>,
    pub origin_location: Coordinate,
    pub radius_meters: u32,
    pub results: Vec<Theatre>,
}

impl CacheEntry {
    /// Whether this entry may answer a query from `query` at `now`.
    ///
    /// Both conditions must hold: the entry is younger than `ttl`, and its
    /// origin lies within `max_reuse_km` of the query point.
    #[must_use]
    pub fn is_reusable(
        &self,
        now: DateTime<Utc>,
        query: &Coordinate,
        ttl: Duration,
        max_reuse_km: f64,
    ) -> bool {
        // A TTL too large for chrono never expires.
        let fresh = chrono::Duration::from_std(ttl)
            .map_or(true, |ttl| now.signed_duration_since(self.timestamp) < ttl);
        let near = self.origin_location.distance_to(query) <= max_reuse_km * 1000.0;
        fresh && near
    }
}

/// Default span of a freshly centered viewport, in degrees.
pub const DEFAULT_LATITUDE_DELTA: f64 = 0.0922;
pub const DEFAULT_LONGITUDE_DELTA: f64 = 0.0421;

/// Visible map region: a center plus the lat/lng span around it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Viewport {
    pub center: Coordinate,
    pub latitude_delta: f64,
    pub longitude_delta: f64,
}

impl Viewport {
    #[must_use]
    pub fn around(center: Coordinate) -> Self {
        Self {
            center,
            latitude_delta: DEFAULT_LATITUDE_DELTA,
            longitude_delta: DEFAULT_LONGITUDE_DELTA,
        }
    }

    #[must_use]
    pub fn with_span(center: Coordinate, latitude_delta: f64, longitude_delta: f64) -> Self {
        Self {
            center,
            latitude_delta,
            longitude_delta,
        }
    }

    #[must_use]
    pub fn bounds(&self) -> BoundingBox {
        BoundingBox {
            min_lat: self.center.latitude - self.latitude_delta / 2.0,
            max_lat: self.center.latitude + self.latitude_delta / 2.0,
            min_lng: self.center.longitude - self.longitude_delta / 2.0,
            max_lng: self.center.longitude + self.longitude_delta / 2.0,
        }
    }
}
