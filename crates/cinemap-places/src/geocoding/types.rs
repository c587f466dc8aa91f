use cinemap_core::Coordinate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct FeatureCollection {
    #[serde(default)]
    pub features: Vec<Feature>,
}

#[derive(Debug, Deserialize)]
pub struct Feature {
    pub id: String,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub place_name: Option<String>,
    /// `[longitude, latitude]`.
    #[serde(default)]
    pub center: Option<Vec<f64>>,
}

impl Feature {
    /// The feature's point, or `None` when `center` is missing, short, or
    /// out of range.
    pub fn coordinate(&self) -> Option<Coordinate> {
        match self.center.as_deref() {
            Some([lng, lat, ..]) => Some(Coordinate::new(*lat, *lng)).filter(Coordinate::is_valid),
            _ => None,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct DirectionsResponse {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub routes: Vec<RawRoute>,
}

#[derive(Debug, Deserialize)]
pub struct RawRoute {
    pub geometry: RouteGeometry,
    /// Meters.
    pub distance: f64,
    /// Seconds.
    pub duration: f64,
}

#[derive(Debug, Deserialize)]
pub struct RouteGeometry {
    /// `[longitude, latitude]` pairs.
    #[serde(default)]
    pub coordinates: Vec<Vec<f64>>,
}

/// One forward-geocoding hit for the place search box.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceSuggestion {
    pub id: String,
    pub name: String,
    /// Fully qualified label, e.g. "Mong Kok, Kowloon, Hong Kong".
    pub place_name: String,
    pub coordinate: Coordinate,
}

/// A driving route between two points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Route {
    pub coordinates: Vec<Coordinate>,
    pub distance_meters: f64,
    pub duration_secs: f64,
}
