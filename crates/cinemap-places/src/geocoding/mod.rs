//! Client for the keyword-search geocoding provider ("sweep" provider).
//!
//! Theatre discovery issues one forward-geocoding query per keyword, biased
//! toward the origin, and merges the batches with coordinate de-duplication.
//! The same client also backs the free-text place search and driving
//! directions.

mod keywords;
mod merge;
pub mod types;

use async_trait::async_trait;
use cinemap_core::{sort_by_distance, ApiCredential, Coordinate, Provenance, ProviderKind, Theatre};
use futures::stream::{self, StreamExt};
use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};

use crate::error::PlacesError;
use crate::http::{ApiHttp, ClientSettings};
use crate::provider::TheatreProvider;
use types::{DirectionsResponse, FeatureCollection, PlaceSuggestion, Route};

pub use keywords::DEFAULT_KEYWORDS;
pub use merge::{dedup_key, merge_keyword_batches, DEDUP_DECIMALS};

pub use cinemap_core::config::DEFAULT_GEOCODING_BASE_URL;

const PROVIDER: &str = "geocoding";
const RESULT_LIMIT: &str = "5";

/// Geocoding API client.
pub struct GeocodingClient {
    http: ApiHttp,
    keywords: Vec<String>,
    max_concurrent: usize,
}

impl GeocodingClient {
    /// # Errors
    ///
    /// Returns [`PlacesError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(api_key: &ApiCredential, settings: &ClientSettings) -> Result<Self, PlacesError> {
        Self::with_base_url(DEFAULT_GEOCODING_BASE_URL, Some(api_key), settings)
    }

    /// # Errors
    ///
    /// Returns [`PlacesError::Http`] if the `reqwest::Client` cannot be built,
    /// or [`PlacesError::InvalidBaseUrl`] if `base_url` does not parse.
    pub fn with_base_url(
        base_url: &str,
        api_key: Option<&ApiCredential>,
        settings: &ClientSettings,
    ) -> Result<Self, PlacesError> {
        Ok(Self {
            http: ApiHttp::new(base_url, "access_token", api_key, settings)?,
            keywords: DEFAULT_KEYWORDS.iter().map(|k| (*k).to_owned()).collect(),
            max_concurrent: settings.max_concurrent.max(1),
        })
    }

    /// Replaces the sweep keyword list. Order is preserved.
    #[must_use]
    pub fn with_keywords<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.keywords = keywords.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    /// Runs one keyword query biased toward `origin`.
    ///
    /// Features without a valid `center` are dropped. Every returned theatre
    /// carries `keyword` as its provenance search term.
    ///
    /// # Errors
    ///
    /// - [`PlacesError::Http`] on network failure or non-2xx HTTP status.
    /// - [`PlacesError::Deserialize`] if the body is not a feature collection.
    pub async fn keyword_search(
        &self,
        keyword: &str,
        origin: Coordinate,
    ) -> Result<Vec<Theatre>, PlacesError> {
        let proximity = format!("{},{}", origin.longitude, origin.latitude);
        let collection = self
            .forward_geocode(
                keyword,
                &[
                    ("proximity", proximity.as_str()),
                    ("limit", RESULT_LIMIT),
                    ("types", "poi"),
                ],
            )
            .await?;

        Ok(collection
            .features
            .into_iter()
            .filter_map(|feature| {
                let location = feature.coordinate()?;
                let name = feature
                    .text
                    .clone()
                    .or_else(|| feature.place_name.clone())
                    .unwrap_or_else(|| keyword.to_owned());
                Some(Theatre {
                    id: feature.id,
                    name,
                    location,
                    address: feature.place_name.unwrap_or_default(),
                    rating: None,
                    photos: Vec::new(),
                    reviews: Vec::new(),
                    distance: 0.0,
                    opening_hours: None,
                    website: None,
                    phone_number: None,
                    provenance: Provenance::keyword(keyword),
                })
            })
            .collect())
    }

    /// Free-text place search for the search box. Returns at most five
    /// suggestions; a blank query returns an empty list without a request.
    ///
    /// # Errors
    ///
    /// Same conditions as [`GeocodingClient::keyword_search`].
    pub async fn search_places(
        &self,
        query: &str,
        proximity: Option<Coordinate>,
    ) -> Result<Vec<PlaceSuggestion>, PlacesError> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }

        let proximity = proximity.map(|p| format!("{},{}", p.longitude, p.latitude));
        let mut params = vec![("limit", RESULT_LIMIT), ("types", "place,poi")];
        if let Some(p) = proximity.as_deref() {
            params.push(("proximity", p));
        }
        let collection = self.forward_geocode(query, &params).await?;

        Ok(collection
            .features
            .into_iter()
            .filter_map(|feature| {
                let coordinate = feature.coordinate()?;
                let place_name = feature.place_name.unwrap_or_default();
                Some(PlaceSuggestion {
                    id: feature.id,
                    name: feature.text.unwrap_or_else(|| place_name.clone()),
                    place_name,
                    coordinate,
                })
            })
            .collect())
    }

    /// Driving route from `from` to `to`; the first route returned wins.
    ///
    /// # Errors
    ///
    /// - [`PlacesError::NoRoute`] when the provider finds no route.
    /// - [`PlacesError::ApiStatus`] for any other non-`Ok` response code.
    /// - [`PlacesError::Http`] / [`PlacesError::Deserialize`] as for searches.
    pub async fn directions(&self, from: Coordinate, to: Coordinate) -> Result<Route, PlacesError> {
        let path = format!(
            "directions/v5/mapbox/driving/{},{};{},{}",
            from.longitude, from.latitude, to.longitude, to.latitude
        );
        let url = self.http.build_url(
            &path,
            &[
                ("alternatives", "true"),
                ("geometries", "geojson"),
                ("steps", "true"),
            ],
        )?;
        let body = self.http.get_json(&url).await?;
        let response: DirectionsResponse =
            serde_json::from_value(body).map_err(|e| PlacesError::Deserialize {
                context: format!("directions({from} -> {to})"),
                source: e,
            })?;

        match response.code.as_deref() {
            None | Some("Ok") => {}
            Some("NoRoute" | "NoSegment") => return Err(PlacesError::NoRoute),
            Some(code) => {
                return Err(PlacesError::ApiStatus {
                    provider: PROVIDER,
                    status: code.to_owned(),
                    message: response.message,
                })
            }
        }

        let route = response
            .routes
            .into_iter()
            .next()
            .ok_or(PlacesError::NoRoute)?;
        Ok(Route {
            coordinates: route
                .geometry
                .coordinates
                .iter()
                .filter_map(|pair| match pair.as_slice() {
                    [lng, lat, ..] => Some(Coordinate::new(*lat, *lng)),
                    _ => None,
                })
                .collect(),
            distance_meters: route.distance,
            duration_secs: route.duration,
        })
    }

    async fn forward_geocode(
        &self,
        query: &str,
        params: &[(&str, &str)],
    ) -> Result<FeatureCollection, PlacesError> {
        let encoded = utf8_percent_encode(query, NON_ALPHANUMERIC).to_string();
        let url = self
            .http
            .build_url(&format!("geocoding/v5/mapbox.places/{encoded}.json"), params)?;
        let body = self.http.get_json(&url).await?;
        serde_json::from_value(body).map_err(|e| PlacesError::Deserialize {
            context: format!("forward geocode(query={query})"),
            source: e,
        })
    }
}

#[async_trait]
impl TheatreProvider for GeocodingClient {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Geocoding
    }

    /// Sweeps every keyword around `origin`. The provider has no radius
    /// filter, so `radius_meters` is not sent; results are proximity-biased.
    ///
    /// A failing keyword is logged and skipped. The sweep errors only when
    /// every keyword failed.
    async fn find_nearby(
        &self,
        origin: Coordinate,
        _radius_meters: u32,
    ) -> Result<Vec<Theatre>, PlacesError> {
        let outcomes: Vec<(String, Result<Vec<Theatre>, PlacesError>)> =
            stream::iter(self.keywords.clone())
                .map(|keyword: String| async move {
                    let result = self.keyword_search(&keyword, origin).await;
                    (keyword, result)
                })
                .buffered(self.max_concurrent)
                .collect()
                .await;

        let attempted = outcomes.len();
        let mut failed = 0usize;
        let mut batches = Vec::with_capacity(attempted);
        for (keyword, outcome) in outcomes {
            match outcome {
                Ok(batch) => batches.push(batch),
                Err(e) => {
                    failed += 1;
                    tracing::warn!(
                        keyword = %keyword,
                        error = %e,
                        "keyword search failed, skipping"
                    );
                }
            }
        }
        if attempted > 0 && failed == attempted {
            return Err(PlacesError::SweepFailed { attempted });
        }

        let mut theatres = merge_keyword_batches(batches);
        sort_by_distance(&mut theatres, &origin);
        tracing::debug!(attempted, failed, found = theatres.len(), "keyword sweep finished");
        Ok(theatres)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_keywords_cover_chains_and_generic_terms() {
        let client = GeocodingClient::with_base_url(
            "https://geo.example.com",
            None,
            &ClientSettings::default(),
        )
        .unwrap();
        assert_eq!(client.keywords().len(), DEFAULT_KEYWORDS.len());
        assert_eq!(client.keywords()[0], "Broadway Circuit");
        assert!(client.keywords().iter().any(|k| k == "映画館"));
    }

    #[test]
    fn feature_coordinate_reads_lng_lat_order() {
        let feature: types::Feature = serde_json::from_value(serde_json::json!({
            "id": "poi.1",
            "center": [114.1582, 22.2851]
        }))
        .unwrap();
        let c = feature.coordinate().unwrap();
        assert!((c.latitude - 22.2851).abs() < 1e-9);
        assert!((c.longitude - 114.1582).abs() < 1e-9);
    }

    #[test]
    fn feature_without_center_has_no_coordinate() {
        let missing: types::Feature =
            serde_json::from_value(serde_json::json!({ "id": "poi.2" })).unwrap();
        let short: types::Feature =
            serde_json::from_value(serde_json::json!({ "id": "poi.3", "center": [114.0] }))
                .unwrap();
        assert!(missing.coordinate().is_none());
        assert!(short.coordinate().is_none());
    }
}
