//! Client for the Places category search ("rich" provider).
//!
//! Discovery runs in two phases: a `movie_theater` nearby search whose radius
//! doubles up to a ceiling while the result set is empty, then one details
//! request per candidate. Detail requests run with bounded concurrency and a
//! failed detail fetch keeps the candidate's basic fields.

mod normalize;
pub mod types;

use async_trait::async_trait;
use cinemap_core::{sort_by_distance, ApiCredential, Coordinate, ProviderKind, Theatre};
use futures::stream::{self, StreamExt};

use crate::error::PlacesError;
use crate::http::{ApiHttp, ClientSettings};
use crate::provider::TheatreProvider;
use types::{DetailsResponse, NearbySearchResponse, PlaceDetails};

pub use normalize::MAX_PHOTOS;

pub use cinemap_core::config::DEFAULT_PLACES_BASE_URL;
pub const DEFAULT_RADIUS_CEILING_METERS: u32 = 30_000;

const PROVIDER: &str = "places";
const NEARBY_PATH: &str = "maps/api/place/nearbysearch/json";
const DETAILS_PATH: &str = "maps/api/place/details/json";
const PHOTO_PATH: &str = "maps/api/place/photo";
const PLACE_TYPE: &str = "movie_theater";
const DETAIL_FIELDS: &str =
    "formatted_address,formatted_phone_number,website,opening_hours,photos,reviews,rating";
const PHOTO_MAX_WIDTH: &str = "400";

/// Places API client.
///
/// Use [`PlacesClient::new`] for production or [`PlacesClient::with_base_url`]
/// to point at a credential proxy or a mock server.
pub struct PlacesClient {
    http: ApiHttp,
    radius_ceiling_meters: u32,
    max_concurrent: usize,
}

impl PlacesClient {
    /// # Errors
    ///
    /// Returns [`PlacesError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(api_key: &ApiCredential, settings: &ClientSettings) -> Result<Self, PlacesError> {
        Self::with_base_url(DEFAULT_PLACES_BASE_URL, Some(api_key), settings)
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
            http: ApiHttp::new(base_url, "key", api_key, settings)?,
            radius_ceiling_meters: DEFAULT_RADIUS_CEILING_METERS,
            max_concurrent: settings.max_concurrent.max(1),
        })
    }

    /// Caps radius widening at `meters`.
    #[must_use]
    pub fn with_radius_ceiling(mut self, meters: u32) -> Self {
        self.radius_ceiling_meters = meters.max(1);
        self
    }

    /// Runs nearby searches starting at `radius_meters`, doubling the radius
    /// while the result set is empty, until the ceiling is reached.
    ///
    /// Records without a usable coordinate are dropped and do not count as
    /// results.
    ///
    /// # Errors
    ///
    /// - [`PlacesError::ApiStatus`] for any status other than `OK` or
    ///   `ZERO_RESULTS` (quota, denied, invalid request).
    /// - [`PlacesError::Http`] on network failure or non-2xx HTTP status.
    /// - [`PlacesError::Deserialize`] if the body is not the expected shape.
    pub async fn nearby_search(
        &self,
        origin: Coordinate,
        radius_meters: u32,
    ) -> Result<Vec<Theatre>, PlacesError> {
        let mut radius = radius_meters.clamp(1, self.radius_ceiling_meters);
        loop {
            let results = self.nearby_page(origin, radius).await?;
            if !results.is_empty() || radius >= self.radius_ceiling_meters {
                return Ok(results);
            }
            let widened = radius.saturating_mul(2).min(self.radius_ceiling_meters);
            tracing::debug!(
                from = radius,
                to = widened,
                "no theatres in radius, widening search"
            );
            radius = widened;
        }
    }

    /// Fetches the details record for one place.
    ///
    /// # Errors
    ///
    /// Same conditions as [`PlacesClient::nearby_search`]. A `NOT_FOUND`
    /// status surfaces as [`PlacesError::ApiStatus`].
    pub async fn place_details(&self, place_id: &str) -> Result<PlaceDetails, PlacesError> {
        let url = self.http.build_url(
            DETAILS_PATH,
            &[("place_id", place_id), ("fields", DETAIL_FIELDS)],
        )?;
        let context = format!("place details(place_id={place_id})");
        let response: DetailsResponse = self
            .http
            .get_checked(&url, &context, |r: &DetailsResponse| {
                check_status(&r.status, r.error_message.as_deref())
            })
            .await?;
        Ok(response.result.unwrap_or_default())
    }

    /// Builds a fetchable photo URL for a photo reference. The credential is
    /// embedded when one is configured.
    #[must_use]
    pub fn photo_url(&self, reference: &str) -> Option<String> {
        self.http
            .build_url(
                PHOTO_PATH,
                &[
                    ("maxwidth", PHOTO_MAX_WIDTH),
                    ("photo_reference", reference),
                ],
            )
            .ok()
            .map(String::from)
    }

    async fn nearby_page(
        &self,
        origin: Coordinate,
        radius: u32,
    ) -> Result<Vec<Theatre>, PlacesError> {
        let location = format!("{},{}", origin.latitude, origin.longitude);
        let radius_param = radius.to_string();
        let url = self.http.build_url(
            NEARBY_PATH,
            &[
                ("location", location.as_str()),
                ("radius", radius_param.as_str()),
                ("type", PLACE_TYPE),
            ],
        )?;
        let context = format!("nearby search(location={location}, radius={radius})");
        let response: NearbySearchResponse = self
            .http
            .get_checked(&url, &context, |r: &NearbySearchResponse| {
                check_status(&r.status, r.error_message.as_deref())
            })
            .await?;

        let raw = response.results.len();
        let theatres: Vec<Theatre> = response
            .results
            .into_iter()
            .filter_map(|summary| normalize::summary_to_theatre(summary, |r| self.photo_url(r)))
            .collect();
        if theatres.len() < raw {
            tracing::debug!(
                dropped = raw - theatres.len(),
                "dropped places without coordinates"
            );
        }
        Ok(theatres)
    }

    async fn enrich(&self, basic: Theatre) -> Theatre {
        match self.place_details(&basic.id).await {
            Ok(details) => normalize::apply_details(basic, details, |r| self.photo_url(r)),
            Err(e) => {
                tracing::warn!(
                    place_id = %basic.id,
                    error = %e,
                    "place details failed, keeping basic record"
                );
                basic
            }
        }
    }
}

#[async_trait]
impl TheatreProvider for PlacesClient {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Places
    }

    async fn find_nearby(
        &self,
        origin: Coordinate,
        radius_meters: u32,
    ) -> Result<Vec<Theatre>, PlacesError> {
        let candidates = self.nearby_search(origin, radius_meters).await?;
        tracing::debug!(candidates = candidates.len(), "enriching places candidates");

        let mut theatres: Vec<Theatre> = stream::iter(candidates)
            .map(|basic| self.enrich(basic))
            .buffered(self.max_concurrent)
            .collect()
            .await;
        sort_by_distance(&mut theatres, &origin);
        Ok(theatres)
    }
}

fn check_status(status: &str, message: Option<&str>) -> Result<(), PlacesError> {
    match status {
        "OK" | "ZERO_RESULTS" => Ok(()),
        other => Err(PlacesError::ApiStatus {
            provider: PROVIDER,
            status: other.to_owned(),
            message: message.map(str::to_owned),
        }),
    }
}
