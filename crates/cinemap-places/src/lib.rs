//! Remote theatre providers.
//!
//! Two clients implement [`TheatreProvider`]:
//!
//! - [`PlacesClient`]: category search plus per-place details. Rich results,
//!   but quota-limited and slower.
//! - [`GeocodingClient`]: multi-keyword sweep over forward geocoding. Cheap
//!   and broad, but without ratings, photos, or reviews.
//!
//! Both retry transient failures with jittered exponential back-off and
//! return results sorted by distance from the query origin.

pub mod error;
pub mod geocoding;
pub mod http;
pub mod places;
pub mod provider;
pub(crate) mod retry;

pub use error::PlacesError;
pub use geocoding::types::{PlaceSuggestion, Route};
pub use geocoding::{dedup_key, merge_keyword_batches, GeocodingClient, DEFAULT_KEYWORDS};
pub use http::ClientSettings;
pub use places::{PlacesClient, MAX_PHOTOS};
pub use provider::TheatreProvider;
