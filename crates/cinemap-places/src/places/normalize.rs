//! Mapping from Places API records to [`Theatre`].

use chrono::{DateTime, TimeZone, Utc};
use cinemap_core::{Coordinate, OpeningHours, Provenance, ProviderKind, Review, Theatre};

use super::types::{PhotoRef, PlaceDetails, PlaceReview, PlaceSummary};

/// Photos kept per theatre.
pub const MAX_PHOTOS: usize = 3;

/// Converts a nearby-search record into a basic theatre.
///
/// Returns `None` when the record has no usable coordinate; such records are
/// dropped rather than placed at a default position.
pub(crate) fn summary_to_theatre(
    summary: PlaceSummary,
    photo_url: impl Fn(&str) -> Option<String>,
) -> Option<Theatre> {
    let location = summary.geometry.and_then(|g| g.location)?;
    let coordinate = Coordinate::new(location.lat?, location.lng?);
    if !coordinate.is_valid() {
        return None;
    }

    Some(Theatre {
        id: summary.place_id,
        name: summary
            .name
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| "Unnamed cinema".to_owned()),
        location: coordinate,
        address: summary.vicinity.unwrap_or_default(),
        rating: summary.rating.filter(|r| in_rating_range(*r)),
        photos: photo_urls(&summary.photos, photo_url),
        reviews: Vec::new(),
        distance: 0.0,
        opening_hours: None,
        website: None,
        phone_number: None,
        provenance: Provenance::provider(ProviderKind::Places),
    })
}

/// Merges a details record into `theatre`. Fields absent from the details
/// keep whatever the nearby-search record supplied.
pub(crate) fn apply_details(
    mut theatre: Theatre,
    details: PlaceDetails,
    photo_url: impl Fn(&str) -> Option<String>,
) -> Theatre {
    if let Some(address) = details.formatted_address.filter(|a| !a.is_empty()) {
        theatre.address = address;
    }
    if let Some(rating) = details.rating.filter(|r| in_rating_range(*r)) {
        theatre.rating = Some(rating);
    }
    if !details.photos.is_empty() {
        theatre.photos = photo_urls(&details.photos, photo_url);
    }
    theatre.reviews = details.reviews.into_iter().filter_map(to_review).collect();
    theatre.opening_hours = details.opening_hours.map(|h| OpeningHours {
        open_now: h.open_now,
        weekday_text: h.weekday_text,
    });
    theatre.website = details.website;
    theatre.phone_number = details.formatted_phone_number;
    theatre
}

fn photo_urls(photos: &[PhotoRef], photo_url: impl Fn(&str) -> Option<String>) -> Vec<String> {
    photos
        .iter()
        .take(MAX_PHOTOS)
        .filter_map(|p| photo_url(&p.photo_reference))
        .collect()
}

fn in_rating_range(rating: f64) -> bool {
    (0.0..=5.0).contains(&rating)
}

/// Reviews without a rating or timestamp, or with a rating outside `[0, 5]`,
/// are skipped.
fn to_review(review: PlaceReview) -> Option<Review> {
    let rating = review.rating.filter(|r| in_rating_range(*r))?;
    let timestamp: DateTime<Utc> = Utc.timestamp_opt(review.time?, 0).single()?;
    Some(Review {
        author: review
            .author_name
            .filter(|a| !a.trim().is_empty())
            .unwrap_or_else(|| "Anonymous".to_owned()),
        rating,
        text: review.text.unwrap_or_default(),
        timestamp,
    })
}
