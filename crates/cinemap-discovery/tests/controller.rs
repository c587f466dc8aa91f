//! Map controller: re-search detection, stale results, location handling,
//! selection, and local edits.

mod support;

use std::sync::Arc;

use chrono::Utc;
use cinemap_core::{Coordinate, ProviderKind, Review, Viewport};
use cinemap_discovery::{
    ControllerOptions, DiscoveryOutcome, FixedLocation, LocationError, MapController,
    ResultSource, DEFAULT_REGION,
};
use support::{discovery, hk_theatres, theatre, Behavior, ScriptedProvider, HK_ORIGIN};

fn controller_with(
    primary: Arc<ScriptedProvider>,
    location: Result<Coordinate, LocationError>,
) -> MapController {
    let secondary = ScriptedProvider::new(ProviderKind::Geocoding, Behavior::Fail);
    MapController::new(
        Arc::new(discovery(primary, secondary)),
        Arc::new(FixedLocation(location)),
        ControllerOptions::default(),
    )
}

fn places_primary() -> Arc<ScriptedProvider> {
    ScriptedProvider::new(
        ProviderKind::Places,
        Behavior::Return(hk_theatres(ProviderKind::Places)),
    )
}

fn north_of(origin: Coordinate, meters: f64) -> Coordinate {
    // One degree of latitude is ~111.2 km on a 6371 km sphere.
    Coordinate::new(origin.latitude + meters / 111_195.0, origin.longitude)
}

#[tokio::test]
async fn starts_centered_on_default_region_without_search_offer() {
    let mut controller = controller_with(places_primary(), Ok(HK_ORIGIN));
    assert_eq!(controller.viewport().center, DEFAULT_REGION);
    assert!(controller.last_search_origin().is_none());
    assert!(!controller.on_viewport_settled(Viewport::around(north_of(HK_ORIGIN, 5_000.0))));
}

#[tokio::test]
async fn panning_past_threshold_offers_search_this_area() {
    let primary = places_primary();
    let mut controller = controller_with(primary.clone(), Ok(HK_ORIGIN));
    assert!(controller.search_this_area().await);
    assert_eq!(controller.last_search_origin(), Some(DEFAULT_REGION));
    assert_eq!(controller.last_source(), Some(ResultSource::Primary));

    assert!(!controller.on_viewport_settled(Viewport::around(north_of(DEFAULT_REGION, 1_000.0))));
    assert!(!controller.has_moved_significantly());

    let far = north_of(DEFAULT_REGION, 3_000.0);
    assert!(controller.on_viewport_settled(Viewport::around(far)));
    assert!(controller.has_moved_significantly());

    assert!(controller.search_this_area().await);
    assert!(!controller.has_moved_significantly());
    assert_eq!(controller.last_search_origin(), Some(far));
    assert!(!controller.is_searching());
}

#[tokio::test]
async fn superseded_ticket_is_discarded() {
    let mut controller = controller_with(places_primary(), Ok(HK_ORIGIN));

    let stale = controller.begin_search(HK_ORIGIN);
    let current = controller.begin_search(north_of(HK_ORIGIN, 500.0));
    assert!(controller.is_searching());

    let fresh = DiscoveryOutcome {
        theatres: vec![theatre("new", 22.32, 114.17, ProviderKind::Places)],
        source: ResultSource::Primary,
    };
    let old = DiscoveryOutcome {
        theatres: vec![theatre("old", 22.30, 114.16, ProviderKind::Places)],
        source: ResultSource::Secondary,
    };

    assert!(controller.apply_results(current, fresh));
    assert!(!controller.apply_results(stale, old));
    assert_eq!(controller.theatres().len(), 1);
    assert_eq!(controller.theatres()[0].id, "new");
    assert_eq!(controller.last_search_origin(), Some(current.origin()));
    assert!(!controller.is_searching());
}

#[tokio::test]
async fn search_this_area_is_refused_while_in_flight() {
    let primary = places_primary();
    let mut controller = controller_with(primary.clone(), Ok(HK_ORIGIN));
    let _ticket = controller.begin_search(HK_ORIGIN);

    assert!(!controller.search_this_area().await);
    assert_eq!(primary.calls(), 0);
}

#[tokio::test]
async fn use_my_location_recenters_and_searches() {
    let device = Coordinate::new(22.2850, 114.1580);
    let primary = places_primary();
    let mut controller = controller_with(primary.clone(), Ok(device));

    assert!(controller.use_my_location().await);
    assert_eq!(controller.viewport().center, device);
    assert_eq!(controller.last_search_origin(), Some(device));
    assert!(controller.warning().is_none());
    assert_eq!(controller.theatres().len(), 3);
    assert_eq!(primary.calls(), 1);
}

#[tokio::test]
async fn use_my_location_overrides_an_in_flight_search() {
    let device = Coordinate::new(22.2850, 114.1580);
    let mut controller = controller_with(places_primary(), Ok(device));
    let stale = controller.begin_search(HK_ORIGIN);

    assert!(controller.use_my_location().await);
    let late = DiscoveryOutcome {
        theatres: vec![],
        source: ResultSource::Exhausted,
    };
    assert!(!controller.apply_results(stale, late));
    assert_eq!(controller.theatres().len(), 3);
}

#[tokio::test]
async fn denied_permission_warns_and_searches_default_region() {
    let primary = ScriptedProvider::new(ProviderKind::Places, Behavior::Fail);
    let mut controller = controller_with(primary, Err(LocationError::PermissionDenied));

    assert!(controller.use_my_location().await);
    let warning = controller.warning().expect("warning should be surfaced");
    assert_eq!(warning.reason, LocationError::PermissionDenied);
    assert_eq!(warning.fallback, DEFAULT_REGION);
    assert_eq!(controller.viewport().center, DEFAULT_REGION);
    assert_eq!(controller.last_source(), Some(ResultSource::StaticFallback));
    assert_eq!(controller.theatres().len(), 5);
}

#[tokio::test]
async fn disabled_services_is_distinct_from_denial() {
    let mut controller = controller_with(places_primary(), Err(LocationError::ServicesDisabled));
    controller.use_my_location().await;
    assert_eq!(
        controller.warning().map(|w| w.reason.clone()),
        Some(LocationError::ServicesDisabled)
    );
    assert!(controller
        .warning()
        .unwrap()
        .to_string()
        .starts_with("location services are disabled"));
}

#[tokio::test]
async fn selecting_a_theatre_opens_detail_without_searching() {
    let primary = places_primary();
    let mut controller = controller_with(primary.clone(), Ok(HK_ORIGIN));
    controller.search_this_area().await;

    let selected = controller.select_theatre("b").expect("theatre b is listed");
    assert_eq!(selected.id, "b");
    let location = selected.location;
    assert!(controller.detail_open());
    assert_eq!(controller.viewport().center, location);
    assert_eq!(primary.calls(), 1);

    controller.close_detail();
    assert!(!controller.detail_open());
    assert!(controller.select_theatre("missing").is_none());
}

#[tokio::test]
async fn local_review_is_committed_to_cache() {
    let primary = places_primary();
    let mut controller = controller_with(primary.clone(), Ok(HK_ORIGIN));
    controller.search_this_area().await;

    let review = Review {
        author: "me".to_owned(),
        rating: 5.0,
        text: "Best IMAX in town".to_owned(),
        timestamp: Utc::now(),
    };
    assert!(controller.add_review("a", review));
    assert!(controller.add_photo("a", "file:///photos/seat.jpg"));
    assert!(!controller.add_review(
        "missing",
        Review {
            author: "me".to_owned(),
            rating: 1.0,
            text: String::new(),
            timestamp: Utc::now(),
        }
    ));
    assert_eq!(controller.commit_theatre("a").await, 1);
    assert_eq!(controller.commit_theatre("missing").await, 0);

    // A fresh search from the same spot is answered by the cache and
    // carries the committed edits.
    controller.search_this_area().await;
    assert_eq!(controller.last_source(), Some(ResultSource::Cache));
    let a = controller.theatres().iter().find(|t| t.id == "a").unwrap();
    assert_eq!(a.reviews.len(), 1);
    assert_eq!(a.photos, ["file:///photos/seat.jpg"]);
    assert_eq!(primary.calls(), 1);
}
