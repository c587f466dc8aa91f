//! `TheatreCache` backed by a real SQLite store.

use std::sync::Arc;
use std::time::Duration;

use cinemap_core::{Coordinate, Provenance, ProviderKind, Theatre};
use cinemap_store::{CacheOptions, KeyValueStore, SqliteStore, TheatreCache};

fn theatre(id: &str, lat: f64, lng: f64) -> Theatre {
    Theatre {
        id: id.to_owned(),
        name: format!("Cinema {id}"),
        location: Coordinate::new(lat, lng),
        address: "1 Test Road".to_owned(),
        rating: None,
        photos: vec![],
        reviews: vec![],
        distance: 0.0,
        opening_hours: None,
        website: None,
        phone_number: None,
        provenance: Provenance::keyword("cinema"),
    }
}

async fn sqlite() -> Arc<SqliteStore> {
    let store = SqliteStore::connect("sqlite::memory:")
        .await
        .expect("in-memory sqlite should open");
    store.init().await.expect("schema should apply");
    Arc::new(store)
}

#[tokio::test]
async fn cache_survives_a_new_repository_instance() {
    let store = sqlite().await;
    let origin = Coordinate::new(22.3193, 114.1694);

    let writer = TheatreCache::new(store.clone(), CacheOptions::default());
    writer
        .put(&[theatre("hk1", 22.2851, 114.1582)], &origin, 10_000)
        .await;

    let reader = TheatreCache::new(store.clone(), CacheOptions::default());
    let entry = reader
        .get(&origin, Duration::from_secs(60), 5.0)
        .await
        .expect("entry written by the first instance");

    assert_eq!(entry.results.len(), 1);
    assert_eq!(entry.results[0].provenance.provider, ProviderKind::Geocoding);
    assert_eq!(
        entry.results[0].provenance.search_term.as_deref(),
        Some("cinema")
    );
    assert_eq!(entry.radius_meters, 10_000);
}

#[tokio::test]
async fn cache_reads_fail_open_after_store_closes() {
    let store = sqlite().await;
    let origin = Coordinate::new(22.3193, 114.1694);
    let cache = TheatreCache::new(store.clone(), CacheOptions::default());
    cache
        .put(&[theatre("hk1", 22.2851, 114.1582)], &origin, 10_000)
        .await;

    store.close().await;

    assert!(cache
        .get(&origin, Duration::from_secs(60), 5.0)
        .await
        .is_none());
    let direct: Arc<dyn KeyValueStore> = store;
    assert!(direct
        .get(cinemap_store::Namespace::TheatreCache, "theatres")
        .await
        .is_err());
}
