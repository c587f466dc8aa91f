//! Shared fixtures: scripted providers with call counters.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use cinemap_core::{Coordinate, Provenance, ProviderKind, Theatre};
use cinemap_discovery::{Discovery, DiscoveryOptions, FallbackCatalog};
use cinemap_places::{PlacesError, TheatreProvider};
use cinemap_store::{CacheOptions, MemoryStore, TheatreCache};

pub const HK_ORIGIN: Coordinate = Coordinate::new(22.3193, 114.1694);
pub const LONDON: Coordinate = Coordinate::new(51.5072, -0.1276);

pub enum Behavior {
    Return(Vec<Theatre>),
    Fail,
    Hang,
}

pub struct ScriptedProvider {
    kind: ProviderKind,
    behavior: Behavior,
    calls: AtomicUsize,
}

impl ScriptedProvider {
    pub fn new(kind: ProviderKind, behavior: Behavior) -> Arc<Self> {
        Arc::new(Self {
            kind,
            behavior,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TheatreProvider for ScriptedProvider {
    fn kind(&self) -> ProviderKind {
        self.kind
    }

    async fn find_nearby(
        &self,
        origin: Coordinate,
        _radius_meters: u32,
    ) -> Result<Vec<Theatre>, PlacesError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.behavior {
            Behavior::Return(theatres) => {
                let mut theatres = theatres.clone();
                cinemap_core::sort_by_distance(&mut theatres, &origin);
                Ok(theatres)
            }
            Behavior::Fail => Err(PlacesError::ApiStatus {
                provider: "scripted",
                status: "OVER_QUERY_LIMIT".to_owned(),
                message: None,
            }),
            Behavior::Hang => {
                tokio::time::sleep(Duration::from_secs(30)).await;
                Ok(Vec::new())
            }
        }
    }
}

pub fn theatre(id: &str, lat: f64, lng: f64, provider: ProviderKind) -> Theatre {
    Theatre {
        id: id.to_owned(),
        name: format!("Cinema {id}"),
        location: Coordinate::new(lat, lng),
        address: "Somewhere".to_owned(),
        rating: None,
        photos: vec![],
        reviews: vec![],
        distance: 0.0,
        opening_hours: None,
        website: None,
        phone_number: None,
        provenance: Provenance::provider(provider),
    }
}

/// Three theatres a few kilometers from [`HK_ORIGIN`].
pub fn hk_theatres(provider: ProviderKind) -> Vec<Theatre> {
    vec![
        theatre("a", 22.3235, 114.2132, provider),
        theatre("b", 22.2794, 114.1822, provider),
        theatre("c", 22.3200, 114.1700, provider),
    ]
}

pub fn options() -> DiscoveryOptions {
    DiscoveryOptions {
        cache_ttl: Duration::from_secs(3600),
        max_reuse_km: 5.0,
        stage_timeout: Duration::from_millis(200),
    }
}

pub fn discovery(
    primary: Arc<ScriptedProvider>,
    secondary: Arc<ScriptedProvider>,
) -> Discovery {
    let cache = TheatreCache::new(Arc::new(MemoryStore::new()), CacheOptions::default());
    Discovery::new(
        cache,
        primary,
        secondary,
        FallbackCatalog::builtin().expect("built-in catalog"),
        options(),
    )
}
