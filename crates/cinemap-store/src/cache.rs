//! Regional theatre result cache.
//!
//! Holds up to `capacity` result sets, one per coarse region bucket and search
//! radius, persisted as a single JSON document in [`Namespace::TheatreCache`].
//! Reuse is decided by [`CacheEntry::is_reusable`]: an entry answers a query
//! only while it is younger than the TTL and its origin lies within the reuse
//! distance of the query point. When several entries qualify, the one whose
//! origin is closest wins.
//!
//! Storage failures never propagate. A failed read is a miss and a failed
//! write is logged and dropped.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use cinemap_core::{sort_by_distance, CacheEntry, Coordinate, Theatre};
use serde::{Deserialize, Serialize};

use crate::kv::{KeyValueStore, Namespace};
use crate::StoreError;

const DOCUMENT_KEY: &str = "theatres";

#[derive(Debug, Clone, Copy)]
pub struct CacheOptions {
    /// Maximum number of regional slots kept before LRU eviction.
    pub capacity: usize,
    /// Side of a region bucket in degrees.
    pub bucket_degrees: f64,
}

impl Default for CacheOptions {
    fn default() -> Self {
        Self {
            capacity: 8,
            bucket_degrees: 0.1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
struct RegionKey {
    lat_bucket: i64,
    lng_bucket: i64,
    radius_meters: u32,
}

impl RegionKey {
    #[allow(clippy::cast_possible_truncation)]
    fn for_origin(origin: &Coordinate, radius_meters: u32, bucket_degrees: f64) -> Self {
        Self {
            lat_bucket: (origin.latitude / bucket_degrees).floor() as i64,
            lng_bucket: (origin.longitude / bucket_degrees).floor() as i64,
            radius_meters,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CacheSlot {
    key: RegionKey,
    last_used: DateTime<Utc>,
    entry: CacheEntry,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct CacheDocument {
    slots: Vec<CacheSlot>,
}

pub struct TheatreCache {
    store: Arc<dyn KeyValueStore>,
    options: CacheOptions,
}

impl TheatreCache {
    #[must_use]
    pub fn new(store: Arc<dyn KeyValueStore>, options: CacheOptions) -> Self {
        Self {
            store,
            options: CacheOptions {
                capacity: options.capacity.max(1),
                ..options
            },
        }
    }

    /// Returns a reusable entry for `query`, with every theatre's `distance`
    /// recomputed against `query` and the list re-sorted.
    pub async fn get(
        &self,
        query: &Coordinate,
        ttl: Duration,
        max_reuse_km: f64,
    ) -> Option<CacheEntry> {
        self.get_at(query, ttl, max_reuse_km, Utc::now()).await
    }

    /// [`TheatreCache::get`] evaluated at an explicit instant.
    pub async fn get_at(
        &self,
        query: &Coordinate,
        ttl: Duration,
        max_reuse_km: f64,
        now: DateTime<Utc>,
    ) -> Option<CacheEntry> {
        let mut document = self.load().await?;

        let best = document
            .slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.entry.is_reusable(now, query, ttl, max_reuse_km))
            .min_by(|(_, a), (_, b)| {
                let da = a.entry.origin_location.distance_to(query);
                let db = b.entry.origin_location.distance_to(query);
                da.total_cmp(&db)
            })
            .map(|(index, _)| index)?;

        let slot = &mut document.slots[best];
        slot.last_used = now;
        let mut entry = slot.entry.clone();
        self.save(&document).await;

        sort_by_distance(&mut entry.results, query);
        tracing::debug!(
            query = %query,
            origin = %entry.origin_location,
            count = entry.results.len(),
            "theatre cache hit"
        );
        Some(entry)
    }

    /// Store `results` for the region around `origin`, replacing any slot for
    /// the same region and radius.
    pub async fn put(&self, results: &[Theatre], origin: &Coordinate, radius_meters: u32) {
        self.put_at(results, origin, radius_meters, Utc::now()).await;
    }

    /// [`TheatreCache::put`] stamped with an explicit instant.
    pub async fn put_at(
        &self,
        results: &[Theatre],
        origin: &Coordinate,
        radius_meters: u32,
        now: DateTime<Utc>,
    ) {
        let mut document = self.load().await.unwrap_or_default();
        let key = RegionKey::for_origin(origin, radius_meters, self.options.bucket_degrees);

        document.slots.retain(|slot| slot.key != key);
        document.slots.push(CacheSlot {
            key,
            last_used: now,
            entry: CacheEntry {
                timestamp: now,
                origin_location: *origin,
                radius_meters,
                results: results.to_vec(),
            },
        });

        while document.slots.len() > self.options.capacity {
            let Some(oldest) = document
                .slots
                .iter()
                .enumerate()
                .min_by_key(|(_, slot)| slot.last_used)
                .map(|(index, _)| index)
            else {
                break;
            };
            let evicted = document.slots.remove(oldest);
            tracing::debug!(
                origin = %evicted.entry.origin_location,
                "evicted least recently used cache slot"
            );
        }

        self.save(&document).await;
    }

    /// Replace the cached copy of `theatre` (matched by id) in every slot.
    ///
    /// Returns how many slots were updated.
    pub async fn update_theatre(&self, theatre: &Theatre) -> usize {
        let Some(mut document) = self.load().await else {
            return 0;
        };

        let mut updated = 0;
        for slot in &mut document.slots {
            for cached in slot.entry.results.iter_mut().filter(|t| t.id == theatre.id) {
                *cached = theatre.clone();
                updated += 1;
            }
        }

        if updated > 0 {
            self.save(&document).await;
        }
        updated
    }

    /// Remove every cached slot.
    pub async fn clear(&self) {
        if let Err(err) = self
            .store
            .remove(Namespace::TheatreCache, DOCUMENT_KEY)
            .await
        {
            tracing::warn!(error = %err, "could not clear theatre cache");
        }
    }

    async fn load(&self) -> Option<CacheDocument> {
        match self.try_load().await {
            Ok(document) => document,
            Err(err) => {
                tracing::warn!(error = %err, "theatre cache read failed; treating as miss");
                None
            }
        }
    }

    async fn try_load(&self) -> Result<Option<CacheDocument>, StoreError> {
        let Some(raw) = self
            .store
            .get(Namespace::TheatreCache, DOCUMENT_KEY)
            .await?
        else {
            return Ok(None);
        };
        let document = serde_json::from_str(&raw).map_err(|source| StoreError::Serialize {
            context: DOCUMENT_KEY.to_owned(),
            source,
        })?;
        Ok(Some(document))
    }

    async fn save(&self, document: &CacheDocument) {
        if let Err(err) = self.try_save(document).await {
            tracing::warn!(error = %err, "theatre cache write failed");
        }
    }

    async fn try_save(&self, document: &CacheDocument) -> Result<(), StoreError> {
        let raw = serde_json::to_string(document).map_err(|source| StoreError::Serialize {
            context: DOCUMENT_KEY.to_owned(),
            source,
        })?;
        self.store
            .set(Namespace::TheatreCache, DOCUMENT_KEY, &raw)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use async_trait::async_trait;
    use cinemap_core::{Provenance, ProviderKind};

    use crate::kv::MemoryStore;

    const TTL: Duration = Duration::from_secs(3600);

    fn theatre(id: &str, lat: f64, lng: f64) -> Theatre {
        Theatre {
            id: id.to_owned(),
            name: format!("Cinema {id}"),
            location: Coordinate::new(lat, lng),
            address: "somewhere".to_owned(),
            rating: Some(4.0),
            photos: vec![],
            reviews: vec![],
            distance: 0.0,
            opening_hours: None,
            website: None,
            phone_number: None,
            provenance: Provenance::provider(ProviderKind::Places),
        }
    }

    fn cache(options: CacheOptions) -> TheatreCache {
        TheatreCache::new(Arc::new(MemoryStore::new()), options)
    }

    struct BrokenStore;

    #[async_trait]
    impl KeyValueStore for BrokenStore {
        async fn get(&self, _: Namespace, _: &str) -> Result<Option<String>, StoreError> {
            Err(StoreError::Sqlx(sqlx::Error::PoolClosed))
        }
        async fn set(&self, _: Namespace, _: &str, _: &str) -> Result<(), StoreError> {
            Err(StoreError::Sqlx(sqlx::Error::PoolClosed))
        }
        async fn remove(&self, _: Namespace, _: &str) -> Result<(), StoreError> {
            Err(StoreError::Sqlx(sqlx::Error::PoolClosed))
        }
    }

    #[tokio::test]
    async fn served_just_before_ttl_but_not_after() {
        let cache = cache(CacheOptions::default());
        let origin = Coordinate::new(22.3193, 114.1694);
        let t0 = Utc::now();
        cache
            .put_at(&[theatre("a", 22.28, 114.15)], &origin, 10_000, t0)
            .await;

        let ttl = Duration::from_secs(600);
        let before = t0 + chrono::Duration::milliseconds(599_999);
        let after = t0 + chrono::Duration::milliseconds(600_001);
        assert!(cache.get_at(&origin, ttl, 5.0, before).await.is_some());
        assert!(cache.get_at(&origin, ttl, 5.0, after).await.is_none());
    }

    #[tokio::test]
    async fn not_served_beyond_reuse_distance() {
        let cache = cache(CacheOptions::default());
        let origin = Coordinate::new(22.0, 114.0);
        let t0 = Utc::now();
        cache
            .put_at(&[theatre("a", 22.01, 114.0)], &origin, 10_000, t0)
            .await;

        // 4 km and 6 km north of the origin, with a 5 km reuse limit.
        let within = Coordinate::new(22.036, 114.0);
        let beyond = Coordinate::new(22.054, 114.0);
        assert!(cache.get_at(&within, TTL, 5.0, t0).await.is_some());
        assert!(cache.get_at(&beyond, TTL, 5.0, t0).await.is_none());
    }

    #[tokio::test]
    async fn distances_are_recomputed_for_the_query_point() {
        let cache = cache(CacheOptions::default());
        let origin = Coordinate::new(22.0, 114.0);
        let mut near_origin = theatre("a", 22.0, 114.0);
        near_origin.distance = 0.0;
        let mut north = theatre("b", 22.03, 114.0);
        north.distance = 3_336.0;
        cache.put(&[near_origin, north], &origin, 10_000).await;

        let query = Coordinate::new(22.03, 114.0);
        let entry = cache.get(&query, TTL, 5.0).await.expect("hit");
        assert_eq!(entry.results[0].id, "b");
        assert!(entry.results[0].distance < 1.0);
        assert!(entry.results[1].distance > 3_000.0);
    }

    #[tokio::test]
    async fn distant_regions_keep_separate_slots() {
        let cache = cache(CacheOptions::default());
        let hong_kong = Coordinate::new(22.3193, 114.1694);
        let new_york = Coordinate::new(40.7128, -74.0060);
        cache
            .put(&[theatre("hk", 22.28, 114.15)], &hong_kong, 10_000)
            .await;
        cache
            .put(&[theatre("ny", 40.75, -73.98)], &new_york, 10_000)
            .await;

        let hk = cache.get(&hong_kong, TTL, 5.0).await.expect("hk slot");
        let ny = cache.get(&new_york, TTL, 5.0).await.expect("ny slot");
        assert_eq!(hk.results[0].id, "hk");
        assert_eq!(ny.results[0].id, "ny");
    }

    #[tokio::test]
    async fn same_region_and_radius_overwrites_slot() {
        let cache = cache(CacheOptions::default());
        let origin = Coordinate::new(22.3193, 114.1694);
        cache.put(&[theatre("old", 22.3, 114.1)], &origin, 10_000).await;
        cache.put(&[theatre("new", 22.3, 114.1)], &origin, 10_000).await;

        let entry = cache.get(&origin, TTL, 5.0).await.expect("hit");
        assert_eq!(entry.results.len(), 1);
        assert_eq!(entry.results[0].id, "new");
    }

    #[tokio::test]
    async fn evicts_least_recently_used_slot() {
        let cache = cache(CacheOptions {
            capacity: 2,
            bucket_degrees: 0.1,
        });
        let t0 = Utc::now();
        let a = Coordinate::new(10.05, 10.05);
        let b = Coordinate::new(20.05, 20.05);
        let c = Coordinate::new(30.05, 30.05);
        cache.put_at(&[theatre("a", 10.05, 10.05)], &a, 5_000, t0).await;
        cache
            .put_at(
                &[theatre("b", 20.05, 20.05)],
                &b,
                5_000,
                t0 + chrono::Duration::seconds(1),
            )
            .await;
        // Touch `a` so `b` becomes the eviction candidate.
        assert!(cache
            .get_at(&a, TTL, 5.0, t0 + chrono::Duration::seconds(2))
            .await
            .is_some());
        cache
            .put_at(
                &[theatre("c", 30.05, 30.05)],
                &c,
                5_000,
                t0 + chrono::Duration::seconds(3),
            )
            .await;

        let now = t0 + chrono::Duration::seconds(4);
        assert!(cache.get_at(&a, TTL, 5.0, now).await.is_some());
        assert!(cache.get_at(&b, TTL, 5.0, now).await.is_none());
        assert!(cache.get_at(&c, TTL, 5.0, now).await.is_some());
    }

    #[tokio::test]
    async fn update_theatre_rewrites_cached_copies() {
        let cache = cache(CacheOptions::default());
        let origin = Coordinate::new(22.3193, 114.1694);
        cache
            .put(&[theatre("a", 22.3, 114.1), theatre("b", 22.31, 114.1)], &origin, 10_000)
            .await;

        let mut edited = theatre("a", 22.3, 114.1);
        edited.photos.push("file:///local/photo.jpg".to_owned());
        assert_eq!(cache.update_theatre(&edited).await, 1);

        let entry = cache.get(&origin, TTL, 5.0).await.expect("hit");
        let a = entry.results.iter().find(|t| t.id == "a").unwrap();
        assert_eq!(a.photos, ["file:///local/photo.jpg"]);
    }

    #[tokio::test]
    async fn clear_removes_everything() {
        let cache = cache(CacheOptions::default());
        let origin = Coordinate::new(22.3193, 114.1694);
        cache.put(&[theatre("a", 22.3, 114.1)], &origin, 10_000).await;
        cache.clear().await;
        assert!(cache.get(&origin, TTL, 5.0).await.is_none());
    }

    #[tokio::test]
    async fn storage_failures_fail_open() {
        let cache = TheatreCache::new(Arc::new(BrokenStore), CacheOptions::default());
        let origin = Coordinate::new(22.3193, 114.1694);
        cache.put(&[theatre("a", 22.3, 114.1)], &origin, 10_000).await;
        assert!(cache.get(&origin, TTL, 5.0).await.is_none());
        assert_eq!(cache.update_theatre(&theatre("a", 22.3, 114.1)).await, 0);
        cache.clear().await;
    }

    #[tokio::test]
    async fn corrupt_document_is_a_miss() {
        let store = Arc::new(MemoryStore::new());
        store
            .set(Namespace::TheatreCache, DOCUMENT_KEY, "not json")
            .await
            .unwrap();
        let cache = TheatreCache::new(store, CacheOptions::default());
        assert!(cache
            .get(&Coordinate::new(22.3, 114.1), TTL, 5.0)
            .await
            .is_none());
    }
}
