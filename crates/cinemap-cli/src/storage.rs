//! `history` and `cache clear`.

use std::sync::Arc;

use cinemap_core::AppConfig;
use cinemap_store::{
    history::DEFAULT_HISTORY_LIMIT, CacheOptions, KeyValueStore, SearchHistory, TheatreCache,
};

pub(crate) async fn run_history(store: Arc<dyn KeyValueStore>, clear: bool) -> anyhow::Result<()> {
    let history = SearchHistory::new(store, DEFAULT_HISTORY_LIMIT);
    if clear {
        history.clear().await?;
        println!("Search history cleared.");
        return Ok(());
    }

    let recent = history.recent().await?;
    if recent.is_empty() {
        println!("No recent searches.");
    }
    for (i, query) in recent.iter().enumerate() {
        println!("{:>2}. {query}", i + 1);
    }
    Ok(())
}

pub(crate) async fn run_cache_clear(
    config: &AppConfig,
    store: Arc<dyn KeyValueStore>,
) -> anyhow::Result<()> {
    let cache = TheatreCache::new(
        store,
        CacheOptions {
            capacity: config.cache_capacity,
            bucket_degrees: config.cache_bucket_degrees,
        },
    );
    cache.clear().await;
    println!("Theatre cache cleared.");
    Ok(())
}
