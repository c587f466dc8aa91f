//! `search` and `directions`: thin wrappers over the geocoding client.

use std::sync::Arc;

use cinemap_core::{AppConfig, Coordinate};
use cinemap_places::{ClientSettings, GeocodingClient, PlacesError, Route};
use cinemap_store::{history::DEFAULT_HISTORY_LIMIT, KeyValueStore, SearchHistory};

fn geocoding_client(config: &AppConfig) -> anyhow::Result<GeocodingClient> {
    GeocodingClient::with_base_url(
        &config.geocoding_base_url,
        config.geocoding_credential()?,
        &ClientSettings::from_config(config),
    )
    .map_err(|e| anyhow::anyhow!("failed to build geocoding client: {e}"))
}

/// Look up places matching `query` and record the query in search history.
///
/// # Errors
///
/// Returns an error if the client cannot be built or the search fails.
/// A history write failure is logged, not returned.
pub(crate) async fn run_search(
    config: &AppConfig,
    store: Arc<dyn KeyValueStore>,
    query: &str,
    near: Option<Coordinate>,
) -> anyhow::Result<()> {
    let client = geocoding_client(config)?;
    let suggestions = client.search_places(query, near).await?;

    let history = SearchHistory::new(store, DEFAULT_HISTORY_LIMIT);
    if let Err(e) = history.record(query).await {
        tracing::warn!(error = %e, "could not record search history");
    }

    if suggestions.is_empty() {
        println!("No places match '{query}'.");
        return Ok(());
    }
    for s in &suggestions {
        println!("{}  {}  ({})", s.coordinate, s.name, s.place_name);
    }
    Ok(())
}

/// Print a driving route summary from `from` to `to`.
///
/// # Errors
///
/// Returns an error if the client cannot be built or the provider fails.
/// "No route" is reported on stdout, not as an error.
pub(crate) async fn run_directions(
    config: &AppConfig,
    from: Coordinate,
    to: Coordinate,
) -> anyhow::Result<()> {
    let client = geocoding_client(config)?;
    match client.directions(from, to).await {
        Ok(route) => {
            println!("{}", summarize_route(&route));
            Ok(())
        }
        Err(PlacesError::NoRoute) => {
            println!("No driving route from {from} to {to}.");
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

fn summarize_route(route: &Route) -> String {
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let minutes = (route.duration_secs / 60.0).round() as u64;
    format!(
        "{:.1} km, about {minutes} min ({} points)",
        route.distance_meters / 1000.0,
        route.coordinates.len()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn route_summary_rounds_minutes() {
        let route = Route {
            coordinates: vec![
                Coordinate::new(22.3193, 114.1694),
                Coordinate::new(22.2851, 114.1582),
            ],
            distance_meters: 5_321.4,
            duration_secs: 912.0,
        };
        assert_eq!(summarize_route(&route), "5.3 km, about 15 min (2 points)");
    }
}
