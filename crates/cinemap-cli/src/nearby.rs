//! `nearby`: run discovery through the map controller and print the result.

use std::sync::Arc;

use cinemap_core::{AppConfig, Coordinate, Theatre};
use cinemap_discovery::{
    cluster_theatres, ControllerOptions, Discovery, FixedLocation, LocationError, MapController,
};
use cinemap_store::KeyValueStore;

/// Discover theatres around `lat`/`lng`, or the default region when no
/// position was given.
///
/// # Errors
///
/// Returns an error if the position is out of range or discovery cannot be
/// wired from `config`. Provider failures are not errors; they surface as an
/// empty list.
pub(crate) async fn run_nearby(
    config: &AppConfig,
    store: Arc<dyn KeyValueStore>,
    lat: Option<f64>,
    lng: Option<f64>,
    radius: Option<u32>,
    cluster: Option<f64>,
) -> anyhow::Result<()> {
    let position = match (lat, lng) {
        (Some(lat), Some(lng)) => {
            let origin = Coordinate::new(lat, lng);
            if !origin.is_valid() {
                anyhow::bail!("coordinate out of range: {lat},{lng}");
            }
            Ok(origin)
        }
        _ => Err(LocationError::PositionUnavailable(
            "no --lat/--lng given".to_string(),
        )),
    };

    let discovery = Discovery::from_config(config, store)
        .map_err(|e| anyhow::anyhow!("failed to set up discovery: {e}"))?;
    let mut options = ControllerOptions::from_config(config);
    if let Some(radius) = radius {
        options.radius_meters = radius;
    }

    let mut controller =
        MapController::new(Arc::new(discovery), Arc::new(FixedLocation(position)), options);
    controller.use_my_location().await;

    if let Some(warning) = controller.warning() {
        eprintln!("warning: {warning}");
    }

    let theatres = controller.theatres();
    let source = controller
        .last_source()
        .map_or_else(|| "none".to_string(), |s| s.to_string());
    println!(
        "{} theatre(s) near {} (source: {source})",
        theatres.len(),
        controller.viewport().center
    );
    if theatres.is_empty() {
        println!("No theatres found. Try again later or widen --radius.");
        return Ok(());
    }

    for theatre in theatres {
        println!("{}", format_theatre(theatre));
    }

    if let Some(radius) = cluster {
        println!();
        for group in cluster_theatres(theatres, radius) {
            if group.is_single() {
                continue;
            }
            println!(
                "cluster of {} at {}: {}",
                group.len(),
                group.centroid,
                group.theatre_ids.join(", ")
            );
        }
    }

    Ok(())
}

fn format_theatre(theatre: &Theatre) -> String {
    let rating = theatre
        .rating
        .map_or_else(|| "not rated".to_string(), |r| format!("{r:.1}\u{2605}"));
    let provenance = match &theatre.provenance.search_term {
        Some(term) => format!("{} '{term}'", theatre.provenance.provider),
        None => theatre.provenance.provider.to_string(),
    };
    format!(
        "{:>6.2} km  {}  [{rating}]  {}  ({provenance})",
        theatre.distance / 1000.0,
        theatre.name,
        theatre.address
    )
}
