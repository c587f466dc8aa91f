mod nearby;
mod places;
mod storage;

use std::sync::Arc;

use clap::{Parser, Subcommand};
use cinemap_core::Coordinate;
use cinemap_store::SqliteStore;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "cinemap-cli")]
#[command(about = "Find movie theatres near a location")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Discover theatres around a point (defaults to Hong Kong)
    Nearby {
        /// Latitude of the search origin
        #[arg(long, requires = "lng", allow_negative_numbers = true)]
        lat: Option<f64>,
        /// Longitude of the search origin
        #[arg(long, requires = "lat", allow_negative_numbers = true)]
        lng: Option<f64>,
        /// Search radius in meters (defaults to `CINEMAP_SEARCH_RADIUS_METERS`)
        #[arg(long)]
        radius: Option<u32>,
        /// Group markers closer than this many meters
        #[arg(long)]
        cluster: Option<f64>,
    },
    /// Free-text place search
    Search {
        query: String,
        /// Bias results toward this point, as `lat,lng`
        #[arg(long, value_parser = parse_coordinate, allow_hyphen_values = true)]
        near: Option<Coordinate>,
    },
    /// Show recent place searches
    History {
        /// Forget all recorded searches
        #[arg(long)]
        clear: bool,
    },
    /// Driving route between two points
    Directions {
        /// Start point as `lat,lng`
        #[arg(long, value_parser = parse_coordinate, allow_hyphen_values = true)]
        from: Coordinate,
        /// End point as `lat,lng`
        #[arg(long, value_parser = parse_coordinate, allow_hyphen_values = true)]
        to: Coordinate,
    },
    /// Theatre cache maintenance
    Cache {
        #[command(subcommand)]
        command: CacheCommands,
    },
}

#[derive(Debug, Subcommand)]
enum CacheCommands {
    /// Remove every cached result set
    Clear,
}

/// Parses `lat,lng` into a validated coordinate.
fn parse_coordinate(raw: &str) -> Result<Coordinate, String> {
    let (lat, lng) = raw
        .split_once(',')
        .ok_or_else(|| format!("expected `lat,lng`, got '{raw}'"))?;
    let lat: f64 = lat
        .trim()
        .parse()
        .map_err(|e| format!("invalid latitude '{lat}': {e}"))?;
    let lng: f64 = lng
        .trim()
        .parse()
        .map_err(|e| format!("invalid longitude '{lng}': {e}"))?;
    let coordinate = Coordinate::new(lat, lng);
    if coordinate.is_valid() {
        Ok(coordinate)
    } else {
        Err(format!("coordinate out of range: '{raw}'"))
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = cinemap_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    if let Commands::Directions { from, to } = cli.command {
        return places::run_directions(&config, from, to).await;
    }

    let store = SqliteStore::connect(&config.database_url).await?;
    store.init().await?;
    let store = Arc::new(store);

    let result = match cli.command {
        Commands::Nearby {
            lat,
            lng,
            radius,
            cluster,
        } => nearby::run_nearby(&config, store.clone(), lat, lng, radius, cluster).await,
        Commands::Search { query, near } => {
            places::run_search(&config, store.clone(), &query, near).await
        }
        Commands::History { clear } => storage::run_history(store.clone(), clear).await,
        Commands::Cache {
            command: CacheCommands::Clear,
        } => storage::run_cache_clear(&config, store.clone()).await,
        Commands::Directions { .. } => Ok(()),
    };

    store.close().await;
    result
}
