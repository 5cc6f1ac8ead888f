#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Command-line front end for the GEOINT monitor.
//!
//! Runs queries against the built-in sources, prints the resulting output
//! buckets and callouts, and exports them as GeoJSON. Without a subcommand
//! it drops into an interactive menu.
//!
//! Uses `indicatif-log-bridge` (via [`geoint_cli_utils::init_logger`])
//! so that log lines and the query spinner never fight for the terminal.

mod interactive;
mod query;
mod report;

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use geoint_feature_models::BoundingBox;
use geoint_source::{ClientConfig, Monitor, ReqwestTransport, SourceError, registry};

use crate::query::QueryFilters;

/// Id of the built-in generic GeoJSON source used by `fetch`.
const GEOJSON_SOURCE_ID: &str = "geojson";

#[derive(Parser)]
#[command(name = "geoint", about = "GEOINT source monitor")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// List all configured sources
    Sources,
    /// Query one source and print the resulting buckets
    Query {
        /// Source identifier (e.g., "`nominatim`")
        source: String,
        /// Search text (GDELT, Nominatim)
        #[arg(long)]
        text: Option<String>,
        /// Spatial filter as `min_x,min_y,max_x,max_y` in WGS84
        /// (Wikimapia, optional viewbox for Nominatim)
        #[arg(long, allow_hyphen_values = true)]
        bbox: Option<BoundingBox>,
        /// Document URL (generic GeoJSON source)
        #[arg(long)]
        url: Option<String>,
        /// Print a callout for every feature
        #[arg(long)]
        callouts: bool,
        /// Write the layer's features to this file as a `FeatureCollection`
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Fetch a GeoJSON document through the generic GeoJSON source
    Fetch {
        /// Document URL
        url: String,
        /// Print a callout for every feature
        #[arg(long)]
        callouts: bool,
        /// Write the features to this file as a `FeatureCollection`
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let multi = geoint_cli_utils::init_logger();
    let cli = Cli::parse();

    let transport = Arc::new(ReqwestTransport::new(&ClientConfig::from_env())?);
    let mut monitor = Monitor::with_registry(transport);

    let Some(command) = cli.command else {
        return interactive::run(&mut monitor, &multi).await;
    };

    let (source, filters, callouts, output) = match command {
        Commands::Sources => {
            report::print_sources(&registry::all_sources());
            return Ok(());
        }
        Commands::Query {
            source,
            text,
            bbox,
            url,
            callouts,
            output,
        } => (source, QueryFilters { text, bbox, url }, callouts, output),
        Commands::Fetch {
            url,
            callouts,
            output,
        } => (
            GEOJSON_SOURCE_ID.to_string(),
            QueryFilters {
                url: Some(url),
                ..QueryFilters::default()
            },
            callouts,
            output,
        ),
    };

    if !query::run(&mut monitor, &multi, &source, &filters).await? {
        return Ok(());
    }

    let layer = monitor
        .layer(&source)
        .ok_or_else(|| SourceError::UnknownSource { id: source.clone() })?;
    report::print_layer(layer, callouts);

    if let Some(path) = output {
        let count = report::write_geojson(layer, &path)?;
        log::info!("Wrote {count} features to {}", path.display());
    }

    Ok(())
}
