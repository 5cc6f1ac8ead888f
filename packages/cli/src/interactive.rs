//! Interactive menu for the GEOINT monitor.
//!
//! Provides a menu-driven interface using `dialoguer` for querying sources,
//! stepping through places and exporting layers without memorizing CLI
//! flags. Layer state persists across actions until the user quits.

use std::path::PathBuf;

use dialoguer::{Confirm, Input, Select};
use geoint_cli_utils::MultiProgress;
use geoint_feature_models::BoundingBox;
use geoint_source::Monitor;
use geoint_source::callout::CalloutData;
use geoint_source_models::{FilterRequirement, SourceDefinition};

use crate::query::{self, QueryFilters};
use crate::report;

/// Top-level actions available in the interactive menu.
enum MonitorAction {
    QuerySource,
    ShowLayer,
    NextPlace,
    SelectFeature,
    ClearSelected,
    ClearLayer,
    ClearAll,
    Export,
    ListSources,
    Quit,
}

impl MonitorAction {
    const ALL: &[Self] = &[
        Self::QuerySource,
        Self::ShowLayer,
        Self::NextPlace,
        Self::SelectFeature,
        Self::ClearSelected,
        Self::ClearLayer,
        Self::ClearAll,
        Self::Export,
        Self::ListSources,
        Self::Quit,
    ];

    #[must_use]
    const fn label(&self) -> &'static str {
        match self {
            Self::QuerySource => "Query a source",
            Self::ShowLayer => "Show layer features",
            Self::NextPlace => "Go to next place",
            Self::SelectFeature => "Select a feature",
            Self::ClearSelected => "Remove selected features",
            Self::ClearLayer => "Clear a layer",
            Self::ClearAll => "Clear all layers",
            Self::Export => "Export a layer as GeoJSON",
            Self::ListSources => "List sources",
            Self::Quit => "Quit",
        }
    }
}

/// Runs the interactive menu loop until the user quits.
///
/// # Errors
///
/// Returns an error if a prompt fails (e.g., no terminal) or an export
/// cannot be written.
pub async fn run(
    monitor: &mut Monitor,
    multi: &MultiProgress,
) -> Result<(), Box<dyn std::error::Error>> {
    println!("GEOINT Monitor");
    println!();

    let labels: Vec<&str> = MonitorAction::ALL.iter().map(MonitorAction::label).collect();

    loop {
        let idx = Select::new()
            .with_prompt("What would you like to do?")
            .items(&labels)
            .default(0)
            .interact()?;

        match MonitorAction::ALL[idx] {
            MonitorAction::QuerySource => query_source(monitor, multi).await?,
            MonitorAction::ShowLayer => {
                let id = pick_source(monitor)?;
                if let Some(layer) = monitor.layer(&id) {
                    report::print_layer(layer, true);
                }
            }
            MonitorAction::NextPlace => next_place(monitor)?,
            MonitorAction::SelectFeature => select_feature(monitor)?,
            MonitorAction::ClearSelected => {
                let id = pick_source(monitor)?;
                if let Some(layer) = monitor.layer_mut(&id) {
                    let removed = layer.clear_selected();
                    println!("Removed {removed} selected features from {id}.");
                }
            }
            MonitorAction::ClearLayer => {
                let id = pick_source(monitor)?;
                if let Some(layer) = monitor.layer_mut(&id) {
                    layer.clear();
                    println!("Cleared {id}.");
                }
            }
            MonitorAction::ClearAll => {
                let confirmed = Confirm::new()
                    .with_prompt("Clear every layer?")
                    .default(false)
                    .interact()?;
                if confirmed {
                    monitor.clear_all();
                    println!("Cleared all layers.");
                }
            }
            MonitorAction::Export => export(monitor)?,
            MonitorAction::ListSources => {
                let definitions: Vec<SourceDefinition> =
                    monitor.layers().map(|l| l.definition().clone()).collect();
                report::print_sources(&definitions);
            }
            MonitorAction::Quit => return Ok(()),
        }

        println!();
    }
}

/// Prompts for one of the monitor's layers and returns its id.
fn pick_source(monitor: &Monitor) -> Result<String, Box<dyn std::error::Error>> {
    let ids: Vec<String> = monitor.layers().map(|l| l.id().to_string()).collect();
    let labels: Vec<String> = monitor
        .layers()
        .map(|l| format!("{} - {}", l.id(), l.definition().name))
        .collect();

    let idx = Select::new()
        .with_prompt("Source")
        .items(&labels)
        .default(0)
        .interact()?;

    Ok(ids[idx].clone())
}

/// Prompts for the filters the chosen source needs, then queries it.
async fn query_source(
    monitor: &mut Monitor,
    multi: &MultiProgress,
) -> Result<(), Box<dyn std::error::Error>> {
    let id = pick_source(monitor)?;
    let Some(layer) = monitor.layer(&id) else {
        return Ok(());
    };

    let mut filters = QueryFilters::default();
    match layer.definition().fetcher.requirement() {
        FilterRequirement::QueryText => {
            let text: String = Input::new().with_prompt("Search text").interact_text()?;
            filters.text = Some(text);
            filters.bbox = prompt_optional_bbox("Restrict to bounding box (empty for none)")?;
        }
        FilterRequirement::SpatialFilter => {
            filters.bbox = prompt_optional_bbox("Bounding box (min_x,min_y,max_x,max_y)")?;
        }
        FilterRequirement::Url => {
            let url: String = Input::new().with_prompt("GeoJSON URL").interact_text()?;
            filters.url = Some(url);
        }
    }

    if query::run(monitor, multi, &id, &filters).await?
        && let Some(layer) = monitor.layer(&id)
    {
        report::print_layer(layer, false);
    }

    Ok(())
}

/// Steps to the next place in the chosen layer and prints it.
fn next_place(monitor: &mut Monitor) -> Result<(), Box<dyn std::error::Error>> {
    let id = pick_source(monitor)?;
    let Some(layer) = monitor.layer_mut(&id) else {
        return Ok(());
    };

    match layer.next_place() {
        Some(feature) => {
            println!("{}", report::format_callout(&CalloutData::from_feature(feature)));
            if let Some(extent) = feature.geometry.extent() {
                let center = extent.center();
                println!("    center: {:.5}, {:.5}", center.x, center.y);
            }
        }
        None => println!("No places in {id}."),
    }

    Ok(())
}

/// Selects a feature by id and prints its callout.
fn select_feature(monitor: &mut Monitor) -> Result<(), Box<dyn std::error::Error>> {
    let id = pick_source(monitor)?;
    let Some(layer) = monitor.layer_mut(&id) else {
        return Ok(());
    };

    let feature_id: String = Input::new().with_prompt("Feature id").interact_text()?;
    let selected = layer.store().find_by_text(feature_id.trim()).map(|f| f.id.clone());
    match selected.and_then(|selected| layer.select(&selected)) {
        Some(feature) => {
            println!("{}", report::format_callout(&CalloutData::from_feature(feature)));
        }
        None => println!("No feature '{}' in {id}.", feature_id.trim()),
    }

    Ok(())
}

/// Writes the chosen layer to a GeoJSON file.
fn export(monitor: &Monitor) -> Result<(), Box<dyn std::error::Error>> {
    let id = pick_source(monitor)?;
    let Some(layer) = monitor.layer(&id) else {
        return Ok(());
    };

    let path: String = Input::new()
        .with_prompt("Output file")
        .default(format!("{id}.geojson"))
        .interact_text()?;
    let path = PathBuf::from(path);

    let count = report::write_geojson(layer, &path)?;
    println!("Wrote {count} features to {}.", path.display());

    Ok(())
}

/// Prompts for an optional bounding box; empty input means none.
fn prompt_optional_bbox(prompt: &str) -> Result<Option<BoundingBox>, Box<dyn std::error::Error>> {
    let input: String = Input::new()
        .with_prompt(prompt)
        .allow_empty(true)
        .interact_text()?;

    if input.trim().is_empty() {
        return Ok(None);
    }

    Ok(Some(input.parse::<BoundingBox>()?))
}
