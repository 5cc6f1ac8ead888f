//! Issues one query and waits for it to land.

use geoint_cli_utils::{IndicatifProgress, MultiProgress};
use geoint_feature_models::BoundingBox;
use geoint_source::{ApplyOutcome, Monitor, QueryOutcome, SourceError};

/// Filters to set on a layer before querying it. `None` leaves the layer's
/// current value in place.
#[derive(Debug, Default)]
pub struct QueryFilters {
    pub text: Option<String>,
    pub bbox: Option<BoundingBox>,
    pub url: Option<String>,
}

/// Applies `filters` to `source_id`, queries it and applies the response.
///
/// Returns `false` if the layer skipped the query.
///
/// # Errors
///
/// Returns [`SourceError::UnknownSource`] if no layer has this id. Fetch
/// and parse failures are logged by the layer, not returned.
pub async fn run(
    monitor: &mut Monitor,
    multi: &MultiProgress,
    source_id: &str,
    filters: &QueryFilters,
) -> Result<bool, SourceError> {
    let layer = monitor
        .layer_mut(source_id)
        .ok_or_else(|| SourceError::UnknownSource {
            id: source_id.to_string(),
        })?;

    if let Some(text) = &filters.text {
        layer.set_query_filter(text.clone());
    }
    if let Some(bbox) = filters.bbox {
        layer.set_spatial_filter(bbox);
    }
    if let Some(url) = &filters.url {
        layer.set_url(url.clone());
    }

    match monitor.query(source_id)? {
        QueryOutcome::Skipped(reason) => {
            log::warn!("{source_id}: query skipped ({reason})");
            return Ok(false);
        }
        QueryOutcome::Issued { generation } => {
            log::debug!("{source_id}: issued query #{generation}");
        }
    }

    let progress = IndicatifProgress::queries_bar(multi, &format!("Querying {source_id}..."));
    for (id, outcome) in monitor.wait_idle_with_progress(&progress).await {
        match outcome {
            ApplyOutcome::Merged(summary) => log::info!(
                "{id}: {} new, {} replaced, {} unchanged",
                summary.inserted,
                summary.replaced,
                summary.unchanged
            ),
            ApplyOutcome::Failed => log::warn!("{id}: query failed, keeping previous features"),
            ApplyOutcome::Stale => {}
        }
    }

    Ok(true)
}
