//! One feature layer per configured source.
//!
//! A layer keeps its filters, its [`FeatureStore`] and [`OutputBuckets`],
//! the current selection, and at most one in-flight request. Requests run
//! on spawned tasks and report back through the monitor's channel as a
//! [`QueryCompletion`] tagged with the generation that issued them; only
//! the current generation is ever applied.

use std::sync::Arc;

use geoint_feature_models::{BoundingBox, Feature, FeatureId, GeometryKind};
use geoint_source_models::{FetcherConfig, SourceDefinition};
use geoint_store::{FeatureStore, MergeSummary, OutputBuckets, UpsertOutcome};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::fetcher::{self, RequestFilters, SkipReason};
use crate::{HttpResponse, SourceError, Transport};

/// A finished fetch, delivered to the owning layer via the monitor.
#[derive(Debug)]
pub struct QueryCompletion {
    /// Layer that issued the request.
    pub source_id: String,
    /// Generation of the layer when the request was issued.
    pub generation: u64,
    /// Raw response or transport failure.
    pub result: Result<HttpResponse, SourceError>,
}

/// Reports a request task's completion when the task ends.
///
/// A task that panics or is aborted before its response arrives still
/// reports, as a transport failure, so the layer never stays busy.
struct CompletionGuard {
    source_id: String,
    generation: u64,
    completions: mpsc::UnboundedSender<QueryCompletion>,
    result: Option<Result<HttpResponse, SourceError>>,
}

impl Drop for CompletionGuard {
    fn drop(&mut self) {
        let result = self.result.take().unwrap_or_else(|| {
            Err(SourceError::Transport {
                message: "request task ended without a response".to_string(),
            })
        });
        let completion = QueryCompletion {
            source_id: std::mem::take(&mut self.source_id),
            generation: self.generation,
            result,
        };
        if let Err(e) = self.completions.send(completion) {
            log::debug!("{}: monitor gone, dropping response", e.0.source_id);
        }
    }
}

/// Result of [`SourceLayer::query`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryOutcome {
    /// A request is in flight.
    Issued {
        /// Generation tag of the request.
        generation: u64,
    },
    /// No request was made.
    Skipped(SkipReason),
}

/// Result of [`SourceLayer::apply`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// The completion belongs to an outdated generation and was dropped.
    Stale,
    /// The fetch failed; layer state is unchanged.
    Failed,
    /// Features were merged.
    Merged(MergeSummary),
}

/// A source layer: filters, features, buckets and selection.
pub struct SourceLayer {
    definition: SourceDefinition,
    transport: Arc<dyn Transport>,
    completions: mpsc::UnboundedSender<QueryCompletion>,
    api_key: String,
    query_filter: Option<String>,
    spatial_filter: Option<BoundingBox>,
    url: Option<String>,
    last_extent: Option<BoundingBox>,
    store: FeatureStore,
    buckets: OutputBuckets,
    selection: Vec<FeatureId>,
    place_cursor: usize,
    generation: u64,
    in_flight: Option<JoinHandle<()>>,
}

impl std::fmt::Debug for SourceLayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceLayer")
            .field("id", &self.definition.id)
            .field("generation", &self.generation)
            .field("features", &self.store.len())
            .field("busy", &self.is_busy())
            .finish_non_exhaustive()
    }
}

impl SourceLayer {
    /// Creates an empty layer that reports completions on `completions`.
    ///
    /// Wikimapia layers read their API key from the configured environment
    /// variable here; a missing key is sent as an empty string.
    #[must_use]
    pub fn new(
        definition: SourceDefinition,
        transport: Arc<dyn Transport>,
        completions: mpsc::UnboundedSender<QueryCompletion>,
    ) -> Self {
        let api_key = match &definition.fetcher {
            FetcherConfig::Wikimapia { api_key_env, .. } => {
                std::env::var(api_key_env).unwrap_or_else(|_| {
                    log::warn!("{}: {api_key_env} is not set", definition.id);
                    String::new()
                })
            }
            _ => String::new(),
        };

        Self {
            store: FeatureStore::new(definition.compare),
            buckets: OutputBuckets::new(definition.routing),
            definition,
            transport,
            completions,
            api_key,
            query_filter: None,
            spatial_filter: None,
            url: None,
            last_extent: None,
            selection: Vec::new(),
            place_cursor: 0,
            generation: 0,
            in_flight: None,
        }
    }

    /// Source identifier.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.definition.id
    }

    /// The definition this layer was built from.
    #[must_use]
    pub const fn definition(&self) -> &SourceDefinition {
        &self.definition
    }

    /// Overrides the API key read at construction.
    pub fn set_api_key(&mut self, key: impl Into<String>) {
        self.api_key = key.into();
    }

    /// Sets the free-text query.
    pub fn set_query_filter(&mut self, text: impl Into<String>) {
        self.query_filter = Some(text.into());
    }

    /// Sets the spatial filter.
    pub fn set_spatial_filter(&mut self, bbox: BoundingBox) {
        self.spatial_filter = Some(bbox);
    }

    /// Sets the URL used by `geojson_url` sources.
    pub fn set_url(&mut self, url: impl Into<String>) {
        self.url = Some(url.into());
    }

    /// Current free-text query.
    #[must_use]
    pub fn query_filter(&self) -> Option<&str> {
        self.query_filter.as_deref()
    }

    /// Current spatial filter.
    #[must_use]
    pub const fn spatial_filter(&self) -> Option<&BoundingBox> {
        self.spatial_filter.as_ref()
    }

    /// Current generation. Bumped by every issued query and every clear.
    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    /// Whether a request is in flight.
    #[must_use]
    pub const fn is_busy(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Issues a request for the current filters.
    ///
    /// Any in-flight request is aborted and its response will be ignored.
    /// Must be called from within a tokio runtime.
    pub fn query(&mut self) -> QueryOutcome {
        let filters = RequestFilters {
            query: self.query_filter.as_deref(),
            spatial: self.spatial_filter.as_ref(),
            url: self.url.as_deref(),
            api_key: &self.api_key,
            last_extent: self.last_extent.as_ref(),
        };

        let url = match fetcher::build_request(&self.definition.fetcher, &filters) {
            Ok(url) => url,
            Err(reason) => {
                if matches!(reason, SkipReason::InvalidUrl { .. }) {
                    log::warn!("{}: query skipped: {reason}", self.definition.id);
                } else {
                    log::debug!("{}: query skipped: {reason}", self.definition.id);
                }
                return QueryOutcome::Skipped(reason);
            }
        };

        self.abort_in_flight();
        self.generation += 1;

        if self.definition.clear_before_query {
            self.clear_features();
        }
        if matches!(self.definition.fetcher, FetcherConfig::Wikimapia { .. }) {
            self.last_extent = self.spatial_filter;
        }

        let generation = self.generation;
        let transport = Arc::clone(&self.transport);
        let guard = CompletionGuard {
            source_id: self.definition.id.clone(),
            generation,
            completions: self.completions.clone(),
            result: None,
        };

        log::info!("{}: querying {url}", self.definition.id);

        self.in_flight = Some(tokio::spawn(async move {
            let mut guard = guard;
            guard.result = Some(transport.get(&url).await);
        }));

        QueryOutcome::Issued { generation }
    }

    /// Applies a completed fetch.
    ///
    /// Completions from older generations are dropped. Failures of any
    /// kind are logged and leave the layer untouched.
    pub fn apply(&mut self, completion: QueryCompletion) -> ApplyOutcome {
        if completion.generation != self.generation {
            log::debug!(
                "{}: dropping stale response (generation {} != {})",
                self.definition.id,
                completion.generation,
                self.generation
            );
            return ApplyOutcome::Stale;
        }
        self.in_flight = None;

        let parsed = completion
            .result
            .and_then(|response| fetcher::decode(&self.definition, &response));

        match parsed {
            Ok(collection) => {
                if collection.dropped_rings > 0 {
                    log::warn!(
                        "{}: {} interior rings are thrown away",
                        self.definition.id,
                        collection.dropped_rings
                    );
                }
                let summary = self.merge(collection.features);
                log::info!(
                    "{}: {} new, {} updated, {} unchanged, {} skipped",
                    self.definition.id,
                    summary.inserted,
                    summary.replaced,
                    summary.unchanged,
                    collection.skipped
                );
                ApplyOutcome::Merged(summary)
            }
            Err(e) => {
                log::warn!("{}: query failed: {e}", self.definition.id);
                ApplyOutcome::Failed
            }
        }
    }

    fn merge(&mut self, features: Vec<Feature>) -> MergeSummary {
        let mut summary = MergeSummary::default();
        for feature in features {
            let id = feature.id.clone();
            let outcome = self.store.upsert(feature);
            summary.record(outcome);

            if outcome != UpsertOutcome::Unchanged
                && let Some(stored) = self.store.find_by_id(&id)
            {
                self.buckets.apply(outcome, stored);
            }
        }
        summary
    }

    /// Empties the layer and invalidates any pending fetch.
    pub fn clear(&mut self) {
        self.abort_in_flight();
        self.generation += 1;
        self.last_extent = None;
        self.clear_features();
        log::debug!("{}: cleared", self.definition.id);
    }

    fn clear_features(&mut self) {
        self.store.clear();
        self.buckets.clear();
        self.selection.clear();
        self.place_cursor = 0;
    }

    fn abort_in_flight(&mut self) {
        if let Some(handle) = self.in_flight.take() {
            handle.abort();
        }
    }

    /// Looks up a feature by identifier.
    #[must_use]
    pub fn find_feature(&self, id: &FeatureId) -> Option<&Feature> {
        self.store.find_by_id(id)
    }

    /// Adds a feature to the selection and returns it, e.g. to pan to its
    /// extent. Unknown identifiers select nothing.
    pub fn select(&mut self, id: &FeatureId) -> Option<&Feature> {
        let feature = self.store.find_by_id(id)?;
        if !self.selection.contains(id) {
            self.selection.push(id.clone());
        }
        Some(feature)
    }

    /// Deselects everything.
    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    /// Selected features, in selection order.
    pub fn selected(&self) -> impl Iterator<Item = &Feature> {
        self.selection
            .iter()
            .filter_map(|id| self.store.find_by_id(id))
    }

    /// Removes the selected features from the store and buckets.
    ///
    /// Returns how many features were removed.
    pub fn clear_selected(&mut self) -> usize {
        let mut removed = 0;
        for id in std::mem::take(&mut self.selection) {
            if self.store.remove(&id).is_some() {
                self.buckets.remove(&id);
                removed += 1;
            }
        }
        removed
    }

    /// Returns the next place to pan to, wrapping around at the end.
    ///
    /// Places are the features of the areas bucket (or the combined bucket
    /// for single-bucket layers).
    pub fn next_place(&mut self) -> Option<&Feature> {
        let places = self.buckets.bucket(self.buckets.route(GeometryKind::Polygon));
        if places.is_empty() {
            return None;
        }

        let index = self.place_cursor % places.len();
        self.place_cursor = index + 1;
        places.get(index)
    }

    /// The layer's feature store.
    #[must_use]
    pub const fn store(&self) -> &FeatureStore {
        &self.store
    }

    /// The layer's output buckets.
    #[must_use]
    pub const fn buckets(&self) -> &OutputBuckets {
        &self.buckets
    }
}

impl Drop for SourceLayer {
    fn drop(&mut self) {
        self.abort_in_flight();
    }
}
