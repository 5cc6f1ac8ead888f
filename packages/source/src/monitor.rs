//! The monitor: owner of all layers and the completion channel.
//!
//! Requests run on spawned tasks but every completion comes back through a
//! single unbounded channel and is applied here, one at a time, so layer
//! state is only ever touched from the task driving the monitor.

use std::sync::Arc;

use geoint_source_models::SourceDefinition;
use tokio::sync::mpsc;

use crate::layer::{ApplyOutcome, QueryCompletion, QueryOutcome, SourceLayer};
use crate::progress::{NullProgress, QueryProgress};
use crate::{SourceError, Transport, registry};

/// Owns every [`SourceLayer`] and dispatches completed fetches to them.
pub struct Monitor {
    transport: Arc<dyn Transport>,
    layers: Vec<SourceLayer>,
    sender: mpsc::UnboundedSender<QueryCompletion>,
    receiver: mpsc::UnboundedReceiver<QueryCompletion>,
}

impl std::fmt::Debug for Monitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Monitor")
            .field("layers", &self.layers)
            .finish_non_exhaustive()
    }
}

impl Monitor {
    /// Creates a monitor with no layers.
    #[must_use]
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        Self {
            transport,
            layers: Vec::new(),
            sender,
            receiver,
        }
    }

    /// Creates a monitor with one layer per built-in source definition.
    #[must_use]
    pub fn with_registry(transport: Arc<dyn Transport>) -> Self {
        let mut monitor = Self::new(transport);
        for definition in registry::all_sources() {
            monitor.push_layer(definition);
        }
        monitor
    }

    /// Registers a layer for `definition`.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::DuplicateSource`] if a layer with the same id
    /// already exists.
    pub fn add_source(&mut self, definition: SourceDefinition) -> Result<&mut SourceLayer, SourceError> {
        if self.layer(&definition.id).is_some() {
            return Err(SourceError::DuplicateSource { id: definition.id });
        }
        Ok(self.push_layer(definition))
    }

    fn push_layer(&mut self, definition: SourceDefinition) -> &mut SourceLayer {
        log::debug!("Registering layer {}", definition.id);
        let layer = SourceLayer::new(definition, Arc::clone(&self.transport), self.sender.clone());
        self.layers.push(layer);
        let last = self.layers.len() - 1;
        &mut self.layers[last]
    }

    /// Looks up a layer.
    #[must_use]
    pub fn layer(&self, id: &str) -> Option<&SourceLayer> {
        self.layers.iter().find(|l| l.id() == id)
    }

    /// Looks up a layer for modification.
    pub fn layer_mut(&mut self, id: &str) -> Option<&mut SourceLayer> {
        self.layers.iter_mut().find(|l| l.id() == id)
    }

    /// All layers in registration order.
    pub fn layers(&self) -> impl Iterator<Item = &SourceLayer> {
        self.layers.iter()
    }

    /// Issues a query on one layer.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::UnknownSource`] if no layer has this id.
    pub fn query(&mut self, id: &str) -> Result<QueryOutcome, SourceError> {
        self.layer_mut(id)
            .map(SourceLayer::query)
            .ok_or_else(|| SourceError::UnknownSource { id: id.to_string() })
    }

    /// Clears every layer.
    pub fn clear_all(&mut self) {
        for layer in &mut self.layers {
            layer.clear();
        }
    }

    /// Hands a completion to the layer that issued it.
    ///
    /// Completions for unknown layers are treated as stale.
    pub fn dispatch(&mut self, completion: QueryCompletion) -> ApplyOutcome {
        match self.layer_mut(&completion.source_id) {
            Some(layer) => layer.apply(completion),
            None => {
                log::warn!("Dropping response for unknown source {}", completion.source_id);
                ApplyOutcome::Stale
            }
        }
    }

    /// Waits for the next completion and applies it.
    ///
    /// Returns the source id and outcome, or `None` if the channel closed.
    pub async fn next_completion(&mut self) -> Option<(String, ApplyOutcome)> {
        let completion = self.receiver.recv().await?;
        let source_id = completion.source_id.clone();
        let outcome = self.dispatch(completion);
        Some((source_id, outcome))
    }

    /// Whether no layer has a request in flight.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.layers.iter().all(|l| !l.is_busy())
    }

    /// Applies completions until no layer has a request in flight.
    ///
    /// Stale completions encountered on the way are applied (and dropped)
    /// too; all outcomes are returned in arrival order.
    pub async fn wait_idle(&mut self) -> Vec<(String, ApplyOutcome)> {
        self.wait_idle_with_progress(&NullProgress).await
    }

    /// Like [`wait_idle`](Self::wait_idle), reporting each layer to
    /// `progress` as its response is applied.
    pub async fn wait_idle_with_progress(
        &mut self,
        progress: &dyn QueryProgress,
    ) -> Vec<(String, ApplyOutcome)> {
        progress.started(self.layers.iter().filter(|l| l.is_busy()).count());

        let mut applied = Vec::new();
        while !self.is_idle() {
            let Some((source_id, outcome)) = self.next_completion().await else {
                break;
            };
            if outcome != ApplyOutcome::Stale {
                progress.layer_done(&source_id, outcome);
            }
            applied.push((source_id, outcome));
        }

        progress.finished();
        applied
    }
}
