//! Progress of a [`Monitor::wait_idle_with_progress`](crate::Monitor::wait_idle_with_progress)
//! call.
//!
//! The monitor announces how many layers have a request in flight, then
//! reports each layer as its response is applied. The CLI renders this as
//! an `indicatif` bar; library callers and tests use [`NullProgress`].

use crate::layer::ApplyOutcome;

/// Receives per-layer updates while the monitor drains in-flight queries.
pub trait QueryProgress: Send + Sync {
    /// Called once, before waiting, with the number of busy layers.
    fn started(&self, busy_layers: usize);

    /// Called for every applied response of a current generation.
    ///
    /// Stale responses are not reported.
    fn layer_done(&self, source_id: &str, outcome: ApplyOutcome);

    /// Called once every layer is idle.
    fn finished(&self);
}

/// Ignores every update.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullProgress;

impl QueryProgress for NullProgress {
    fn started(&self, _busy_layers: usize) {}
    fn layer_done(&self, _source_id: &str, _outcome: ApplyOutcome) {}
    fn finished(&self) {}
}
