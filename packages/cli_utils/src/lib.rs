#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Terminal plumbing shared by the `geoint` binary.
//!
//! [`IndicatifProgress`] draws the "waiting for sources" bar while the
//! monitor drains in-flight queries, and [`init_logger`] routes `log`
//! output through the same [`MultiProgress`] so log lines never tear it.

use std::time::Duration;

use geoint_source::ApplyOutcome;
use geoint_source::progress::QueryProgress;
use indicatif::{ProgressBar, ProgressStyle};
use log::LevelFilter;

pub use indicatif::MultiProgress;

/// Layer query progress rendered as an `indicatif` bar.
pub struct IndicatifProgress {
    bar: ProgressBar,
    bar_style: ProgressStyle,
}

impl IndicatifProgress {
    /// Adds a spinner labelled `message` to `multi`.
    ///
    /// It turns into a `done/busy` bar once the monitor reports how many
    /// layers it is waiting for.
    #[must_use]
    pub fn queries_bar(multi: &MultiProgress, message: &str) -> Self {
        let bar = multi.add(ProgressBar::new_spinner());
        bar.enable_steady_tick(Duration::from_millis(100));
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        bar.set_message(message.to_string());

        let bar_style = ProgressStyle::with_template(
            "{spinner:.cyan} {msg} {wide_bar:.cyan/dim} {pos}/{len} layers [{elapsed_precise}]",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("##-");

        Self { bar, bar_style }
    }

    /// Layers reported so far.
    #[must_use]
    pub fn done(&self) -> u64 {
        self.bar.position()
    }

    /// Text currently shown next to the bar.
    #[must_use]
    pub fn message(&self) -> String {
        self.bar.message()
    }
}

impl QueryProgress for IndicatifProgress {
    fn started(&self, busy_layers: usize) {
        self.bar.set_length(busy_layers as u64);
        self.bar.set_position(0);
        self.bar.set_style(self.bar_style.clone());
    }

    fn layer_done(&self, source_id: &str, outcome: ApplyOutcome) {
        self.bar.inc(1);
        self.bar.set_message(match outcome {
            ApplyOutcome::Merged(summary) => {
                format!("{source_id}: {} features", summary.total())
            }
            ApplyOutcome::Failed => format!("{source_id}: failed"),
            ApplyOutcome::Stale => format!("{source_id}: superseded"),
        });
    }

    fn finished(&self) {
        self.bar.finish_and_clear();
    }
}

/// Installs `pretty_env_logger` behind `indicatif-log-bridge` and returns
/// the [`MultiProgress`] every bar must be added to.
///
/// `RUST_LOG` wins when set; otherwise the `geoint` crates log at `info`
/// and everything else at `warn`.
#[must_use]
pub fn init_logger() -> MultiProgress {
    let multi = MultiProgress::new();

    let mut builder = pretty_env_logger::formatted_builder();
    match std::env::var("RUST_LOG") {
        Ok(filters) => {
            builder.parse_filters(&filters);
        }
        Err(_) => {
            builder
                .filter_level(LevelFilter::Warn)
                .filter_module("geoint", LevelFilter::Info);
        }
    }
    let logger = builder.build();
    let level = logger.filter();

    if indicatif_log_bridge::LogWrapper::new(multi.clone(), logger)
        .try_init()
        .is_err()
    {
        log::debug!("Logger already installed");
    }
    log::set_max_level(level);

    multi
}
