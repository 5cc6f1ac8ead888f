#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Keyed feature store and output buckets.
//!
//! Each source layer owns one [`FeatureStore`] holding at most one live
//! feature per identifier, and one [`OutputBuckets`](buckets::OutputBuckets)
//! set that mirrors the store in per-geometry collections for rendering.
//! Parse results are merged with [`FeatureStore::upsert`]; nothing is ever
//! removed except through [`FeatureStore::clear`] or
//! [`FeatureStore::remove`].

pub mod buckets;
pub mod export;

use std::collections::BTreeMap;

use geoint_feature_models::{ComparePolicy, Feature, FeatureId};
use strum_macros::{AsRefStr, Display};

pub use buckets::{BucketKind, BucketRouting, OutputBuckets};

/// What [`FeatureStore::upsert`] did with a feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, AsRefStr)]
pub enum UpsertOutcome {
    /// First sighting of the identifier.
    Inserted,
    /// The identifier was known and the feature changed; the old value was
    /// discarded.
    Replaced,
    /// The identifier was known and nothing relevant changed; the new value
    /// was discarded.
    Unchanged,
}

/// Counts of upsert outcomes for one merged collection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeSummary {
    /// Newly inserted features.
    pub inserted: usize,
    /// Replaced features.
    pub replaced: usize,
    /// Discarded duplicates.
    pub unchanged: usize,
}

impl MergeSummary {
    /// Records one outcome.
    pub const fn record(&mut self, outcome: UpsertOutcome) {
        match outcome {
            UpsertOutcome::Inserted => self.inserted += 1,
            UpsertOutcome::Replaced => self.replaced += 1,
            UpsertOutcome::Unchanged => self.unchanged += 1,
        }
    }

    /// Total number of features seen.
    #[must_use]
    pub const fn total(&self) -> usize {
        self.inserted + self.replaced + self.unchanged
    }
}

/// Currently displayed features of one layer, keyed by identifier.
#[derive(Debug, Clone, Default)]
pub struct FeatureStore {
    features: BTreeMap<FeatureId, Feature>,
    compare: ComparePolicy,
}

impl FeatureStore {
    /// Creates an empty store with the given comparison policy.
    #[must_use]
    pub const fn new(compare: ComparePolicy) -> Self {
        Self {
            features: BTreeMap::new(),
            compare,
        }
    }

    /// The comparison policy used by [`upsert`](Self::upsert).
    #[must_use]
    pub const fn compare_policy(&self) -> ComparePolicy {
        self.compare
    }

    /// Inserts `feature`, or replaces the stored feature with the same
    /// identifier if it changed under the store's [`ComparePolicy`].
    ///
    /// Geometries are compared coordinate by coordinate with exact equality.
    pub fn upsert(&mut self, feature: Feature) -> UpsertOutcome {
        let Some(existing) = self.features.get_mut(&feature.id) else {
            self.features.insert(feature.id.clone(), feature);
            return UpsertOutcome::Inserted;
        };

        let changed = match self.compare {
            ComparePolicy::GeometryOnly => existing.geometry != feature.geometry,
            ComparePolicy::FullFeature => {
                existing.geometry != feature.geometry || existing.attributes != feature.attributes
            }
        };

        if changed {
            log::trace!("Replacing feature {}", feature.id);
            *existing = feature;
            UpsertOutcome::Replaced
        } else {
            UpsertOutcome::Unchanged
        }
    }

    /// Upserts every feature, in order.
    pub fn merge(&mut self, features: impl IntoIterator<Item = Feature>) -> MergeSummary {
        let mut summary = MergeSummary::default();
        for feature in features {
            summary.record(self.upsert(feature));
        }
        log::debug!(
            "Merged {} features: {} inserted, {} replaced, {} unchanged ({} live)",
            summary.total(),
            summary.inserted,
            summary.replaced,
            summary.unchanged,
            self.features.len()
        );
        summary
    }

    /// Looks up a feature by identifier.
    #[must_use]
    pub fn find_by_id(&self, id: &FeatureId) -> Option<&Feature> {
        self.features.get(id)
    }

    /// Looks up a feature by the text its identifier displays as.
    ///
    /// A payload identifier wins over a part or minted identifier that
    /// prints the same.
    #[must_use]
    pub fn find_by_text(&self, text: &str) -> Option<&Feature> {
        FeatureId::candidates(text)
            .iter()
            .find_map(|id| self.features.get(id))
    }

    /// Removes and returns one feature.
    pub fn remove(&mut self, id: &FeatureId) -> Option<Feature> {
        self.features.remove(id)
    }

    /// Removes every feature.
    pub fn clear(&mut self) {
        log::trace!("Clearing {} features", self.features.len());
        self.features.clear();
    }

    /// Number of live features.
    #[must_use]
    pub fn len(&self) -> usize {
        self.features.len()
    }

    /// Whether the store holds no features.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Iterates over the live features in identifier order.
    pub fn iter(&self) -> impl Iterator<Item = &Feature> {
        self.features.values()
    }
}
