//! Per-geometry output collections consumed by the rendering layer.
//!
//! Buckets mirror the subset of a layer's store that a renderer draws. They
//! are only appended to or updated in place by merges, and emptied
//! wholesale by clear commands.

use std::collections::BTreeMap;

use geoint_feature_models::{Feature, FeatureId, GeometryKind};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

use crate::UpsertOutcome;

/// Identifies one output bucket.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display, EnumString, AsRefStr,
)]
#[strum(serialize_all = "snake_case")]
pub enum BucketKind {
    /// Point features.
    Points,
    /// Line features. No supported geometry routes here yet.
    Lines,
    /// Polygon features.
    Areas,
    /// Everything, for layers drawn as a single overlay.
    Combined,
}

/// How a layer distributes features over buckets.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum BucketRouting {
    /// Points, lines and areas each get their own bucket.
    #[default]
    ByGeometry,
    /// One combined bucket.
    Single,
}

impl BucketRouting {
    /// Buckets that exist under this routing.
    #[must_use]
    pub const fn kinds(self) -> &'static [BucketKind] {
        match self {
            Self::ByGeometry => &[BucketKind::Points, BucketKind::Lines, BucketKind::Areas],
            Self::Single => &[BucketKind::Combined],
        }
    }

    /// Bucket that receives a geometry of `kind`.
    #[must_use]
    pub const fn route(self, kind: GeometryKind) -> BucketKind {
        match (self, kind) {
            (Self::Single, _) => BucketKind::Combined,
            (Self::ByGeometry, GeometryKind::Point) => BucketKind::Points,
            (Self::ByGeometry, GeometryKind::Polygon) => BucketKind::Areas,
        }
    }
}

/// The output buckets of one layer.
#[derive(Debug, Clone)]
pub struct OutputBuckets {
    routing: BucketRouting,
    buckets: BTreeMap<BucketKind, Vec<Feature>>,
}

impl OutputBuckets {
    /// Creates empty buckets for `routing`.
    #[must_use]
    pub fn new(routing: BucketRouting) -> Self {
        Self {
            routing,
            buckets: routing.kinds().iter().map(|&k| (k, Vec::new())).collect(),
        }
    }

    /// The routing these buckets were created with.
    #[must_use]
    pub const fn routing(&self) -> BucketRouting {
        self.routing
    }

    /// Bucket that receives a geometry of `kind` under these buckets' routing.
    #[must_use]
    pub const fn route(&self, kind: GeometryKind) -> BucketKind {
        self.routing.route(kind)
    }

    /// Mirrors one upsert into the buckets.
    ///
    /// `Inserted` appends, `Replaced` swaps the entry in place (moving it if
    /// the geometry kind changed), `Unchanged` does nothing.
    pub fn apply(&mut self, outcome: UpsertOutcome, feature: &Feature) {
        let target = self.route(feature.geometry.kind());

        match outcome {
            UpsertOutcome::Unchanged => {}
            UpsertOutcome::Inserted => self.push(target, feature.clone()),
            UpsertOutcome::Replaced => {
                let slot = self
                    .buckets
                    .get_mut(&target)
                    .and_then(|bucket| bucket.iter_mut().find(|f| f.id == feature.id));
                if let Some(slot) = slot {
                    *slot = feature.clone();
                } else {
                    self.remove(&feature.id);
                    self.push(target, feature.clone());
                }
            }
        }
    }

    fn push(&mut self, kind: BucketKind, feature: Feature) {
        self.buckets.entry(kind).or_default().push(feature);
    }

    /// Features in `kind`, in merge order. Unknown buckets are empty.
    #[must_use]
    pub fn bucket(&self, kind: BucketKind) -> &[Feature] {
        self.buckets.get(&kind).map_or(&[], Vec::as_slice)
    }

    /// Iterates over every bucket and its features.
    pub fn iter(&self) -> impl Iterator<Item = (BucketKind, &[Feature])> {
        self.buckets.iter().map(|(kind, f)| (*kind, f.as_slice()))
    }

    /// Removes a feature from whichever bucket holds it.
    ///
    /// Returns whether anything was removed.
    pub fn remove(&mut self, id: &FeatureId) -> bool {
        let mut removed = false;
        for bucket in self.buckets.values_mut() {
            let before = bucket.len();
            bucket.retain(|f| &f.id != id);
            removed |= bucket.len() != before;
        }
        removed
    }

    /// Empties every bucket.
    pub fn clear(&mut self) {
        for bucket in self.buckets.values_mut() {
            bucket.clear();
        }
    }

    /// Number of features across all buckets.
    #[must_use]
    pub fn total(&self) -> usize {
        self.buckets.values().map(Vec::len).sum()
    }
}
