//! Trajectory points and their per-track grouping
//!
//! A [`TrajectoryPoint`] is one track crossing one FMT layer, expressed in
//! that layer's local frame. A [`TrioGroup`] collects the crossings of one
//! track over all layers, with an explicit empty slot where a layer gave no
//! accepted point.

pub mod extractor;

pub use extractor::{
    Extraction, ExtractionSummary, ExtractorConfig, GroupingStrategy, TrajectoryExtractor,
};

use crate::types::{DcSector, Layer, FMT_LAYERS};
use serde::{Deserialize, Serialize};

/// One accepted track crossing of an FMT layer
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrajectoryPoint {
    layer: Layer,
    sector: DcSector,
    z: f64,
    x: f64,
    y: f64,
    cos_theta: f64,
}

impl TrajectoryPoint {
    /// `x` and `y` are in the layer's local frame, `z` is global
    pub fn new(layer: Layer, sector: DcSector, z: f64, x: f64, y: f64, cos_theta: f64) -> Self {
        Self {
            layer,
            sector,
            z,
            x,
            y,
            cos_theta,
        }
    }

    /// Layer crossed
    pub fn layer(&self) -> Layer {
        self.layer
    }

    /// DC sector of the track, `Unknown` without a track row
    pub fn sector(&self) -> DcSector {
        self.sector
    }

    /// z of the point after propagation (cm)
    pub fn z(&self) -> f64 {
        self.z
    }

    /// Local-frame x (cm)
    pub fn x(&self) -> f64 {
        self.x
    }

    /// Local-frame y (cm)
    pub fn y(&self) -> f64 {
        self.y
    }

    /// Cosine of the track polar angle at the plane
    pub fn cos_theta(&self) -> f64 {
        self.cos_theta
    }
}

/// One track's points, one slot per layer
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TrioGroup {
    slots: [Option<TrajectoryPoint>; FMT_LAYERS],
}

impl TrioGroup {
    /// A group with every slot empty
    pub fn new() -> Self {
        Self::default()
    }

    /// Point of a layer, if its slot is filled
    pub fn get(&self, layer: Layer) -> Option<&TrajectoryPoint> {
        self.slots[layer.index()].as_ref()
    }

    /// Store a point in its layer's slot, returning what was there before
    pub fn insert(&mut self, point: TrajectoryPoint) -> Option<TrajectoryPoint> {
        self.slots[point.layer.index()].replace(point)
    }

    /// Number of filled slots
    pub fn filled(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    /// No slot filled
    pub fn is_empty(&self) -> bool {
        self.filled() == 0
    }

    /// Every layer filled
    pub fn is_complete(&self) -> bool {
        self.filled() == FMT_LAYERS
    }

    /// Filled points in layer order
    pub fn points(&self) -> impl Iterator<Item = &TrajectoryPoint> {
        self.slots.iter().flatten()
    }

    /// Slots in layer order
    pub fn slots(&self) -> &[Option<TrajectoryPoint>; FMT_LAYERS] {
        &self.slots
    }
}
