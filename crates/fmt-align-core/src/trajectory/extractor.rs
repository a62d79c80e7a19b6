//! Trajectory point extraction
//!
//! Turns one event into the FMT crossings of its tracks, grouped per track.
//!
//! # Algorithm
//!
//! For every FMT row of the trajectory bank:
//!
//! 1. find the group the row belongs to (see [`GroupingStrategy`])
//! 2. look up the DC sector of the particle in the track bank
//! 3. compute the layer's reference z, nominal plus global and layer shifts
//! 4. reject vertices already at or past that plane
//! 5. swim the particle to the plane
//! 6. apply the trajectory cuts on the swum point
//! 7. rotate the point into the layer frame and store it in its slot
//!
//! Groups with fewer than `min_filled` points are dropped at the end.
//! Rejections in steps 4 to 6 only empty the slot of that row. A row with no
//! group is still evaluated and counted, but its point is discarded.
//!
//! # Example
//!
//! ```
//! use fmt_align_core::bank::{MemoryBank, MemoryEvent, PARTICLE_BANK, TRACK_BANK, TRAJ_BANK};
//! use fmt_align_core::cuts::{CutDecision, CutEngine};
//! use fmt_align_core::geometry::{ReferencePlaneSet, ShiftMatrix};
//! use fmt_align_core::swim::HelixSwimmer;
//! use fmt_align_core::trajectory::{ExtractorConfig, TrajectoryExtractor};
//!
//! struct AcceptAll;
//! impl CutEngine for AcceptAll {
//!     fn downstream_track_check(&self, _: f64, _: f64) -> CutDecision { CutDecision::Accept }
//!     fn check_traj_cuts(&self, _: f64, _: f64, _: f64, _: f64, _: f64) -> CutDecision {
//!         CutDecision::Accept
//!     }
//! }
//!
//! let event = MemoryEvent::new()
//!     .with_bank(MemoryBank::new(TRAJ_BANK)
//!         .with_bytes("detector", vec![8, 8, 8])
//!         .with_bytes("layer", vec![1, 2, 3])
//!         .with_shorts("pindex", vec![0, 0, 0]))
//!     .with_bank(MemoryBank::new(PARTICLE_BANK)
//!         .with_floats("vx", vec![0.0]).with_floats("vy", vec![0.0])
//!         .with_floats("vz", vec![-3.0]).with_floats("px", vec![0.2])
//!         .with_floats("py", vec![0.1]).with_floats("pz", vec![2.0])
//!         .with_bytes("charge", vec![-1]))
//!     .with_bank(MemoryBank::new(TRACK_BANK)
//!         .with_shorts("pindex", vec![0]).with_bytes("sector", vec![4]));
//!
//! let planes = ReferencePlaneSet::new([26.0, 27.2, 28.4], [0.0, 60.0, 120.0]).unwrap();
//! let shifts = ShiftMatrix::zeros();
//! let swimmer = HelixSwimmer::default();
//! let extractor = TrajectoryExtractor::new(
//!     &swimmer, &AcceptAll, &planes, &shifts, ExtractorConfig::new(3),
//! );
//!
//! let extraction = extractor.extract(&event).unwrap().unwrap();
//! assert_eq!(extraction.groups.len(), 1);
//! assert_eq!(extraction.candidates, 3);
//! ```

use super::{TrajectoryPoint, TrioGroup};
use crate::bank::{columns, DataEvent, RowTable, PARTICLE_BANK, TRACK_BANK, TRAJ_BANK};
use crate::cuts::CutEngine;
use crate::error::{AlignError, BankError, Result};
use crate::geometry::{rotate_to_local, ReferencePlaneSet, ShiftMatrix};
use crate::swim::TrackPropagator;
use crate::types::{DcSector, Layer, TrackState, Vec3, FMT_DETECTOR_ID, FMT_LAYERS};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::iter::Sum;
use std::ops::{Add, AddAssign};

/// How trajectory rows are assigned to groups
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupingStrategy {
    /// A first-layer row opens a new group and every following row joins
    /// it. Points of rows before the first first-layer row of an event are
    /// dropped.
    /// Relies on the bank listing each track's layers contiguously.
    #[default]
    LayerOrdered,

    /// Groups are keyed on the particle index. A first-layer row still
    /// opens a fresh group for its particle; other layers join the
    /// particle's open group, opening one if needed. Robust to interleaved
    /// tracks.
    ByParticle,
}

/// Extraction settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractorConfig {
    /// Number of layers used, counted from the first
    pub layer_count: usize,
    /// Minimum number of filled slots for a group to be kept
    pub min_filled: usize,
    /// Detector identifier of the FMT rows in the trajectory bank
    pub detector_id: i8,
    /// How rows are assigned to groups
    pub grouping: GroupingStrategy,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self::new(FMT_LAYERS)
    }
}

impl ExtractorConfig {
    /// All FMT layers, layer-ordered grouping
    pub fn new(min_filled: usize) -> Self {
        Self {
            layer_count: FMT_LAYERS,
            min_filled,
            detector_id: FMT_DETECTOR_ID,
            grouping: GroupingStrategy::default(),
        }
    }

    /// Use only the first `layer_count` layers
    pub fn with_layer_count(mut self, layer_count: usize) -> Self {
        self.layer_count = layer_count;
        self
    }

    /// Choose how rows are grouped
    pub fn with_grouping(mut self, grouping: GroupingStrategy) -> Self {
        self.grouping = grouping;
        self
    }

    /// Detector identifier of the rows to extract
    pub fn with_detector_id(mut self, detector_id: i8) -> Self {
        self.detector_id = detector_id;
        self
    }

    /// Check that `1 <= min_filled <= layer_count <= FMT_LAYERS`
    pub fn validate(&self) -> Result<()> {
        if !(1..=FMT_LAYERS).contains(&self.layer_count) {
            return Err(AlignError::InvalidLayerCount {
                layer_count: self.layer_count,
                max: FMT_LAYERS,
            });
        }
        if !(1..=self.layer_count).contains(&self.min_filled) {
            return Err(AlignError::InvalidMinFilled {
                min_filled: self.min_filled,
                layer_count: self.layer_count,
            });
        }
        Ok(())
    }
}

/// Groups found in one event
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Extraction {
    /// Groups meeting the fill threshold, in creation order
    pub groups: Vec<TrioGroup>,
    /// Trajectory rows that reached the cuts, accepted or not
    pub candidates: u64,
}

impl Extraction {
    /// Counts of this extraction, as one event
    pub fn summary(&self) -> ExtractionSummary {
        ExtractionSummary {
            events: 1,
            groups: self.groups.len() as u64,
            points: self.groups.iter().map(|g| g.filled() as u64).sum(),
            candidates: self.candidates,
        }
    }
}

/// Counts accumulated over many extractions
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionSummary {
    /// Events that carried all three banks
    pub events: u64,
    /// Groups kept
    pub groups: u64,
    /// Filled slots over the kept groups
    pub points: u64,
    /// Trajectory rows evaluated
    pub candidates: u64,
}

impl Add for ExtractionSummary {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self {
            events: self.events + other.events,
            groups: self.groups + other.groups,
            points: self.points + other.points,
            candidates: self.candidates + other.candidates,
        }
    }
}

impl AddAssign for ExtractionSummary {
    fn add_assign(&mut self, other: Self) {
        *self = *self + other;
    }
}

impl Sum for ExtractionSummary {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

impl<'a> Sum<&'a Extraction> for ExtractionSummary {
    fn sum<I: Iterator<Item = &'a Extraction>>(iter: I) -> Self {
        iter.map(Extraction::summary).sum()
    }
}

/// Extracts FMT trajectory points from events
///
/// Holds no per-event state, so one extractor can process any number of
/// events, in any order.
#[derive(Debug)]
pub struct TrajectoryExtractor<'a, P: ?Sized, C: ?Sized> {
    propagator: &'a P,
    cuts: &'a C,
    planes: &'a ReferencePlaneSet,
    shifts: &'a ShiftMatrix,
    config: ExtractorConfig,
}

impl<'a, P, C> TrajectoryExtractor<'a, P, C>
where
    P: TrackPropagator + ?Sized,
    C: CutEngine + ?Sized,
{
    /// Extractor over borrowed collaborators
    pub fn new(
        propagator: &'a P,
        cuts: &'a C,
        planes: &'a ReferencePlaneSet,
        shifts: &'a ShiftMatrix,
        config: ExtractorConfig,
    ) -> Self {
        Self {
            propagator,
            cuts,
            planes,
            shifts,
            config,
        }
    }

    /// Settings in use
    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    /// Extract the trajectory groups of one event
    ///
    /// Returns `Ok(None)` when the event lacks one of the trajectory,
    /// particle or track banks, and an error for an invalid configuration
    /// or a malformed bank.
    pub fn extract<E: DataEvent>(&self, event: &E) -> Result<Option<Extraction>> {
        if let Err(e) = self.config.validate() {
            tracing::error!("Refusing to extract trajectory points: {}", e);
            return Err(e);
        }

        let (Some(traj), Some(particles), Some(tracks)) = (
            event.bank(TRAJ_BANK),
            event.bank(PARTICLE_BANK),
            event.bank(TRACK_BANK),
        ) else {
            tracing::trace!("Event without trajectory, particle or track bank");
            return Ok(None);
        };

        let mut builder = GroupBuilder::new(self.config.grouping);
        let mut candidates = 0u64;

        for row in 0..traj.rows() {
            if traj.get_byte(columns::DETECTOR, row)? != self.config.detector_id {
                continue;
            }
            let Some(layer) = Layer::from_bank(traj.get_byte(columns::LAYER, row)?)
                .filter(|l| l.index() < self.config.layer_count)
            else {
                continue;
            };
            let pindex = traj.get_short(columns::PINDEX, row)?;

            let group = builder.group_for(layer, pindex);
            candidates += 1;

            let Some(point) = self.evaluate(layer, pindex, particles, tracks)? else {
                continue;
            };
            match group {
                Some(group) => builder.store(group, point),
                None => {
                    tracing::trace!("Trajectory row {} ({}) precedes any first-layer row", row, layer)
                }
            }
        }

        let groups = builder.finish(self.config.min_filled);
        tracing::trace!("{} groups kept from {} candidates", groups.len(), candidates);
        Ok(Some(Extraction { groups, candidates }))
    }

    /// Run one candidate through propagation and cuts
    fn evaluate<B: RowTable>(
        &self,
        layer: Layer,
        pindex: i16,
        particles: &B,
        tracks: &B,
    ) -> Result<Option<TrajectoryPoint>> {
        let sector = find_sector(tracks, pindex)?;
        let z_ref = self.planes.shifted_z(layer, self.shifts);
        let state = read_state(particles, pindex)?;

        if self
            .cuts
            .downstream_track_check(state.position.z, z_ref)
            .is_rejected()
        {
            return Ok(None);
        }

        let Some(swum) = self.propagator.swim_to_plane(&state, z_ref) else {
            return Ok(None);
        };
        let Some(cos_theta) = swum.cos_theta() else {
            return Ok(None);
        };

        let Vec3 { x, y, z } = swum.position;
        if self
            .cuts
            .check_traj_cuts(z, x, y, z_ref, cos_theta)
            .is_rejected()
        {
            return Ok(None);
        }

        let (x_local, y_local) = rotate_to_local(x, y, self.planes.angle(layer));
        Ok(Some(TrajectoryPoint::new(
            layer, sector, z, x_local, y_local, cos_theta,
        )))
    }
}

/// DC sector of a particle, last matching track row wins
fn find_sector<B: RowTable>(tracks: &B, pindex: i16) -> Result<DcSector> {
    let mut sector = DcSector::Unknown;
    for row in 0..tracks.rows() {
        if tracks.get_short(columns::PINDEX, row)? == pindex {
            sector = DcSector::from_bank(tracks.get_byte(columns::SECTOR, row)?);
        }
    }
    Ok(sector)
}

fn read_state<B: RowTable>(particles: &B, pindex: i16) -> Result<TrackState> {
    let row = usize::try_from(pindex).map_err(|_| BankError::NegativeIndex {
        bank: PARTICLE_BANK.to_string(),
        pindex,
    })?;
    let float = |column: &str| particles.get_float(column, row).map(f64::from);

    Ok(TrackState::new(
        Vec3::new(float(columns::VX)?, float(columns::VY)?, float(columns::VZ)?),
        Vec3::new(float(columns::PX)?, float(columns::PY)?, float(columns::PZ)?),
        i32::from(particles.get_byte(columns::CHARGE, row)?),
    ))
}

/// Assigns rows to groups during one event
#[derive(Debug)]
struct GroupBuilder {
    strategy: GroupingStrategy,
    groups: Vec<TrioGroup>,
    current: Option<usize>,
    open: HashMap<i16, usize>,
}

impl GroupBuilder {
    fn new(strategy: GroupingStrategy) -> Self {
        Self {
            strategy,
            groups: Vec::new(),
            current: None,
            open: HashMap::new(),
        }
    }

    fn open_group(&mut self) -> usize {
        self.groups.push(TrioGroup::new());
        self.groups.len() - 1
    }

    /// Index of the group a row goes to, opening one when the strategy says so
    fn group_for(&mut self, layer: Layer, pindex: i16) -> Option<usize> {
        match self.strategy {
            GroupingStrategy::LayerOrdered => {
                if layer == Layer::First {
                    self.current = Some(self.open_group());
                }
                self.current
            }
            GroupingStrategy::ByParticle => {
                if layer == Layer::First || !self.open.contains_key(&pindex) {
                    let index = self.open_group();
                    self.open.insert(pindex, index);
                }
                self.open.get(&pindex).copied()
            }
        }
    }

    fn store(&mut self, group: usize, point: TrajectoryPoint) {
        if self.groups[group].insert(point).is_some() {
            tracing::debug!("Group {} already had a point on {}, replaced", group, point.layer());
        }
    }

    fn finish(self, min_filled: usize) -> Vec<TrioGroup> {
        self.groups
            .into_iter()
            .filter(|g| g.filled() >= min_filled)
            .collect()
    }
}
