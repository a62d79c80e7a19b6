//! Event builders and deterministic stand-ins shared by the integration tests

#![allow(dead_code)]

use fmt_align_core::bank::{MemoryBank, MemoryEvent, PARTICLE_BANK, TRACK_BANK, TRAJ_BANK};
use fmt_align_core::cuts::{CutDecision, CutEngine};
use fmt_align_core::geometry::ReferencePlaneSet;
use fmt_align_core::types::{PropagatedState, TrackState, Vec3, FMT_DETECTOR_ID};
use std::cell::Cell;

/// Nominal plane z of the test geometry (cm)
pub const PLANE_Z: [f64; 3] = [26.0, 27.5, 29.0];

pub fn flat_planes() -> ReferencePlaneSet {
    ReferencePlaneSet::new(PLANE_Z, [0.0; 3]).unwrap()
}

/// One trajectory bank row
#[derive(Debug, Clone, Copy)]
pub struct TrajRow {
    pub detector: i8,
    pub layer: i8,
    pub pindex: i16,
}

pub fn fmt(layer: i8, pindex: i16) -> TrajRow {
    TrajRow {
        detector: FMT_DETECTOR_ID,
        layer,
        pindex,
    }
}

/// One particle bank row
#[derive(Debug, Clone, Copy)]
pub struct Particle {
    pub vertex: [f32; 3],
    pub momentum: [f32; 3],
    pub charge: i8,
}

/// A particle at (x, y, -3) heading forward with cos(theta) = 0.8
pub fn particle_at(x: f32, y: f32) -> Particle {
    Particle {
        vertex: [x, y, -3.0],
        momentum: [0.0, 3.0, 4.0],
        charge: -1,
    }
}

#[derive(Debug, Default)]
pub struct EventBuilder {
    traj: Vec<TrajRow>,
    particles: Vec<Particle>,
    tracks: Vec<(i16, i8)>,
}

impl EventBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn traj(mut self, rows: impl IntoIterator<Item = TrajRow>) -> Self {
        self.traj.extend(rows);
        self
    }

    pub fn particle(mut self, particle: Particle) -> Self {
        self.particles.push(particle);
        self
    }

    /// Track bank row, `sector` one-based as stored in the bank
    pub fn track(mut self, pindex: i16, sector: i8) -> Self {
        self.tracks.push((pindex, sector));
        self
    }

    pub fn build(self) -> MemoryEvent {
        let traj = MemoryBank::new(TRAJ_BANK)
            .with_bytes("detector", self.traj.iter().map(|r| r.detector).collect())
            .with_bytes("layer", self.traj.iter().map(|r| r.layer).collect())
            .with_shorts("pindex", self.traj.iter().map(|r| r.pindex).collect());

        let column = |f: fn(&Particle) -> f32| self.particles.iter().map(f).collect::<Vec<_>>();
        let particles = MemoryBank::new(PARTICLE_BANK)
            .with_floats("vx", column(|p| p.vertex[0]))
            .with_floats("vy", column(|p| p.vertex[1]))
            .with_floats("vz", column(|p| p.vertex[2]))
            .with_floats("px", column(|p| p.momentum[0]))
            .with_floats("py", column(|p| p.momentum[1]))
            .with_floats("pz", column(|p| p.momentum[2]))
            .with_bytes("charge", self.particles.iter().map(|p| p.charge).collect());

        let tracks = MemoryBank::new(TRACK_BANK)
            .with_shorts("pindex", self.tracks.iter().map(|t| t.0).collect())
            .with_bytes("sector", self.tracks.iter().map(|t| t.1).collect());

        MemoryEvent::new()
            .with_bank(traj)
            .with_bank(particles)
            .with_bank(tracks)
    }
}

/// Moves the track to the requested plane without bending it
#[derive(Debug, Default)]
pub struct Teleport {
    pub calls: Cell<usize>,
}

impl fmt_align_core::swim::TrackPropagator for Teleport {
    fn swim_to_plane(&self, state: &TrackState, z_target: f64) -> Option<PropagatedState> {
        self.calls.set(self.calls.get() + 1);
        Some(PropagatedState {
            position: Vec3::new(state.position.x, state.position.y, z_target),
            momentum: state.momentum,
        })
    }
}

/// Cuts that reject chosen planes or chosen swum x positions
#[derive(Debug, Default)]
pub struct ScriptedCuts {
    /// Reference planes failing the downstream check
    pub downstream_reject: Vec<f64>,
    /// Swum x positions failing the trajectory cuts
    pub traj_reject_x: Vec<f64>,
    pub downstream_calls: Cell<usize>,
    pub traj_calls: Cell<usize>,
}

impl ScriptedCuts {
    pub fn accept_all() -> Self {
        Self::default()
    }

    pub fn reject_plane(z_ref: f64) -> Self {
        Self {
            downstream_reject: vec![z_ref],
            ..Default::default()
        }
    }

    pub fn reject_x(xs: impl IntoIterator<Item = f64>) -> Self {
        Self {
            traj_reject_x: xs.into_iter().collect(),
            ..Default::default()
        }
    }
}

fn matches_any(values: &[f64], v: f64) -> bool {
    values.iter().any(|r| (r - v).abs() < 1e-9)
}

impl CutEngine for ScriptedCuts {
    fn downstream_track_check(&self, _z: f64, z_ref: f64) -> CutDecision {
        self.downstream_calls.set(self.downstream_calls.get() + 1);
        if matches_any(&self.downstream_reject, z_ref) {
            CutDecision::Reject
        } else {
            CutDecision::Accept
        }
    }

    fn check_traj_cuts(&self, _z: f64, x: f64, _y: f64, _z_ref: f64, _cos: f64) -> CutDecision {
        self.traj_calls.set(self.traj_calls.get() + 1);
        if matches_any(&self.traj_reject_x, x) {
            CutDecision::Reject
        } else {
            CutDecision::Accept
        }
    }
}
