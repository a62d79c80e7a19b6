//! Track propagation ("swimming") to a z plane
//!
//! The extractor only sees the [`TrackPropagator`] trait. [`HelixSwimmer`]
//! is the implementation shipped with the crate: an exact helix in a
//! uniform solenoid field, which is what a track sees between the target
//! and the FMT. The torus field only matters further downstream and is not
//! modelled.
//!
//! Closures with the right signature are propagators too, which keeps test
//! stand-ins short:
//!
//! ```
//! use fmt_align_core::swim::TrackPropagator;
//! use fmt_align_core::types::{PropagatedState, TrackState, Vec3};
//!
//! let teleport = |s: &TrackState, z: f64| {
//!     Some(PropagatedState {
//!         position: Vec3::new(s.position.x, s.position.y, z),
//!         momentum: s.momentum,
//!     })
//! };
//! let state = TrackState::new(Vec3::new(1.0, 2.0, 0.0), Vec3::new(0.0, 0.0, 2.0), -1);
//! assert_eq!(teleport.swim_to_plane(&state, 30.0).unwrap().position.z, 30.0);
//! ```

use crate::types::{PropagatedState, TrackState, Vec3};
use serde::{Deserialize, Serialize};

/// Nominal solenoid field at full scale (T)
pub const SOLENOID_NOMINAL_FIELD: f64 = 5.0;

/// Curvature constant, GeV/c per T per cm
const C_LIGHT: f64 = 0.002_997_924_58;

/// Below this bending strength (GeV/c per cm) tracks are swum as straight lines
const STRAIGHT_LINE_LIMIT: f64 = 1e-12;

/// Propagates a track state to a plane of constant z
pub trait TrackPropagator {
    /// State at `z_target`, or `None` if the track cannot reach it
    fn swim_to_plane(&self, state: &TrackState, z_target: f64) -> Option<PropagatedState>;
}

impl<F> TrackPropagator for F
where
    F: Fn(&TrackState, f64) -> Option<PropagatedState>,
{
    fn swim_to_plane(&self, state: &TrackState, z_target: f64) -> Option<PropagatedState> {
        self(state, z_target)
    }
}

/// Magnetic field setup
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SwimConfig {
    /// Solenoid scale factor, sign gives polarity
    pub solenoid_scale: f64,
    /// Torus scale factor
    pub torus_scale: f64,
    /// Torus shift along z (cm)
    pub torus_shift: f64,
}

impl Default for SwimConfig {
    fn default() -> Self {
        Self {
            solenoid_scale: -0.75,
            torus_scale: -1.0,
            torus_shift: -3.0,
        }
    }
}

impl SwimConfig {
    /// Field setup from its three parameters
    pub fn new(solenoid_scale: f64, torus_scale: f64, torus_shift: f64) -> Self {
        Self {
            solenoid_scale,
            torus_scale,
            torus_shift,
        }
    }

    /// Build from the three values given on the command line
    pub fn from_array([solenoid_scale, torus_scale, torus_shift]: [f64; 3]) -> Self {
        Self::new(solenoid_scale, torus_scale, torus_shift)
    }

    /// Longitudinal solenoid field (T)
    pub fn solenoid_field(&self) -> f64 {
        self.solenoid_scale * SOLENOID_NOMINAL_FIELD
    }
}

/// Exact helix propagation in a uniform field along z
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HelixSwimmer {
    config: SwimConfig,
    bz: f64,
}

impl Default for HelixSwimmer {
    fn default() -> Self {
        Self::new(SwimConfig::default())
    }
}

impl HelixSwimmer {
    /// Swimmer in the solenoid field of `config`
    pub fn new(config: SwimConfig) -> Self {
        tracing::debug!(
            "Swimmer configured: solenoid {} ({} T), torus {} shifted {} cm",
            config.solenoid_scale,
            config.solenoid_field(),
            config.torus_scale,
            config.torus_shift
        );
        Self {
            config,
            bz: config.solenoid_field(),
        }
    }

    /// Field setup in use
    pub fn config(&self) -> &SwimConfig {
        &self.config
    }
}

impl TrackPropagator for HelixSwimmer {
    fn swim_to_plane(&self, state: &TrackState, z_target: f64) -> Option<PropagatedState> {
        let TrackState {
            position: r0,
            momentum: p0,
            charge,
        } = *state;

        if !r0.is_finite() || !p0.is_finite() || !z_target.is_finite() || p0.z == 0.0 {
            return None;
        }

        let dz = z_target - r0.z;
        // dp_T/dz = (a / pz) * (py, -px)
        let a = f64::from(charge) * C_LIGHT * self.bz;

        if a.abs() < STRAIGHT_LINE_LIMIT {
            let slope = dz / p0.z;
            return Some(PropagatedState {
                position: Vec3::new(r0.x + p0.x * slope, r0.y + p0.y * slope, z_target),
                momentum: p0,
            });
        }

        let (sin, cos) = (a * dz / p0.z).sin_cos();
        let position = Vec3::new(
            r0.x + (p0.x * sin + p0.y * (1.0 - cos)) / a,
            r0.y + (p0.y * sin - p0.x * (1.0 - cos)) / a,
            z_target,
        );
        let momentum = Vec3::new(p0.x * cos + p0.y * sin, p0.y * cos - p0.x * sin, p0.z);

        Some(PropagatedState { position, momentum })
    }
}
