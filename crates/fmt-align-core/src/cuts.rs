//! Fiducial cuts on trajectory candidates
//!
//! Two classes of cuts are applied by the extractor:
//!
//! 1. the downstream check, on the vertex before any propagation
//! 2. the trajectory cuts, on the point swum to the layer plane
//!
//! [`FiducialCuts`] keeps atomic per-cut counters so one instance can be
//! shared by several workers and reported on at the end of a run.

use crate::error::{AlignError, ConfigError, Result, ResultExt};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};

/// Outcome of a cut
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CutDecision {
    /// Keep the candidate
    Accept,
    /// Drop the candidate
    Reject,
}

impl CutDecision {
    /// Whether the candidate is kept
    pub fn is_accepted(self) -> bool {
        self == CutDecision::Accept
    }

    /// Whether the candidate is dropped
    pub fn is_rejected(self) -> bool {
        self == CutDecision::Reject
    }
}

/// Acceptance tests applied while extracting trajectory points
pub trait CutEngine {
    /// Check a vertex z against the reference plane it will be swum to
    fn downstream_track_check(&self, z: f64, z_ref: f64) -> CutDecision;

    /// Check a point swum to the reference plane
    fn check_traj_cuts(&self, z: f64, x: f64, y: f64, z_ref: f64, cos_theta: f64) -> CutDecision;
}

/// Thresholds for [`FiducialCuts`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FiducialCutConfig {
    /// Largest allowed distance between the swum z and the plane (cm)
    pub z_tolerance: f64,
    /// Inner radius of the active area (cm)
    pub inner_radius: f64,
    /// Outer radius of the active area (cm)
    pub outer_radius: f64,
    /// Smallest accepted cos(theta) at the plane
    pub min_cos_theta: f64,
}

impl Default for FiducialCutConfig {
    fn default() -> Self {
        Self {
            z_tolerance: 0.05,
            inner_radius: 2.5,
            outer_radius: 18.5,
            min_cos_theta: 0.8,
        }
    }
}

impl FiducialCutConfig {
    /// Check that the thresholds describe a non-empty acceptance
    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: String| Err(AlignError::from(ConfigError::InvalidCuts(msg)));
        if !(self.z_tolerance >= 0.0) {
            return invalid(format!("z_tolerance must be >= 0, got {}", self.z_tolerance));
        }
        if !(self.inner_radius >= 0.0 && self.inner_radius < self.outer_radius) {
            return invalid(format!(
                "need 0 <= inner_radius < outer_radius, got {} and {}",
                self.inner_radius, self.outer_radius
            ));
        }
        if !(-1.0..=1.0).contains(&self.min_cos_theta) {
            return invalid(format!(
                "min_cos_theta must be in [-1, 1], got {}",
                self.min_cos_theta
            ));
        }
        Ok(())
    }

    /// Parse and validate thresholds from TOML text; missing keys keep defaults
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Read thresholds from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(AlignError::from)
            .with_context(|| format!("reading cut configuration {}", path.display()))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("parsing cut configuration {}", path.display()))
    }
}

/// Per-cut counters
#[derive(Debug, Default)]
struct CutCounters {
    downstream: AtomicU64,
    off_plane: AtomicU64,
    outside_annulus: AtomicU64,
    too_wide: AtomicU64,
    passed: AtomicU64,
}

/// Configurable fiducial cuts for the FMT
#[derive(Debug, Default)]
pub struct FiducialCuts {
    config: FiducialCutConfig,
    counters: CutCounters,
}

impl FiducialCuts {
    /// Cuts with validated thresholds and zeroed counters
    pub fn new(config: FiducialCutConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            counters: CutCounters::default(),
        })
    }

    /// Thresholds in use
    pub fn config(&self) -> &FiducialCutConfig {
        &self.config
    }

    /// Snapshot of the counters
    pub fn report(&self) -> CutReport {
        let load = |c: &AtomicU64| c.load(Ordering::Relaxed);
        CutReport {
            downstream: load(&self.counters.downstream),
            off_plane: load(&self.counters.off_plane),
            outside_annulus: load(&self.counters.outside_annulus),
            too_wide: load(&self.counters.too_wide),
            passed: load(&self.counters.passed),
        }
    }

    fn reject(counter: &AtomicU64) -> CutDecision {
        counter.fetch_add(1, Ordering::Relaxed);
        CutDecision::Reject
    }
}

impl CutEngine for FiducialCuts {
    fn downstream_track_check(&self, z: f64, z_ref: f64) -> CutDecision {
        if z >= z_ref {
            return Self::reject(&self.counters.downstream);
        }
        CutDecision::Accept
    }

    fn check_traj_cuts(&self, z: f64, x: f64, y: f64, z_ref: f64, cos_theta: f64) -> CutDecision {
        let c = &self.config;
        if !((z - z_ref).abs() <= c.z_tolerance) {
            return Self::reject(&self.counters.off_plane);
        }
        let r = x.hypot(y);
        if !(r >= c.inner_radius && r <= c.outer_radius) {
            return Self::reject(&self.counters.outside_annulus);
        }
        if !(cos_theta >= c.min_cos_theta) {
            return Self::reject(&self.counters.too_wide);
        }
        self.counters.passed.fetch_add(1, Ordering::Relaxed);
        CutDecision::Accept
    }
}

/// How much of the cut summary to print
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum CutVerbosity {
    /// Print nothing
    Silent,
    /// One summary line
    #[default]
    Minimal,
    /// Summary line plus one line per cut
    Detailed,
}

impl CutVerbosity {
    /// Level from its command line number (0, 1 or 2)
    pub fn from_level(level: u8) -> Option<Self> {
        match level {
            0 => Some(Self::Silent),
            1 => Some(Self::Minimal),
            2 => Some(Self::Detailed),
            _ => None,
        }
    }
}

/// Counter snapshot of a [`FiducialCuts`] instance
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CutReport {
    /// Vertices at or past the plane
    pub downstream: u64,
    /// Swum points away from the plane
    pub off_plane: u64,
    /// Swum points outside the active area
    pub outside_annulus: u64,
    /// Tracks below the polar angle cosine
    pub too_wide: u64,
    /// Points accepted by every cut
    pub passed: u64,
}

impl CutReport {
    /// Rejections summed over all cuts
    pub fn rejected(&self) -> u64 {
        self.downstream + self.off_plane + self.outside_annulus + self.too_wide
    }

    /// Render the report for `candidates` evaluated trajectory points
    pub fn render(&self, candidates: u64, verbosity: CutVerbosity) -> String {
        if verbosity == CutVerbosity::Silent {
            return String::new();
        }
        let pct = |n: u64| {
            if candidates == 0 {
                0.0
            } else {
                100.0 * n as f64 / candidates as f64
            }
        };
        let mut out = format!(
            "{} trajectory points evaluated, {} passed ({:.2}%), {} rejected\n",
            candidates,
            self.passed,
            pct(self.passed),
            self.rejected()
        );
        if verbosity == CutVerbosity::Detailed {
            for (name, n) in [
                ("downstream vertex", self.downstream),
                ("off plane", self.off_plane),
                ("outside active area", self.outside_annulus),
                ("polar angle", self.too_wide),
            ] {
                out.push_str(&format!("  {name:<20} {n:>10} ({:.2}%)\n", pct(n)));
            }
        }
        out
    }
}

impl fmt::Display for CutReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} passed, {} rejected", self.passed, self.rejected())
    }
}
