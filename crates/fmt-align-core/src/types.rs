//! Core types for FMT alignment
//!
//! This module defines the fundamental types shared across the crate:
//! - Detector constants
//! - Layer and sector identifiers
//! - Track kinematics before and after propagation

use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of FMT layers
pub const FMT_LAYERS: usize = 3;

/// Number of DC sectors
pub const DC_SECTORS: usize = 6;

/// Detector identifier of the FMT in the trajectory bank
pub const FMT_DETECTOR_ID: i8 = 8;

/// One of the FMT layers, ordered from upstream to downstream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Layer {
    /// Most upstream layer
    First,
    /// Middle layer
    Second,
    /// Most downstream layer
    Third,
}

impl Layer {
    /// All layers in detector order
    pub const ALL: [Layer; FMT_LAYERS] = [Layer::First, Layer::Second, Layer::Third];

    /// Zero-based layer index
    pub fn index(self) -> usize {
        self as usize
    }

    /// Layer for a zero-based index
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Layer for the one-based number stored in event banks
    pub fn from_bank(layer: i8) -> Option<Self> {
        if layer < 1 {
            return None;
        }
        Self::from_index(layer as usize - 1)
    }
}

impl fmt::Display for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "L{}", self.index() + 1)
    }
}

/// DC sector a track went through
///
/// `Unknown` is a separate state rather than a magic index, so it cannot be
/// used to index per-sector data by accident.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DcSector {
    /// No matching track row was found
    #[default]
    Unknown,
    /// Zero-based sector index
    Known(u8),
}

impl DcSector {
    /// Sector for the one-based number stored in event banks
    pub fn from_bank(sector: i8) -> Self {
        if (1..=DC_SECTORS as i8).contains(&sector) {
            Self::Known((sector - 1) as u8)
        } else {
            Self::Unknown
        }
    }

    /// Zero-based sector index, when known
    pub fn index(self) -> Option<usize> {
        match self {
            Self::Known(i) => Some(i as usize),
            Self::Unknown => None,
        }
    }

    /// Whether a track row matched
    pub fn is_known(self) -> bool {
        matches!(self, Self::Known(_))
    }
}

impl fmt::Display for DcSector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Known(i) => write!(f, "S{}", i + 1),
            Self::Unknown => write!(f, "S?"),
        }
    }
}

/// Three-component vector
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec3 {
    /// x component
    pub x: f64,
    /// y component
    pub y: f64,
    /// z component
    pub z: f64,
}

impl Vec3 {
    /// Vector from its components
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Euclidean norm
    pub fn magnitude(&self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    /// Norm of the (x, y) projection
    pub fn transverse(&self) -> f64 {
        self.x.hypot(self.y)
    }

    /// No NaN or infinite component
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

/// Kinematics of a reconstructed particle at its vertex
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrackState {
    /// Vertex position (cm)
    pub position: Vec3,
    /// Momentum (GeV/c)
    pub momentum: Vec3,
    /// Charge in units of e
    pub charge: i32,
}

impl TrackState {
    /// State at a vertex
    pub fn new(position: Vec3, momentum: Vec3, charge: i32) -> Self {
        Self {
            position,
            momentum,
            charge,
        }
    }
}

/// Track state after being swum to a plane
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PropagatedState {
    /// Position at the plane (cm)
    pub position: Vec3,
    /// Momentum at the plane (GeV/c)
    pub momentum: Vec3,
}

impl PropagatedState {
    /// Cosine of the polar angle, `pz / |p|`. `None` for a null momentum.
    pub fn cos_theta(&self) -> Option<f64> {
        let p = self.momentum.magnitude();
        if p > 0.0 && p.is_finite() {
            Some(self.momentum.z / p)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layer_from_bank_is_one_based() {
        assert_eq!(Layer::from_bank(1), Some(Layer::First));
        assert_eq!(Layer::from_bank(3), Some(Layer::Third));
        assert_eq!(Layer::from_bank(0), None);
        assert_eq!(Layer::from_bank(4), None);
        assert_eq!(Layer::from_bank(-2), None);
    }

    #[test]
    fn test_sector_unknown_has_no_index() {
        assert_eq!(DcSector::from_bank(3), DcSector::Known(2));
        assert_eq!(DcSector::from_bank(0).index(), None);
        assert_eq!(DcSector::from_bank(7), DcSector::Unknown);
        assert!(!DcSector::default().is_known());
    }

    #[test]
    fn test_cos_theta() {
        let state = PropagatedState {
            position: Vec3::default(),
            momentum: Vec3::new(0.0, 3.0, 4.0),
        };
        assert!((state.cos_theta().unwrap() - 0.8).abs() < 1e-12);

        let null = PropagatedState {
            position: Vec3::default(),
            momentum: Vec3::default(),
        };
        assert_eq!(null.cos_theta(), None);
    }
}
