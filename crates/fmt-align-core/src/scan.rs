//! Alignment scan plans
//!
//! An alignment scan re-runs extraction with one alignment variable moved
//! around its nominal value. This module builds the list of tested
//! geometries; comparing the resulting residuals is left to the caller.
//!
//! ```
//! use fmt_align_core::scan::{AlignmentVariable, LayerAlignment, ScanPlan, ScanRange};
//!
//! let plan = ScanPlan::new(AlignmentVariable::DZ, ScanRange::new(0.2, 0.1).unwrap());
//! let nominal = LayerAlignment {
//!     dz: [0.5, 0.5, 0.5],
//!     ..Default::default()
//! };
//!
//! let tested: Vec<f64> = plan
//!     .shifts(&nominal.shift_matrix())
//!     .iter()
//!     .map(|(_, m)| m.get(fmt_align_core::types::Layer::First, fmt_align_core::geometry::ShiftColumn::Z))
//!     .collect();
//! let expected = [0.3, 0.4, 0.5, 0.6, 0.7];
//! assert!(tested.iter().zip(expected).all(|(a, b)| (a - b).abs() < 1e-9));
//! ```

use crate::error::{ConfigError, Result};
use crate::geometry::{ShiftColumn, ShiftMatrix};
use crate::types::{Layer, FMT_LAYERS};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Alignment variable being scanned
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AlignmentVariable {
    /// Shift in the layer plane
    #[serde(rename = "dXY")]
    DXY,
    /// Shift along the beam
    #[serde(rename = "dZ")]
    DZ,
    /// Rotation about the in-plane axes
    #[serde(rename = "rXY")]
    RXY,
    /// Rotation about the beam axis
    #[serde(rename = "rZ")]
    RZ,
}

impl AlignmentVariable {
    /// Every variable
    pub const ALL: [AlignmentVariable; 4] = [Self::DXY, Self::DZ, Self::RXY, Self::RZ];

    /// Command line name
    pub fn name(self) -> &'static str {
        match self {
            Self::DXY => "dXY",
            Self::DZ => "dZ",
            Self::RXY => "rXY",
            Self::RZ => "rZ",
        }
    }

    /// Shift matrix columns moved by this variable. Empty for rXY, which
    /// has no column of its own.
    pub fn columns(self) -> &'static [ShiftColumn] {
        match self {
            Self::DXY => &[ShiftColumn::X, ShiftColumn::Y],
            Self::DZ => &[ShiftColumn::Z],
            Self::RXY => &[],
            Self::RZ => &[ShiftColumn::Phi],
        }
    }

    /// Whether moving this variable changes extracted points
    pub fn affects_extraction(self) -> bool {
        self.columns().contains(&ShiftColumn::Z)
    }
}

impl FromStr for AlignmentVariable {
    type Err = ConfigError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|v| v.name() == s)
            .ok_or_else(|| ConfigError::UnknownVariable(s.to_string()))
    }
}

impl fmt::Display for AlignmentVariable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Largest number of steps on each side of the nominal value
pub const MAX_SCAN_STEPS: usize = 10_000;

/// Tested interval around the nominal value
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScanRange {
    range: f64,
    step: f64,
}

impl ScanRange {
    /// Range must be finite and non-negative, step finite and positive, and
    /// the range may span at most [`MAX_SCAN_STEPS`] steps per side
    pub fn new(range: f64, step: f64) -> Result<Self> {
        if !(range >= 0.0) || !range.is_finite() {
            return Err(ConfigError::InvalidRange(range).into());
        }
        if !(step > 0.0) || !step.is_finite() {
            return Err(ConfigError::InvalidStep(step).into());
        }
        if range / step > MAX_SCAN_STEPS as f64 {
            return Err(ConfigError::TooManySteps {
                range,
                step,
                max: MAX_SCAN_STEPS,
            }
            .into());
        }
        Ok(Self { range, step })
    }

    /// Largest tested distance from the nominal value
    pub fn range(&self) -> f64 {
        self.range
    }

    /// Distance between tested values
    pub fn step(&self) -> f64 {
        self.step
    }

    /// Offsets `k * step` for every `k` with `|k * step| <= range`, in
    /// increasing order
    pub fn offsets(&self) -> Vec<f64> {
        // tolerate 0.2 / 0.1 = 1.9999999999999998
        let n = (self.range / self.step + 1e-9).floor() as i64;
        (-n..=n).map(|k| k as f64 * self.step).collect()
    }
}

/// Nominal per-layer alignment, from the command line
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LayerAlignment {
    /// x shift per layer (cm)
    pub dx: [f64; FMT_LAYERS],
    /// y shift per layer (cm)
    pub dy: [f64; FMT_LAYERS],
    /// z shift per layer (cm)
    pub dz: [f64; FMT_LAYERS],
    /// Rotation about x per layer (deg)
    pub rx: [f64; FMT_LAYERS],
    /// Rotation about y per layer (deg)
    pub ry: [f64; FMT_LAYERS],
    /// Rotation about z per layer (deg)
    pub rz: [f64; FMT_LAYERS],
}

impl LayerAlignment {
    /// Shift matrix of this alignment with no global shift. rx and ry have
    /// no column and are not carried over.
    pub fn shift_matrix(&self) -> ShiftMatrix {
        let mut matrix = ShiftMatrix::zeros();
        for layer in Layer::ALL {
            let i = layer.index();
            matrix.set(layer, ShiftColumn::Z, self.dz[i]);
            matrix.set(layer, ShiftColumn::X, self.dx[i]);
            matrix.set(layer, ShiftColumn::Y, self.dy[i]);
            matrix.set(layer, ShiftColumn::Phi, self.rz[i]);
        }
        matrix
    }
}

/// One variable scanned over a range
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScanPlan {
    /// Variable moved by the scan
    pub variable: AlignmentVariable,
    /// Offsets applied to it
    pub range: ScanRange,
}

impl ScanPlan {
    /// Scan `variable` over `range`
    pub fn new(variable: AlignmentVariable, range: ScanRange) -> Self {
        Self { variable, range }
    }

    /// Every tested geometry with its offset from `nominal`
    pub fn shifts(&self, nominal: &ShiftMatrix) -> Vec<(f64, ShiftMatrix)> {
        self.range
            .offsets()
            .into_iter()
            .map(|offset| {
                let mut matrix = nominal.clone();
                for &column in self.variable.columns() {
                    matrix.offset_layers(column, offset);
                }
                (offset, matrix)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_variable_names() {
        for variable in AlignmentVariable::ALL {
            assert_eq!(variable.name().parse::<AlignmentVariable>(), Ok(variable));
        }
        assert!("dx".parse::<AlignmentVariable>().is_err());
        assert!("DZ".parse::<AlignmentVariable>().is_err());
    }

    #[test]
    fn test_offsets_are_inclusive() {
        let offsets = ScanRange::new(0.2, 0.1).unwrap().offsets();
        assert_eq!(offsets.len(), 5);
        assert!((offsets[0] + 0.2).abs() < 1e-12);
        assert_eq!(offsets[2], 0.0);
        assert!((offsets[4] - 0.2).abs() < 1e-12);
    }

    #[test]
    fn test_offsets_stop_inside_range() {
        let offsets = ScanRange::new(0.25, 0.1).unwrap().offsets();
        assert_eq!(offsets.len(), 5);
        assert_eq!(ScanRange::new(0.0, 0.1).unwrap().offsets(), vec![0.0]);
    }

    #[test]
    fn test_invalid_ranges() {
        assert!(ScanRange::new(-0.1, 0.1).is_err());
        assert!(ScanRange::new(0.1, 0.0).is_err());
        assert!(ScanRange::new(0.1, -1.0).is_err());
        assert!(ScanRange::new(f64::NAN, 0.1).is_err());
    }

    #[test]
    fn test_step_count_is_bounded() {
        assert!(matches!(
            ScanRange::new(1.0, 1e-300),
            Err(crate::error::AlignError::Config(ConfigError::TooManySteps { .. }))
        ));
        assert!(ScanRange::new(1.0, 1e-6).is_err());

        let widest = ScanRange::new(MAX_SCAN_STEPS as f64, 1.0).unwrap();
        assert_eq!(widest.offsets().len(), 2 * MAX_SCAN_STEPS + 1);
    }

    #[test]
    fn test_shift_matrix_columns() {
        let alignment = LayerAlignment {
            dx: [0.1, 0.2, 0.3],
            dz: [1.0, 2.0, 3.0],
            rz: [0.0, 0.0, 45.0],
            rx: [9.0, 9.0, 9.0],
            ..Default::default()
        };
        let m = alignment.shift_matrix();
        assert_eq!(m.get(Layer::Second, ShiftColumn::Z), 2.0);
        assert_eq!(m.get(Layer::Third, ShiftColumn::X), 0.3);
        assert_eq!(m.get(Layer::Third, ShiftColumn::Phi), 45.0);
        assert_eq!(m.global(ShiftColumn::Z), 0.0);
    }

    #[test]
    fn test_dxy_scan_moves_x_and_y_only() {
        let plan = ScanPlan::new(AlignmentVariable::DXY, ScanRange::new(0.1, 0.1).unwrap());
        let shifts = plan.shifts(&ShiftMatrix::zeros());

        assert_eq!(shifts.len(), 3);
        let (offset, m) = &shifts[2];
        assert!((offset - 0.1).abs() < 1e-12);
        assert!((m.get(Layer::First, ShiftColumn::Y) - 0.1).abs() < 1e-12);
        assert_eq!(m.get(Layer::First, ShiftColumn::Z), 0.0);
        assert!(!AlignmentVariable::DXY.affects_extraction());
        assert!(AlignmentVariable::DZ.affects_extraction());
    }

    #[test]
    fn test_rxy_scan_keeps_matrix() {
        let plan = ScanPlan::new(AlignmentVariable::RXY, ScanRange::new(0.2, 0.1).unwrap());
        let nominal = ShiftMatrix::zeros();
        assert!(plan.shifts(&nominal).iter().all(|(_, m)| *m == nominal));
    }
}
