//! FMT geometry
//!
//! The extractor needs three things from the detector description:
//!
//! - the nominal z of each layer's reference plane ([`ReferencePlaneSet`])
//! - the strip angle of each layer, to move swum points into the layer frame
//! - the alignment offsets under test ([`ShiftMatrix`])
//!
//! Nominal values come from a [`GeometryProvider`], usually a
//! [`CalibrationStore`] read from disk.

pub mod calibration;
pub mod shift;

pub use calibration::{CalibrationStore, GeometryProvider, LayerTable, DEFAULT_VARIATION};
pub use shift::{ShiftColumn, ShiftMatrix};

use crate::error::{GeometryError, Result};
use crate::types::{Layer, FMT_LAYERS};
use serde::{Deserialize, Serialize};

/// Nominal reference plane of every FMT layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferencePlaneSet {
    /// z position of each layer (cm)
    z: [f64; FMT_LAYERS],
    /// Strip angle of each layer (deg)
    angle: [f64; FMT_LAYERS],
}

impl ReferencePlaneSet {
    /// Build a plane set from centimetre positions and degree angles
    pub fn new(z: [f64; FMT_LAYERS], angle: [f64; FMT_LAYERS]) -> Result<Self> {
        if z.iter().any(|v| !v.is_finite()) {
            return Err(GeometryError::NonFinite("z".into()).into());
        }
        if angle.iter().any(|v| !v.is_finite()) {
            return Err(GeometryError::NonFinite("angle".into()).into());
        }
        Ok(Self { z, angle })
    }

    /// Nominal z of a layer (cm)
    pub fn z(&self, layer: Layer) -> f64 {
        self.z[layer.index()]
    }

    /// Strip angle of a layer (deg)
    pub fn angle(&self, layer: Layer) -> f64 {
        self.angle[layer.index()]
    }

    /// z of the plane a track is swum to, nominal position plus the global
    /// and per-layer z shifts
    pub fn shifted_z(&self, layer: Layer, shifts: &ShiftMatrix) -> f64 {
        self.z(layer) + shifts.z_offset(layer)
    }
}

/// Rotate a global (x, y) into a layer frame whose strips sit at
/// `angle_deg`.
///
/// ```
/// use fmt_align_core::geometry::rotate_to_local;
///
/// let (x, y) = rotate_to_local(1.0, 0.0, 90.0);
/// assert!(x.abs() < 1e-12);
/// assert!((y + 1.0).abs() < 1e-12);
/// ```
pub fn rotate_to_local(x: f64, y: f64, angle_deg: f64) -> (f64, f64) {
    let (sin, cos) = angle_deg.to_radians().sin_cos();
    (x * cos + y * sin, y * cos - x * sin)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn planes() -> ReferencePlaneSet {
        ReferencePlaneSet::new([26.0, 27.2, 28.4], [-90.0, -30.0, 30.0]).unwrap()
    }

    #[test]
    fn test_plane_lookup() {
        let p = planes();
        assert_eq!(p.z(Layer::Second), 27.2);
        assert_eq!(p.angle(Layer::Third), 30.0);
    }

    #[test]
    fn test_shifted_z_adds_global_and_layer_rows() {
        let mut shifts = ShiftMatrix::zeros();
        shifts.set_global(ShiftColumn::Z, -3.65);
        shifts.set(Layer::Second, ShiftColumn::Z, 0.2);

        let p = planes();
        assert!((p.shifted_z(Layer::First, &shifts) - (26.0 - 3.65)).abs() < 1e-12);
        assert!((p.shifted_z(Layer::Second, &shifts) - (27.2 - 3.65 + 0.2)).abs() < 1e-12);
    }

    #[test]
    fn test_rejects_non_finite() {
        assert!(ReferencePlaneSet::new([f64::NAN, 0.0, 0.0], [0.0; 3]).is_err());
        assert!(ReferencePlaneSet::new([0.0; 3], [0.0, f64::INFINITY, 0.0]).is_err());
    }

    #[test]
    fn test_zero_angle_is_identity() {
        assert_eq!(rotate_to_local(3.5, -1.25, 0.0), (3.5, -1.25));
    }

    proptest! {
        #[test]
        fn prop_rotation_preserves_norm(
            x in -100.0f64..100.0,
            y in -100.0f64..100.0,
            angle in -360.0f64..360.0,
        ) {
            let (xl, yl) = rotate_to_local(x, y, angle);
            let before = x * x + y * y;
            let after = xl * xl + yl * yl;
            prop_assert!((after - before).abs() <= 1e-9 * before.max(1.0));
        }

        #[test]
        fn prop_rotation_inverts(
            x in -100.0f64..100.0,
            y in -100.0f64..100.0,
            angle in -180.0f64..180.0,
        ) {
            let (xl, yl) = rotate_to_local(x, y, angle);
            let (xb, yb) = rotate_to_local(xl, yl, -angle);
            prop_assert!((xb - x).abs() < 1e-9);
            prop_assert!((yb - y).abs() < 1e-9);
        }
    }
}
