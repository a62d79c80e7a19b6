//! Alignment shifts applied on top of the nominal geometry

use crate::error::{GeometryError, Result};
use crate::types::{Layer, FMT_LAYERS};
use serde::{Deserialize, Serialize};

/// Number of rows in a shift matrix: one global row plus one per layer
pub const SHIFT_ROWS: usize = FMT_LAYERS + 1;

/// Number of alignment variables per row
pub const SHIFT_COLUMNS: usize = 4;

/// Alignment variable stored in a shift matrix column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShiftColumn {
    /// z offset (cm), the only column extraction reads
    Z = 0,
    /// x offset (cm)
    X = 1,
    /// y offset (cm)
    Y = 2,
    /// In-plane rotation about z (deg)
    Phi = 3,
}

impl ShiftColumn {
    /// All columns in storage order
    pub const ALL: [ShiftColumn; SHIFT_COLUMNS] =
        [ShiftColumn::Z, ShiftColumn::X, ShiftColumn::Y, ShiftColumn::Phi];

    /// Column index in a row
    pub fn index(self) -> usize {
        self as usize
    }
}

/// Offsets under test, row 0 global and rows 1..=3 per layer
///
/// ```
/// use fmt_align_core::geometry::{ShiftColumn, ShiftMatrix};
/// use fmt_align_core::types::Layer;
///
/// let shifts = ShiftMatrix::from_rows(&[
///     [-3.65, 0.0, 0.0, 0.0],
///     [0.20, 0.0, 0.0, 0.0],
///     [0.00, 0.0, 0.0, 0.0],
///     [0.05, 0.0, 0.0, 0.0],
/// ])
/// .unwrap();
///
/// assert!((shifts.z_offset(Layer::Third) - (-3.60)).abs() < 1e-12);
/// assert_eq!(shifts.get(Layer::First, ShiftColumn::Z), 0.20);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<[f64; SHIFT_COLUMNS]>", into = "Vec<[f64; SHIFT_COLUMNS]>")]
pub struct ShiftMatrix {
    rows: [[f64; SHIFT_COLUMNS]; SHIFT_ROWS],
}

impl Default for ShiftMatrix {
    fn default() -> Self {
        Self::zeros()
    }
}

impl ShiftMatrix {
    /// No shifts at all
    pub fn zeros() -> Self {
        Self {
            rows: [[0.0; SHIFT_COLUMNS]; SHIFT_ROWS],
        }
    }

    /// Build from explicit rows; the row count must be exactly `SHIFT_ROWS`
    pub fn from_rows(rows: &[[f64; SHIFT_COLUMNS]]) -> Result<Self> {
        if rows.len() != SHIFT_ROWS {
            return Err(GeometryError::ShiftRows {
                expected: SHIFT_ROWS,
                actual: rows.len(),
            }
            .into());
        }
        if rows.iter().flatten().any(|v| !v.is_finite()) {
            return Err(GeometryError::NonFinite("shift matrix".into()).into());
        }
        let mut matrix = Self::zeros();
        matrix.rows.copy_from_slice(rows);
        Ok(matrix)
    }

    /// Global offset of a variable
    pub fn global(&self, column: ShiftColumn) -> f64 {
        self.rows[0][column.index()]
    }

    /// Per-layer offset of a variable
    pub fn get(&self, layer: Layer, column: ShiftColumn) -> f64 {
        self.rows[layer.index() + 1][column.index()]
    }

    /// Set the global offset of a variable
    pub fn set_global(&mut self, column: ShiftColumn, value: f64) {
        self.rows[0][column.index()] = value;
    }

    /// Set the offset of a variable on one layer
    pub fn set(&mut self, layer: Layer, column: ShiftColumn, value: f64) {
        self.rows[layer.index() + 1][column.index()] = value;
    }

    /// Add `delta` to a variable on every layer row
    pub fn offset_layers(&mut self, column: ShiftColumn, delta: f64) {
        for row in self.rows.iter_mut().skip(1) {
            row[column.index()] += delta;
        }
    }

    /// Total z shift of a layer's reference plane
    pub fn z_offset(&self, layer: Layer) -> f64 {
        self.global(ShiftColumn::Z) + self.get(layer, ShiftColumn::Z)
    }

    /// Raw rows, global first
    pub fn rows(&self) -> &[[f64; SHIFT_COLUMNS]; SHIFT_ROWS] {
        &self.rows
    }
}

impl TryFrom<Vec<[f64; SHIFT_COLUMNS]>> for ShiftMatrix {
    type Error = crate::error::AlignError;

    fn try_from(rows: Vec<[f64; SHIFT_COLUMNS]>) -> Result<Self> {
        Self::from_rows(&rows)
    }
}

impl From<ShiftMatrix> for Vec<[f64; SHIFT_COLUMNS]> {
    fn from(matrix: ShiftMatrix) -> Self {
        matrix.rows.to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_count_is_enforced() {
        assert!(ShiftMatrix::from_rows(&[[0.0; 4]; 3]).is_err());
        assert!(ShiftMatrix::from_rows(&[[0.0; 4]; 5]).is_err());
        assert!(ShiftMatrix::from_rows(&[[0.0; 4]; 4]).is_ok());
    }

    #[test]
    fn test_offset_layers_leaves_global_row() {
        let mut m = ShiftMatrix::zeros();
        m.set_global(ShiftColumn::Z, 1.0);
        m.offset_layers(ShiftColumn::Z, 0.1);

        assert_eq!(m.global(ShiftColumn::Z), 1.0);
        for layer in Layer::ALL {
            assert!((m.get(layer, ShiftColumn::Z) - 0.1).abs() < 1e-12);
            assert_eq!(m.get(layer, ShiftColumn::X), 0.0);
        }
    }

    #[test]
    fn test_deserialize_checks_rows() {
        let ok: ShiftMatrix =
            serde_json::from_str("[[1,0,0,0],[0,0,0,0],[0,0,0,0],[0,0,0,2]]").unwrap();
        assert_eq!(ok.global(ShiftColumn::Z), 1.0);
        assert_eq!(ok.get(Layer::Third, ShiftColumn::Phi), 2.0);

        let bad = serde_json::from_str::<ShiftMatrix>("[[1,0,0,0]]");
        assert!(bad.is_err());
    }
}
