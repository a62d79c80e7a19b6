//! Calibration store for the FMT layer table
//!
//! The store is a TOML file holding one table per calibration variation.
//! Values follow the calibration database conventions: positions in
//! millimetres and angles in degrees.
//!
//! ```toml
//! [variations.rgf_spring2020]
//! z = [260.0, 272.0, 284.0]
//! angle = [-90.0, -30.0, 30.0]
//! ```

use super::ReferencePlaneSet;
use crate::error::{AlignError, GeometryError, Result, ResultExt};
use crate::types::FMT_LAYERS;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Variation used when none is requested
pub const DEFAULT_VARIATION: &str = "rgf_spring2020";

/// Calibration lengths are in mm, the rest of the crate works in cm
const MM_TO_CM: f64 = 0.1;

/// Source of nominal layer geometry
pub trait GeometryProvider {
    /// Reference planes for a calibration variation, in centimetres
    fn reference_planes(&self, variation: &str) -> Result<ReferencePlaneSet>;
}

/// Raw per-layer values of one variation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerTable {
    /// Layer z positions (mm)
    pub z: Vec<f64>,
    /// Strip angles (deg)
    pub angle: Vec<f64>,
}

impl LayerTable {
    fn to_planes(&self) -> Result<ReferencePlaneSet> {
        let z = layer_array("z", &self.z)?;
        let angle = layer_array("angle", &self.angle)?;
        ReferencePlaneSet::new(z.map(|mm| mm * MM_TO_CM), angle)
    }
}

fn layer_array(field: &str, values: &[f64]) -> Result<[f64; FMT_LAYERS]> {
    values.try_into().map_err(|_| {
        GeometryError::LayerCount {
            field: field.to_string(),
            expected: FMT_LAYERS,
            actual: values.len(),
        }
        .into()
    })
}

/// Calibration tables keyed by variation name
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CalibrationStore {
    #[serde(default)]
    variations: BTreeMap<String, LayerTable>,
}

impl CalibrationStore {
    /// An empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a variation, replacing any previous table with that name
    pub fn with_variation(mut self, name: impl Into<String>, table: LayerTable) -> Self {
        self.variations.insert(name.into(), table);
        self
    }

    /// Parse a store from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Load a store from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(AlignError::from)
            .with_context(|| format!("reading calibration store {}", path.display()))?;
        let store = Self::from_toml_str(&content)
            .with_context(|| format!("parsing calibration store {}", path.display()))?;
        tracing::debug!(
            "Loaded {} calibration variation(s) from {}",
            store.variations.len(),
            path.display()
        );
        Ok(store)
    }

    /// Names of the available variations
    pub fn variations(&self) -> impl Iterator<Item = &str> {
        self.variations.keys().map(String::as_str)
    }
}

impl GeometryProvider for CalibrationStore {
    fn reference_planes(&self, variation: &str) -> Result<ReferencePlaneSet> {
        let table = self
            .variations
            .get(variation)
            .ok_or_else(|| GeometryError::UnknownVariation(variation.to_string()))?;
        table
            .to_planes()
            .with_context(|| format!("variation {variation}"))
    }
}
