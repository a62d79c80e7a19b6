//! FMT Align Core - trajectory point extraction for forward tracker alignment
//!
//! This crate turns reconstructed events into the points where tracks cross
//! the layers of the forward micromegas tracker (FMT), expressed in each
//! layer's local frame. Those points are what an alignment scan compares
//! against the measured clusters.
//!
//! # Architecture
//!
//! The extractor is the only part with real logic; everything it talks to
//! sits behind a trait so it can be swapped or stubbed:
//!
//! 1. **Event banks** (`bank`): typed row tables read by name ✅
//! 2. **Geometry** (`geometry`): nominal planes, strip angles, alignment shifts ✅
//! 3. **Propagation** (`swim`): track state to a z plane ✅
//! 4. **Cuts** (`cuts`): vertex and swum-point acceptance ✅
//! 5. **Extraction** (`trajectory`): grouping, pruning, local frame ✅
//! 6. **Scan plans** (`scan`): geometries tested by an alignment scan ✅
//!
//! ```text
//! REC::Traj ──┐
//! REC::Particle ──> TrajectoryExtractor ──> Vec<TrioGroup>
//! REC::Track ─┘        │      │      │
//!               ReferencePlaneSet  TrackPropagator  CutEngine
//! ```
//!
//! # Quick Start
//!
//! ```
//! use fmt_align_core::prelude::*;
//!
//! let store = CalibrationStore::from_toml_str(r#"
//!     [variations.rgf_spring2020]
//!     z = [260.0, 272.0, 284.0]
//!     angle = [-90.0, -30.0, 30.0]
//! "#).unwrap();
//! let planes = store.reference_planes(DEFAULT_VARIATION).unwrap();
//!
//! let swimmer = HelixSwimmer::new(SwimConfig::default());
//! let cuts = FiducialCuts::default();
//! let shifts = ShiftMatrix::zeros();
//! let extractor = TrajectoryExtractor::new(
//!     &swimmer, &cuts, &planes, &shifts, ExtractorConfig::new(3),
//! );
//!
//! // An event without the trajectory banks yields nothing to extract
//! assert!(extractor.extract(&MemoryEvent::new()).unwrap().is_none());
//! ```

#![deny(unsafe_code)]
#![warn(
    missing_docs,
    rust_2018_idioms,
    missing_debug_implementations,
    clippy::all
)]

pub mod bank;
pub mod cuts;
pub mod error;
pub mod geometry;
pub mod scan;
pub mod swim;
pub mod trajectory;
pub mod types;

// Re-export commonly used types for convenience
pub use bank::{DataEvent, MemoryBank, MemoryEvent, RowTable};
pub use cuts::{CutDecision, CutEngine, FiducialCuts};
pub use error::{AlignError, Result};
pub use geometry::{ReferencePlaneSet, ShiftMatrix};
pub use swim::{HelixSwimmer, SwimConfig, TrackPropagator};
pub use trajectory::{
    Extraction, ExtractionSummary, ExtractorConfig, TrajectoryExtractor, TrajectoryPoint,
    TrioGroup,
};
pub use types::{DcSector, Layer, FMT_LAYERS};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::bank::{DataEvent, EventFileReader, MemoryBank, MemoryEvent, RowTable};
    pub use crate::cuts::{CutDecision, CutEngine, FiducialCutConfig, FiducialCuts};
    pub use crate::error::{AlignError, Result};
    pub use crate::geometry::{
        CalibrationStore, GeometryProvider, ReferencePlaneSet, ShiftColumn, ShiftMatrix,
        DEFAULT_VARIATION,
    };
    pub use crate::scan::{AlignmentVariable, LayerAlignment, ScanPlan, ScanRange};
    pub use crate::swim::{HelixSwimmer, SwimConfig, TrackPropagator};
    pub use crate::trajectory::{
        Extraction, ExtractionSummary, ExtractorConfig, GroupingStrategy, TrajectoryExtractor,
        TrajectoryPoint, TrioGroup,
    };
    pub use crate::types::{DcSector, Layer};
}
