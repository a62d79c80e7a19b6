//! Event banks
//!
//! Reconstructed events are read as named banks: tables with one typed
//! column per variable and one row per entry. The extractor only needs
//! three of them, and only reads them through [`RowTable`] and
//! [`DataEvent`], so any storage backend can be plugged in.
//!
//! [`MemoryEvent`] is the in-memory backend used by the command line tool
//! and by tests; [`EventFileReader`] streams them from a JSON-lines file.

pub mod memory;
pub mod reader;

pub use memory::{Column, MemoryBank, MemoryEvent};
pub use reader::{has_event_extension, EventFileReader, EVENT_FILE_EXTENSION};

use crate::error::Result;

/// Trajectory bank: one row per detector crossing of a particle
pub const TRAJ_BANK: &str = "REC::Traj";

/// Particle bank: vertex kinematics, indexed by `pindex`
pub const PARTICLE_BANK: &str = "REC::Particle";

/// Track bank: forward tracks with their DC sector
pub const TRACK_BANK: &str = "REC::Track";

/// Column names read by the extractor
pub mod columns {
    /// Detector identifier of a trajectory row
    pub const DETECTOR: &str = "detector";
    /// One-based layer of a trajectory row
    pub const LAYER: &str = "layer";
    /// Particle bank row a trajectory or track row refers to
    pub const PINDEX: &str = "pindex";
    /// One-based DC sector of a track
    pub const SECTOR: &str = "sector";
    /// Vertex x (cm)
    pub const VX: &str = "vx";
    /// Vertex y (cm)
    pub const VY: &str = "vy";
    /// Vertex z (cm)
    pub const VZ: &str = "vz";
    /// Momentum x (GeV/c)
    pub const PX: &str = "px";
    /// Momentum y (GeV/c)
    pub const PY: &str = "py";
    /// Momentum z (GeV/c)
    pub const PZ: &str = "pz";
    /// Charge in units of e
    pub const CHARGE: &str = "charge";
}

/// A table of typed columns
pub trait RowTable {
    /// Number of rows
    fn rows(&self) -> usize;

    /// Read a byte column
    fn get_byte(&self, column: &str, row: usize) -> Result<i8>;

    /// Read a short column
    fn get_short(&self, column: &str, row: usize) -> Result<i16>;

    /// Read a float column
    fn get_float(&self, column: &str, row: usize) -> Result<f32>;
}

/// One event, giving access to its banks by name
pub trait DataEvent {
    /// Bank type stored in the event
    type Bank: RowTable;

    /// The bank with this name, or `None` if the event does not carry it
    fn bank(&self, name: &str) -> Option<&Self::Bank>;
}
