//! Error types for FMT alignment
//!
//! This module defines all error types used by the extraction core.
//! We use `thiserror` for ergonomic error definitions with automatic Display/Error implementations.
//!
//! Only structural failures surface here. A missing bank is not an error
//! (the extractor returns `Ok(None)`), and row-level rejections (cuts, failed
//! propagation, unresolved sector) never leave the row they happened on.

use thiserror::Error;

/// Result type alias for alignment operations
pub type Result<T> = std::result::Result<T, AlignError>;

/// Main error type for alignment operations
#[derive(Error, Debug)]
pub enum AlignError {
    /// The minimum fill threshold is outside `[1, layer_count]`
    #[error("minimum filled layers must be in [1, {layer_count}], got {min_filled}")]
    InvalidMinFilled {
        /// Requested threshold
        min_filled: usize,
        /// Number of layers the extractor runs over
        layer_count: usize,
    },

    /// The layer count is outside `[1, max]`
    #[error("layer count must be in [1, {max}], got {layer_count}")]
    InvalidLayerCount {
        /// Requested layer count
        layer_count: usize,
        /// Number of FMT layers
        max: usize,
    },

    /// Event bank errors
    #[error("Bank error: {0}")]
    Bank(#[from] BankError),

    /// Geometry and calibration errors
    #[error("Geometry error: {0}")]
    Geometry(#[from] GeometryError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Event file decoding errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error with context
    #[error("{context}: {source}")]
    WithContext {
        /// What was being done
        context: String,
        /// Underlying failure
        source: Box<AlignError>,
    },
}

/// Errors raised while reading a row table
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BankError {
    /// The bank has no column of that name
    #[error("column '{column}' not found in bank {bank}")]
    MissingColumn {
        /// Bank name
        bank: String,
        /// Requested column
        column: String,
    },

    /// The column exists with another element type
    #[error("column '{column}' in bank {bank} is {actual}, expected {expected}")]
    ColumnType {
        /// Bank name
        bank: String,
        /// Requested column
        column: String,
        /// Type the caller asked for
        expected: &'static str,
        /// Type stored in the bank
        actual: &'static str,
    },

    /// Row index past the end of the bank
    #[error("row {row} out of range for bank {bank} with {rows} rows")]
    RowOutOfRange {
        /// Bank name
        bank: String,
        /// Requested row
        row: usize,
        /// Rows in the bank
        rows: usize,
    },

    /// Columns of one bank disagree on the row count
    #[error("bank {bank} has ragged columns: '{column}' has {len} rows, expected {rows}")]
    RaggedColumns {
        /// Bank name
        bank: String,
        /// First column with a different length
        column: String,
        /// Length of that column
        len: usize,
        /// Length of the other columns
        rows: usize,
    },

    /// A trajectory row refers to a negative particle index
    #[error("negative particle index {pindex} in bank {bank}")]
    NegativeIndex {
        /// Bank the index points into
        bank: String,
        /// Offending index
        pindex: i16,
    },
}

/// Errors related to detector geometry
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeometryError {
    /// No calibration table under that variation name
    #[error("calibration variation not found: {0}")]
    UnknownVariation(String),

    /// A per-layer list has the wrong length
    #[error("expected {expected} values for '{field}', got {actual}")]
    LayerCount {
        /// Name of the list
        field: String,
        /// Number of layers
        expected: usize,
        /// Length found
        actual: usize,
    },

    /// A shift matrix with the wrong number of rows
    #[error("shift matrix must have {expected} rows, got {actual}")]
    ShiftRows {
        /// Global row plus one per layer
        expected: usize,
        /// Rows given
        actual: usize,
    },

    /// NaN or infinite value in the named quantity
    #[error("non-finite value in '{0}'")]
    NonFinite(String),
}

/// Errors related to configuration values
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// Negative or non-finite scan range
    #[error("scan range must be >= 0, got {0}")]
    InvalidRange(f64),

    /// Non-positive or non-finite scan step
    #[error("scan step must be > 0, got {0}")]
    InvalidStep(f64),

    /// Scan with more steps than can be run
    #[error("scan range {range} with step {step} needs more than {max} steps per side")]
    TooManySteps {
        /// Requested range
        range: f64,
        /// Requested step
        step: f64,
        /// Largest accepted number of steps per side
        max: usize,
    },

    /// Not one of dXY, dZ, rXY, rZ
    #[error("unknown alignment variable: {0}")]
    UnknownVariable(String),

    /// Cut thresholds that accept nothing or are out of range
    #[error("invalid cut configuration: {0}")]
    InvalidCuts(String),

    /// TOML that does not parse into the expected table
    #[error("malformed TOML: {0}")]
    Toml(String),
}

impl From<toml::de::Error> for AlignError {
    fn from(e: toml::de::Error) -> Self {
        AlignError::Config(ConfigError::Toml(e.to_string()))
    }
}

impl AlignError {
    /// Add context to an error
    pub fn context(self, context: impl Into<String>) -> Self {
        Self::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }
}

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    /// Add context to a Result
    fn context(self, context: impl Into<String>) -> Result<T>;

    /// Add lazy context to a Result
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.context(context))
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| e.context(f()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_context() {
        let err = AlignError::from(GeometryError::UnknownVariation("default".into()));
        let err = err.context("Failed to load FMT geometry");

        assert!(err.to_string().contains("Failed to load FMT geometry"));
        assert!(err.to_string().contains("default"));
    }

    #[test]
    fn test_result_ext() {
        let result: Result<()> = Err(BankError::MissingColumn {
            bank: "REC::Traj".into(),
            column: "layer".into(),
        }
        .into());
        let result = result.with_context(|| "reading event 12".to_string());

        let message = result.unwrap_err().to_string();
        assert!(message.starts_with("reading event 12"));
        assert!(message.contains("'layer'"));
    }

    #[test]
    fn test_toml_error_maps_to_config() {
        let err: AlignError = toml::from_str::<toml::Value>("= broken").unwrap_err().into();
        assert!(matches!(err, AlignError::Config(ConfigError::Toml(_))));
    }
}
