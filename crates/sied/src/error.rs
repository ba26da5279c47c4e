//! Error types for front detection.

use bin_grid::GridError;
use thiserror::Error;

/// Errors surfaced to callers of the detector.
///
/// Per-window and per-contour problems (degenerate histograms, windows
/// crossing the grid edge) are resolved inside the scan and never show up
/// here.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SiedError {
    /// Grid shape is inconsistent or a grid access went out of range.
    #[error(transparent)]
    Grid(#[from] GridError),

    /// Intensity array does not cover the grid.
    #[error("intensity array has {actual} values but the grid has {expected} bins")]
    InputLength { expected: usize, actual: usize },

    /// Intensity value outside 0..=255 that is not the fill value.
    #[error("bin {bin} has intensity {value}, expected 0..=255 or the fill value")]
    InvalidIntensity { bin: usize, value: i32 },

    /// Configuration error.
    #[error("configuration error: {0}")]
    InvalidConfig(String),
}

impl SiedError {
    /// Create an InvalidConfig error.
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// Fail with InputLength unless a per-bin array has `expected` values.
    pub(crate) fn check_length(expected: usize, actual: usize) -> Result<()> {
        if expected == actual {
            Ok(())
        } else {
            Err(Self::InputLength { expected, actual })
        }
    }
}

impl From<serde_json::Error> for SiedError {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidConfig(err.to_string())
    }
}

/// Result type for detector operations.
pub type Result<T> = std::result::Result<T, SiedError>;
