//! Error types for bin grid access.

use thiserror::Error;

/// Result type alias using GridError.
pub type GridResult<T> = Result<T, GridError>;

/// Errors raised while building or indexing a bin grid.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GridError {
    /// Row counts and base bins do not describe a consistent grid.
    #[error("invalid grid shape: {0}")]
    InvalidGridShape(String),

    /// A row, bin or window lies outside the grid.
    #[error("requested {requested} is outside grid bounds {grid}")]
    OutOfBounds { requested: String, grid: String },
}

impl GridError {
    /// Create an InvalidGridShape error.
    pub fn invalid_shape(msg: impl Into<String>) -> Self {
        Self::InvalidGridShape(msg.into())
    }

    /// Create an OutOfBounds error.
    pub fn out_of_bounds(requested: impl Into<String>, grid: impl Into<String>) -> Self {
        Self::OutOfBounds {
            requested: requested.into(),
            grid: grid.into(),
        }
    }

    /// True for the bounds variant, which callers inside a scan usually
    /// treat as "not enough context here" rather than a failure.
    pub fn is_out_of_bounds(&self) -> bool {
        matches!(self, Self::OutOfBounds { .. })
    }
}
