//! Shape and indexing primitives for the integerized sinusoidal bin grid.
//!
//! Satellite products binned on an equal-area sinusoidal grid store one value
//! per bin in a flat array. Rows are latitude bands whose bin count shrinks
//! towards the poles, so "the bin above" has to be found through the ratio of
//! a bin's position in its row rather than a fixed stride.

pub mod error;
pub mod grid;
pub mod window;

pub use error::{GridError, GridResult};
pub use grid::BinGrid;
pub use window::Window;
