//! Cayula-Cornillon single-image edge detection (SIED) of ocean fronts.
//!
//! Works directly on per-bin intensities of an equal-area sinusoidal bin
//! grid (see the `bin-grid` crate), without reprojecting to a raster.
//!
//! # Pipeline
//!
//! ```text
//! intensity[] (0..=255 or fill)
//!      │
//!      ▼
//! median_filter ──► filtered[]
//!      │
//!      ├─► coarse 32x32 windows, half-window stride
//!      │         │
//!      │         ├─► analyze_window: Otsu threshold + separability
//!      │         ├─► Cohesion::measure: both bodies spatially coherent
//!      │         └─► locate_edges ──► merged into edge map
//!      │
//!      └─► ContourTracer over edge map + filtered[]
//!               │
//!               ├─► prune_short_contours
//!               ▼
//!          front mask (1 / 0 / fill)
//! ```
//!
//! # Example
//!
//! ```
//! use sied::{detect_fronts, DEFAULT_FILL_VALUE};
//!
//! let bins_in_row = vec![4; 4];
//! let base_bin = vec![0, 4, 8, 12];
//! let intensity = vec![100; 16];
//!
//! let mask = detect_fronts(&intensity, 4, &bins_in_row, &base_bin).unwrap();
//! assert!(mask.iter().all(|&v| v == 0 || v == DEFAULT_FILL_VALUE));
//! ```

pub mod cohesion;
pub mod config;
pub mod contour;
pub mod detector;
pub mod error;
pub mod filter;
pub mod histogram;
pub mod locator;

// Re-export commonly used types at crate root
pub use cohesion::{is_cohesive, Cohesion};
pub use config::{
    CohesionParams, ContourParams, HistogramParams, SiedConfig, DEFAULT_FILL_VALUE,
    DEFAULT_WINDOW_WIDTH,
};
pub use contour::{Contour, ContourPoint, ContourTracer, Direction};
pub use detector::{
    detect_fronts, write_front_mask, DetectionStats, FrontDetection, FrontDetector, FRONT,
    NO_FRONT,
};
pub use error::{Result, SiedError};
pub use filter::{median9, median_filter, median_of_valid};
pub use histogram::{analyze_window, window_threshold, Histogram, HistogramOutcome};
pub use locator::{locate_edges, merge_edges};

pub use bin_grid::{BinGrid, GridError};
