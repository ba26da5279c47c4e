//! Reference fixtures shared by the bin-grid and sied tests.

use bin_grid::BinGrid;

/// Row lengths of a small grid straddling the equator.
pub const TWELVE_ROW_BINS_IN_ROW: [usize; 12] = [6, 7, 8, 9, 10, 11, 11, 10, 9, 8, 7, 6];

/// First bin of each row of the twelve-row grid.
pub const TWELVE_ROW_BASE_BIN: [usize; 12] = [0, 6, 13, 21, 30, 40, 51, 62, 72, 81, 89, 96];

/// Intensities of the twelve-row grid, one per bin.
#[rustfmt::skip]
pub const TWELVE_ROW_DATA: [i32; 102] = [
    148, 66, 169, 185, 255, 241,
    245, 216, 38, 110, 127, 2, 203,
    134, 99, 227, 186, 19, 173, 179, 51,
    141, 48, 221, 232, 72, 50, 166, 187, 11,
    181, 45, 17, 195, 53, 121, 252, 164, 39, 57,
    153, 6, 150, 226, 113, 202, 233, 133, 230, 160, 149,
    155, 211, 171, 31, 97, 8, 49, 123, 78, 95, 157,
    128, 183, 234, 62, 138, 143, 71, 126, 147, 239,
    7, 26, 3, 58, 207, 35, 122, 40, 129,
    115, 1, 42, 83, 75, 244, 188, 214,
    112, 55, 246, 47, 105, 98, 92,
    114, 88, 29, 193, 180, 24,
];

/// The twelve-row grid.
pub fn twelve_row_grid() -> BinGrid {
    BinGrid::new(TWELVE_ROW_BINS_IN_ROW.to_vec(), TWELVE_ROW_BASE_BIN.to_vec())
        .expect("twelve-row fixture is a valid grid")
}

/// 5x5 window with a known gradient coherence of 0.3690171758724715.
#[rustfmt::skip]
pub const GRADIENT_RATIO_WINDOW: [i32; 25] = [
    50, 83, 100, 248, 118,
    110, 67, 95, 168, 149,
    195, 58, 21, 204, 215,
    118, 84, 154, 22, 211,
    113, 64, 126, 97, 235,
];
