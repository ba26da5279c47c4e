//! Window extraction tests on irregular and uniform bin grids.

use bin_grid::{BinGrid, GridError};
use test_utils::{twelve_row_grid, TEST_FILL, TWELVE_ROW_DATA};

const FILL: i32 = TEST_FILL;

fn twelve_row_data() -> Vec<i32> {
    TWELVE_ROW_DATA.to_vec()
}

// ============================================================================
// Irregular grid
// ============================================================================

#[test]
fn test_window_without_fill() {
    let grid = twelve_row_grid();
    let window = grid.window(&twelve_row_data(), 33, 4, 3, FILL).unwrap();
    assert_eq!(window.values, vec![221, 232, 72, 17, 195, 53, 150, 226, 113]);
    assert_eq!(window.fill_count, 0);
    assert!(window.is_complete());
}

#[test]
fn test_window_counts_fill_values() {
    let grid = twelve_row_grid();
    let mut data = twelve_row_data();
    data[32] = FILL;
    data[44] = FILL;

    let window = grid.window(&data, 33, 4, 3, FILL).unwrap();
    assert_eq!(
        window.values,
        vec![221, 232, 72, FILL, 195, 53, 150, 226, FILL]
    );
    assert_eq!(window.fill_count, 2);
}

#[test]
fn test_bin_window_matches_value_window() {
    let grid = twelve_row_grid();
    let bins = grid.bin_window(33, 4, 3).unwrap();
    assert_eq!(bins, vec![23, 24, 25, 32, 33, 34, 42, 43, 44]);
}

#[test]
fn test_column_neighbor_follows_row_ratio() {
    let grid = twelve_row_grid();
    // Bin 33 is column 3 of 10 in row 4.
    assert_eq!(grid.column_neighbor(33, 4, 3).unwrap(), 24);
    assert_eq!(grid.column_neighbor(33, 4, 5).unwrap(), 43);
    assert_eq!(grid.column_neighbor(33, 4, 0).unwrap(), 2);
}

#[test]
fn test_window_above_first_row_is_out_of_bounds() {
    let grid = twelve_row_grid();
    let err = grid.window(&twelve_row_data(), 7, 1, 5, FILL).unwrap_err();
    assert!(matches!(err, GridError::OutOfBounds { .. }));
}

#[test]
fn test_window_below_last_row_is_out_of_bounds() {
    let grid = twelve_row_grid();
    assert!(grid.bin_window(99, 11, 3).unwrap_err().is_out_of_bounds());
}

#[test]
fn test_window_past_row_end_is_out_of_bounds() {
    let grid = twelve_row_grid();
    // Last bin of row 4 has no right-hand neighbour.
    assert!(grid.bin_window(39, 4, 3).unwrap_err().is_out_of_bounds());
    // First bin of row 4 has no left-hand neighbour.
    assert!(grid.bin_window(30, 4, 3).unwrap_err().is_out_of_bounds());
}

// ============================================================================
// Uniform grid
// ============================================================================

#[test]
fn test_odd_windows_are_centered() {
    let grid = BinGrid::uniform(15, 15).unwrap();
    let data: Vec<i32> = (0..225).collect();
    for width in [3usize, 5, 7] {
        for row in 3..12 {
            for bin in grid.row_bins(row).skip(3).take(9) {
                let window = grid.window(&data, bin, row, width, FILL).unwrap();
                assert_eq!(window.values[(width * width - 1) / 2], bin as i32);
                assert_eq!(window.center(), bin as i32);
            }
        }
    }
}

#[test]
fn test_even_window_anchors_top_left_of_center() {
    let grid = BinGrid::uniform(9, 9).unwrap();
    let data: Vec<i32> = (0..81).collect();

    // Bin 40 is row 4, column 4: a 4x4 window covers rows 3..=6 and columns 3..=6.
    let window = grid.window(&data, 40, 4, 4, FILL).unwrap();
    assert_eq!(
        window.values,
        vec![30, 31, 32, 33, 39, 40, 41, 42, 48, 49, 50, 51, 57, 58, 59, 60]
    );
    assert_eq!(window.center_index(), 5);
    assert_eq!(window.center(), 40);
}

#[test]
fn test_even_windows_tile_without_overlap() {
    let grid = BinGrid::uniform(8, 8).unwrap();
    let mut seen = vec![0u8; 64];
    for row in [1usize, 5] {
        for column in [1usize, 5] {
            let bin = grid.base_bin(row) + column;
            for id in grid.bin_window(bin, row, 4).unwrap() {
                seen[id] += 1;
            }
        }
    }
    assert!(seen.iter().all(|&count| count == 1));
}
