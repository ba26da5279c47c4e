//! Contextual 3x3 median pre-filter.
//!
//! Every bin with a full 3x3 neighbourhood is replaced by the median of
//! that neighbourhood. Windows holding fill values fall back to the median of
//! their valid cells. Bins in the two outermost rows at each pole end, and
//! the first and last bin of every row, become fill: later stages read 3x3
//! and 5x5 neighbourhoods of interior bins and need them defined.

use bin_grid::{BinGrid, Window};

use crate::error::{Result, SiedError};

/// Rows at the top and bottom of the grid that are always fill after filtering.
pub const FILTER_ROW_MARGIN: usize = 2;

macro_rules! sort_pair {
    ($p:ident, $a:expr, $b:expr) => {
        if $p[$a] > $p[$b] {
            $p.swap($a, $b);
        }
    };
}

/// Median of nine values via a fixed 19-exchange sorting network.
///
/// The slice is partially reordered in place.
pub fn median9(p: &mut [i32; 9]) -> i32 {
    sort_pair!(p, 1, 2);
    sort_pair!(p, 4, 5);
    sort_pair!(p, 7, 8);
    sort_pair!(p, 0, 1);
    sort_pair!(p, 3, 4);
    sort_pair!(p, 6, 7);
    sort_pair!(p, 1, 2);
    sort_pair!(p, 4, 5);
    sort_pair!(p, 7, 8);
    sort_pair!(p, 0, 3);
    sort_pair!(p, 5, 8);
    sort_pair!(p, 4, 7);
    sort_pair!(p, 3, 6);
    sort_pair!(p, 1, 4);
    sort_pair!(p, 2, 5);
    sort_pair!(p, 4, 7);
    sort_pair!(p, 4, 2);
    sort_pair!(p, 6, 4);
    sort_pair!(p, 4, 2);
    p[4]
}

/// Median over the values that are not `fill_value`.
///
/// An even number of valid values averages the two middle ones, rounding
/// halves up. Returns `fill_value` when nothing is valid.
pub fn median_of_valid(values: &[i32], fill_value: i32) -> i32 {
    let mut valid: Vec<i32> = values.iter().copied().filter(|&v| v != fill_value).collect();
    if valid.is_empty() {
        return fill_value;
    }
    valid.sort_unstable();

    let mid = valid.len() / 2;
    if valid.len() % 2 == 1 {
        valid[mid]
    } else {
        let sum = valid[mid - 1] + valid[mid];
        (sum as f64 / 2.0).round() as i32
    }
}

/// Apply the median filter to a whole grid.
///
/// `data` must have one value per grid bin. Bins whose own value is fill
/// stay fill.
pub fn median_filter(grid: &BinGrid, data: &[i32], fill_value: i32) -> Result<Vec<i32>> {
    SiedError::check_length(grid.total_bins(), data.len())?;
    let n_rows = grid.n_rows();
    let mut filtered = vec![fill_value; data.len()];
    let mut window = Window::with_width(3);

    for row in FILTER_ROW_MARGIN..n_rows.saturating_sub(FILTER_ROW_MARGIN) {
        let bins = grid.row_bins(row);
        if bins.len() < 3 {
            continue;
        }
        for bin in bins.start + 1..bins.end - 1 {
            if data[bin] == fill_value {
                continue;
            }
            if grid
                .window_into(data, bin, row, 3, fill_value, &mut window)
                .is_err()
            {
                // Row-length changes can push a neighbour column off its row.
                continue;
            }
            filtered[bin] = window_median(&window, fill_value);
        }
    }

    Ok(filtered)
}

fn window_median(window: &Window, fill_value: i32) -> i32 {
    if window.is_complete() {
        let mut cells = [0i32; 9];
        cells.copy_from_slice(&window.values);
        median9(&mut cells)
    } else {
        median_of_valid(&window.values, fill_value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FILL: i32 = -999;

    #[test]
    fn test_median9() {
        let mut values = [144, 233, 178, 102, 72, 1, 52, 246, 254];
        assert_eq!(median9(&mut values), 144);

        let mut constant = [145; 9];
        assert_eq!(median9(&mut constant), 145);
    }

    #[test]
    fn test_median9_matches_sort() {
        let cases = [
            [9, 8, 7, 6, 5, 4, 3, 2, 1],
            [1, 2, 3, 4, 5, 6, 7, 8, 9],
            [5, 5, 1, 1, 9, 9, 5, 0, 255],
            [0, 255, 0, 255, 0, 255, 0, 255, 128],
        ];
        for case in cases {
            let mut sorted = case;
            sorted.sort_unstable();
            let mut values = case;
            assert_eq!(median9(&mut values), sorted[4], "case {:?}", case);
        }
    }

    #[test]
    fn test_median_of_valid_odd_count() {
        let values = [FILL, 222, 147, 3, 254, 29, FILL, 3, 99];
        assert_eq!(median_of_valid(&values, FILL), 99);
    }

    #[test]
    fn test_median_of_valid_even_count_rounds() {
        let values = [FILL, 108, FILL, 42, FILL, 232, 19, 188, 69];
        assert_eq!(median_of_valid(&values, FILL), 89);
    }

    #[test]
    fn test_median_of_valid_all_fill() {
        assert_eq!(median_of_valid(&[FILL; 9], FILL), FILL);
    }

    #[test]
    fn test_filter_removes_single_spike() {
        let grid = BinGrid::uniform(7, 7).unwrap();
        let mut data = vec![100; 49];
        data[24] = 250;
        let filtered = median_filter(&grid, &data, FILL).unwrap();
        assert_eq!(filtered[24], 100);
    }

    #[test]
    fn test_filter_keeps_fill_centers() {
        let grid = BinGrid::uniform(7, 7).unwrap();
        let mut data = vec![100; 49];
        data[24] = FILL;
        data[23] = FILL;
        let filtered = median_filter(&grid, &data, FILL).unwrap();
        assert_eq!(filtered[24], FILL);
        assert_eq!(filtered[23], FILL);
        // Neighbour of the hole uses the valid cells only.
        assert_eq!(filtered[25], 100);
    }

    #[test]
    fn test_filter_rejects_short_data() {
        let grid = BinGrid::uniform(7, 7).unwrap();
        let err = median_filter(&grid, &[100; 48], FILL).unwrap_err();
        assert_eq!(
            err,
            SiedError::InputLength {
                expected: 49,
                actual: 48
            }
        );
    }
}
