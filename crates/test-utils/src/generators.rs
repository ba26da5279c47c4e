//! Synthetic grids and intensity fields.
//!
//! Random generators take an explicit seed so failures reproduce.

use std::ops::Range;

use bin_grid::BinGrid;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::TEST_FILL;

/// Rectangular grid with `width` bins in each of `n_rows` rows.
pub fn uniform_grid(n_rows: usize, width: usize) -> BinGrid {
    BinGrid::uniform(n_rows, width).expect("uniform grid dimensions must be non-zero")
}

/// Two flat water masses meeting along a meridian.
///
/// Bins left of `split` (a fraction of each row's length) get `low`, the
/// rest `high`.
///
/// # Example
///
/// ```
/// use test_utils::{step_front_field, uniform_grid};
///
/// let grid = uniform_grid(2, 4);
/// let field = step_front_field(&grid, 0.5, 10, 200);
/// assert_eq!(field, vec![10, 10, 200, 200, 10, 10, 200, 200]);
/// ```
pub fn step_front_field(grid: &BinGrid, split: f64, low: i32, high: i32) -> Vec<i32> {
    let mut field = Vec::with_capacity(grid.total_bins());
    for row in 0..grid.n_rows() {
        let boundary = (split * grid.bins_in_row(row) as f64).round() as usize;
        field.extend((0..grid.bins_in_row(row)).map(|c| if c < boundary { low } else { high }));
    }
    field
}

/// Edge map with a single vertical line at `column` over `rows`.
pub fn vertical_line_edges(grid: &BinGrid, column: usize, rows: Range<usize>) -> Vec<i32> {
    let mut edges = vec![0; grid.total_bins()];
    for row in rows {
        edges[grid.base_bin(row) + column] = 1;
    }
    edges
}

/// Square window where every cell is independently `low`, `high` or fill.
///
/// `fill_fraction` of the cells are fill on average; the rest split evenly
/// between the two values.
pub fn speckle_window(width: usize, low: i32, high: i32, fill_fraction: f64, seed: u64) -> Vec<i32> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..width * width)
        .map(|_| {
            if rng.gen_bool(fill_fraction) {
                TEST_FILL
            } else if rng.gen_bool(0.5) {
                low
            } else {
                high
            }
        })
        .collect()
}

/// Uniform random intensities in 0..=255 with a share of fill bins.
pub fn random_intensity(total_bins: usize, fill_fraction: f64, seed: u64) -> Vec<i32> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..total_bins)
        .map(|_| {
            if rng.gen_bool(fill_fraction) {
                TEST_FILL
            } else {
                rng.gen_range(0..=255)
            }
        })
        .collect()
}

/// Add uniform noise of amplitude `amplitude` to every non-fill value,
/// clamped to 0..=255.
pub fn add_noise(field: &mut [i32], amplitude: i32, seed: u64) {
    let mut rng = StdRng::seed_from_u64(seed);
    for value in field.iter_mut().filter(|v| **v != TEST_FILL) {
        *value = (*value + rng.gen_range(-amplitude..=amplitude)).clamp(0, 255);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vertical_line_edges() {
        let grid = uniform_grid(5, 4);
        let edges = vertical_line_edges(&grid, 1, 1..4);
        assert_eq!(edges.iter().filter(|&&v| v == 1).count(), 3);
        assert_eq!(edges[5], 1);
        assert_eq!(edges[13], 1);
        assert_eq!(edges[17], 0);
    }

    #[test]
    fn test_speckle_window_is_reproducible() {
        let a = speckle_window(8, 50, 200, 0.5, 7);
        let b = speckle_window(8, 50, 200, 0.5, 7);
        assert_eq!(a, b);
        assert!(a.iter().all(|&v| v == 50 || v == 200 || v == TEST_FILL));
    }

    #[test]
    fn test_random_intensity_range() {
        let data = random_intensity(500, 0.1, 3);
        assert_eq!(data.len(), 500);
        assert!(data
            .iter()
            .all(|&v| v == TEST_FILL || (0..=255).contains(&v)));
    }

    #[test]
    fn test_add_noise_keeps_fill() {
        let mut field = vec![TEST_FILL, 0, 255, 128];
        add_noise(&mut field, 10, 1);
        assert_eq!(field[0], TEST_FILL);
        assert!(field[1..].iter().all(|v| (0..=255).contains(v)));
    }
}
