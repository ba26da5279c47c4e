//! Edge pixel location inside an accepted window.

use crate::cohesion::{binarize, neighbor_bodies};

/// Mark the boundary cells between the two bodies of `window`.
///
/// A cell is an edge when any of its valid 8-connected neighbours lies on
/// the other side of `threshold`; edge cells are set to `threshold`, other
/// valid cells to 0 and fill cells stay fill.
pub fn locate_edges(window: &[i32], width: usize, threshold: i32, fill_value: i32) -> Vec<i32> {
    let bodies = binarize(window, threshold, fill_value);
    let mut edges = vec![0; window.len()];

    for r in 0..width {
        for c in 0..width {
            let idx = r * width + c;
            edges[idx] = match bodies[idx] {
                None => fill_value,
                Some(high) => {
                    if neighbor_bodies(&bodies, width, r, c).any(|n| n != high) {
                        threshold
                    } else {
                        0
                    }
                }
            };
        }
    }
    edges
}

/// Copy edge marks of a window into the whole-grid edge map.
///
/// `bins` holds the grid bin of every window cell. Only positive marks are
/// written, so pixels marked by an earlier window are never cleared.
/// Returns the number of newly marked bins.
pub fn merge_edges(edge_map: &mut [i32], window_edges: &[i32], bins: &[usize]) -> usize {
    let mut marked = 0;
    for (&mark, &bin) in window_edges.iter().zip(bins) {
        if mark > 0 {
            if edge_map[bin] <= 0 {
                marked += 1;
            }
            edge_map[bin] = mark;
        }
    }
    marked
}

#[cfg(test)]
mod tests {
    use super::*;

    const FILL: i32 = -999;

    #[test]
    fn test_vertical_boundary_marks_both_sides() {
        #[rustfmt::skip]
        let window = vec![
            10, 10, 90, 90,
            10, 10, 90, 90,
            10, 10, 90, 90,
            10, 10, 90, 90,
        ];
        let edges = locate_edges(&window, 4, 50, FILL);
        #[rustfmt::skip]
        let expected = vec![
            0, 50, 50, 0,
            0, 50, 50, 0,
            0, 50, 50, 0,
            0, 50, 50, 0,
        ];
        assert_eq!(edges, expected);
    }

    #[test]
    fn test_fill_propagates_and_is_ignored_as_neighbor() {
        #[rustfmt::skip]
        let window = vec![
            10, 10,   10,
            10, 10,   FILL,
            10, FILL, 90,
        ];
        let edges = locate_edges(&window, 3, 50, FILL);
        #[rustfmt::skip]
        let expected = vec![
            0, 0,    0,
            0, 50,   FILL,
            0, FILL, 50,
        ];
        assert_eq!(edges, expected);
    }

    #[test]
    fn test_uniform_window_has_no_edges() {
        let edges = locate_edges(&[30; 9], 3, 50, FILL);
        assert!(edges.iter().all(|&e| e == 0));
    }

    #[test]
    fn test_merge_never_clears_marks() {
        let mut edge_map = vec![0, 0, 0, 0, FILL];
        assert_eq!(merge_edges(&mut edge_map, &[40, 0, 0], &[0, 1, 2]), 1);
        assert_eq!(merge_edges(&mut edge_map, &[0, 0, 55], &[0, 1, 2]), 1);
        assert_eq!(merge_edges(&mut edge_map, &[FILL, 70], &[4, 3]), 1);
        assert_eq!(edge_map, vec![40, 0, 55, 70, FILL]);
    }
}
