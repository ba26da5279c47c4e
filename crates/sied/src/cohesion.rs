//! Spatial cohesion of a thresholded window.
//!
//! Splitting a window at its histogram threshold yields two bodies. A real
//! front separates two compact water masses, so most neighbours of a cell
//! should belong to the same body as the cell itself. Salt-and-pepper noise
//! with a bimodal histogram fails this test.

use crate::config::CohesionParams;

/// Body membership of a window cell: `None` for fill, `Some(true)` for the
/// high (at or above threshold) body.
pub type Body = Option<bool>;

/// Split `window` into bodies at `threshold`.
pub fn binarize(window: &[i32], threshold: i32, fill_value: i32) -> Vec<Body> {
    window
        .iter()
        .map(|&v| (v != fill_value).then_some(v >= threshold))
        .collect()
}

/// Bodies of the up-to-8 valid neighbours of cell `(r, c)`.
pub(crate) fn neighbor_bodies(
    bodies: &[Body],
    width: usize,
    r: usize,
    c: usize,
) -> impl Iterator<Item = bool> + '_ {
    let rows = r.saturating_sub(1)..(r + 2).min(width);
    rows.flat_map(move |k| {
        let cols = c.saturating_sub(1)..(c + 2).min(width);
        cols.filter_map(move |l| {
            if k == r && l == c {
                None
            } else {
                bodies[k * width + l]
            }
        })
    })
}

/// Neighbour agreement counts of both bodies.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Cohesion {
    /// Neighbour pairs where a low cell sees a low neighbour.
    pub same_low: u32,
    /// Neighbour pairs examined around low cells.
    pub total_low: u32,
    /// Neighbour pairs where a high cell sees a high neighbour.
    pub same_high: u32,
    /// Neighbour pairs examined around high cells.
    pub total_high: u32,
}

impl Cohesion {
    /// Count neighbour agreement over a square window.
    pub fn measure(window: &[i32], width: usize, threshold: i32, fill_value: i32) -> Self {
        let bodies = binarize(window, threshold, fill_value);
        let mut counts = Self::default();

        for r in 0..width {
            for c in 0..width {
                let Some(high) = bodies[r * width + c] else {
                    continue;
                };
                let mut same = 0;
                let mut total = 0;
                for neighbor in neighbor_bodies(&bodies, width, r, c) {
                    total += 1;
                    if neighbor == high {
                        same += 1;
                    }
                }
                if high {
                    counts.same_high += same;
                    counts.total_high += total;
                } else {
                    counts.same_low += same;
                    counts.total_low += total;
                }
            }
        }
        counts
    }

    /// Cohesion of the low body, `None` when it has no neighbour pairs.
    pub fn low(&self) -> Option<f64> {
        ratio(self.same_low, self.total_low)
    }

    /// Cohesion of the high body, `None` when it has no neighbour pairs.
    pub fn high(&self) -> Option<f64> {
        ratio(self.same_high, self.total_high)
    }

    /// Cohesion of both bodies together.
    pub fn combined(&self) -> Option<f64> {
        ratio(
            self.same_low + self.same_high,
            self.total_low + self.total_high,
        )
    }

    /// True when every ratio reaches its criterion.
    pub fn passes(&self, params: &CohesionParams) -> bool {
        match (self.low(), self.high(), self.combined()) {
            (Some(low), Some(high), Some(all)) => {
                low >= params.group_low && high >= params.group_high && all >= params.combined
            }
            _ => false,
        }
    }
}

fn ratio(num: u32, den: u32) -> Option<f64> {
    (den > 0).then(|| num as f64 / den as f64)
}

/// True when splitting `window` at `threshold` yields two cohesive bodies.
pub fn is_cohesive(
    window: &[i32],
    width: usize,
    threshold: i32,
    fill_value: i32,
    params: &CohesionParams,
) -> bool {
    Cohesion::measure(window, width, threshold, fill_value).passes(params)
}
