//! Contour following over the edge pixel map.
//!
//! Edge pixels from the window scan are linked into directed chains. Each
//! chain starts at an unclaimed edge pixel (row-major order) and grows one
//! pixel at a time:
//!
//! 1. Prefer an adjacent edge pixel whose direction deviates least from the
//!    direction the chain arrived with, unless taking it would turn more than
//!    `max_turn_degrees` against any of the last `turn_lookback` steps. If
//!    that pixel already belongs to a contour, the chain ends.
//! 2. Without such a pixel, follow the filtered data itself when the local
//!    gradient field is coherent: step to the neighbour whose gradient best
//!    aligns with the gradient at the chain's tip.
//!
//! A pixel belongs to at most one contour; it is claimed as soon as it is
//! appended. Chains stop near the grid border, and short chains are dropped.

use bin_grid::BinGrid;
use tracing::trace;

use crate::config::ContourParams;
use crate::error::{Result, SiedError};

/// Step direction between neighbouring pixels of a 3x3 window.
///
/// Angles follow the usual mathematical convention with "up" meaning the
/// previous grid row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Right,
    UpRight,
    Up,
    UpLeft,
    Left,
    DownLeft,
    Down,
    DownRight,
}

/// Direction towards every cell of a row-major 3x3 window; the center has none.
pub const CELL_DIRECTIONS: [Option<Direction>; 9] = [
    Some(Direction::UpLeft),
    Some(Direction::Up),
    Some(Direction::UpRight),
    Some(Direction::Left),
    None,
    Some(Direction::Right),
    Some(Direction::DownLeft),
    Some(Direction::Down),
    Some(Direction::DownRight),
];

impl Direction {
    /// Compass angle in degrees.
    pub fn degrees(self) -> i32 {
        match self {
            Self::Right => 0,
            Self::UpRight => 45,
            Self::Up => 90,
            Self::UpLeft => 135,
            Self::Left => 180,
            Self::DownLeft => 225,
            Self::Down => 270,
            Self::DownRight => 315,
        }
    }

    /// Direction towards cell `index` of a 3x3 window.
    pub fn from_cell(index: usize) -> Option<Self> {
        CELL_DIRECTIONS.get(index).copied().flatten()
    }

    /// Row change of a step: 0 and 180 stay on the row, angles in (0, 180)
    /// move to the previous row, angles in (180, 360) to the next.
    pub fn row_offset(self) -> isize {
        match self.degrees() {
            0 | 180 => 0,
            1..=179 => -1,
            _ => 1,
        }
    }
}

/// Signed difference `a - b` of two angles folded into (-180, 180].
pub fn angle_between(a: i32, b: i32) -> i32 {
    let d = (a - b).rem_euclid(360);
    if d > 180 {
        d - 360
    } else {
        d
    }
}

/// One pixel of a contour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContourPoint {
    pub bin: usize,
    pub row: usize,
    /// Direction of the step that reached this point; `None` for the first.
    pub entry: Option<Direction>,
}

/// A directed chain of edge pixels.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Contour {
    pub points: Vec<ContourPoint>,
}

impl Contour {
    /// New contour holding only its first point.
    pub fn start(bin: usize, row: usize) -> Self {
        Self {
            points: vec![ContourPoint {
                bin,
                row,
                entry: None,
            }],
        }
    }

    pub fn push(&mut self, point: ContourPoint) {
        self.points.push(point);
    }

    /// Last point of the chain.
    pub fn tail(&self) -> Option<&ContourPoint> {
        self.points.last()
    }

    /// Number of points.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Bins of all points, in chain order.
    pub fn bins(&self) -> impl Iterator<Item = usize> + '_ {
        self.points.iter().map(|p| p.bin)
    }
}

/// How a step was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepSource {
    /// An adjacent edge pixel.
    EdgePixel,
    /// Gradient continuation over the filtered data.
    Gradient,
}

/// Candidate next point of a contour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Step {
    pub bin: usize,
    pub row: usize,
    pub direction: Direction,
    pub source: StepSource,
}

/// A 2D gradient vector, `x` along the row and `y` down the rows.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Vector2 {
    pub x: f64,
    pub y: f64,
}

impl Vector2 {
    pub fn dot(self, other: Self) -> f64 {
        self.x * other.x + self.y * other.y
    }

    pub fn magnitude(self) -> f64 {
        self.x.hypot(self.y)
    }
}

/// Central-difference gradient at the center of a row-major 3x3 window.
///
/// Fill in one of the four cross cells is replaced by the center value; a
/// fill center has no gradient.
pub fn gradient(cells: &[i32], fill_value: i32) -> Vector2 {
    let center = cells[4];
    if center == fill_value {
        return Vector2::default();
    }
    let at = |i: usize| {
        if cells[i] == fill_value {
            center
        } else {
            cells[i]
        }
    };
    Vector2 {
        x: (at(5) - at(3)) as f64 / 2.0,
        y: (at(7) - at(1)) as f64 / 2.0,
    }
}

/// Coherence of the gradient field around the center of a 5x5 window.
///
/// Ratio of the magnitude of the summed gradients to the summed gradient
/// magnitudes over the central 3x3 pixels: 1 when all gradients point the
/// same way, near 0 for noise. A flat window scores 0.
pub fn gradient_ratio(window: &[i32], fill_value: i32) -> f64 {
    let mut sum = Vector2::default();
    let mut sum_magnitude = 0.0;
    let mut cells = [0i32; 9];

    for r in 1..4 {
        for c in 1..4 {
            for k in 0..3 {
                for m in 0..3 {
                    cells[k * 3 + m] = window[(r - 1 + k) * 5 + (c - 1 + m)];
                }
            }
            let g = gradient(&cells, fill_value);
            sum.x += g.x;
            sum.y += g.y;
            sum_magnitude += g.magnitude();
        }
    }

    if sum_magnitude == 0.0 {
        0.0
    } else {
        sum.magnitude() / sum_magnitude
    }
}

/// True when stepping in `next` turns by more than `max_turn` degrees
/// against the entry direction of any of the last `lookback` points.
pub fn turn_too_sharp(
    points: &[ContourPoint],
    next: Direction,
    lookback: usize,
    max_turn: i32,
) -> bool {
    points
        .iter()
        .rev()
        .take(lookback)
        .filter_map(|p| p.entry)
        .any(|entry| angle_between(entry.degrees(), next.degrees()).abs() > max_turn)
}

/// Grows contours over an edge map.
pub struct ContourTracer<'a> {
    grid: &'a BinGrid,
    edges: &'a [i32],
    filtered: &'a [i32],
    fill_value: i32,
    params: ContourParams,
    claimed: Vec<bool>,
}

impl<'a> ContourTracer<'a> {
    /// Create a tracer over `edges` (positive = edge pixel) and the
    /// median-filtered data the edges were found in.
    pub fn new(
        grid: &'a BinGrid,
        edges: &'a [i32],
        filtered: &'a [i32],
        fill_value: i32,
        params: ContourParams,
    ) -> Result<Self> {
        SiedError::check_length(grid.total_bins(), edges.len())?;
        SiedError::check_length(grid.total_bins(), filtered.len())?;
        Ok(Self {
            grid,
            edges,
            filtered,
            fill_value,
            params,
            claimed: vec![false; grid.total_bins()],
        })
    }

    /// True when `bin` carries an edge mark.
    pub fn is_edge(&self, bin: usize) -> bool {
        self.edges[bin] > 0
    }

    /// True when `bin` already belongs to a contour.
    pub fn is_claimed(&self, bin: usize) -> bool {
        self.claimed[bin]
    }

    /// Claim map over all bins.
    pub fn claimed(&self) -> &[bool] {
        &self.claimed
    }

    /// Trace every contour, scanning start pixels in row-major order.
    pub fn trace(&mut self) -> Vec<Contour> {
        let margin = self.params.edge_margin;
        let mut contours = Vec::new();

        for row in margin..self.grid.n_rows().saturating_sub(margin) {
            let bins = self.grid.row_bins(row);
            if bins.len() <= 2 * margin {
                continue;
            }
            for bin in bins.start + margin..bins.end - margin {
                if self.is_edge(bin) && !self.claimed[bin] {
                    let contour = self.start_contour(bin, row);
                    trace!(start = bin, row, length = contour.len(), "Traced contour");
                    contours.push(contour);
                }
            }
        }
        contours
    }

    /// Claim `bin` and grow a contour from it.
    pub fn start_contour(&mut self, bin: usize, row: usize) -> Contour {
        self.claimed[bin] = true;
        let mut contour = Contour::start(bin, row);
        if self.can_continue_from(bin, row) {
            self.follow(&mut contour);
        }
        contour
    }

    /// Extend `contour` until no step is found, the next pixel is already
    /// claimed, or the chain reaches the border margin.
    pub fn follow(&mut self, contour: &mut Contour) {
        while let Some(step) = self.next_step(contour) {
            if self.claimed[step.bin] {
                break;
            }
            self.claimed[step.bin] = true;
            contour.push(ContourPoint {
                bin: step.bin,
                row: step.row,
                entry: Some(step.direction),
            });
            if !self.can_continue_from(step.bin, step.row) {
                break;
            }
        }
    }

    /// Next point of `contour`: an adjacent edge pixel if one qualifies,
    /// otherwise gradient continuation.
    pub fn next_step(&self, contour: &Contour) -> Option<Step> {
        self.find_best_front(contour)
            .or_else(|| self.gradient_continuation(contour))
    }

    /// Adjacent edge pixel deviating least from the arrival direction. Ties
    /// keep the first cell in row-major order. The candidate is dropped when
    /// it would turn too sharply.
    ///
    /// Claimed pixels stay candidates: choosing one ends the contour in
    /// [`ContourTracer::follow`] instead of falling back to the gradient.
    pub fn find_best_front(&self, contour: &Contour) -> Option<Step> {
        let tail = contour.tail()?;
        let neighbors = self.grid.bin_window(tail.bin, tail.row, 3).ok()?;

        let mut best: Option<(i32, usize)> = None;
        for (cell, &bin) in neighbors.iter().enumerate() {
            let Some(direction) = Direction::from_cell(cell) else {
                continue;
            };
            if !self.is_edge(bin) {
                continue;
            }
            let dtheta = tail.entry.map_or(0, |entry| {
                angle_between(entry.degrees(), direction.degrees()).abs()
            });
            if best.map_or(true, |(min, _)| dtheta < min) {
                best = Some((dtheta, cell));
            }
        }

        let (_, cell) = best?;
        let direction = Direction::from_cell(cell)?;
        if turn_too_sharp(
            &contour.points,
            direction,
            self.params.turn_lookback,
            self.params.max_turn_degrees,
        ) {
            return None;
        }
        Some(self.step(tail, neighbors[cell], direction, StepSource::EdgePixel))
    }

    /// Follow the filtered field when the gradients around the tail agree.
    ///
    /// Picks the unclaimed neighbour whose gradient has the largest positive
    /// dot product with the gradient at the tail.
    pub fn gradient_continuation(&self, contour: &Contour) -> Option<Step> {
        let tail = contour.tail()?;
        let fill = self.fill_value;

        let outer = self
            .grid
            .window(self.filtered, tail.bin, tail.row, 5, fill)
            .ok()?;
        let ratio = gradient_ratio(&outer.values, fill);
        if ratio <= self.params.gradient_ratio {
            return None;
        }

        let inner = self
            .grid
            .window(self.filtered, tail.bin, tail.row, 3, fill)
            .ok()?;
        let g0 = gradient(&inner.values, fill);
        let neighbors = self.grid.bin_window(tail.bin, tail.row, 3).ok()?;

        let mut best: Option<(f64, usize)> = None;
        for (cell, &bin) in neighbors.iter().enumerate() {
            let Some(direction) = Direction::from_cell(cell) else {
                continue;
            };
            if self.claimed[bin] {
                continue;
            }
            let row = offset_row(tail.row, direction);
            let Ok(window) = self.grid.window(self.filtered, bin, row, 3, fill) else {
                continue;
            };
            let product = g0.dot(gradient(&window.values, fill));
            if best.map_or(true, |(max, _)| product > max) {
                best = Some((product, cell));
            }
        }

        let (product, cell) = best?;
        if product <= 0.0 {
            return None;
        }
        let direction = Direction::from_cell(cell)?;
        trace!(bin = neighbors[cell], ratio, product, "Gradient continuation");
        Some(self.step(tail, neighbors[cell], direction, StepSource::Gradient))
    }

    /// True when a contour ending at `bin` may keep growing: the pixel lies
    /// at least `edge_margin` rows and columns inside the grid.
    pub fn can_continue_from(&self, bin: usize, row: usize) -> bool {
        let margin = self.params.edge_margin;
        if row < margin || row + margin >= self.grid.n_rows() {
            return false;
        }
        let column = bin - self.grid.base_bin(row);
        column >= margin && column + margin < self.grid.bins_in_row(row)
    }

    fn step(&self, tail: &ContourPoint, bin: usize, direction: Direction, source: StepSource) -> Step {
        Step {
            bin,
            row: offset_row(tail.row, direction),
            direction,
            source,
        }
    }
}

fn offset_row(row: usize, direction: Direction) -> usize {
    row.wrapping_add_signed(direction.row_offset())
}

/// Drop contours shorter than `min_length`. Returns how many were dropped.
pub fn prune_short_contours(contours: &mut Vec<Contour>, min_length: usize) -> usize {
    let before = contours.len();
    contours.retain(|c| c.len() >= min_length);
    before - contours.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    const FILL: i32 = -999;

    #[test]
    fn test_direction_table() {
        let degrees: Vec<Option<i32>> = (0..9)
            .map(|i| Direction::from_cell(i).map(Direction::degrees))
            .collect();
        assert_eq!(
            degrees,
            vec![
                Some(135),
                Some(90),
                Some(45),
                Some(180),
                None,
                Some(0),
                Some(225),
                Some(270),
                Some(315)
            ]
        );
    }

    #[test]
    fn test_row_offsets() {
        assert_eq!(Direction::Right.row_offset(), 0);
        assert_eq!(Direction::Left.row_offset(), 0);
        assert_eq!(Direction::UpLeft.row_offset(), -1);
        assert_eq!(Direction::Up.row_offset(), -1);
        assert_eq!(Direction::Down.row_offset(), 1);
        assert_eq!(Direction::DownRight.row_offset(), 1);
    }

    #[test]
    fn test_angle_between_folds() {
        assert_eq!(angle_between(0, 270), 90);
        assert_eq!(angle_between(270, 0), -90);
        assert_eq!(angle_between(90, 270), 180);
        assert_eq!(angle_between(270, 90), 180);
        assert_eq!(angle_between(315, 45), -90);
        assert_eq!(angle_between(0, 0), 0);
    }

    #[test]
    fn test_gradient_ratio_reference_window() {
        #[rustfmt::skip]
        let window = [
            50, 83, 100, 248, 118,
            110, 67, 95, 168, 149,
            195, 58, 21, 204, 215,
            118, 84, 154, 22, 211,
            113, 64, 126, 97, 235,
        ];
        let ratio = gradient_ratio(&window, FILL);
        assert!((ratio - 0.3690171758724715).abs() < 1e-12, "ratio {}", ratio);
    }

    #[test]
    fn test_gradient_ratio_of_ramp_is_one() {
        let window: Vec<i32> = (0..25).map(|i| (i % 5) * 10).collect();
        assert!((gradient_ratio(&window, FILL) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_gradient_ratio_of_flat_window_is_zero() {
        assert_eq!(gradient_ratio(&[7; 25], FILL), 0.0);
    }

    #[test]
    fn test_gradient_replaces_fill_with_center() {
        let cells = [0, FILL, 0, 10, 20, FILL, 0, 40, 0];
        let g = gradient(&cells, FILL);
        assert_eq!(g, Vector2 { x: 5.0, y: 10.0 });
        assert_eq!(gradient(&[1, 2, 3, 4, FILL, 6, 7, 8, 9], FILL), Vector2::default());
    }

    #[test]
    fn test_turn_too_sharp() {
        let mut contour = Contour::start(0, 0);
        assert!(!turn_too_sharp(&contour.points, Direction::Up, 5, 90));

        for _ in 0..3 {
            contour.push(ContourPoint {
                bin: 0,
                row: 0,
                entry: Some(Direction::Down),
            });
        }
        assert!(!turn_too_sharp(&contour.points, Direction::Right, 5, 90));
        assert!(!turn_too_sharp(&contour.points, Direction::DownLeft, 5, 90));
        assert!(turn_too_sharp(&contour.points, Direction::UpRight, 5, 90));

        // Five rightward steps push the downward history out of reach.
        for _ in 0..5 {
            contour.push(ContourPoint {
                bin: 0,
                row: 0,
                entry: Some(Direction::Right),
            });
        }
        assert!(!turn_too_sharp(&contour.points, Direction::Up, 5, 90));
        assert!(turn_too_sharp(&contour.points, Direction::Up, 6, 45));
    }

    #[test]
    fn test_prune_short_contours() {
        let mut contours = vec![Contour::start(1, 0), Contour::start(2, 0)];
        for i in 0..4 {
            contours[1].push(ContourPoint {
                bin: 10 + i,
                row: 0,
                entry: Some(Direction::Right),
            });
        }
        assert_eq!(prune_short_contours(&mut contours, 5), 1);
        assert_eq!(contours.len(), 1);
        assert_eq!(contours[0].len(), 5);
    }
}
