//! Square neighbourhood windows over the sinusoidal grid.
//!
//! A window is built row by row. For every row it covers, the center bin's
//! fractional position in its own row is projected onto that row's bin count
//! to find the matching column, which keeps windows aligned in longitude
//! where rows change length near the poles.
//!
//! Odd widths are centered on the requested bin. Even widths put the bin at
//! cell `(width/2 - 1, width/2 - 1)`, the top-left cell of the central 2x2.

use crate::error::{GridError, GridResult};
use crate::grid::BinGrid;

/// Dense `width x width` row-major snapshot of a per-bin array.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Window {
    pub width: usize,
    pub values: Vec<i32>,
    /// Number of cells holding the fill value.
    pub fill_count: usize,
}

impl Window {
    /// Empty window buffer for `width`, to be filled by [`BinGrid::window_into`].
    pub fn with_width(width: usize) -> Self {
        Self {
            width,
            values: Vec::with_capacity(width * width),
            fill_count: 0,
        }
    }

    /// Value at window row `r`, column `c`.
    pub fn get(&self, r: usize, c: usize) -> i32 {
        self.values[r * self.width + c]
    }

    /// Index of the cell holding the reference bin.
    pub fn center_index(&self) -> usize {
        let before = cells_before_center(self.width);
        before * self.width + before
    }

    /// Value of the reference bin.
    pub fn center(&self) -> i32 {
        self.values[self.center_index()]
    }

    /// True when no cell holds the fill value.
    pub fn is_complete(&self) -> bool {
        self.fill_count == 0
    }

    /// Number of cells, `width * width` once filled.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// True for a buffer that has not been filled yet.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Rows (and columns) of the window above (left of) the reference bin.
pub fn cells_before_center(width: usize) -> usize {
    if width % 2 == 0 {
        width / 2 - 1
    } else {
        (width - 1) / 2
    }
}

impl BinGrid {
    /// Column in `other_row` lying at the same fractional position as `bin`
    /// in `row`. May equal the row length when `bin` sits at the far end.
    pub fn mapped_column(&self, bin: usize, row: usize, other_row: usize) -> GridResult<usize> {
        let column = self.column_of_bin(bin, row)?;
        self.check_row(other_row)?;
        let ratio = column as f64 / self.bins_in_row(row) as f64;
        Ok((ratio * self.bins_in_row(other_row) as f64 + 0.5).floor() as usize)
    }

    /// Bin in `other_row` matching the position of `bin` in `row`:
    /// `round(ratio * bins_in_row[other]) + base_bin[other]`.
    pub fn column_neighbor(&self, bin: usize, row: usize, other_row: usize) -> GridResult<usize> {
        Ok(self.mapped_column(bin, row, other_row)? + self.base_bin(other_row))
    }

    /// Bin identifiers of the `width x width` neighbourhood of `bin`.
    pub fn bin_window(&self, bin: usize, row: usize, width: usize) -> GridResult<Vec<usize>> {
        let mut bins = vec![0; width * width];
        self.walk_window(bin, row, width, |cell, id| bins[cell] = id)?;
        Ok(bins)
    }

    /// Values of `data` over the `width x width` neighbourhood of `bin`.
    pub fn window(
        &self,
        data: &[i32],
        bin: usize,
        row: usize,
        width: usize,
        fill_value: i32,
    ) -> GridResult<Window> {
        let mut window = Window::with_width(width);
        self.window_into(data, bin, row, width, fill_value, &mut window)?;
        Ok(window)
    }

    /// Like [`BinGrid::window`], reusing the buffer of `out`.
    pub fn window_into(
        &self,
        data: &[i32],
        bin: usize,
        row: usize,
        width: usize,
        fill_value: i32,
        out: &mut Window,
    ) -> GridResult<()> {
        if data.len() != self.total_bins() {
            return Err(GridError::invalid_shape(format!(
                "data has {} values for a grid of {} bins",
                data.len(),
                self.total_bins()
            )));
        }
        out.width = width;
        out.values.clear();
        out.values.resize(width * width, fill_value);
        out.fill_count = 0;

        let values = &mut out.values;
        self.walk_window(bin, row, width, |cell, id| values[cell] = data[id])?;
        out.fill_count = out.values.iter().filter(|&&v| v == fill_value).count();
        Ok(())
    }

    /// Visit every window cell with its bin id, after checking that the
    /// whole window lies on the grid.
    fn walk_window(
        &self,
        bin: usize,
        row: usize,
        width: usize,
        mut visit: impl FnMut(usize, usize),
    ) -> GridResult<()> {
        if width == 0 {
            return Err(GridError::out_of_bounds("window of width 0", self.describe()));
        }
        self.column_of_bin(bin, row)?;

        let before = cells_before_center(width);
        let out_of_bounds = || {
            GridError::out_of_bounds(
                format!("{}x{} window around bin {} (row {})", width, width, bin, row),
                self.describe(),
            )
        };
        if row < before || row - before + width > self.n_rows() {
            return Err(out_of_bounds());
        }
        let first_row = row - before;

        let mut starts = Vec::with_capacity(width);
        for current_row in first_row..first_row + width {
            let column = self.mapped_column(bin, row, current_row)?;
            if column < before || column - before + width > self.bins_in_row(current_row) {
                return Err(out_of_bounds());
            }
            starts.push(self.base_bin(current_row) + column - before);
        }

        for (r, start) in starts.into_iter().enumerate() {
            for c in 0..width {
                visit(r * width + c, start + c);
            }
        }
        Ok(())
    }
}
