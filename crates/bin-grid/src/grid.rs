//! Row layout of the integerized sinusoidal bin grid.

use crate::error::{GridError, GridResult};
use serde::{Deserialize, Serialize};

/// Shape of a sinusoidal bin grid: how many bins each latitude row holds and
/// where each row starts in the flat bin numbering.
///
/// Bins are numbered from 0 in row-major order, so
/// `base_bin[r + 1] == base_bin[r] + bins_in_row[r]` always holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "GridShape", into = "GridShape")]
pub struct BinGrid {
    bins_in_row: Vec<usize>,
    base_bin: Vec<usize>,
    total_bins: usize,
}

/// Unvalidated wire form of a [`BinGrid`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GridShape {
    pub bins_in_row: Vec<usize>,
    pub base_bin: Vec<usize>,
}

impl BinGrid {
    /// Build a grid from explicit row counts and base bins, checking that
    /// the two arrays agree with each other.
    pub fn new(bins_in_row: Vec<usize>, base_bin: Vec<usize>) -> GridResult<Self> {
        if bins_in_row.is_empty() {
            return Err(GridError::invalid_shape("grid has no rows"));
        }
        if bins_in_row.len() != base_bin.len() {
            return Err(GridError::invalid_shape(format!(
                "bins_in_row has {} rows but base_bin has {}",
                bins_in_row.len(),
                base_bin.len()
            )));
        }
        if let Some(row) = bins_in_row.iter().position(|&n| n == 0) {
            return Err(GridError::invalid_shape(format!("row {} has no bins", row)));
        }
        if base_bin[0] != 0 {
            return Err(GridError::invalid_shape(format!(
                "base_bin[0] must be 0, got {}",
                base_bin[0]
            )));
        }
        for row in 1..bins_in_row.len() {
            let expected = base_bin[row - 1] + bins_in_row[row - 1];
            if base_bin[row] != expected {
                return Err(GridError::invalid_shape(format!(
                    "base_bin[{}] is {} but rows above end at {}",
                    row, base_bin[row], expected
                )));
            }
        }

        let last = bins_in_row.len() - 1;
        let total_bins = base_bin[last] + bins_in_row[last];
        Ok(Self {
            bins_in_row,
            base_bin,
            total_bins,
        })
    }

    /// Same as [`BinGrid::new`], additionally checking a separately supplied
    /// row count.
    pub fn with_row_count(
        n_rows: usize,
        bins_in_row: &[usize],
        base_bin: &[usize],
    ) -> GridResult<Self> {
        if n_rows != bins_in_row.len() {
            return Err(GridError::invalid_shape(format!(
                "n_rows is {} but bins_in_row has {} entries",
                n_rows,
                bins_in_row.len()
            )));
        }
        Self::new(bins_in_row.to_vec(), base_bin.to_vec())
    }

    /// Build a grid from row counts alone, deriving the base bins.
    pub fn from_bins_in_row(bins_in_row: Vec<usize>) -> GridResult<Self> {
        let mut base_bin = Vec::with_capacity(bins_in_row.len());
        let mut next = 0;
        for &n in &bins_in_row {
            base_bin.push(next);
            next += n;
        }
        Self::new(bins_in_row, base_bin)
    }

    /// Rectangular grid with `width` bins in each of `n_rows` rows.
    pub fn uniform(n_rows: usize, width: usize) -> GridResult<Self> {
        Self::from_bins_in_row(vec![width; n_rows])
    }

    /// Integerized sinusoidal grid with `n_rows` latitude rows.
    ///
    /// Row `r` is centered on latitude `(r + 0.5) * 180 / n_rows - 90` and
    /// holds `round(2 * n_rows * cos(lat))` bins, so a 2160-row grid gives
    /// the familiar 4320 bins along the equator.
    pub fn isin(n_rows: usize) -> GridResult<Self> {
        let bins_in_row = (0..n_rows)
            .map(|row| {
                let lat = ((row as f64 + 0.5) * 180.0 / n_rows as f64) - 90.0;
                let n = (2.0 * n_rows as f64 * lat.to_radians().cos() + 0.5).floor();
                (n as usize).max(1)
            })
            .collect();
        Self::from_bins_in_row(bins_in_row)
    }

    /// Number of latitude rows.
    pub fn n_rows(&self) -> usize {
        self.bins_in_row.len()
    }

    /// Total number of bins over all rows.
    pub fn total_bins(&self) -> usize {
        self.total_bins
    }

    /// Number of bins in `row`. Panics if the row does not exist.
    pub fn bins_in_row(&self, row: usize) -> usize {
        self.bins_in_row[row]
    }

    /// First bin of `row`. Panics if the row does not exist.
    pub fn base_bin(&self, row: usize) -> usize {
        self.base_bin[row]
    }

    /// Row counts for every row.
    pub fn row_lengths(&self) -> &[usize] {
        &self.bins_in_row
    }

    /// Base bins for every row.
    pub fn base_bins(&self) -> &[usize] {
        &self.base_bin
    }

    /// Bins of `row` as a range of flat indices.
    pub fn row_bins(&self, row: usize) -> std::ops::Range<usize> {
        self.base_bin[row]..self.base_bin[row] + self.bins_in_row[row]
    }

    /// Find the row holding `bin`.
    pub fn row_of_bin(&self, bin: usize) -> GridResult<usize> {
        if bin >= self.total_bins {
            return Err(GridError::out_of_bounds(
                format!("bin {}", bin),
                self.describe(),
            ));
        }
        Ok(self.base_bin.partition_point(|&base| base <= bin) - 1)
    }

    /// Position of `bin` within `row`.
    pub fn column_of_bin(&self, bin: usize, row: usize) -> GridResult<usize> {
        self.check_row(row)?;
        if !self.row_bins(row).contains(&bin) {
            return Err(GridError::out_of_bounds(
                format!("bin {} in row {}", bin, row),
                self.describe(),
            ));
        }
        Ok(bin - self.base_bin[row])
    }

    pub(crate) fn check_row(&self, row: usize) -> GridResult<()> {
        if row >= self.n_rows() {
            return Err(GridError::out_of_bounds(
                format!("row {}", row),
                self.describe(),
            ));
        }
        Ok(())
    }

    pub(crate) fn describe(&self) -> String {
        format!("{} rows / {} bins", self.n_rows(), self.total_bins)
    }
}

impl TryFrom<GridShape> for BinGrid {
    type Error = GridError;

    fn try_from(shape: GridShape) -> GridResult<Self> {
        Self::new(shape.bins_in_row, shape.base_bin)
    }
}

impl From<BinGrid> for GridShape {
    fn from(grid: BinGrid) -> Self {
        Self {
            bins_in_row: grid.bins_in_row,
            base_bin: grid.base_bin,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uniform_grid_layout() {
        let grid = BinGrid::uniform(9, 9).unwrap();
        assert_eq!(grid.n_rows(), 9);
        assert_eq!(grid.total_bins(), 81);
        assert_eq!(grid.base_bin(4), 36);
        assert_eq!(grid.row_bins(2), 18..27);
    }

    #[test]
    fn test_mismatched_base_bin_rejected() {
        let err = BinGrid::new(vec![4, 4, 4], vec![0, 4, 9]).unwrap_err();
        assert!(matches!(err, GridError::InvalidGridShape(_)));
    }

    #[test]
    fn test_row_count_mismatch_rejected() {
        let err = BinGrid::with_row_count(4, &[3, 3, 3], &[0, 3, 6]).unwrap_err();
        assert!(err.to_string().contains("n_rows is 4"));
    }

    #[test]
    fn test_empty_row_rejected() {
        assert!(BinGrid::from_bins_in_row(vec![3, 0, 3]).is_err());
        assert!(BinGrid::from_bins_in_row(vec![]).is_err());
    }

    #[test]
    fn test_row_of_bin() {
        let grid = BinGrid::from_bins_in_row(vec![6, 7, 8, 9]).unwrap();
        assert_eq!(grid.row_of_bin(0).unwrap(), 0);
        assert_eq!(grid.row_of_bin(5).unwrap(), 0);
        assert_eq!(grid.row_of_bin(6).unwrap(), 1);
        assert_eq!(grid.row_of_bin(29).unwrap(), 3);
        assert!(grid.row_of_bin(30).unwrap_err().is_out_of_bounds());
    }

    #[test]
    fn test_isin_rows_shrink_towards_poles() {
        let grid = BinGrid::isin(2160).unwrap();
        assert_eq!(grid.n_rows(), 2160);
        let equator = grid.bins_in_row(1080);
        assert!(equator >= 4319 && equator <= 4320, "equator has {} bins", equator);
        assert!(grid.bins_in_row(0) < 10);
        assert_eq!(grid.bins_in_row(0), grid.bins_in_row(2159));
    }

    #[test]
    fn test_shape_deserialization_is_validated() {
        let good: BinGrid =
            serde_json::from_str(r#"{"bins_in_row":[2,3],"base_bin":[0,2]}"#).unwrap();
        assert_eq!(good.total_bins(), 5);

        let bad = serde_json::from_str::<BinGrid>(r#"{"bins_in_row":[2,3],"base_bin":[0,3]}"#);
        assert!(bad.is_err());
    }
}
