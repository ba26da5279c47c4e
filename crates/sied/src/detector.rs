//! Detection pipeline: median filter, coarse window scan, contour tracing.

use bin_grid::{window::cells_before_center, BinGrid};
use serde::Serialize;
use tracing::{debug, info, trace};

use crate::cohesion::Cohesion;
use crate::config::SiedConfig;
use crate::contour::{prune_short_contours, Contour, ContourTracer};
use crate::error::{Result, SiedError};
use crate::filter::median_filter;
use crate::histogram::{analyze_window, HistogramOutcome};
use crate::locator::{locate_edges, merge_edges};

/// Mask value of a front pixel.
pub const FRONT: i32 = 1;

/// Mask value of a pixel with data but no front.
pub const NO_FRONT: i32 = 0;

/// Counters collected during one detection run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DetectionStats {
    /// Coarse windows that fit on the grid and were analysed.
    pub windows_scanned: usize,
    /// Coarse window positions dropped because the window left the grid.
    pub windows_skipped: usize,
    /// Windows whose threshold passed both tests.
    pub windows_accepted: usize,
    pub rejected_degenerate: usize,
    pub rejected_segment_size: usize,
    pub rejected_inseparable: usize,
    pub rejected_cohesion: usize,
    /// Distinct bins marked in the edge map.
    pub edge_pixels: usize,
    pub contours_traced: usize,
    pub contours_kept: usize,
    /// Bins set to [`FRONT`] in the output mask.
    pub front_pixels: usize,
}

/// Output of [`FrontDetector::detect`].
#[derive(Debug, Clone, PartialEq)]
pub struct FrontDetection {
    /// One value per bin: [`FRONT`], [`NO_FRONT`] or the fill value.
    pub mask: Vec<i32>,
    pub stats: DetectionStats,
}

impl FrontDetection {
    /// Bins flagged as front.
    pub fn front_bins(&self) -> impl Iterator<Item = usize> + '_ {
        self.mask
            .iter()
            .enumerate()
            .filter(|(_, &v)| v == FRONT)
            .map(|(bin, _)| bin)
    }
}

/// Single-image edge detector.
#[derive(Debug, Clone, Default)]
pub struct FrontDetector {
    config: SiedConfig,
}

impl FrontDetector {
    /// Create a detector, validating `config`.
    pub fn new(config: SiedConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &SiedConfig {
        &self.config
    }

    /// Run the full pipeline over `intensity`, one value per grid bin.
    pub fn detect(&self, grid: &BinGrid, intensity: &[i32]) -> Result<FrontDetection> {
        self.validate_input(grid, intensity)?;
        let fill = self.config.fill_value;

        let filtered = median_filter(grid, intensity, fill)?;
        let (edges, mut stats) = self.locate_edge_pixels(grid, &filtered)?;

        let mut tracer = ContourTracer::new(grid, &edges, &filtered, fill, self.config.contour)?;
        let mut contours = tracer.trace();
        stats.contours_traced = contours.len();
        let pruned = prune_short_contours(&mut contours, self.config.contour.min_length);
        stats.contours_kept = contours.len();
        debug!(
            traced = stats.contours_traced,
            kept = stats.contours_kept,
            pruned,
            "Contour tracing complete"
        );

        let mask = write_front_mask(intensity, &contours, fill);
        stats.front_pixels = mask.iter().filter(|&&v| v == FRONT).count();

        info!(
            rows = grid.n_rows(),
            bins = grid.total_bins(),
            windows_accepted = stats.windows_accepted,
            front_pixels = stats.front_pixels,
            "Front detection complete"
        );

        Ok(FrontDetection { mask, stats })
    }

    /// Scan the filtered grid with coarse windows and build the edge map.
    ///
    /// The map holds the window threshold at edge pixels, 0 elsewhere and
    /// the fill value where `filtered` is fill.
    pub fn locate_edge_pixels(
        &self,
        grid: &BinGrid,
        filtered: &[i32],
    ) -> Result<(Vec<i32>, DetectionStats)> {
        SiedError::check_length(grid.total_bins(), filtered.len())?;
        let fill = self.config.fill_value;
        let width = self.config.window_width;
        let stride = self.config.window_stride;
        let before = cells_before_center(width);
        let after = width - 1 - before;

        let mut stats = DetectionStats::default();
        let mut edges: Vec<i32> = filtered
            .iter()
            .map(|&v| if v == fill { fill } else { NO_FRONT })
            .collect();
        let mut values = vec![fill; width * width];

        let mut row = before;
        while row + after < grid.n_rows() {
            let bins_in_row = grid.bins_in_row(row);
            let base = grid.base_bin(row);

            let mut column = before;
            while column + after < bins_in_row {
                let center = base + column;
                let Ok(bins) = grid.bin_window(center, row, width) else {
                    stats.windows_skipped += 1;
                    column += stride;
                    continue;
                };
                stats.windows_scanned += 1;

                for (value, &bin) in values.iter_mut().zip(&bins) {
                    *value = filtered[bin];
                }

                match analyze_window(&values, fill, &self.config.histogram) {
                    HistogramOutcome::Accepted { threshold, theta } => {
                        let cohesion = Cohesion::measure(&values, width, threshold, fill);
                        if cohesion.passes(&self.config.cohesion) {
                            let marks = locate_edges(&values, width, threshold, fill);
                            stats.edge_pixels += merge_edges(&mut edges, &marks, &bins);
                            stats.windows_accepted += 1;
                            trace!(center, row, threshold, theta, "Window accepted");
                        } else {
                            stats.rejected_cohesion += 1;
                            trace!(center, row, threshold, ?cohesion, "Window not cohesive");
                        }
                    }
                    HistogramOutcome::Degenerate => stats.rejected_degenerate += 1,
                    HistogramOutcome::SegmentTooLarge { .. } => stats.rejected_segment_size += 1,
                    HistogramOutcome::Inseparable { .. } => stats.rejected_inseparable += 1,
                }

                column += stride;
            }
            row += stride;
        }

        debug!(
            scanned = stats.windows_scanned,
            skipped = stats.windows_skipped,
            accepted = stats.windows_accepted,
            degenerate = stats.rejected_degenerate,
            segment_size = stats.rejected_segment_size,
            inseparable = stats.rejected_inseparable,
            cohesion = stats.rejected_cohesion,
            edge_pixels = stats.edge_pixels,
            "Coarse scan complete"
        );

        Ok((edges, stats))
    }

    fn validate_input(&self, grid: &BinGrid, intensity: &[i32]) -> Result<()> {
        SiedError::check_length(grid.total_bins(), intensity.len())?;
        let fill = self.config.fill_value;
        if let Some((bin, &value)) = intensity
            .iter()
            .enumerate()
            .find(|(_, &v)| v != fill && !(0..=255).contains(&v))
        {
            return Err(SiedError::InvalidIntensity { bin, value });
        }
        Ok(())
    }
}

/// Write the surviving contours into a front mask.
///
/// Bins of `contours` become [`FRONT`]; bins that are fill in `intensity`
/// are fill regardless.
pub fn write_front_mask(intensity: &[i32], contours: &[Contour], fill_value: i32) -> Vec<i32> {
    let mut mask = vec![NO_FRONT; intensity.len()];
    for bin in contours.iter().flat_map(Contour::bins) {
        mask[bin] = FRONT;
    }
    for (m, &v) in mask.iter_mut().zip(intensity) {
        if v == fill_value {
            *m = fill_value;
        }
    }
    mask
}

/// Detect fronts with the default configuration.
///
/// `intensity` holds one value per bin (0..=255 or the default fill value);
/// `bins_in_row` and `base_bin` describe the grid's `n_rows` rows.
pub fn detect_fronts(
    intensity: &[i32],
    n_rows: usize,
    bins_in_row: &[usize],
    base_bin: &[usize],
) -> Result<Vec<i32>> {
    let grid = BinGrid::with_row_count(n_rows, bins_in_row, base_bin)?;
    let detection = FrontDetector::default().detect(&grid, intensity)?;
    Ok(detection.mask)
}
