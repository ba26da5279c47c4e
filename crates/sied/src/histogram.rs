//! Two-population histogram analysis of a coarse window.
//!
//! A window holds a front candidate when its intensity histogram splits into
//! two well separated populations. The split point maximizing the
//! between-group variance is found in a single pass over the 256 buckets
//! with running sums; it is then checked against a segment-size guard and a
//! separability criterion `between / (between + within)`.

use crate::config::HistogramParams;

/// Number of intensity levels.
pub const HISTOGRAM_BINS: usize = 256;

/// Bucket counts of valid (non-fill) intensities in a window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Histogram {
    counts: [u32; HISTOGRAM_BINS],
    valid: u32,
    cells: usize,
}

impl Histogram {
    /// Count intensities of `values`, skipping fill and out-of-range cells.
    pub fn from_window(values: &[i32], fill_value: i32) -> Self {
        let mut counts = [0u32; HISTOGRAM_BINS];
        let mut valid = 0;
        for &v in values {
            if v == fill_value || !(0..HISTOGRAM_BINS as i32).contains(&v) {
                continue;
            }
            counts[v as usize] += 1;
            valid += 1;
        }
        Self {
            counts,
            valid,
            cells: values.len(),
        }
    }

    /// Number of valid values counted.
    pub fn valid(&self) -> u32 {
        self.valid
    }

    /// Number of window cells, fill included.
    pub fn cells(&self) -> usize {
        self.cells
    }

    /// Count of `value`.
    pub fn count(&self, value: usize) -> u32 {
        self.counts[value]
    }

    /// Normalized frequency of every bucket over the valid values.
    pub fn frequencies(&self) -> Vec<f64> {
        let total = self.valid.max(1) as f64;
        self.counts.iter().map(|&c| c as f64 / total).collect()
    }

    /// Number of valid values strictly below `tau`.
    pub fn count_below(&self, tau: usize) -> u32 {
        self.counts[..tau.min(HISTOGRAM_BINS)].iter().sum()
    }

    /// Split point maximizing the between-group variance.
    ///
    /// Candidates are `tau` in `1..=254`, splitting values into `< tau` and
    /// `>= tau`. Candidates leaving one side empty are skipped. Ties keep the
    /// lowest `tau`. Returns `None` when no candidate separates anything.
    pub fn best_split(&self) -> Option<Split> {
        let mut n_high = self.valid as f64;
        let mut sum_high: f64 = self
            .counts
            .iter()
            .enumerate()
            .map(|(i, &c)| i as f64 * c as f64)
            .sum();
        let mut n_low = 0.0;
        let mut sum_low = 0.0;

        let mut best: Option<Split> = None;
        for i in 0..HISTOGRAM_BINS - 2 {
            let c = self.counts[i] as f64;
            n_high -= c;
            sum_high -= i as f64 * c;
            n_low += c;
            sum_low += i as f64 * c;

            if n_low == 0.0 || n_high == 0.0 {
                continue;
            }

            let mu_low = sum_low / n_low;
            let mu_high = sum_high / n_high;
            let total = n_low + n_high;
            let between = (mu_low - mu_high).powi(2) * n_low * n_high / (total * total);

            if best.map_or(between > 0.0, |b| between > b.between) {
                best = Some(Split {
                    tau: i + 1,
                    between,
                    mu_low,
                    mu_high,
                    n_low: n_low as u32,
                    n_high: n_high as u32,
                });
            }
        }
        best
    }

    /// Weighted sum of the variances of both groups of `split`.
    pub fn within_group_variance(&self, split: &Split) -> f64 {
        let (low, high) = self.counts.split_at(split.tau);
        let spread = |counts: &[u32], offset: usize, mu: f64| -> f64 {
            counts
                .iter()
                .enumerate()
                .map(|(i, &c)| ((i + offset) as f64 - mu).powi(2) * c as f64)
                .sum()
        };
        let total = (split.n_low + split.n_high) as f64;
        // Group variance times its weight: (S / n) * (n / total) == S / total.
        (spread(low, 0, split.mu_low) + spread(high, split.tau, split.mu_high)) / total
    }
}

/// A candidate threshold with its group statistics.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Split {
    /// First value of the high group.
    pub tau: usize,
    /// Between-group variance.
    pub between: f64,
    pub mu_low: f64,
    pub mu_high: f64,
    pub n_low: u32,
    pub n_high: u32,
}

/// Result of analysing one window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HistogramOutcome {
    /// Two populations separated at `threshold`.
    Accepted { threshold: i32, theta: f64 },
    /// All values fill or identical: nothing to split.
    Degenerate,
    /// The low population covers too little or too much of the window.
    SegmentTooLarge { low_fraction: f64 },
    /// Populations overlap too much.
    Inseparable { theta: f64 },
}

impl HistogramOutcome {
    /// Threshold when accepted.
    pub fn threshold(&self) -> Option<i32> {
        match self {
            Self::Accepted { threshold, .. } => Some(*threshold),
            _ => None,
        }
    }
}

/// Analyse a window of intensities.
///
/// The segment-size guard compares the low population with the total number
/// of window cells, fill cells included.
pub fn analyze_window(values: &[i32], fill_value: i32, params: &HistogramParams) -> HistogramOutcome {
    let histogram = Histogram::from_window(values, fill_value);
    let Some(split) = histogram.best_split() else {
        return HistogramOutcome::Degenerate;
    };

    let low_fraction = histogram.count_below(split.tau) as f64 / histogram.cells() as f64;
    if low_fraction < params.min_segment_fraction || low_fraction > params.max_segment_fraction {
        return HistogramOutcome::SegmentTooLarge { low_fraction };
    }

    let within = histogram.within_group_variance(&split);
    let theta = split.between / (split.between + within);
    if theta >= params.separability {
        HistogramOutcome::Accepted {
            threshold: split.tau as i32,
            theta,
        }
    } else {
        HistogramOutcome::Inseparable { theta }
    }
}

/// Threshold of a window, or `None` when it does not hold two populations.
pub fn window_threshold(values: &[i32], fill_value: i32, params: &HistogramParams) -> Option<i32> {
    analyze_window(values, fill_value, params).threshold()
}
