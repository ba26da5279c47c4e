//! Configuration for the front detector.

use crate::error::{Result, SiedError};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Fill value used by the binned products this detector was built for.
pub const DEFAULT_FILL_VALUE: i32 = -999;

/// Side length of the coarse histogram window.
pub const DEFAULT_WINDOW_WIDTH: usize = 32;

/// Configuration for a detection run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SiedConfig {
    /// Sentinel marking bins without data. Must lie outside 0..=255.
    pub fill_value: i32,

    /// Side length of the coarse scan window.
    pub window_width: usize,

    /// Distance between consecutive coarse window centers, in rows and in
    /// columns.
    pub window_stride: usize,

    /// Histogram (two-population) test.
    pub histogram: HistogramParams,

    /// Spatial cohesion test.
    pub cohesion: CohesionParams,

    /// Contour following and pruning.
    pub contour: ContourParams,
}

impl Default for SiedConfig {
    fn default() -> Self {
        Self {
            fill_value: DEFAULT_FILL_VALUE,
            window_width: DEFAULT_WINDOW_WIDTH,
            window_stride: DEFAULT_WINDOW_WIDTH / 2,
            histogram: HistogramParams::default(),
            cohesion: CohesionParams::default(),
            contour: ContourParams::default(),
        }
    }
}

/// Thresholds of the histogram analysis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistogramParams {
    /// Minimum `between / (between + within)` for a window to hold two
    /// populations.
    pub separability: f64,
    /// Smallest share of window cells the low population may hold.
    pub min_segment_fraction: f64,
    /// Largest share of window cells the low population may hold.
    pub max_segment_fraction: f64,
}

impl Default for HistogramParams {
    fn default() -> Self {
        Self {
            separability: 0.7,
            min_segment_fraction: 0.25,
            max_segment_fraction: 0.75,
        }
    }
}

/// Thresholds of the cohesion test.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CohesionParams {
    /// Minimum cohesion of the cold (below threshold) population.
    pub group_low: f64,
    /// Minimum cohesion of the warm (at or above threshold) population.
    pub group_high: f64,
    /// Minimum cohesion of both populations together.
    pub combined: f64,
}

impl Default for CohesionParams {
    fn default() -> Self {
        Self {
            group_low: 0.90,
            group_high: 0.90,
            combined: 0.92,
        }
    }
}

/// Contour following parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContourParams {
    /// Contours with fewer points are discarded.
    pub min_length: usize,
    /// Minimum gradient coherence for following a front without edge pixels.
    pub gradient_ratio: f64,
    /// Largest allowed change of direction, in degrees, against recent steps.
    pub max_turn_degrees: i32,
    /// How many recent points the turn check looks at.
    pub turn_lookback: usize,
    /// Contours stop growing this many rows/columns from the grid border.
    pub edge_margin: usize,
}

impl Default for ContourParams {
    fn default() -> Self {
        Self {
            min_length: 15,
            gradient_ratio: 0.7,
            max_turn_degrees: 90,
            turn_lookback: 5,
            edge_margin: 2,
        }
    }
}

impl SiedConfig {
    /// Load configuration from environment variables on top of the defaults.
    ///
    /// Unparseable values are logged and ignored.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        env_override("SIED_FILL_VALUE", &mut config.fill_value);
        env_override("SIED_WINDOW_WIDTH", &mut config.window_width);
        env_override("SIED_WINDOW_STRIDE", &mut config.window_stride);

        env_override("SIED_SEPARABILITY", &mut config.histogram.separability);
        env_override(
            "SIED_MIN_SEGMENT_FRACTION",
            &mut config.histogram.min_segment_fraction,
        );
        env_override(
            "SIED_MAX_SEGMENT_FRACTION",
            &mut config.histogram.max_segment_fraction,
        );

        env_override("SIED_COHESION_LOW", &mut config.cohesion.group_low);
        env_override("SIED_COHESION_HIGH", &mut config.cohesion.group_high);
        env_override("SIED_COHESION_COMBINED", &mut config.cohesion.combined);

        env_override("SIED_MIN_CONTOUR_LENGTH", &mut config.contour.min_length);
        env_override("SIED_GRADIENT_RATIO", &mut config.contour.gradient_ratio);
        env_override("SIED_MAX_TURN_DEGREES", &mut config.contour.max_turn_degrees);
        env_override("SIED_TURN_LOOKBACK", &mut config.contour.turn_lookback);
        env_override("SIED_EDGE_MARGIN", &mut config.contour.edge_margin);

        config
    }

    /// Parse a JSON document; missing fields keep their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if (0..=255).contains(&self.fill_value) {
            return Err(SiedError::invalid_config(format!(
                "fill_value {} collides with valid intensities 0..=255",
                self.fill_value
            )));
        }

        if self.window_width < 4 {
            return Err(SiedError::invalid_config("window_width must be >= 4"));
        }

        if self.window_stride == 0 || self.window_stride > self.window_width {
            return Err(SiedError::invalid_config(
                "window_stride must be between 1 and window_width",
            ));
        }

        let h = &self.histogram;
        check_unit("histogram.separability", h.separability)?;
        if !(0.0..=1.0).contains(&h.min_segment_fraction)
            || !(0.0..=1.0).contains(&h.max_segment_fraction)
            || h.min_segment_fraction >= h.max_segment_fraction
        {
            return Err(SiedError::invalid_config(
                "segment fractions must satisfy 0 <= min < max <= 1",
            ));
        }

        check_unit("cohesion.group_low", self.cohesion.group_low)?;
        check_unit("cohesion.group_high", self.cohesion.group_high)?;
        check_unit("cohesion.combined", self.cohesion.combined)?;

        let c = &self.contour;
        if c.min_length == 0 {
            return Err(SiedError::invalid_config("contour.min_length must be > 0"));
        }
        check_unit("contour.gradient_ratio", c.gradient_ratio)?;
        if !(0..=180).contains(&c.max_turn_degrees) {
            return Err(SiedError::invalid_config(
                "contour.max_turn_degrees must be 0-180",
            ));
        }
        if c.turn_lookback == 0 {
            return Err(SiedError::invalid_config("contour.turn_lookback must be > 0"));
        }
        if c.edge_margin < 1 {
            return Err(SiedError::invalid_config("contour.edge_margin must be >= 1"));
        }

        Ok(())
    }
}

fn check_unit(name: &str, value: f64) -> Result<()> {
    if value > 0.0 && value <= 1.0 {
        Ok(())
    } else {
        Err(SiedError::invalid_config(format!(
            "{} must be in (0, 1], got {}",
            name, value
        )))
    }
}

fn env_override<T: std::str::FromStr>(key: &str, target: &mut T) {
    if let Ok(val) = std::env::var(key) {
        match val.parse() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(key, value = %val, "Ignoring unparseable configuration value"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SiedConfig::default();
        assert_eq!(config.fill_value, -999);
        assert_eq!(config.window_width, 32);
        assert_eq!(config.window_stride, 16);
        assert_eq!(config.histogram.separability, 0.7);
        assert_eq!(config.histogram.min_segment_fraction, 0.25);
        assert_eq!(config.histogram.max_segment_fraction, 0.75);
        assert_eq!(config.cohesion.group_low, 0.90);
        assert_eq!(config.cohesion.group_high, 0.90);
        assert_eq!(config.cohesion.combined, 0.92);
        assert_eq!(config.contour.min_length, 15);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut config = SiedConfig::default();
        config.fill_value = 0;
        assert!(config.validate().is_err());

        config = SiedConfig::default();
        config.window_width = 2;
        assert!(config.validate().is_err());

        config = SiedConfig::default();
        config.window_stride = 0;
        assert!(config.validate().is_err());

        config = SiedConfig::default();
        config.window_stride = 33;
        assert!(config.validate().is_err());

        config = SiedConfig::default();
        config.histogram.min_segment_fraction = 0.8;
        assert!(config.validate().is_err());

        config = SiedConfig::default();
        config.cohesion.combined = 1.5;
        assert!(config.validate().is_err());

        config = SiedConfig::default();
        config.contour.min_length = 0;
        assert!(config.validate().is_err());

        config = SiedConfig::default();
        config.contour.max_turn_degrees = 270;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config =
            SiedConfig::from_json(r#"{"window_width": 16, "contour": {"min_length": 20}}"#)
                .unwrap();
        assert_eq!(config.window_width, 16);
        assert_eq!(config.window_stride, 16);
        assert_eq!(config.contour.min_length, 20);
        assert_eq!(config.contour.turn_lookback, 5);
        assert_eq!(config.fill_value, -999);
    }

    #[test]
    fn test_invalid_json_config_rejected() {
        assert!(SiedConfig::from_json(r#"{"fill_value": 12}"#).is_err());
        assert!(SiedConfig::from_json("not json").is_err());
    }
}
