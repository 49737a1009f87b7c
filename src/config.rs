use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{BoundaryError, Result};

/// Tuning knobs for both detection strategies.
///
/// Every field has a default, so a JSON file only needs the values it
/// overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// Minimum stroke length kept by the line extractor, as a fraction of
    /// the image height (vertical strokes) or width (horizontal strokes).
    pub min_line_fraction: f64,
    /// Width of the rotation search window in degrees.
    pub rotation_range: i32,
    /// Optional cap on the number of rotation trials.
    pub max_search_trials: Option<usize>,
    /// Z-score a projection sample must exceed to count as a border line.
    pub rect_zscore_threshold: f64,
    /// Upper bound on the summed outlier z-scores per axis, normalized by
    /// axis length.
    pub rect_saturation_limit: f64,
    /// The threshold level is raised while the white fraction is above this.
    pub contour_white_fraction_limit: f64,
    /// Contours whose bounding rectangle is narrower or shorter than this
    /// are rejected.
    pub contour_min_dim: u32,
    /// Contours enclosing more than this fraction of the image are rejected.
    pub contour_max_area_fraction: f64,
    /// Contours enclosing less than this many square pixels are rejected.
    pub contour_min_area: f64,
    pub threshold_start: u8,
    pub threshold_step: u8,
    pub threshold_max: u8,
    pub max_threshold_iterations: usize,
    pub preprocess: PreprocessConfig,
}

/// Parameters for turning a photograph into an edge map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreprocessConfig {
    /// Median filter radius used for denoising (0 disables it).
    pub denoise_radius: u32,
    pub canny_low: f32,
    pub canny_high: f32,
    /// Gaussian sigma applied to the edge map (0 disables it).
    pub smoothing_sigma: f32,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            min_line_fraction: 0.58,
            rotation_range: 30,
            max_search_trials: None,
            rect_zscore_threshold: 3.5,
            rect_saturation_limit: 0.25,
            contour_white_fraction_limit: 0.85,
            contour_min_dim: 100,
            contour_max_area_fraction: 0.3,
            contour_min_area: 200.0,
            threshold_start: 100,
            threshold_step: 10,
            threshold_max: 250,
            max_threshold_iterations: 25,
            preprocess: PreprocessConfig::default(),
        }
    }
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self {
            denoise_radius: 1,
            canny_low: 50.0,
            canny_high: 240.0,
            smoothing_sigma: 2.0,
        }
    }
}

impl DetectorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a configuration from a JSON file and validate it.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let config: DetectorConfig = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_min_line_fraction(mut self, fraction: f64) -> Self {
        self.min_line_fraction = fraction;
        self
    }

    pub fn with_rotation_range(mut self, degrees: i32) -> Self {
        self.rotation_range = degrees;
        self
    }

    pub fn with_max_search_trials(mut self, trials: usize) -> Self {
        self.max_search_trials = Some(trials);
        self
    }

    pub fn with_preprocess(mut self, preprocess: PreprocessConfig) -> Self {
        self.preprocess = preprocess;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.min_line_fraction > 0.0 && self.min_line_fraction <= 1.0) {
            return Err(invalid(format!(
                "min_line_fraction must be in (0, 1], got {}",
                self.min_line_fraction
            )));
        }
        if self.rotation_range < 0 {
            return Err(invalid(format!(
                "rotation_range must not be negative, got {}",
                self.rotation_range
            )));
        }
        if self.rect_zscore_threshold <= 0.0 {
            return Err(invalid("rect_zscore_threshold must be positive".into()));
        }
        if self.rect_saturation_limit <= 0.0 {
            return Err(invalid("rect_saturation_limit must be positive".into()));
        }
        if !(0.0..=1.0).contains(&self.contour_white_fraction_limit) {
            return Err(invalid(
                "contour_white_fraction_limit must be in [0, 1]".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.contour_max_area_fraction) {
            return Err(invalid("contour_max_area_fraction must be in [0, 1]".into()));
        }
        if self.threshold_step == 0 {
            return Err(invalid("threshold_step must be at least 1".into()));
        }
        if self.threshold_start > self.threshold_max {
            return Err(invalid(format!(
                "threshold_start ({}) is above threshold_max ({})",
                self.threshold_start, self.threshold_max
            )));
        }
        if self.preprocess.canny_low > self.preprocess.canny_high {
            return Err(invalid("canny_low must not exceed canny_high".into()));
        }
        Ok(())
    }
}

fn invalid(message: String) -> BoundaryError {
    BoundaryError::InvalidConfig(message)
}
