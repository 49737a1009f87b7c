pub mod preprocessing;
pub mod lines;
pub mod rectangle;
pub mod rotation;
pub mod contours;
pub mod crop;
pub mod strategy;
pub mod steps;

pub use contours::{estimate_bounds, estimate_gray_bounds};
pub use crop::{crop, crop_dynamic};
pub use lines::{extract_lines, LineMask};
pub use rectangle::{looks_like_rectangle, rectangle_bounds};
pub use rotation::{search_rotated_rectangle, trial_angles, RotationMatch};
pub use strategy::{BoundaryDetector, ContourDetector, FallbackDetector, LineFrameDetector};

use crate::config::DetectorConfig;
use crate::pipeline::Pipeline;

/// Build the morphological pipeline: preprocessing, rotation search, crop.
pub fn build_line_pipeline(config: &DetectorConfig) -> Pipeline {
    use crate::detection::steps::*;
    use std::sync::Arc;

    Pipeline::new()
        .add_step(Arc::new(GrayscaleStep))
        .add_step(Arc::new(DenoiseStep { radius: config.preprocess.denoise_radius }))
        .add_step(Arc::new(EdgeDetectionStep {
            low_threshold: config.preprocess.canny_low,
            high_threshold: config.preprocess.canny_high,
        }))
        .add_step(Arc::new(SmoothStep { sigma: config.preprocess.smoothing_sigma }))
        .add_step(Arc::new(RotationSearchStep { config: config.clone() }))
        .add_step(Arc::new(CropStep))
}

/// Build the contour pipeline: grayscale, adaptive-threshold bounds, crop.
pub fn build_contour_pipeline(config: &DetectorConfig) -> Pipeline {
    use crate::detection::steps::*;
    use std::sync::Arc;

    Pipeline::new()
        .add_step(Arc::new(GrayscaleStep))
        .add_step(Arc::new(ContourBoundsStep { config: config.clone() }))
        .add_step(Arc::new(CropStep))
}

/// Build a pipeline that locates the frame with lines, falling back to
/// contours, then crops.
pub fn build_standard_pipeline(config: &DetectorConfig) -> Pipeline {
    use crate::detection::steps::*;
    use std::sync::Arc;

    Pipeline::new()
        .add_step(Arc::new(GrayscaleStep))
        .add_step(Arc::new(DetectFrameStep {
            detector: Arc::new(FallbackDetector::standard(config)),
        }))
        .add_step(Arc::new(CropStep))
}
