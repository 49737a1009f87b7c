//! Interchangeable boundary detectors.
//!
//! Both strategies answer the same question, "where is the frame?", so they
//! sit behind one trait. [`FallbackDetector`] chains them.

use image::GrayImage;
use tracing::{info, instrument, warn};

use crate::config::DetectorConfig;
use crate::detection::contours::estimate_gray_bounds;
use crate::detection::preprocessing::edge_map;
use crate::detection::rotation::search_rotated_rectangle;
use crate::error::{BoundaryError, Result};
use crate::models::BoundingBox;
use crate::report::Reporter;

/// Anything that can locate the frame in a grayscale photograph.
pub trait BoundaryDetector: Send + Sync {
    /// Human-readable name (used in logs and reports).
    fn name(&self) -> &str;

    fn detect(&self, image: &GrayImage, reporter: &dyn Reporter) -> Result<BoundingBox>;
}

/// Morphological strategy: edge map, rotation search, line mask bounds.
#[derive(Debug, Clone, Default)]
pub struct LineFrameDetector {
    pub config: DetectorConfig,
}

impl LineFrameDetector {
    pub fn new(config: DetectorConfig) -> Self {
        Self { config }
    }
}

impl BoundaryDetector for LineFrameDetector {
    fn name(&self) -> &str {
        "line frame"
    }

    #[instrument(skip_all, fields(detector = "line frame"))]
    fn detect(&self, image: &GrayImage, reporter: &dyn Reporter) -> Result<BoundingBox> {
        let edges = edge_map(image, &self.config.preprocess);
        reporter.report("edge map", image, &edges)?;

        let found = search_rotated_rectangle(&edges, &self.config, reporter)?;
        Ok(found.bounds)
    }
}

/// Adaptive-threshold contour strategy.
#[derive(Debug, Clone, Default)]
pub struct ContourDetector {
    pub config: DetectorConfig,
}

impl ContourDetector {
    pub fn new(config: DetectorConfig) -> Self {
        Self { config }
    }
}

impl BoundaryDetector for ContourDetector {
    fn name(&self) -> &str {
        "contour"
    }

    fn detect(&self, image: &GrayImage, _reporter: &dyn Reporter) -> Result<BoundingBox> {
        estimate_gray_bounds(image, &self.config)
    }
}

/// Tries each detector in turn, moving on only after a recoverable failure.
pub struct FallbackDetector {
    detectors: Vec<Box<dyn BoundaryDetector>>,
}

impl FallbackDetector {
    pub fn new() -> Self {
        Self {
            detectors: Vec::new(),
        }
    }

    /// Lines first, contours second.
    pub fn standard(config: &DetectorConfig) -> Self {
        Self::new()
            .then(Box::new(LineFrameDetector::new(config.clone())))
            .then(Box::new(ContourDetector::new(config.clone())))
    }

    pub fn then(mut self, detector: Box<dyn BoundaryDetector>) -> Self {
        self.detectors.push(detector);
        self
    }

    pub fn len(&self) -> usize {
        self.detectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.detectors.is_empty()
    }
}

impl Default for FallbackDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl BoundaryDetector for FallbackDetector {
    fn name(&self) -> &str {
        "fallback"
    }

    fn detect(&self, image: &GrayImage, reporter: &dyn Reporter) -> Result<BoundingBox> {
        let mut last_error = BoundaryError::NotFound { attempts: 0 };

        for detector in &self.detectors {
            match detector.detect(image, reporter) {
                Ok(bbox) => {
                    info!(detector = detector.name(), %bbox, "Frame located");
                    return Ok(bbox);
                }
                Err(err) if err.is_recoverable() => {
                    warn!(detector = detector.name(), %err, "Detector failed, trying next");
                    last_error = err;
                }
                Err(err) => return Err(err),
            }
        }

        Err(last_error)
    }
}
