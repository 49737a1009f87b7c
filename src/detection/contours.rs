use image::{DynamicImage, GrayImage, Luma};
use imageproc::contours::BorderType;
use tracing::{debug, instrument};

use crate::config::DetectorConfig;
use crate::error::{BoundaryError, Result};
use crate::models::{BoundingBox, Contour};

/// Binarized image together with the level that produced it.
#[derive(Debug, Clone)]
pub struct ThresholdResult {
    pub level: u8,
    pub foreground_fraction: f64,
    pub binary: GrayImage,
}

/// Pixels strictly above `level` become 255, the rest 0.
pub fn threshold_binary(gray: &GrayImage, level: u8) -> GrayImage {
    GrayImage::from_fn(gray.width(), gray.height(), |x, y| {
        if gray.get_pixel(x, y)[0] > level {
            Luma([255u8])
        } else {
            Luma([0u8])
        }
    })
}

/// Fraction of nonzero pixels; 0 for an empty image.
pub fn foreground_fraction(binary: &GrayImage) -> f64 {
    let total = binary.width() as u64 * binary.height() as u64;
    if total == 0 {
        return 0.0;
    }
    let white = binary.pixels().filter(|p| p[0] > 0).count() as u64;
    white as f64 / total as f64
}

/// Raise the threshold level until the foreground no longer swamps the image.
///
/// Starts at `threshold_start` and steps by `threshold_step` while the white
/// fraction is above `contour_white_fraction_limit`. Gives up once the next
/// level would pass `threshold_max` or after `max_threshold_iterations`.
pub fn adaptive_threshold(gray: &GrayImage, config: &DetectorConfig) -> Result<ThresholdResult> {
    let mut level = config.threshold_start;
    let mut iterations = 0usize;

    loop {
        let binary = threshold_binary(gray, level);
        let fraction = foreground_fraction(&binary);
        iterations += 1;
        debug!(level, fraction, "Threshold level tried");

        if fraction <= config.contour_white_fraction_limit {
            return Ok(ThresholdResult {
                level,
                foreground_fraction: fraction,
                binary,
            });
        }

        let next = level
            .checked_add(config.threshold_step)
            .filter(|&next| next <= config.threshold_max);
        match next {
            Some(next) if iterations < config.max_threshold_iterations => level = next,
            _ => return Err(BoundaryError::NoSuitableThreshold { last_level: level }),
        }
    }
}

/// All region borders (outer and hole) of a binary image.
pub fn find_contours(binary: &GrayImage) -> Vec<Contour> {
    imageproc::contours::find_contours::<u32>(binary)
        .into_iter()
        .filter_map(|c| Contour::new(c.points, c.border_type == BorderType::Hole))
        .collect()
}

/// Whether a contour is a plausible piece of the frame.
///
/// Rejects contours that are too narrow or short, that cover too much of
/// the image (background), or that enclose too little (speckle).
pub fn contour_ok(contour: &Contour, image_area: f64, config: &DetectorConfig) -> bool {
    if contour.width() < config.contour_min_dim || contour.height() < config.contour_min_dim {
        return false;
    }
    let area = contour.area();
    if area > image_area * config.contour_max_area_fraction {
        return false;
    }
    area >= config.contour_min_area
}

/// Union of the contours' bounding rectangles.
pub fn union_bounds<'a>(contours: impl IntoIterator<Item = &'a Contour>) -> Option<BoundingBox> {
    contours
        .into_iter()
        .map(Contour::bounding_rect)
        .reduce(|acc, rect| acc.union(&rect))
}

/// Threshold, extract and filter contours in one pass.
#[derive(Debug, Clone)]
pub struct ContourSearch {
    pub threshold: ThresholdResult,
    /// Number of contours before filtering.
    pub found: usize,
    /// Contours that passed [`contour_ok`].
    pub accepted: Vec<Contour>,
}

impl ContourSearch {
    /// Union of the accepted contours' rectangles.
    pub fn bounds(&self) -> Result<BoundingBox> {
        union_bounds(&self.accepted).ok_or(BoundaryError::EmptyBoundingBox)
    }
}

pub fn search_contours(gray: &GrayImage, config: &DetectorConfig) -> Result<ContourSearch> {
    let threshold = adaptive_threshold(gray, config)?;
    let contours = find_contours(&threshold.binary);
    let found = contours.len();
    let image_area = gray.width() as f64 * gray.height() as f64;

    let accepted: Vec<Contour> = contours
        .into_iter()
        .filter(|c| contour_ok(c, image_area, config))
        .collect();
    debug!(
        level = threshold.level,
        found,
        accepted = accepted.len(),
        "Contours filtered"
    );

    Ok(ContourSearch {
        threshold,
        found,
        accepted,
    })
}

/// Propose a frame bounding box from the raw image.
pub fn estimate_bounds(image: &DynamicImage, config: &DetectorConfig) -> Result<BoundingBox> {
    estimate_gray_bounds(&image.to_luma8(), config)
}

#[instrument(skip_all, fields(width = gray.width(), height = gray.height()))]
pub fn estimate_gray_bounds(gray: &GrayImage, config: &DetectorConfig) -> Result<BoundingBox> {
    search_contours(gray, config)?.bounds()
}
