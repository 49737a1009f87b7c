//! Search for a frame over small rotations of the edge map.
//!
//! Slightly skewed photographs turn the frame's border lines into diagonal
//! strokes that the axis-aligned line extractor erodes away. Rotating the
//! edge map by a few degrees realigns them.

use image::{GrayImage, Luma};
use imageproc::geometric_transformations::{Interpolation, rotate_about_center};
use tracing::{debug, info, instrument, warn};

use crate::config::DetectorConfig;
use crate::detection::lines::{LineMask, LinePasses, extract_line_passes, mask_to_gray};
use crate::detection::rectangle::rectangle_bounds;
use crate::error::{BoundaryError, Result};
use crate::models::BoundingBox;
use crate::report::Reporter;

/// Outcome of a successful rotation search.
#[derive(Debug, Clone)]
pub struct RotationMatch {
    /// Line mask, rotated back into the frame of the input edge map.
    pub mask: LineMask,
    /// Trial angle (degrees, positive is counter-clockwise) that produced the match.
    pub angle: i32,
    /// Number of angles tried, including the successful one.
    pub attempts: usize,
    /// Envelope of the detected frame in the input edge map's coordinates.
    pub bounds: BoundingBox,
}

/// Angles tried by [`search_rotated_rectangle`], in order.
///
/// Zero comes first, then every angle from `-(range / 2)` up to but not
/// including `range / 2`. Zero is not repeated in the second pass, so an
/// even `range` yields exactly `range` distinct angles.
pub fn trial_angles(rotation_range: i32) -> Vec<i32> {
    let half = rotation_range / 2;
    std::iter::once(0)
        .chain((-half..half).filter(|&angle| angle != 0))
        .collect()
}

/// Rotate a grayscale image counter-clockwise by `degrees` about its centre,
/// keeping the canvas size.
///
/// Uncovered pixels are filled with zero. A zero angle returns an exact copy.
pub fn rotate_gray(img: &GrayImage, degrees: i32) -> GrayImage {
    if degrees == 0 {
        return img.clone();
    }
    rotate_about_center(
        img,
        // imageproc turns clockwise for positive angles.
        -(degrees as f32).to_radians(),
        Interpolation::Bilinear,
        Luma([0u8]),
    )
}

/// Map a box found in an image rotated by `degrees` back into the unrotated
/// image and return its axis-aligned envelope, clipped to the image.
pub fn unrotate_bounds(bbox: &BoundingBox, degrees: i32, width: u32, height: u32) -> BoundingBox {
    if degrees == 0 {
        return *bbox;
    }
    let (sin, cos) = (degrees as f64).to_radians().sin_cos();
    let (cx, cy) = (width as f64 / 2.0, height as f64 / 2.0);
    let corners = [
        (bbox.min_x, bbox.min_y),
        (bbox.max_x, bbox.min_y),
        (bbox.max_x, bbox.max_y),
        (bbox.min_x, bbox.max_y),
    ];

    let (mut min_x, mut min_y) = (f64::MAX, f64::MAX);
    let (mut max_x, mut max_y) = (f64::MIN, f64::MIN);
    for (x, y) in corners {
        let (dx, dy) = (x as f64 - cx, y as f64 - cy);
        let ox = cx + cos * dx - sin * dy;
        let oy = cy + sin * dx + cos * dy;
        min_x = min_x.min(ox);
        min_y = min_y.min(oy);
        max_x = max_x.max(ox);
        max_y = max_y.max(oy);
    }

    let clip = |v: f64, hi: u32| v.clamp(0.0, hi as f64);
    BoundingBox::new(
        clip(min_x.floor(), width) as u32,
        clip(min_y.floor(), height) as u32,
        clip(max_x.ceil(), width) as u32,
        clip(max_y.ceil(), height) as u32,
    )
}

fn rotate_passes(passes: &LinePasses, degrees: i32) -> LinePasses {
    LinePasses {
        vertical: rotate_gray(&passes.vertical, degrees),
        horizontal: rotate_gray(&passes.horizontal, degrees),
    }
}

/// Try each angle from [`trial_angles`] until the line mask of the rotated
/// edge map looks like a rectangle.
///
/// Every trial rotates the original edge map, never a previous trial's
/// output. The first success wins.
#[instrument(skip_all, fields(width = edge_map.width(), height = edge_map.height()))]
pub fn search_rotated_rectangle(
    edge_map: &GrayImage,
    config: &DetectorConfig,
    reporter: &dyn Reporter,
) -> Result<RotationMatch> {
    let angles = trial_angles(config.rotation_range);
    let limit = config.max_search_trials.unwrap_or(angles.len());
    let mut attempts = 0usize;

    for angle in angles.into_iter().take(limit) {
        attempts += 1;
        debug!(angle, attempts, "Trying rotation");

        let rotated = rotate_gray(edge_map, angle);
        let passes = extract_line_passes(&rotated, config.min_line_fraction);
        let Some(rotated_bounds) = rectangle_bounds(&passes.combine(), config) else {
            continue;
        };

        let mask = rotate_passes(&passes, -angle).combine();
        let bounds = unrotate_bounds(&rotated_bounds, angle, edge_map.width(), edge_map.height());
        info!(angle, attempts, %bounds, "Rectangle found");
        reporter.report("rotation search", edge_map, &mask_to_gray(&mask))?;

        return Ok(RotationMatch {
            mask,
            angle,
            attempts,
            bounds,
        });
    }

    warn!(attempts, "No rectangle found at any rotation");
    Err(BoundaryError::NotFound { attempts })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::NullReporter;

    #[test]
    fn default_range_tries_thirty_distinct_angles() {
        let angles = trial_angles(30);
        assert_eq!(angles.len(), 30);
        assert_eq!(angles[0], 0);
        assert_eq!(angles[1], -15);
        assert_eq!(*angles.last().unwrap(), 14);
        assert_eq!(angles.iter().filter(|&&a| a == 0).count(), 1);
        assert!(!angles.contains(&15));
    }

    #[test]
    fn tiny_ranges_only_try_zero() {
        assert_eq!(trial_angles(0), vec![0]);
        assert_eq!(trial_angles(1), vec![0]);
        assert_eq!(trial_angles(2), vec![0, -1]);
    }

    #[test]
    fn odd_range_truncates_half_width() {
        assert_eq!(trial_angles(5), vec![0, -2, -1, 1]);
    }

    #[test]
    fn zero_rotation_is_identity() {
        let img = GrayImage::from_fn(9, 7, |x, y| Luma([(x * 20 + y) as u8]));
        assert_eq!(rotate_gray(&img, 0), img);
    }

    #[test]
    fn positive_angle_turns_counter_clockwise() {
        // A dot right of centre moves up when turned counter-clockwise.
        let mut img = GrayImage::new(41, 41);
        for y in 19..22 {
            for x in 29..32 {
                img.put_pixel(x, y, Luma([255]));
            }
        }
        let turned = rotate_gray(&img, 10);
        let (mut sum_y, mut count) = (0u32, 0u32);
        for (_, y, p) in turned.enumerate_pixels() {
            if p[0] > 128 {
                sum_y += y;
                count += 1;
            }
        }
        assert!(count > 0);
        assert!(sum_y / count < 20);
    }

    #[test]
    fn unrotate_maps_point_back_through_the_same_turn() {
        // Top right after a quarter turn counter-clockwise is bottom right before it.
        let found = BoundingBox::new(60, 10, 70, 20);
        let back = unrotate_bounds(&found, 90, 100, 100);
        assert!((79..=80).contains(&back.min_x) && (90..=91).contains(&back.max_x), "got {back}");
        assert!((59..=60).contains(&back.min_y) && (70..=71).contains(&back.max_y), "got {back}");
    }

    #[test]
    fn unrotate_is_identity_at_zero() {
        let bbox = BoundingBox::new(10, 20, 90, 70);
        assert_eq!(unrotate_bounds(&bbox, 0, 100, 100), bbox);
    }

    #[test]
    fn unrotated_envelope_contains_box_and_stays_in_image() {
        let bbox = BoundingBox::new(20, 20, 80, 80);
        let back = unrotate_bounds(&bbox, 10, 100, 100);
        assert!(back.min_x < 20 && back.min_y < 20);
        assert!(back.max_x > 80 && back.max_y > 80);
        assert!(back.fits_within(100, 100));

        let full = unrotate_bounds(&BoundingBox::new(0, 0, 100, 100), -7, 100, 100);
        assert_eq!(full, BoundingBox::new(0, 0, 100, 100));
    }

    #[test]
    fn trial_cap_limits_attempts() {
        let config = DetectorConfig::default().with_max_search_trials(3);
        let blank = GrayImage::new(60, 60);
        match search_rotated_rectangle(&blank, &config, &NullReporter) {
            Err(BoundaryError::NotFound { attempts }) => assert_eq!(attempts, 3),
            other => panic!("expected NotFound, got {other:?}"),
        }
    }
}
