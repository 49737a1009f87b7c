use image::{DynamicImage, GenericImageView, GrayImage};

use crate::error::{BoundaryError, Result};
use crate::models::BoundingBox;

fn check_bounds(bbox: &BoundingBox, width: u32, height: u32) -> Result<()> {
    if bbox.is_empty() {
        return Err(BoundaryError::EmptyBoundingBox);
    }
    if !bbox.fits_within(width, height) {
        return Err(BoundaryError::OutOfRange {
            bbox: *bbox,
            width,
            height,
        });
    }
    Ok(())
}

/// Cut `bbox` out of a grayscale image.
pub fn crop(image: &GrayImage, bbox: &BoundingBox) -> Result<GrayImage> {
    check_bounds(bbox, image.width(), image.height())?;
    Ok(image::imageops::crop_imm(image, bbox.min_x, bbox.min_y, bbox.width(), bbox.height()).to_image())
}

/// Cut `bbox` out of an image of any colour type.
pub fn crop_dynamic(image: &DynamicImage, bbox: &BoundingBox) -> Result<DynamicImage> {
    let (width, height) = image.dimensions();
    check_bounds(bbox, width, height)?;
    Ok(image.crop_imm(bbox.min_x, bbox.min_y, bbox.width(), bbox.height()))
}
