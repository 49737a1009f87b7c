use image::{DynamicImage, GrayImage};
use imageproc::edges::canny;
use imageproc::filter::{gaussian_blur_f32, median_filter};

use crate::config::PreprocessConfig;

/// Convert image to grayscale
pub fn to_grayscale(img: &DynamicImage) -> GrayImage {
    img.to_luma8()
}

/// Suppress sensor noise with a median filter
pub fn denoise(img: &GrayImage, radius: u32) -> GrayImage {
    if radius == 0 {
        return img.clone();
    }
    median_filter(img, radius, radius)
}

/// Detect edges using Canny edge detector
pub fn detect_edges(img: &GrayImage, low_threshold: f32, high_threshold: f32) -> GrayImage {
    canny(img, low_threshold, high_threshold)
}

/// Gaussian smoothing so that thin, slightly broken edges merge into strokes
pub fn smooth(img: &GrayImage, sigma: f32) -> GrayImage {
    if sigma <= 0.0 {
        return img.clone();
    }
    gaussian_blur_f32(img, sigma)
}

/// Full preprocessing chain: denoise, Canny, smooth.
pub fn edge_map(img: &GrayImage, config: &PreprocessConfig) -> GrayImage {
    let denoised = denoise(img, config.denoise_radius);
    let edges = detect_edges(&denoised, config.canny_low, config.canny_high);
    smooth(&edges, config.smoothing_sigma)
}
