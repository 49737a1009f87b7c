//! Morphological extraction of long horizontal and vertical strokes.
//!
//! Each axis is opened (eroded, then dilated) with a one-pixel-thick
//! rectangular kernel whose length is a fraction of that axis. Strokes
//! shorter than the kernel vanish; longer ones survive with their original
//! extent and intensity profile.

use std::collections::VecDeque;

use image::{GrayImage, ImageBuffer, Luma};
use tracing::trace;

/// Line mask: sum of the vertical and horizontal opening passes.
///
/// Stored as 16 bit so that intersections (where both passes contribute)
/// can exceed 255 without wrapping.
pub type LineMask = ImageBuffer<Luma<u16>, Vec<u16>>;

/// The two single-axis passes that make up a [`LineMask`].
#[derive(Debug, Clone)]
pub struct LinePasses {
    pub vertical: GrayImage,
    pub horizontal: GrayImage,
}

impl LinePasses {
    /// Pixel-wise sum of both passes.
    pub fn combine(&self) -> LineMask {
        LineMask::from_fn(self.vertical.width(), self.vertical.height(), |x, y| {
            let v = self.vertical.get_pixel(x, y)[0] as u16;
            let h = self.horizontal.get_pixel(x, y)[0] as u16;
            Luma([v + h])
        })
    }
}

/// Keep only strokes at least `min_line_fraction` of the axis length long.
pub fn extract_lines(edge_map: &GrayImage, min_line_fraction: f64) -> LineMask {
    extract_line_passes(edge_map, min_line_fraction).combine()
}

/// Vertical and horizontal openings of the edge map, kept separate.
pub fn extract_line_passes(edge_map: &GrayImage, min_line_fraction: f64) -> LinePasses {
    let (width, height) = edge_map.dimensions();
    let vertical_len = kernel_length(height, min_line_fraction);
    let horizontal_len = kernel_length(width, min_line_fraction);
    trace!(vertical_len, horizontal_len, "Line kernels");

    LinePasses {
        vertical: open_columns(edge_map, vertical_len),
        horizontal: open_rows(edge_map, horizontal_len),
    }
}

/// Rescale a mask into 8 bits for display or debug output.
pub fn mask_to_gray(mask: &LineMask) -> GrayImage {
    let peak = mask.pixels().map(|p| p[0]).max().unwrap_or(0);
    if peak == 0 {
        return GrayImage::new(mask.width(), mask.height());
    }
    GrayImage::from_fn(mask.width(), mask.height(), |x, y| {
        let v = mask.get_pixel(x, y)[0] as u32;
        Luma([(v * 255 / peak as u32) as u8])
    })
}

fn kernel_length(axis: u32, fraction: f64) -> usize {
    let len = (fraction * axis as f64).round() as usize;
    len.clamp(1, (axis as usize).max(1))
}

fn open_rows(img: &GrayImage, kernel: usize) -> GrayImage {
    let (width, height) = img.dimensions();
    let mut out = GrayImage::new(width, height);
    let mut line = vec![0u8; width as usize];
    for y in 0..height {
        for x in 0..width {
            line[x as usize] = img.get_pixel(x, y)[0];
        }
        let opened = open_line(&line, kernel);
        for x in 0..width {
            out.put_pixel(x, y, Luma([opened[x as usize]]));
        }
    }
    out
}

fn open_columns(img: &GrayImage, kernel: usize) -> GrayImage {
    let (width, height) = img.dimensions();
    let mut out = GrayImage::new(width, height);
    let mut line = vec![0u8; height as usize];
    for x in 0..width {
        for y in 0..height {
            line[y as usize] = img.get_pixel(x, y)[0];
        }
        let opened = open_line(&line, kernel);
        for y in 0..height {
            out.put_pixel(x, y, Luma([opened[y as usize]]));
        }
    }
    out
}

/// 1-D grayscale opening with a flat kernel of length `kernel`.
///
/// The erosion window for output `i` is `i - anchor ..= i + kernel - 1 - anchor`
/// and the dilation uses the mirrored window, so the pair is a true opening.
fn open_line(line: &[u8], kernel: usize) -> Vec<u8> {
    let anchor = kernel / 2;
    let tail = kernel - 1 - anchor;
    let eroded = sliding_extreme(line, anchor, tail, |a, b| a <= b);
    sliding_extreme(&eroded, tail, anchor, |a, b| a >= b)
}

/// Windowed min/max over `i - before ..= i + after`, clipped to the slice.
///
/// `dominates(a, b)` is true when `a` should replace `b` as the window
/// extreme. Runs in linear time using a monotonic deque of indices.
fn sliding_extreme(
    src: &[u8],
    before: usize,
    after: usize,
    dominates: fn(u8, u8) -> bool,
) -> Vec<u8> {
    let n = src.len();
    let mut out = vec![0u8; n];
    let mut window: VecDeque<usize> = VecDeque::new();
    let mut next = 0usize;

    for (i, slot) in out.iter_mut().enumerate() {
        let right = (i + after).min(n - 1);
        while next <= right {
            while let Some(&back) = window.back() {
                if dominates(src[next], src[back]) {
                    window.pop_back();
                } else {
                    break;
                }
            }
            window.push_back(next);
            next += 1;
        }

        let left = i.saturating_sub(before);
        while let Some(&front) = window.front() {
            if front < left {
                window.pop_front();
            } else {
                break;
            }
        }

        if let Some(&best) = window.front() {
            *slot = src[best];
        }
    }

    out
}
