use framefind::BoundingBox;
use image::{GrayImage, Luma};

/// Deterministic linear congruential generator for reproducible fixtures.
pub struct Lcg(u64);

impl Lcg {
    pub fn new(seed: u64) -> Self {
        Self(seed)
    }

    pub fn next_u32(&mut self) -> u32 {
        self.0 = self.0.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        (self.0 >> 33) as u32
    }
}

/// Edge map with an axis-aligned one-pixel frame `inset` pixels from each side.
pub fn framed_edge_map(size: u32, inset: u32) -> GrayImage {
    let far = size - 1 - inset;
    GrayImage::from_fn(size, size, |x, y| {
        let on_row = (y == inset || y == far) && (inset..=far).contains(&x);
        let on_col = (x == inset || x == far) && (inset..=far).contains(&y);
        if on_row || on_col { Luma([255u8]) } else { Luma([0u8]) }
    })
}

/// Edge map with a square frame of half side `half_side`, turned clockwise
/// by `degrees` about the image centre (negative turns counter-clockwise). Border bands are
/// `2 * half_thickness` pixels wide.
pub fn rotated_frame_edge_map(size: u32, half_side: f64, degrees: f64, half_thickness: f64) -> GrayImage {
    let c = size as f64 / 2.0;
    let (sin, cos) = degrees.to_radians().sin_cos();
    GrayImage::from_fn(size, size, |x, y| {
        let (dx, dy) = (x as f64 - c, y as f64 - c);
        // Undo the rotation to test against the upright square.
        let u = cos * dx + sin * dy;
        let v = -sin * dx + cos * dy;
        let near_vertical = (u.abs() - half_side).abs() <= half_thickness && v.abs() <= half_side + half_thickness;
        let near_horizontal = (v.abs() - half_side).abs() <= half_thickness && u.abs() <= half_side + half_thickness;
        if near_vertical || near_horizontal { Luma([255u8]) } else { Luma([0u8]) }
    })
}

/// Sparse salt noise: roughly `density` of the pixels are 255.
pub fn noise_image(width: u32, height: u32, seed: u64, density: f64) -> GrayImage {
    let mut rng = Lcg::new(seed);
    let cutoff = (density * u32::MAX as f64 / 2.0) as u32;
    GrayImage::from_fn(width, height, |_, _| {
        if rng.next_u32() < cutoff { Luma([255u8]) } else { Luma([0u8]) }
    })
}

/// Dark backdrop with a bright "page" covering `page`, both with a little
/// deterministic grain.
pub fn page_photo(width: u32, height: u32, page: BoundingBox) -> GrayImage {
    let mut rng = Lcg::new(7);
    GrayImage::from_fn(width, height, |x, y| {
        let grain = (rng.next_u32() % 21) as i32 - 10;
        let inside = x >= page.min_x && x < page.max_x && y >= page.min_y && y < page.max_y;
        let base = if inside { 235 } else { 40 };
        Luma([(base + grain) as u8])
    })
}

/// Noise-free version of [`page_photo`].
pub fn flat_page_photo(width: u32, height: u32, page: BoundingBox) -> GrayImage {
    GrayImage::from_fn(width, height, |x, y| {
        let inside = x >= page.min_x && x < page.max_x && y >= page.min_y && y < page.max_y;
        if inside { Luma([230u8]) } else { Luma([35u8]) }
    })
}
