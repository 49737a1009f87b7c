use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use image::{GrayImage, Luma};
use tracing::debug;

use crate::error::{BoundaryError, Result};

/// Receives (original, modified) image pairs as detection progresses.
pub trait Reporter: Send + Sync {
    fn report(&self, stage: &str, original: &GrayImage, modified: &GrayImage) -> Result<()>;
}

/// Discards every report.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullReporter;

impl Reporter for NullReporter {
    fn report(&self, _stage: &str, _original: &GrayImage, _modified: &GrayImage) -> Result<()> {
        Ok(())
    }
}

/// Writes each pair as one side-by-side PNG into a debug directory.
///
/// Files are named `NN_stage_name.png` in report order.
#[derive(Debug)]
pub struct DebugDirReporter {
    output_dir: PathBuf,
    counter: AtomicUsize,
}

impl DebugDirReporter {
    /// The directory must be empty or non-existent.
    pub fn new(output_dir: impl Into<PathBuf>) -> Result<Self> {
        let output_dir = output_dir.into();
        prepare_empty_dir(&output_dir)?;
        Ok(Self {
            output_dir,
            counter: AtomicUsize::new(0),
        })
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }
}

impl Reporter for DebugDirReporter {
    fn report(&self, stage: &str, original: &GrayImage, modified: &GrayImage) -> Result<()> {
        let index = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        let filename = format!("{:02}_{}.png", index, file_stem(stage));
        let path = self.output_dir.join(&filename);
        side_by_side(original, modified).save(&path)?;
        debug!(file = %filename, "Saved debug report");
        Ok(())
    }
}

/// Check that `dir` is empty, creating it if it does not exist.
pub fn prepare_empty_dir(dir: &Path) -> Result<()> {
    if dir.exists() {
        let entries = std::fs::read_dir(dir)?;
        if entries.count() > 0 {
            return Err(BoundaryError::InvalidConfig(format!(
                "debug directory is not empty: {}",
                dir.display()
            )));
        }
    } else {
        std::fs::create_dir_all(dir)?;
    }
    Ok(())
}

/// Lower-case, underscore-separated form of a step or stage name.
pub fn file_stem(name: &str) -> String {
    name.to_lowercase().replace(' ', "_")
}

const SEPARATOR: u32 = 4;

/// Place two images next to each other on a black canvas.
pub fn side_by_side(left: &GrayImage, right: &GrayImage) -> GrayImage {
    let width = left.width() + SEPARATOR + right.width();
    let height = left.height().max(right.height());
    let mut canvas = GrayImage::from_pixel(width, height, Luma([0u8]));
    image::imageops::overlay(&mut canvas, left, 0, 0);
    image::imageops::overlay(
        &mut canvas,
        right,
        (left.width() + SEPARATOR) as i64,
        0,
    );
    canvas
}
