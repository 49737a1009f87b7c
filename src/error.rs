use thiserror::Error;

use crate::models::BoundingBox;

/// Errors produced by the boundary detection strategies and the crop utility.
///
/// Most variants describe an ordinary "nothing found" outcome rather than a
/// fault; see [`BoundaryError::is_recoverable`].
#[derive(Debug, Error)]
pub enum BoundaryError {
    #[error("no rectangular frame found after {attempts} rotation trials")]
    NotFound { attempts: usize },

    #[error("no contour survived filtering; bounding box is empty")]
    EmptyBoundingBox,

    #[error("bounding box {bbox} exceeds image extent {width}x{height}")]
    OutOfRange {
        bbox: BoundingBox,
        width: u32,
        height: u32,
    },

    #[error("{axis} projection has zero variance")]
    DegenerateProjection { axis: &'static str },

    #[error("no threshold level isolates the foreground (stopped at {last_level})")]
    NoSuitableThreshold { last_level: u8 },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("configuration parse error: {0}")]
    Config(#[from] serde_json::Error),
}

impl BoundaryError {
    /// Whether a caller should fall back to another strategy instead of failing.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            BoundaryError::NotFound { .. }
                | BoundaryError::EmptyBoundingBox
                | BoundaryError::NoSuitableThreshold { .. }
                | BoundaryError::DegenerateProjection { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, BoundaryError>;
