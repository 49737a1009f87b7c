pub mod config;
pub mod detection;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod report;

pub use config::{DetectorConfig, PreprocessConfig};
pub use detection::{BoundaryDetector, ContourDetector, FallbackDetector, LineFrameDetector};
pub use error::BoundaryError;
pub use models::{BoundingBox, Contour};
pub use pipeline::{
    DebugConfig, MetadataValue, Pipeline, PipelineContext, PipelineData, PipelineStep,
};
pub use report::{DebugDirReporter, NullReporter, Reporter};
