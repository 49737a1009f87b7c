#![allow(dead_code)]

mod fixtures;
pub use fixtures::*;

// Re-export commonly used types from framefind for tests
#[allow(unused_imports)]
pub use framefind::{BoundaryError, BoundingBox, DetectorConfig, NullReporter};
