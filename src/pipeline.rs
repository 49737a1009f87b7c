use image::DynamicImage;
use std::sync::Arc;
use std::collections::HashMap;
use anyhow::Result;
use tracing::{debug, info};

use crate::models::BoundingBox;
use crate::report::{file_stem, prepare_empty_dir};

/// Data that flows through the pipeline
/// Each PipelineData is one image (or derived image) with associated metadata
#[derive(Clone)]
pub struct PipelineData {
    /// The current image (edge map, mask, crop, ...)
    pub image: DynamicImage,

    /// Reference to the original image (shared efficiently via Arc)
    pub original: Arc<DynamicImage>,

    /// Frame bounding box in the original image, once a step has found one
    pub bbox: Option<BoundingBox>,

    /// Metadata for tracking properties (e.g., "rotation_angle", "threshold_level")
    pub metadata: HashMap<String, MetadataValue>,
}

/// Metadata value types
#[derive(Debug, Clone, PartialEq)]
pub enum MetadataValue {
    String(String),
    Int(i32),
}

impl PipelineData {
    /// Create PipelineData for a full image
    pub fn from_image(image: DynamicImage) -> Self {
        let original = Arc::new(image.clone());
        Self {
            image,
            original,
            bbox: None,
            metadata: HashMap::new(),
        }
    }

    /// Replace the working image, keeping original, bbox and metadata
    pub fn with_image(mut self, image: DynamicImage) -> Self {
        self.image = image;
        self
    }

    /// Add metadata
    pub fn with_metadata(mut self, key: impl Into<String>, value: MetadataValue) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    /// Get metadata as int
    pub fn get_int(&self, key: &str) -> Option<i32> {
        match self.metadata.get(key) {
            Some(MetadataValue::Int(v)) => Some(*v),
            _ => None,
        }
    }

    /// Get metadata as string
    pub fn get_string(&self, key: &str) -> Option<&str> {
        match self.metadata.get(key) {
            Some(MetadataValue::String(v)) => Some(v.as_str()),
            _ => None,
        }
    }
}

/// Debug configuration for pipeline execution
#[derive(Clone, Debug)]
pub struct DebugConfig {
    /// Root directory for debug outputs
    pub output_dir: std::path::PathBuf,
    /// Whether debug mode is enabled
    pub enabled: bool,
}

/// Context available to all pipeline steps
#[derive(Clone, Default)]
pub struct PipelineContext {
    pub debug: Option<DebugConfig>,
}

/// Trait that all pipeline steps must implement
pub trait PipelineStep: Send + Sync {
    /// Process data and return transformed data
    /// Steps can transform (many → many) or filter (many → fewer) items
    fn process(&self, data: Vec<PipelineData>, context: &PipelineContext) -> Result<Vec<PipelineData>>;

    /// Human-readable name for this step (used in logs and debug directories)
    fn name(&self) -> &str;
}

/// Composable pipeline builder
pub struct Pipeline {
    steps: Vec<Arc<dyn PipelineStep>>,
    context: PipelineContext,
}

impl Pipeline {
    /// Create a new empty pipeline
    pub fn new() -> Self {
        Self {
            steps: Vec::new(),
            context: PipelineContext::default(),
        }
    }

    /// Enable debug mode with output directory
    /// The directory must be empty or non-existent
    pub fn with_debug(mut self, output_dir: std::path::PathBuf) -> Result<Self> {
        prepare_empty_dir(&output_dir)?;

        self.context.debug = Some(DebugConfig {
            output_dir,
            enabled: true,
        });

        Ok(self)
    }

    /// Add a processing step to the pipeline
    pub fn add_step(mut self, step: Arc<dyn PipelineStep>) -> Self {
        self.steps.push(step);
        self
    }

    /// Helper method to add a step from a Box (for convenience)
    pub fn add_step_boxed(mut self, step: Box<dyn PipelineStep>) -> Self {
        self.steps.push(Arc::from(step));
        self
    }

    /// Number of steps in the pipeline
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Run every step sequentially on an input image
    pub fn run(&self, input: DynamicImage) -> Result<Vec<PipelineData>> {
        self.run_partial(input, self.steps.len())
    }

    /// Run the pipeline but stop after `num_steps` steps (useful for debugging)
    pub fn run_partial(&self, input: DynamicImage, num_steps: usize) -> Result<Vec<PipelineData>> {
        self.save_debug_images("00_input", std::slice::from_ref(&input))?;

        let mut data = vec![PipelineData::from_image(input)];

        for (step_idx, step) in self.steps.iter().take(num_steps).enumerate() {
            info!(step = step.name(), items = data.len(), "Running step");
            data = step.process(data, &self.context)?;

            let step_dir_name = format!("{:02}_{}", step_idx + 1, file_stem(step.name()));
            let images: Vec<DynamicImage> = data.iter().map(|item| item.image.clone()).collect();
            self.save_debug_images(&step_dir_name, &images)?;

            debug!(step = step.name(), items = data.len(), "Step finished");
        }

        Ok(data)
    }

    fn save_debug_images(&self, dir_name: &str, images: &[DynamicImage]) -> Result<()> {
        let Some(debug_config) = &self.context.debug else {
            return Ok(());
        };
        if !debug_config.enabled {
            return Ok(());
        }

        let step_dir = debug_config.output_dir.join(dir_name);
        std::fs::create_dir_all(&step_dir)?;

        for (idx, image) in images.iter().enumerate() {
            let output_path = step_dir.join(format!("{:02}.png", idx + 1));
            image.save(&output_path)
                .map_err(|e| anyhow::anyhow!("Failed to save debug image: {}", e))?;
        }

        debug!(count = images.len(), dir = dir_name, "Saved debug images");
        Ok(())
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}
