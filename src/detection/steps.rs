use crate::pipeline::{PipelineData, PipelineStep, PipelineContext, MetadataValue};
use crate::config::DetectorConfig;
use crate::detection::{contours, crop, lines, preprocessing, rotation};
use crate::detection::strategy::BoundaryDetector;
use crate::report::NullReporter;
use anyhow::Result;
use image::DynamicImage;
use std::sync::Arc;
use tracing::info;

/// Convert image to grayscale
pub struct GrayscaleStep;

impl PipelineStep for GrayscaleStep {
    fn process(&self, data: Vec<PipelineData>, _context: &PipelineContext) -> Result<Vec<PipelineData>> {
        Ok(data
            .into_iter()
            .map(|item| {
                let gray = preprocessing::to_grayscale(&item.image);
                item.with_image(DynamicImage::ImageLuma8(gray))
            })
            .collect())
    }

    fn name(&self) -> &str {
        "Grayscale Conversion"
    }
}

/// Median-filter denoising
pub struct DenoiseStep {
    pub radius: u32,
}

impl PipelineStep for DenoiseStep {
    fn process(&self, data: Vec<PipelineData>, _context: &PipelineContext) -> Result<Vec<PipelineData>> {
        Ok(data
            .into_iter()
            .map(|item| {
                let denoised = preprocessing::denoise(&item.image.to_luma8(), self.radius);
                item.with_image(DynamicImage::ImageLuma8(denoised))
            })
            .collect())
    }

    fn name(&self) -> &str {
        "Denoise"
    }
}

/// Detect edges using Canny
pub struct EdgeDetectionStep {
    pub low_threshold: f32,
    pub high_threshold: f32,
}

impl PipelineStep for EdgeDetectionStep {
    fn process(&self, data: Vec<PipelineData>, _context: &PipelineContext) -> Result<Vec<PipelineData>> {
        Ok(data
            .into_iter()
            .map(|item| {
                let gray = item.image.to_luma8();
                let edges = preprocessing::detect_edges(&gray, self.low_threshold, self.high_threshold);
                item.with_image(DynamicImage::ImageLuma8(edges))
            })
            .collect())
    }

    fn name(&self) -> &str {
        "Edge Detection"
    }
}

/// Gaussian smoothing of the edge map
pub struct SmoothStep {
    pub sigma: f32,
}

impl PipelineStep for SmoothStep {
    fn process(&self, data: Vec<PipelineData>, _context: &PipelineContext) -> Result<Vec<PipelineData>> {
        Ok(data
            .into_iter()
            .map(|item| {
                let smoothed = preprocessing::smooth(&item.image.to_luma8(), self.sigma);
                item.with_image(DynamicImage::ImageLuma8(smoothed))
            })
            .collect())
    }

    fn name(&self) -> &str {
        "Smoothing"
    }
}

/// Rotation search over the edge map; items without a frame are dropped
pub struct RotationSearchStep {
    pub config: DetectorConfig,
}

impl PipelineStep for RotationSearchStep {
    fn process(&self, data: Vec<PipelineData>, _context: &PipelineContext) -> Result<Vec<PipelineData>> {
        let mut result = Vec::new();

        for item in data {
            let edges = item.image.to_luma8();
            match rotation::search_rotated_rectangle(&edges, &self.config, &NullReporter) {
                Ok(found) => {
                    let mut new_item = item.with_image(DynamicImage::ImageLuma8(lines::mask_to_gray(&found.mask)));
                    new_item.bbox = Some(found.bounds);
                    new_item.metadata.insert("rotation_angle".to_string(), MetadataValue::Int(found.angle));
                    new_item.metadata.insert("rotation_attempts".to_string(), MetadataValue::Int(found.attempts as i32));
                    result.push(new_item);
                }
                Err(err) if err.is_recoverable() => info!(%err, "Dropping item"),
                Err(err) => return Err(err.into()),
            }
        }

        Ok(result)
    }

    fn name(&self) -> &str {
        "Rotation Search"
    }
}

/// Adaptive-threshold contour bounds; items without a frame are dropped
pub struct ContourBoundsStep {
    pub config: DetectorConfig,
}

impl PipelineStep for ContourBoundsStep {
    fn process(&self, data: Vec<PipelineData>, _context: &PipelineContext) -> Result<Vec<PipelineData>> {
        let mut result = Vec::new();

        for item in data {
            let search = contours::search_contours(&item.image.to_luma8(), &self.config)
                .and_then(|search| search.bounds().map(|bbox| (search, bbox)));
            let (search, bbox) = match search {
                Ok(found) => found,
                Err(err) if err.is_recoverable() => {
                    info!(%err, "Dropping item");
                    continue;
                }
                Err(err) => return Err(err.into()),
            };

            let mut new_item = item.with_image(DynamicImage::ImageLuma8(search.threshold.binary));
            new_item.bbox = Some(bbox);
            new_item.metadata.insert("threshold_level".to_string(), MetadataValue::Int(search.threshold.level as i32));
            new_item.metadata.insert("contour_count".to_string(), MetadataValue::Int(search.accepted.len() as i32));
            result.push(new_item);
        }

        Ok(result)
    }

    fn name(&self) -> &str {
        "Contour Bounds"
    }
}

/// Run any boundary detector on the working image
pub struct DetectFrameStep {
    pub detector: Arc<dyn BoundaryDetector>,
}

impl PipelineStep for DetectFrameStep {
    fn process(&self, data: Vec<PipelineData>, _context: &PipelineContext) -> Result<Vec<PipelineData>> {
        let mut result = Vec::new();

        for item in data {
            match self.detector.detect(&item.image.to_luma8(), &NullReporter) {
                Ok(bbox) => {
                    let mut new_item = item.with_metadata(
                        "detector",
                        MetadataValue::String(self.detector.name().to_string()),
                    );
                    new_item.bbox = Some(bbox);
                    result.push(new_item);
                }
                Err(err) if err.is_recoverable() => info!(%err, "Dropping item"),
                Err(err) => return Err(err.into()),
            }
        }

        Ok(result)
    }

    fn name(&self) -> &str {
        "Frame Detection"
    }
}

/// Crop the original image to the item's bounding box
pub struct CropStep;

impl PipelineStep for CropStep {
    fn process(&self, data: Vec<PipelineData>, _context: &PipelineContext) -> Result<Vec<PipelineData>> {
        let mut result = Vec::new();

        for item in data {
            let Some(bbox) = item.bbox else {
                anyhow::bail!("Crop step reached an item without a bounding box");
            };
            let cropped = crop::crop_dynamic(&item.original, &bbox)?;
            result.push(item.with_image(cropped));
        }

        Ok(result)
    }

    fn name(&self) -> &str {
        "Crop"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::BoundingBox;
    use crate::pipeline::Pipeline;
    use image::{GrayImage, Luma};

    #[test]
    fn crop_step_cuts_original() {
        let img = DynamicImage::ImageLuma8(GrayImage::from_fn(50, 40, |x, _| Luma([x as u8])));
        let mut item = PipelineData::from_image(img);
        item.bbox = Some(BoundingBox::new(10, 5, 30, 25));

        let out = CropStep.process(vec![item], &PipelineContext::default()).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].image.width(), 20);
        assert_eq!(out[0].image.to_luma8().get_pixel(0, 0)[0], 10);
    }

    #[test]
    fn crop_step_requires_bbox() {
        let item = PipelineData::from_image(DynamicImage::new_luma8(5, 5));
        assert!(CropStep.process(vec![item], &PipelineContext::default()).is_err());
    }

    #[test]
    fn contour_step_drops_blank_items() {
        let blank = DynamicImage::ImageLuma8(GrayImage::from_pixel(120, 120, Luma([10])));
        let pipeline = Pipeline::new()
            .add_step(Arc::new(GrayscaleStep))
            .add_step(Arc::new(ContourBoundsStep { config: DetectorConfig::default() }));
        assert!(pipeline.run(blank).unwrap().is_empty());
    }
}
