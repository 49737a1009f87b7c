//! Statistical test for a four-sided frame in a line mask.
//!
//! A frame's border lines show up as isolated spikes in the row and column
//! projections of the mask: one near each end of both axes. A mask that is
//! mostly lit (a wall of edges) also produces high z-scores, so the summed
//! outlier mass per axis must stay below a saturation limit.

use tracing::debug;

use crate::config::DetectorConfig;
use crate::detection::lines::LineMask;
use crate::error::{BoundaryError, Result};
use crate::models::BoundingBox;

/// Which axis a projection runs along.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    /// One sample per row (sum across all columns).
    Rows,
    /// One sample per column (sum across all rows).
    Columns,
}

impl Axis {
    fn name(self) -> &'static str {
        match self {
            Axis::Rows => "row",
            Axis::Columns => "column",
        }
    }
}

/// Sum the mask along `axis`.
pub fn projection(mask: &LineMask, axis: Axis) -> Vec<f64> {
    let (width, height) = mask.dimensions();
    match axis {
        Axis::Rows => {
            let mut sums = vec![0.0; height as usize];
            for (_, y, p) in mask.enumerate_pixels() {
                sums[y as usize] += p[0] as f64;
            }
            sums
        }
        Axis::Columns => {
            let mut sums = vec![0.0; width as usize];
            for (x, _, p) in mask.enumerate_pixels() {
                sums[x as usize] += p[0] as f64;
            }
            sums
        }
    }
}

/// Z-scored projection of the mask along `axis` (population deviation).
pub fn projection_zscores(mask: &LineMask, axis: Axis) -> Result<Vec<f64>> {
    zscores(&projection(mask, axis)).ok_or(BoundaryError::DegenerateProjection {
        axis: axis.name(),
    })
}

fn zscores(values: &[f64]) -> Option<Vec<f64>> {
    if values.is_empty() {
        return None;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    let std_dev = variance.sqrt();
    if std_dev <= f64::EPSILON * mean.abs().max(1.0) {
        return None;
    }
    Some(values.iter().map(|v| (v - mean) / std_dev).collect())
}

/// Outlier summary for one z-scored projection.
#[derive(Debug, Clone, PartialEq)]
struct AxisEvidence {
    /// First outlier index in the leading third.
    first_near_start: Option<usize>,
    /// Last outlier index in the trailing third.
    last_near_end: Option<usize>,
    /// Sum of outlier z-scores divided by the axis length.
    saturation: f64,
}

impl AxisEvidence {
    fn from_zscores(z: &[f64], threshold: f64) -> Self {
        let n = z.len();
        let start_end = n / 3;
        let end_start = n * 2 / 3;

        let first_near_start = z[..start_end].iter().position(|&v| v > threshold);
        let last_near_end = z[end_start..]
            .iter()
            .rposition(|&v| v > threshold)
            .map(|i| i + end_start);
        let outlier_mass: f64 = z.iter().filter(|&&v| v > threshold).sum();

        Self {
            first_near_start,
            last_near_end,
            saturation: outlier_mass / n as f64,
        }
    }

    fn is_border_pair(&self, saturation_limit: f64) -> bool {
        self.first_near_start.is_some()
            && self.last_near_end.is_some()
            && self.saturation < saturation_limit
    }
}

fn axis_evidence(mask: &LineMask, axis: Axis, config: &DetectorConfig) -> Result<AxisEvidence> {
    let z = projection_zscores(mask, axis)?;
    Ok(AxisEvidence::from_zscores(&z, config.rect_zscore_threshold))
}

/// Does the mask contain border lines near both ends of both axes?
///
/// A degenerate (constant) projection counts as "no rectangle".
pub fn looks_like_rectangle(mask: &LineMask, config: &DetectorConfig) -> bool {
    rectangle_bounds(mask, config).is_some()
}

/// Box spanned by the outermost border lines, if the mask looks like a
/// rectangle.
pub fn rectangle_bounds(mask: &LineMask, config: &DetectorConfig) -> Option<BoundingBox> {
    let evidence = axis_evidence(mask, Axis::Rows, config).and_then(|rows| {
        axis_evidence(mask, Axis::Columns, config).map(|cols| (rows, cols))
    });
    let (rows, cols) = match evidence {
        Ok(pair) => pair,
        Err(err) => {
            debug!(%err, "Treating mask as rectangle-free");
            return None;
        }
    };

    let limit = config.rect_saturation_limit;
    if !rows.is_border_pair(limit) || !cols.is_border_pair(limit) {
        debug!(?rows, ?cols, "Rectangle evidence insufficient");
        return None;
    }

    Some(BoundingBox::new(
        cols.first_near_start? as u32,
        rows.first_near_start? as u32,
        cols.last_near_end? as u32 + 1,
        rows.last_near_end? as u32 + 1,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    fn framed_mask(size: u32, inset: u32) -> LineMask {
        let far = size - 1 - inset;
        LineMask::from_fn(size, size, |x, y| {
            let on_row = (y == inset || y == far) && (inset..=far).contains(&x);
            let on_col = (x == inset || x == far) && (inset..=far).contains(&y);
            if on_row || on_col { Luma([255]) } else { Luma([0]) }
        })
    }

    #[test]
    fn frame_is_detected() {
        let mask = framed_mask(200, 20);
        let config = DetectorConfig::default();
        assert!(looks_like_rectangle(&mask, &config));
        assert_eq!(
            rectangle_bounds(&mask, &config),
            Some(BoundingBox::new(20, 20, 180, 180))
        );
    }

    #[test]
    fn constant_mask_is_degenerate() {
        let mask = LineMask::from_pixel(50, 40, Luma([7]));
        assert!(matches!(
            projection_zscores(&mask, Axis::Rows),
            Err(BoundaryError::DegenerateProjection { axis: "row" })
        ));
        assert!(!looks_like_rectangle(&mask, &DetectorConfig::default()));
    }

    #[test]
    fn single_line_is_not_a_rectangle() {
        let mask = LineMask::from_fn(200, 200, |_, y| if y == 30 { Luma([255]) } else { Luma([0]) });
        assert!(!looks_like_rectangle(&mask, &DetectorConfig::default()));
    }

    #[test]
    fn lines_in_middle_third_do_not_count() {
        let mask = LineMask::from_fn(200, 200, |x, y| {
            if x == 100 || y == 100 { Luma([255]) } else { Luma([0]) }
        });
        assert!(!looks_like_rectangle(&mask, &DetectorConfig::default()));
    }

    #[test]
    fn saturated_axis_is_rejected() {
        let mut evidence_z = vec![0.0; 30];
        evidence_z[2] = 4.0;
        evidence_z[28] = 4.0;
        let ok = AxisEvidence::from_zscores(&evidence_z, 3.5);
        assert!(ok.is_border_pair(0.3));
        assert!(!ok.is_border_pair(0.25));
    }

    #[test]
    fn projections_sum_the_right_axis() {
        let mask = LineMask::from_fn(3, 2, |x, y| Luma([(x + 10 * y) as u16]));
        assert_eq!(projection(&mask, Axis::Rows), vec![3.0, 33.0]);
        assert_eq!(projection(&mask, Axis::Columns), vec![10.0, 12.0, 14.0]);
    }
}
