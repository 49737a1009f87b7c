mod common;

use common::*;
use framefind::detection::{build_contour_pipeline, build_line_pipeline, build_standard_pipeline};
use framefind::{BoundaryDetector, DebugDirReporter, FallbackDetector};
use image::DynamicImage;

fn photo() -> DynamicImage {
    DynamicImage::ImageLuma8(page_photo(400, 300, BoundingBox::new(100, 80, 300, 230)))
}

#[test]
fn standard_pipeline_falls_back_to_contours() {
    let config = DetectorConfig::default();
    let results = build_standard_pipeline(&config).run(photo()).unwrap();

    assert_eq!(results.len(), 1);
    let item = &results[0];
    assert_eq!(item.bbox, Some(BoundingBox::new(100, 80, 300, 230)));
    assert_eq!(item.get_string("detector"), Some("fallback"));
    assert_eq!(item.image.width(), 200);
    assert_eq!(item.image.height(), 150);
}

#[test]
fn contour_pipeline_records_threshold_metadata() {
    let results = build_contour_pipeline(&DetectorConfig::default()).run(photo()).unwrap();

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].get_int("threshold_level"), Some(100));
    assert_eq!(results[0].get_int("contour_count"), Some(1));
}

#[test]
fn line_pipeline_records_rotation_and_crops_original() {
    let page = BoundingBox::new(50, 40, 350, 260);
    let photo = DynamicImage::ImageLuma8(flat_page_photo(400, 300, page));
    let results = build_line_pipeline(&DetectorConfig::default()).run(photo).unwrap();

    assert_eq!(results.len(), 1);
    let item = &results[0];
    assert_eq!(item.get_int("rotation_angle"), Some(0));
    assert_eq!(item.get_int("rotation_attempts"), Some(1));

    let bbox = item.bbox.unwrap();
    assert!(bbox.min_x.abs_diff(50) <= 10 && bbox.max_x.abs_diff(350) <= 10, "got {bbox}");
    assert!(bbox.min_y.abs_diff(40) <= 10 && bbox.max_y.abs_diff(260) <= 10, "got {bbox}");
    assert_eq!(item.image.width(), bbox.width());
    assert_eq!(item.image.height(), bbox.height());
}

#[test]
fn line_pipeline_drops_photo_without_long_borders() {
    let results = build_line_pipeline(&DetectorConfig::default()).run(photo()).unwrap();
    assert!(results.is_empty());
}

#[test]
fn partial_run_stops_after_grayscale() {
    let rgb = DynamicImage::ImageRgb8(photo().to_rgb8());
    let results = build_standard_pipeline(&DetectorConfig::default())
        .run_partial(rgb, 1)
        .unwrap();

    assert_eq!(results.len(), 1);
    assert!(matches!(results[0].image, DynamicImage::ImageLuma8(_)));
    assert!(results[0].bbox.is_none());
}

#[test]
fn debug_mode_writes_one_directory_per_step() {
    let dir = tempfile::tempdir().unwrap();
    let debug_dir = dir.path().join("debug");

    build_standard_pipeline(&DetectorConfig::default())
        .with_debug(debug_dir.clone())
        .unwrap()
        .run(photo())
        .unwrap();

    for step in ["00_input", "01_grayscale_conversion", "02_frame_detection", "03_crop"] {
        assert!(debug_dir.join(step).join("01.png").is_file(), "missing {step}");
    }
}

#[test]
fn debug_mode_refuses_non_empty_directory() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("stale.png"), b"x").unwrap();

    assert!(build_standard_pipeline(&DetectorConfig::default())
        .with_debug(dir.path().to_path_buf())
        .is_err());
}

#[test]
fn fallback_detector_reports_intermediate_images() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("report");
    let reporter = DebugDirReporter::new(out.clone()).unwrap();
    let gray = photo().to_luma8();

    let bbox = FallbackDetector::standard(&DetectorConfig::default())
        .detect(&gray, &reporter)
        .unwrap();

    assert_eq!(bbox, BoundingBox::new(100, 80, 300, 230));
    assert!(out.join("01_edge_map.png").is_file());
}
