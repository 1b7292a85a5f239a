// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Detector head decoding through to a detection report

use image::{DynamicImage, Rgb, RgbImage};
use ndarray::Array3;

use microplastics_detector::detector::postprocessing::{
    decode_output, non_max_suppression, scale_to_original, to_raw_detections,
};
use microplastics_detector::detector::preprocessing::{letterbox, preprocess_for_detection};
use microplastics_detector::detector::LabelTable;
use microplastics_detector::measurement::{BoundingBox, MeasurementConfig};
use microplastics_detector::report::{build_report, ImageSize, MalformedPolicy};

/// Write one anchor `(cx, cy, w, h, scores...)` into a `[1, 4 + nc, anchors]` head
fn set_anchor(head: &mut Array3<f32>, anchor: usize, bbox: [f32; 4], scores: &[f32]) {
    for (i, v) in bbox.iter().enumerate() {
        head[[0, i, anchor]] = *v;
    }
    for (i, s) in scores.iter().enumerate() {
        head[[0, 4 + i, anchor]] = *s;
    }
}

#[test]
fn test_head_to_report() {
    // 1280x640 image letterboxed into 640: scale 0.5, 160px top padding
    let image = DynamicImage::ImageRgb8(RgbImage::from_pixel(1280, 640, Rgb([10, 20, 30])));
    let (_, info) = letterbox(&image, 640);
    assert_eq!(info.scale, 0.5);
    assert_eq!(info.pad_y, 160.0);

    let mut head = Array3::<f32>::zeros((1, 6, 16));
    // microplastic: 20x10 input px centred at (100, 200)
    set_anchor(&mut head, 0, [100.0, 200.0, 20.0, 10.0], &[0.9, 0.05]);
    // overlapping duplicate with lower score, suppressed
    set_anchor(&mut head, 1, [101.0, 200.0, 20.0, 10.0], &[0.6, 0.0]);
    // debris
    set_anchor(&mut head, 2, [300.0, 300.0, 40.0, 40.0], &[0.1, 0.7]);
    // below threshold
    set_anchor(&mut head, 3, [400.0, 400.0, 40.0, 40.0], &[0.2, 0.3]);

    let candidates = decode_output(head.view().into_dyn(), 0.4).unwrap();
    assert_eq!(candidates.len(), 3);

    let kept = non_max_suppression(candidates, 0.45, 300);
    assert_eq!(kept.len(), 2);

    let labels = LabelTable::new(["microplastic", "debris"]);
    let detections = to_raw_detections(&kept, &info, &labels, "microplastic");

    assert_eq!(detections[0].label, "microplastic");
    assert_eq!(detections[0].bbox, BoundingBox::new(180.0, 70.0, 40.0, 20.0));
    assert_eq!(detections[1].label, "debris");

    let report = build_report(
        detections,
        ImageSize::new(1280, 640),
        &MeasurementConfig::default(),
        MalformedPolicy::Reject,
    )
    .unwrap();

    assert_eq!(report.count(), 2);
    assert_eq!(report.classified_count(), 1);
    // 40x20 px at 5 um/px -> 223.6 um diagonal
    assert_eq!(report.size_counts.get("medium"), Some(1));
    assert_eq!(report.calibration.field_of_view_microns, (6400.0, 3200.0));
}

#[test]
fn test_boxes_are_clipped_to_image() {
    let image = DynamicImage::new_rgb8(320, 320);
    let (_, info) = letterbox(&image, 640);
    assert_eq!(info.scale, 2.0);

    let mut head = Array3::<f32>::zeros((1, 5, 8));
    set_anchor(&mut head, 0, [630.0, 10.0, 40.0, 40.0], &[0.8]);

    let candidates = decode_output(head.view().into_dyn(), 0.4).unwrap();
    let scaled = scale_to_original(&candidates[0], &info);

    assert_eq!(scaled.x2, 320.0);
    assert_eq!(scaled.y1, 0.0);
    assert!(scaled.x1 >= 0.0 && scaled.y2 <= 320.0);
}

#[test]
fn test_preprocess_respects_configured_input_size() {
    let image = DynamicImage::new_rgb8(100, 50);
    let (tensor, info) = preprocess_for_detection(&image, 320);

    assert_eq!(tensor.shape(), &[1, 3, 320, 320]);
    assert_eq!(info.scale, 3.2);
    assert_eq!(info.pad_y, 80.0);
}

#[test]
fn test_single_class_model_without_labels() {
    let image = DynamicImage::new_rgb8(640, 640);
    let (_, info) = letterbox(&image, 640);

    let mut head = Array3::<f32>::zeros((1, 7, 8));
    set_anchor(&mut head, 0, [50.0, 50.0, 10.0, 10.0], &[0.0, 0.0, 0.8]);
    set_anchor(&mut head, 1, [200.0, 200.0, 10.0, 10.0], &[0.6, 0.0, 0.0]);

    let kept = non_max_suppression(decode_output(head.view().into_dyn(), 0.4).unwrap(), 0.45, 300);
    let detections = to_raw_detections(&kept, &info, &LabelTable::default(), "microplastic");

    assert_eq!(detections.len(), 2);
    assert!(detections.iter().all(|d| d.label == "microplastic"));
    assert_eq!(detections[0].bbox, BoundingBox::new(45.0, 45.0, 10.0, 10.0));

    let report = build_report(
        detections,
        ImageSize::new(640, 640),
        &MeasurementConfig::default(),
        MalformedPolicy::Reject,
    )
    .unwrap();
    assert_eq!(report.classified_count(), 2);
}

#[test]
fn test_class_id_past_label_table() {
    let image = DynamicImage::new_rgb8(640, 640);
    let (_, info) = letterbox(&image, 640);

    let mut head = Array3::<f32>::zeros((1, 7, 8));
    set_anchor(&mut head, 0, [100.0, 100.0, 20.0, 20.0], &[0.0, 0.0, 0.9]);

    let kept = non_max_suppression(decode_output(head.view().into_dyn(), 0.4).unwrap(), 0.45, 300);
    let labels = LabelTable::new(["microplastic", "debris"]);
    let detections = to_raw_detections(&kept, &info, &labels, "microplastic");

    assert_eq!(detections.len(), 1);
    assert_eq!(detections[0].label, "class_2");

    let report = build_report(
        detections,
        ImageSize::new(640, 640),
        &MeasurementConfig::default(),
        MalformedPolicy::Reject,
    )
    .unwrap();
    assert_eq!(report.classified_count(), 0);
}
