// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! End-to-end report scenarios at full precision

use microplastics_detector::api::detect::DetectResponse;
use microplastics_detector::measurement::{
    BoundingBox, Calibration, Classification, MeasurementConfig, RawDetection,
};
use microplastics_detector::report::{build_report, ImageSize, MalformedPolicy};

const EPS: f64 = 1e-9;

#[test]
fn test_single_medium_particle() {
    let config = MeasurementConfig::default();
    let detections = vec![RawDetection::new(
        "microplastic",
        0.9,
        BoundingBox::new(10.0, 10.0, 20.0, 10.0),
    )];

    let report = build_report(
        detections,
        ImageSize::new(64, 48),
        &config,
        MalformedPolicy::Drop,
    )
    .unwrap();

    assert_eq!(report.count(), 1);
    let detection = &report.detections[0];
    let measurement = detection.classification.measurement().unwrap();
    assert!((measurement.width_microns - 100.0).abs() < EPS);
    assert!((measurement.height_microns - 50.0).abs() < EPS);
    assert!((measurement.diagonal_microns - 12500f64.sqrt()).abs() < EPS);
    assert_eq!(detection.classification.category().unwrap().name, "medium");

    assert_eq!(report.size_counts.get("medium"), Some(1));
    assert_eq!(report.size_counts.total(), 1);
    assert_eq!(report.calibration.microns_per_pixel, 5.0);
    assert_eq!(report.calibration.field_of_view_microns, (320.0, 240.0));

    let wire = serde_json::to_value(DetectResponse::from(&report)).unwrap();
    assert_eq!(wire["detections"][0]["diagonal_µm"], 111.8);
    assert_eq!(wire["detections"][0]["width_µm"], 100.0);
    assert_eq!(wire["detections"][0]["size_category"], "medium");
}

#[test]
fn test_empty_image() {
    let config = MeasurementConfig::default();
    let report = build_report(
        Vec::new(),
        ImageSize::new(640, 480),
        &config,
        MalformedPolicy::Drop,
    )
    .unwrap();

    assert_eq!(report.count(), 0);
    assert!(report.detections.is_empty());
    assert_eq!(report.size_counts.total(), 0);
    assert_eq!(report.size_counts.len(), 4);
    assert_eq!(report.calibration.field_of_view_microns, (3200.0, 2400.0));
}

#[test]
fn test_non_target_label_is_not_measured() {
    let config = MeasurementConfig::default();
    let report = build_report(
        vec![RawDetection::new(
            "debris",
            0.8,
            BoundingBox::new(0.0, 0.0, 30.0, 30.0),
        )],
        ImageSize::new(100, 100),
        &config,
        MalformedPolicy::Drop,
    )
    .unwrap();

    assert_eq!(report.count(), 1);
    assert_eq!(
        report.detections[0].classification,
        Classification::Unclassified
    );
    assert_eq!(report.size_counts.total(), 0);

    let wire = serde_json::to_value(DetectResponse::from(&report)).unwrap();
    let record = wire["detections"][0].as_object().unwrap();
    assert_eq!(record["label"], "debris");
    assert_eq!(record["width_px"], 30.0);
    for absent in ["size_category", "width_µm", "height_µm", "diagonal_µm"] {
        assert!(!record.contains_key(absent), "{} should be omitted", absent);
    }
}

#[test]
fn test_sub_micron_particle_with_unit_calibration() {
    let config = MeasurementConfig {
        calibration: Calibration::new(1.0).unwrap(),
        ..MeasurementConfig::default()
    };
    let report = build_report(
        vec![RawDetection::new(
            "microplastic",
            0.6,
            BoundingBox::new(0.0, 0.0, 0.1, 0.1),
        )],
        ImageSize::new(10, 10),
        &config,
        MalformedPolicy::Drop,
    )
    .unwrap();

    let detection = &report.detections[0];
    let diagonal = detection.classification.measurement().unwrap().diagonal_microns;
    assert!((diagonal - 0.02f64.sqrt()).abs() < EPS);
    assert_eq!(
        detection.classification.category().unwrap().name,
        "nanoplastic"
    );
    assert_eq!(report.size_counts.get("nanoplastic"), Some(1));

    let wire = serde_json::to_value(DetectResponse::from(&report)).unwrap();
    assert_eq!(wire["detections"][0]["diagonal_µm"], 0.14);
    assert_eq!(wire["calibration_info"]["microns_per_pixel"], 1.0);
}
