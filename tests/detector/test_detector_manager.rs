// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! DetectorManager loading and lookup

use image::DynamicImage;
use mockall::mock;
use std::path::PathBuf;
use std::sync::Arc;

use microplastics_detector::detector::{DetectorConfig, DetectorManager, ObjectDetector};
use microplastics_detector::measurement::{BoundingBox, RawDetection};

mock! {
    pub Detector {}

    impl ObjectDetector for Detector {
        fn detect(&self, image: &DynamicImage) -> anyhow::Result<Vec<RawDetection>>;
        fn model_name(&self) -> String;
    }
}

#[tokio::test]
async fn test_manager_without_model_file() {
    let config = DetectorConfig {
        model_path: Some(PathBuf::from("/definitely/missing/best.onnx")),
        ..DetectorConfig::default()
    };

    let manager = DetectorManager::new(config).await;
    assert!(!manager.has_detector());
    assert!(manager.get_detector().is_none());
}

#[tokio::test]
async fn test_manager_rejects_non_model_file() {
    let file = tempfile::NamedTempFile::new().unwrap();
    std::fs::write(file.path(), b"not an onnx graph").unwrap();

    let config = DetectorConfig {
        model_path: Some(file.path().to_path_buf()),
        ..DetectorConfig::default()
    };

    let manager = DetectorManager::new(config).await;
    assert!(!manager.has_detector());
}

#[test]
fn test_manager_with_injected_detector() {
    let mut detector = MockDetector::new();
    detector
        .expect_model_name()
        .returning(|| "mock-yolo".to_string());
    detector.expect_detect().times(1).returning(|image| {
        Ok(vec![RawDetection::new(
            "microplastic",
            0.75,
            BoundingBox::new(0.0, 0.0, image.width() as f64, image.height() as f64),
        )])
    });

    let manager = DetectorManager::with_detector(Arc::new(detector));
    assert!(manager.has_detector());
    assert_eq!(manager.model_name().as_deref(), Some("mock-yolo"));

    let detections = manager
        .get_detector()
        .unwrap()
        .detect(&DynamicImage::new_rgb8(12, 7))
        .unwrap();
    assert_eq!(detections.len(), 1);
    assert_eq!(detections[0].bbox, BoundingBox::new(0.0, 0.0, 12.0, 7.0));
}

#[test]
fn test_empty_manager() {
    let manager = DetectorManager::empty();
    assert!(!manager.has_detector());
    assert!(manager.model_name().is_none());
}
