// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Error responses of the detection endpoints

use axum::http::StatusCode;
use image::DynamicImage;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

use super::common::{
    body_json, detector_returning, json_request, multipart_request, png_bytes, router_with,
    send, state_with, MockDetector,
};
use microplastics_detector::api::{create_router, AppState};
use microplastics_detector::detector::{DetectorManager, ObjectDetector};
use microplastics_detector::measurement::{BoundingBox, MeasurementConfig, RawDetection};
use microplastics_detector::report::MalformedPolicy;

#[tokio::test]
async fn test_detect_without_model_returns_503() {
    let router = create_router(AppState::new_for_test());

    let response = send(
        router,
        multipart_request("/detect", "file", &png_bytes(16, 16)),
    )
    .await;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

    let json = body_json(response).await;
    assert_eq!(json["error_type"], "model_not_loaded");
    assert!(json["request_id"].is_string());
}

#[tokio::test]
async fn test_detect_missing_file_field() {
    let mut detector = MockDetector::new();
    detector.expect_detect().never();

    let response = send(
        router_with(detector),
        multipart_request("/detect", "image", &png_bytes(16, 16)),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = body_json(response).await;
    assert_eq!(json["error_type"], "validation_error");
    assert_eq!(json["details"]["field"], "file");
}

#[tokio::test]
async fn test_detect_undecodable_upload() {
    let mut detector = MockDetector::new();
    detector.expect_detect().never();

    let response = send(
        router_with(detector),
        multipart_request("/detect", "file", b"definitely not an image"),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error_type"], "invalid_image");
}

#[tokio::test]
async fn test_detect_base64_missing_image() {
    let response = send(
        router_with(detector_returning(Vec::new())),
        json_request("/v1/detect", json!({})),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error_type"], "validation_error");
}

#[tokio::test]
async fn test_detect_base64_invalid_encoding() {
    let response = send(
        router_with(detector_returning(Vec::new())),
        json_request("/v1/detect", json!({ "image": "!!not-base64!!" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_reject_policy_returns_422() {
    let detector = detector_returning(vec![
        RawDetection::new("microplastic", 0.9, BoundingBox::new(0.0, 0.0, 5.0, 5.0)),
        RawDetection::new("microplastic", 0.9, BoundingBox::new(0.0, 0.0, f64::NAN, 5.0)),
    ]);
    let router = create_router(state_with(
        detector,
        MeasurementConfig::default(),
        MalformedPolicy::Reject,
        None,
    ));

    let response = send(
        router,
        multipart_request("/detect", "file", &png_bytes(32, 32)),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let json = body_json(response).await;
    assert_eq!(json["error_type"], "malformed_geometry");
    assert_eq!(json["details"]["detection_index"], 1);
}

#[tokio::test]
async fn test_detector_failure_returns_500() {
    let mut detector = MockDetector::new();
    detector
        .expect_detect()
        .times(1)
        .returning(|_| Err(anyhow::anyhow!("inference exploded")));

    let response = send(
        router_with(detector),
        multipart_request("/detect", "file", &png_bytes(16, 16)),
    )
    .await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let json = body_json(response).await;
    assert_eq!(json["error_type"], "detection_failed");
    assert!(json["message"].as_str().unwrap().contains("inference exploded"));
}

#[tokio::test]
async fn test_slow_detector_times_out() {
    let mut detector = MockDetector::new();
    detector.expect_detect().returning(|_| {
        std::thread::sleep(Duration::from_millis(500));
        Ok(Vec::new())
    });

    let router = create_router(state_with(
        detector,
        MeasurementConfig::default(),
        MalformedPolicy::Drop,
        Some(Duration::from_millis(20)),
    ));

    let response = send(
        router,
        multipart_request("/detect", "file", &png_bytes(16, 16)),
    )
    .await;
    assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);
    assert_eq!(body_json(response).await["error_type"], "timeout");
}

/// Serializes inference the way the ONNX session lock does
struct LockedSlowDetector {
    session: std::sync::Mutex<()>,
    delay: Duration,
}

impl ObjectDetector for LockedSlowDetector {
    fn detect(&self, _image: &DynamicImage) -> anyhow::Result<Vec<RawDetection>> {
        let _guard = self
            .session
            .lock()
            .map_err(|_| anyhow::anyhow!("lock poisoned"))?;
        std::thread::sleep(self.delay);
        Ok(Vec::new())
    }

    fn model_name(&self) -> String {
        "locked-slow".to_string()
    }
}

#[tokio::test]
async fn test_timed_out_run_keeps_detector_busy() {
    let detector = LockedSlowDetector {
        session: std::sync::Mutex::new(()),
        delay: Duration::from_millis(400),
    };
    let state = AppState::new(
        DetectorManager::with_detector(Arc::new(detector)),
        MeasurementConfig::default(),
        MalformedPolicy::Drop,
        Some(Duration::from_millis(100)),
    );

    // First run times out but keeps the session
    let response = send(
        create_router(state.clone()),
        multipart_request("/detect", "file", &png_bytes(16, 16)),
    )
    .await;
    assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);

    // Queued behind the abandoned run
    let response = send(
        create_router(state.clone()),
        multipart_request("/detect", "file", &png_bytes(16, 16)),
    )
    .await;
    assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);

    // Once both runs drain the detector answers again
    tokio::time::sleep(Duration::from_millis(1000)).await;
    let state = AppState {
        detect_timeout: Some(Duration::from_secs(5)),
        ..state
    };
    let response = send(
        create_router(state),
        multipart_request("/detect", "file", &png_bytes(16, 16)),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
}
