// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Detection endpoint handlers

use axum::{extract::State, Json};
use axum_extra::extract::Multipart;
use image::DynamicImage;
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

use super::request::DetectRequest;
use super::response::DetectResponse;
use crate::api::errors::{ApiError, ApiErrorResponse};
use crate::api::http_server::AppState;
use crate::report::{build_report, ImageSize};
use crate::vision::{decode_base64_image, decode_image_bytes, ImageInfo};

/// Multipart field carrying the image
pub const UPLOAD_FIELD: &str = "file";

/// POST /detect - Detect and size-classify particles in an uploaded image
///
/// # Request
/// - multipart/form-data with the image in the `file` field
///
/// # Response
/// - `count`, `detections`, `image_size`, `size_counts`, `calibration_info`
///
/// # Errors
/// - 400 Bad Request: missing file, undecodable image
/// - 422 Unprocessable Entity: malformed detector output (reject policy)
/// - 503 Service Unavailable: model not loaded
/// - 500 / 504: detector failure or timeout
pub async fn detect_handler(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<DetectResponse>, ApiErrorResponse> {
    let request_id = Uuid::new_v4().to_string();
    let span = info_span!("detect", request_id = %request_id);

    async {
        let bytes = read_upload(multipart).await?;
        let (image, image_info) = decode_image_bytes(&bytes).map_err(|e| {
            warn!("Failed to decode upload: {}", e);
            ApiError::from(e)
        })?;
        run_detection(&state, image, image_info).await
    }
    .instrument(span)
    .await
    .map(Json)
    .map_err(|e| ApiErrorResponse::new(e, request_id))
}

/// POST /v1/detect - Same as /detect for a base64-encoded image
pub async fn detect_base64_handler(
    State(state): State<AppState>,
    Json(request): Json<DetectRequest>,
) -> Result<Json<DetectResponse>, ApiErrorResponse> {
    let request_id = Uuid::new_v4().to_string();
    let span = info_span!("detect", request_id = %request_id);

    async {
        let image_data = request.validate()?;
        let (image, image_info) = decode_base64_image(image_data).map_err(|e| {
            warn!("Failed to decode image: {}", e);
            ApiError::from(e)
        })?;
        run_detection(&state, image, image_info).await
    }
    .instrument(span)
    .await
    .map(Json)
    .map_err(|e| ApiErrorResponse::new(e, request_id))
}

async fn read_upload(mut multipart: Multipart) -> Result<Vec<u8>, ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::InvalidRequest(format!("Invalid multipart body: {}", e)))?
    {
        if field.name() == Some(UPLOAD_FIELD) {
            let bytes = field
                .bytes()
                .await
                .map_err(|e| ApiError::InvalidRequest(format!("Failed to read upload: {}", e)))?;
            return Ok(bytes.to_vec());
        }
    }

    Err(ApiError::ValidationError {
        field: UPLOAD_FIELD.to_string(),
        message: format!("multipart field '{}' is required", UPLOAD_FIELD),
    })
}

/// Run the detector on a decoded image and build the report
async fn run_detection(
    state: &AppState,
    image: DynamicImage,
    image_info: ImageInfo,
) -> Result<DetectResponse, ApiError> {
    let detector = state.detectors.get_detector().ok_or_else(|| {
        warn!("Detection requested but model is not loaded");
        ApiError::ModelNotLoaded
    })?;

    debug!(
        "Decoded image: {}x{}, {} bytes",
        image_info.width, image_info.height, image_info.size_bytes
    );

    let task = tokio::task::spawn_blocking(move || detector.detect(&image));
    let joined = match state.detect_timeout {
        Some(limit) => tokio::time::timeout(limit, task).await.map_err(|_| {
            warn!(
                "Detector did not finish within {:?}; it stays busy with this image and later requests queue behind it",
                limit
            );
            ApiError::Timeout
        })?,
        None => task.await,
    };

    let detections = joined
        .map_err(|e| ApiError::InternalError(format!("Detector task failed: {}", e)))?
        .map_err(|e| {
            warn!("Detection failed: {:#}", e);
            ApiError::DetectionFailed(format!("{:#}", e))
        })?;

    let image_size = ImageSize::new(image_info.width, image_info.height);
    let report = build_report(
        detections,
        image_size,
        &state.measurement,
        state.malformed_policy,
    )
    .map_err(|e| {
        warn!("Rejecting detector output: {}", e);
        ApiError::from(e)
    })?;

    info!(
        "Detection complete: {} objects, {} size-classified, {} dropped",
        report.count(),
        report.classified_count(),
        report.dropped
    );

    Ok(DetectResponse::from(&report))
}
