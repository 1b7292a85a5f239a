// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::report::ReportError;
use crate::vision::ImageError;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ErrorResponse {
    pub error_type: String,
    pub message: String,
    pub request_id: Option<String>,
    pub details: Option<HashMap<String, serde_json::Value>>,
}

#[derive(Debug, Clone)]
pub enum ApiError {
    InvalidRequest(String),
    ValidationError {
        field: String,
        message: String,
    },
    InvalidImage(String),
    ModelNotLoaded,
    MalformedGeometry {
        index: usize,
        message: String,
    },
    DetectionFailed(String),
    InternalError(String),
    Timeout,
}

impl ApiError {
    pub fn to_response(&self, request_id: Option<String>) -> ErrorResponse {
        let (error_type, message, details) = match self {
            ApiError::InvalidRequest(msg) => ("invalid_request", msg.clone(), None),
            ApiError::ValidationError { field, message } => {
                let mut details = HashMap::new();
                details.insert(
                    "field".to_string(),
                    serde_json::Value::String(field.clone()),
                );
                ("validation_error", message.clone(), Some(details))
            }
            ApiError::InvalidImage(msg) => ("invalid_image", msg.clone(), None),
            ApiError::ModelNotLoaded => ("model_not_loaded", "Model not loaded".to_string(), None),
            ApiError::MalformedGeometry { index, message } => {
                let mut details = HashMap::new();
                details.insert(
                    "detection_index".to_string(),
                    serde_json::Value::Number((*index).into()),
                );
                ("malformed_geometry", message.clone(), Some(details))
            }
            ApiError::DetectionFailed(msg) => ("detection_failed", msg.clone(), None),
            ApiError::InternalError(msg) => ("internal_error", msg.clone(), None),
            ApiError::Timeout => ("timeout", "Detection timed out".to_string(), None),
        };

        ErrorResponse {
            error_type: error_type.to_string(),
            message,
            request_id,
            details,
        }
    }

    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::InvalidRequest(_)
            | ApiError::ValidationError { .. }
            | ApiError::InvalidImage(_) => 400,
            ApiError::MalformedGeometry { .. } => 422,
            ApiError::ModelNotLoaded => 503,
            ApiError::DetectionFailed(_) | ApiError::InternalError(_) => 500,
            ApiError::Timeout => 504,
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::InvalidRequest(msg) => write!(f, "Invalid request: {}", msg),
            ApiError::ValidationError { field, message } => {
                write!(f, "Validation error for {}: {}", field, message)
            }
            ApiError::InvalidImage(msg) => write!(f, "Invalid image: {}", msg),
            ApiError::ModelNotLoaded => write!(f, "Model not loaded"),
            ApiError::MalformedGeometry { index, message } => {
                write!(f, "Malformed detection #{}: {}", index, message)
            }
            ApiError::DetectionFailed(msg) => write!(f, "Detection failed: {}", msg),
            ApiError::InternalError(msg) => write!(f, "Internal error: {}", msg),
            ApiError::Timeout => write!(f, "Detection timed out"),
        }
    }
}

impl std::error::Error for ApiError {}

impl From<ImageError> for ApiError {
    fn from(e: ImageError) -> Self {
        ApiError::InvalidImage(e.to_string())
    }
}

impl From<ReportError> for ApiError {
    fn from(e: ReportError) -> Self {
        match e {
            ReportError::MalformedGeometry { index, source } => ApiError::MalformedGeometry {
                index,
                message: source.to_string(),
            },
        }
    }
}

/// An `ApiError` tagged with the id of the request that produced it
#[derive(Debug)]
pub struct ApiErrorResponse {
    pub error: ApiError,
    pub request_id: Option<String>,
}

impl ApiErrorResponse {
    pub fn new(error: ApiError, request_id: impl Into<String>) -> Self {
        Self {
            error,
            request_id: Some(request_id.into()),
        }
    }
}

impl From<ApiError> for ApiErrorResponse {
    fn from(error: ApiError) -> Self {
        Self {
            error,
            request_id: None,
        }
    }
}

impl IntoResponse for ApiErrorResponse {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.error.status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let body = self.error.to_response(self.request_id);

        (status, Json(body)).into_response()
    }
}
