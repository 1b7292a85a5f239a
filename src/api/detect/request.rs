// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Base64 detection request

use serde::{Deserialize, Serialize};

use crate::api::errors::ApiError;
use crate::vision::{strip_data_url, MAX_IMAGE_SIZE};

/// Base64 grows payloads by a third
const MAX_BASE64_SIZE: usize = MAX_IMAGE_SIZE / 3 * 4 + 4;

/// Request for detection on a base64-encoded image
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectRequest {
    /// Base64-encoded image data (a `data:` URL is accepted too)
    #[serde(default)]
    pub image: Option<String>,
}

impl DetectRequest {
    pub fn validate(&self) -> Result<&str, ApiError> {
        let image = self
            .image
            .as_deref()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| ApiError::ValidationError {
                field: "image".to_string(),
                message: "image is required".to_string(),
            })?;

        // Limit applies to the payload, not to a data URL prefix
        if strip_data_url(image).len() > MAX_BASE64_SIZE {
            return Err(ApiError::ValidationError {
                field: "image".to_string(),
                message: format!("image exceeds maximum size of {} bytes", MAX_IMAGE_SIZE),
            });
        }

        Ok(image)
    }
}
