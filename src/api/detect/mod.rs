// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Particle detection endpoints
//!
//! Provides POST /detect (multipart upload) and POST /v1/detect (base64 JSON).

pub mod handler;
pub mod request;
pub mod response;

pub use handler::{detect_base64_handler, detect_handler};
pub use request::DetectRequest;
pub use response::{CalibrationInfoResponse, DetectResponse, DetectionRecord};
