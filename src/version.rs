// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
// Version information for the microplastics detector

/// Semantic version number
pub const VERSION_NUMBER: &str = env!("CARGO_PKG_VERSION");

/// Service name used in logs
pub const SERVICE_NAME: &str = "Microplastics AI";

/// Supported features in this version
pub const FEATURES: &[&str] = &[
    "yolo-onnx-detector",
    "multipart-upload",
    "base64-upload",
    "micron-calibration",
    "size-categories",
    "configurable-category-table",
    "malformed-geometry-policy",
];

/// Get formatted version string for logging
pub fn get_version_string() -> String {
    format!("{} {}", SERVICE_NAME, VERSION_NUMBER)
}
