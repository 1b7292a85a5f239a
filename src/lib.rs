// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod api;
pub mod config;
pub mod detector;
pub mod measurement;
pub mod report;
pub mod version;
pub mod vision;

pub use api::{create_router, start_server, AppState};
pub use config::{ConfigError, ServiceConfig};
pub use detector::{DetectorConfig, DetectorManager, ObjectDetector};
pub use measurement::{
    classify_size, convert_to_physical, should_classify, Calibration, MeasurementConfig,
    RawDetection, SizeCategoryTable,
};
pub use report::{build_report, DetectionReport, ImageSize, MalformedPolicy};
