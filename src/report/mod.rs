// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Per-image detection reports

pub mod aggregator;

pub use aggregator::{
    build_report, CalibrationInfo, DetectionReport, ImageSize, MalformedPolicy, ReportError,
    SizeCounts,
};
