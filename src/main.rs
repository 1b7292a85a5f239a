// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use anyhow::{Context, Result};
use clap::Parser;
use microplastics_detector::{
    api::{start_server, AppState},
    config::ServiceConfig,
    detector::DetectorManager,
    version,
};
use std::env;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env before clap reads the environment
    dotenv::dotenv().ok();

    if env::var("RUST_LOG").is_err() {
        env::set_var("RUST_LOG", "info");
    }
    tracing_subscriber::fmt::init();

    let config = ServiceConfig::parse();
    tracing::info!("🚀 Starting {}", version::get_version_string());
    tracing::info!("Features: {}", version::FEATURES.join(", "));

    // Configuration errors are fatal
    let measurement = config
        .measurement_config()
        .context("Invalid measurement configuration")?;
    let malformed_policy = config
        .malformed_policy()
        .context("Invalid malformed geometry policy")?;
    let detector_config = config
        .detector_config()
        .context("Invalid detector configuration")?;
    let addr = config.listen_addr().context("Invalid listen address")?;

    tracing::info!(
        "Calibration: {} µm/px, target label '{}', categories: {}",
        measurement.calibration.microns_per_pixel(),
        measurement.target_label,
        measurement
            .categories
            .categories()
            .iter()
            .map(|c| c.to_string())
            .collect::<Vec<_>>()
            .join(", ")
    );
    tracing::info!(
        "Detector: {} (confidence >= {}, IoU {}, input {}px)",
        config.model_path.display(),
        detector_config.confidence_threshold,
        detector_config.iou_threshold,
        detector_config.input_size
    );

    let detectors = DetectorManager::new(detector_config).await;
    if !detectors.has_detector() {
        tracing::warn!("⚠️ Serving without a model; /detect will answer 503");
    }

    let state = AppState::new(
        detectors,
        measurement,
        malformed_policy,
        config.detect_timeout(),
    );

    start_server(state, addr).await?;

    tracing::info!("Server stopped");
    Ok(())
}
