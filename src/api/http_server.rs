// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::{net::SocketAddr, sync::Arc, time::Duration};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::detect::{detect_base64_handler, detect_handler};
use super::handlers::{health_handler, root_handler};
use crate::detector::DetectorManager;
use crate::measurement::MeasurementConfig;
use crate::report::MalformedPolicy;
use crate::vision::MAX_IMAGE_SIZE;

/// Multipart framing and base64 overhead on top of the raw image limit
const BODY_LIMIT: usize = MAX_IMAGE_SIZE * 2;

/// Process-wide, read-only state shared by all handlers
#[derive(Clone)]
pub struct AppState {
    pub detectors: Arc<DetectorManager>,
    pub measurement: Arc<MeasurementConfig>,
    pub malformed_policy: MalformedPolicy,
    pub detect_timeout: Option<Duration>,
}

impl AppState {
    pub fn new(
        detectors: DetectorManager,
        measurement: MeasurementConfig,
        malformed_policy: MalformedPolicy,
        detect_timeout: Option<Duration>,
    ) -> Self {
        Self {
            detectors: Arc::new(detectors),
            measurement: Arc::new(measurement),
            malformed_policy,
            detect_timeout,
        }
    }

    /// Default measurement settings and no detector
    pub fn new_for_test() -> Self {
        Self::new(
            DetectorManager::empty(),
            MeasurementConfig::default(),
            MalformedPolicy::default(),
            None,
        )
    }
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health_handler))
        .route("/detect", post(detect_handler))
        .route("/v1/detect", post(detect_base64_handler))
        .layer(DefaultBodyLimit::max(BODY_LIMIT))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

pub async fn start_server(state: AppState, addr: SocketAddr) -> anyhow::Result<()> {
    let app = create_router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!("API server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
