// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod detect;
pub mod errors;
pub mod handlers;
pub mod http_server;

pub use detect::{detect_base64_handler, detect_handler, DetectRequest, DetectResponse};
pub use errors::{ApiError, ApiErrorResponse, ErrorResponse};
pub use handlers::{health_handler, root_handler, HealthResponse, RootResponse};
pub use http_server::{create_router, start_server, AppState};
