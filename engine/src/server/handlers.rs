//! HTTP request handlers

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use openapi_server::models::{
    ApiResponse, DeployResponse, ErrorResponse, HealthResponse, VersionResponse,
};
use tracing::{error, info, warn};

use crate::errors::EngineError;
use crate::models::config::DeploymentConfig;
use crate::server::state::ServerState;
use crate::utils::version_info;

/// Health check handler
pub async fn health_handler() -> impl IntoResponse {
    let version = version_info();
    Json(HealthResponse {
        status: "healthy".to_string(),
        service: "landing-zone".to_string(),
        version: version.version,
    })
}

/// Version handler
pub async fn version_handler() -> impl IntoResponse {
    let version = version_info();
    Json(VersionResponse {
        version: version.version,
        git_hash: version.git_hash,
        build_time: version.build_time,
    })
}

/// Start a deployment and reply with its id without waiting for it
pub async fn deploy_handler(
    State(state): State<Arc<ServerState>>,
    payload: Result<Json<DeploymentConfig>, JsonRejection>,
) -> Response {
    let Json(config) = match payload {
        Ok(payload) => payload,
        Err(rejection) => {
            warn!("Rejected deployment request: {}", rejection.body_text());
            return error_response(StatusCode::BAD_REQUEST, rejection.body_text());
        }
    };

    match state.orchestrator.start(config) {
        Ok(deployment_id) => {
            info!("Accepted deployment {}", deployment_id);
            Json(DeployResponse {
                success: true,
                message: "Deployment started".to_string(),
                deployment_id,
            })
            .into_response()
        }
        Err(e @ EngineError::InvalidConfig(_)) => {
            warn!("Rejected deployment request: {}", e);
            error_response(StatusCode::BAD_REQUEST, e.to_string())
        }
        Err(e) => {
            error!("Failed to start deployment: {}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}

/// Current deployment status
pub async fn status_handler(State(state): State<Arc<ServerState>>) -> impl IntoResponse {
    Json(ApiResponse::ok(state.orchestrator.query_status()))
}

fn error_response(code: StatusCode, message: impl Into<String>) -> Response {
    (code, Json(ErrorResponse::new(message))).into_response()
}
