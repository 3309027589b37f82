//! # API Handlers
//!
//! This module contains all the HTTP endpoint handlers for the Fanout API.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::db;
use crate::models::ServiceInfo;
use crate::server::AppState;

pub mod webhooks;

/// Root handler that returns basic service information
#[utoipa::path(
    get,
    path = "/",
    responses(
        (status = 200, description = "Service information", body = ServiceInfo)
    ),
    tag = "root"
)]
pub async fn root() -> Json<ServiceInfo> {
    Json(ServiceInfo::default())
}

/// Liveness response including the database ping result
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// Overall status, "ok" or "degraded"
    pub status: String,
    /// Database reachability, "connected" or "unreachable"
    pub database: String,
    /// Time the check ran, RFC 3339
    pub timestamp: String,
}

/// Health check handler that pings the database
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse),
        (status = 503, description = "Database is unreachable", body = HealthResponse)
    ),
    tag = "health"
)]
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let database_ok = match db::health_check(&state.db).await {
        Ok(()) => true,
        Err(error) => {
            tracing::warn!(error = %error, "database health check failed");
            false
        }
    };

    let response = HealthResponse {
        status: if database_ok { "ok" } else { "degraded" }.to_string(),
        database: if database_ok { "connected" } else { "unreachable" }.to_string(),
        timestamp: Utc::now().to_rfc3339(),
    };
    let status = if database_ok {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(response))
}
