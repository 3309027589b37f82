//! # Webhook Handlers
//!
//! This module contains the inbound webhook endpoint. External tools call
//! it with a signed service token in the path; everything after the token
//! check is delegated to the notification pipeline.

use axum::{
    extract::{Path, State, rejection::JsonRejection},
    response::Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{Value as JsonValue, json};
use tracing::debug;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::{ApiError, validation_error};
use crate::notify::WebhookPipeline;
use crate::server::AppState;
use crate::telemetry::{self, TraceContext};

/// Path parameters for the webhook entrypoint
#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct WebhookPath {
    /// Service type slug selecting the classifier (e.g., "issues")
    #[param(min_length = 1, example = "issues")]
    pub service_type: String,
    /// Signed service token issued to the sending service
    pub token: String,
}

/// Webhook processing response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct WebhookResponse {
    /// Number of notifications queued for this delivery
    pub notifications: u64,
    /// Set when the payload did not classify to any known event
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// Receive a webhook from an external service
#[utoipa::path(
    post,
    path = "/webhooks/{service_type}/{token}",
    params(WebhookPath),
    request_body = serde_json::Value,
    responses(
        (status = 200, description = "Webhook processed", body = WebhookResponse),
        (status = 400, description = "Malformed JSON body"),
        (status = 401, description = "Authentication failed"),
        (status = 404, description = "Unknown service type"),
        (status = 500, description = "Storage failure")
    ),
    tag = "webhooks"
)]
pub async fn receive_webhook(
    State(state): State<AppState>,
    Path(path): Path<WebhookPath>,
    payload: Result<Json<JsonValue>, JsonRejection>,
) -> Result<Json<WebhookResponse>, ApiError> {
    let Json(payload) = payload?;
    if !payload.is_object() {
        return Err(validation_error(
            "Webhook payload must be a JSON object",
            json!({"payload": "expected an object"}),
        ));
    }
    debug!(service_type = %path.service_type, "received webhook");

    let pipeline = WebhookPipeline::new(
        &state.db,
        &state.verifier,
        &state.registry,
        &state.renderer,
        state.config.log_retention_hours,
    );
    // One trace id per delivery; errors are converted inside the scope so
    // the problem+json response carries it.
    let trace_id = format!("req-{}", &Uuid::new_v4().to_string()[..8]);
    let outcome = telemetry::with_trace_context(TraceContext { trace_id }, async {
        pipeline
            .handle(&path.service_type, &path.token, payload)
            .await
            .map_err(ApiError::from)
    })
    .await?;

    let response = if outcome.handled {
        WebhookResponse {
            notifications: outcome.notifications,
            detail: None,
        }
    } else {
        WebhookResponse {
            notifications: 0,
            detail: Some("unsupported event".to_string()),
        }
    };
    Ok(Json(response))
}
