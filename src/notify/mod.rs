//! # Notification Pipeline
//!
//! End-to-end handling of one webhook delivery: authenticate the sender,
//! log the raw payload, classify it into event batches, then resolve and
//! process rules batch by batch. Batches run sequentially because each one
//! must see the set of users the earlier batches already notified. The
//! entity state is persisted last so the next webhook diffs against what
//! this one saw.

pub mod processor;
pub mod resolver;

pub use processor::{ProcessOutcome, RuleProcessor};
pub use resolver::RuleResolver;

use std::collections::HashSet;

use axum::http::StatusCode;
use chrono::{Duration, Utc};
use sea_orm::{DatabaseConnection, DbErr};
use serde_json::Value as JsonValue;
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::auth::{AuthError, TokenVerifier, check_service};
use crate::classify::ClassifierRegistry;
use crate::error::ApiError;
use crate::render::Renderer;
use crate::repositories::{IncomingLogRepository, ServiceRepository, TrackedEntityRepository};

/// Failures that abort a webhook delivery.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error("unknown service type: {0}")]
    UnknownServiceType(String),
    #[error(transparent)]
    Storage(#[from] DbErr),
}

impl From<PipelineError> for ApiError {
    fn from(error: PipelineError) -> Self {
        match error {
            PipelineError::Auth(auth_error) => {
                warn!(error = %auth_error, "webhook authentication failed");
                crate::error::unauthorized(None)
            }
            PipelineError::UnknownServiceType(kind) => ApiError::new(
                StatusCode::NOT_FOUND,
                "NOT_FOUND",
                format!("Unknown service type: {kind}"),
            ),
            PipelineError::Storage(db_error) => ApiError::from(db_error),
        }
    }
}

/// Result of one webhook delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WebhookOutcome {
    /// Notifications queued across all event batches.
    pub notifications: u64,
    /// False when classification produced no recognized event.
    pub handled: bool,
}

/// Orchestrates one webhook delivery from token check to state persist.
pub struct WebhookPipeline<'a> {
    db: &'a DatabaseConnection,
    verifier: &'a TokenVerifier,
    classifiers: &'a ClassifierRegistry,
    renderer: &'a Renderer,
    log_retention_hours: u64,
}

impl<'a> WebhookPipeline<'a> {
    pub fn new(
        db: &'a DatabaseConnection,
        verifier: &'a TokenVerifier,
        classifiers: &'a ClassifierRegistry,
        renderer: &'a Renderer,
        log_retention_hours: u64,
    ) -> Self {
        Self {
            db,
            verifier,
            classifiers,
            renderer,
            log_retention_hours,
        }
    }

    pub async fn handle(
        &self,
        service_type: &str,
        token: &str,
        payload: JsonValue,
    ) -> Result<WebhookOutcome, PipelineError> {
        let classifier = self
            .classifiers
            .get(service_type)
            .ok_or_else(|| PipelineError::UnknownServiceType(service_type.to_string()))?;

        let claims = self.verifier.decode(token)?;
        let service = ServiceRepository::new(self.db)
            .find_active(claims.service_id)
            .await?
            .ok_or(AuthError::ServiceNotFound(claims.service_id))?;
        check_service(&claims, &service, service_type)?;

        let logs = IncomingLogRepository::new(self.db);
        logs.append(service.id, payload.clone()).await?;
        let cutoff = Utc::now() - Duration::hours(self.log_retention_hours as i64);
        if let Err(error) = logs.prune_older_than(cutoff).await {
            warn!(service_id = %service.id, error = %error, "failed to prune incoming log");
        }

        let entities = TrackedEntityRepository::new(self.db);
        let prior = match classifier.extract_external_id(&payload) {
            Some(external_id) => entities.find_by_external(service.id, &external_id).await?,
            None => None,
        };

        let batches = classifier.classify(&payload, prior.as_ref());
        if batches.is_empty() {
            debug!(service_id = %service.id, "payload did not classify to any known event");
            return Ok(WebhookOutcome {
                notifications: 0,
                handled: false,
            });
        }
        debug!(service_id = %service.id, ?batches, "classified webhook");

        let identities = classifier.extract_identities(&payload);
        let resolver = RuleResolver::new(self.db);
        let processor = RuleProcessor::new(self.db, self.renderer);
        let mut already_notified: HashSet<Uuid> = HashSet::new();
        let mut queued: u64 = 0;
        for batch in &batches {
            let matches = resolver
                .resolve_batch(
                    service.id,
                    batch,
                    &identities,
                    prior.as_ref(),
                    &already_notified,
                )
                .await?;
            let outcome = processor.process(&matches, &payload).await;
            already_notified.extend(outcome.notified_user_ids);
            queued += outcome.queued;
        }

        if let Some(state) = classifier.extract_entity_state(&payload) {
            entities
                .replace(
                    service.id,
                    &state.external_id,
                    state.entity_key,
                    state.assignee_identity,
                    state.is_resolved,
                    state.snapshot,
                )
                .await?;
        }

        info!(
            service_id = %service.id,
            notifications = queued,
            "webhook processed"
        );
        Ok(WebhookOutcome {
            notifications: queued,
            handled: true,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_errors_map_to_unauthorized() {
        let error = PipelineError::Auth(AuthError::MissingToken);
        let api_error = ApiError::from(error);
        assert_eq!(api_error.status, StatusCode::UNAUTHORIZED);
        assert_eq!(api_error.code, "UNAUTHORIZED");
    }

    #[test]
    fn test_unknown_service_type_maps_to_not_found() {
        let error = PipelineError::UnknownServiceType("calendars".to_string());
        let api_error = ApiError::from(error);
        assert_eq!(api_error.status, StatusCode::NOT_FOUND);
        assert!(api_error.message.contains("calendars"));
    }

    #[test]
    fn test_storage_errors_keep_their_database_mapping() {
        let error = PipelineError::Storage(DbErr::RecordNotFound("rules".to_string()));
        let api_error = ApiError::from(error);
        assert_eq!(api_error.status, StatusCode::NOT_FOUND);
    }
}
