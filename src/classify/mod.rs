//! # Event Classification
//!
//! Turns raw webhook payloads into semantic event batches. Each supported
//! service type (issue trackers, help desks, build systems, code review
//! tools) has its own [`Classifier`] that knows the payload shape of that
//! tool family and how to diff it against the stored state of the entity
//! the webhook concerns.
//!
//! Classification is pure: classifiers never touch the database. The
//! pipeline hands them the payload plus the previously stored
//! [`tracked_entity::Model`] (if any) and persists whatever
//! [`EntityState`] they extract afterwards.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value as JsonValue;

use crate::models::tracked_entity;

pub mod builds;
pub mod issues;
pub mod reviews;
pub mod tickets;

pub use builds::BuildClassifier;
pub use issues::IssueClassifier;
pub use reviews::ReviewClassifier;
pub use tickets::TicketClassifier;

/// A group of event types that are resolved and processed together.
///
/// Events in the same batch share one already-notified set, so a user who
/// matched a rule for one event in the batch is not notified again for a
/// later event in the same batch.
pub type EventBatch = Vec<String>;

/// Entity state to persist after a webhook has been processed.
///
/// The next webhook for the same external entity is diffed against this.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityState {
    /// Identifier of the entity inside the external tool.
    pub external_id: String,
    /// Human-readable label, e.g. an issue key or a branch name.
    pub entity_key: Option<String>,
    /// External identity of the current assignee, if any.
    pub assignee_identity: Option<String>,
    /// Whether the entity counts as resolved (issue resolved, build green).
    pub is_resolved: bool,
    /// Raw fragment of the payload kept for field-level diffing.
    pub snapshot: Option<JsonValue>,
}

/// External identities mentioned by a payload, used for recipient
/// resolution.
#[derive(Debug, Clone, Default)]
pub struct PayloadIdentities {
    /// Who triggered the webhook.
    pub actor: Option<String>,
    /// Current assignee of the entity.
    pub assignee: Option<String>,
    /// Reporter, requester or author of the entity.
    pub reporter: Option<String>,
    /// Distinct comment authors, in payload order.
    pub commenters: Vec<String>,
}

/// Payload interpretation for one family of external tools.
pub trait Classifier: Send + Sync {
    /// Classify a payload into event batches, diffing against the stored
    /// prior state of the entity when one exists.
    ///
    /// An empty result means the webhook is not a supported event; payloads
    /// with missing or malformed fields degrade to fewer (or no) events
    /// rather than erroring.
    fn classify(
        &self,
        payload: &JsonValue,
        prior: Option<&tracked_entity::Model>,
    ) -> Vec<EventBatch>;

    /// Identifier of the external entity this payload concerns.
    fn extract_external_id(&self, payload: &JsonValue) -> Option<String>;

    /// State to persist for the entity after processing, replacing any
    /// prior record.
    fn extract_entity_state(&self, payload: &JsonValue) -> Option<EntityState>;

    /// External identities mentioned by the payload.
    fn extract_identities(&self, payload: &JsonValue) -> PayloadIdentities;
}

/// Lookup of classifiers by service type slug.
pub struct ClassifierRegistry {
    classifiers: HashMap<&'static str, Arc<dyn Classifier>>,
}

impl ClassifierRegistry {
    /// Registry with all built-in classifiers registered.
    pub fn with_builtin() -> Self {
        let mut classifiers: HashMap<&'static str, Arc<dyn Classifier>> = HashMap::new();
        classifiers.insert("issues", Arc::new(IssueClassifier));
        classifiers.insert("tickets", Arc::new(TicketClassifier));
        classifiers.insert("builds", Arc::new(BuildClassifier));
        classifiers.insert("reviews", Arc::new(ReviewClassifier));
        Self { classifiers }
    }

    /// Classifier for a service type, if one is registered.
    pub fn get(&self, service_type: &str) -> Option<Arc<dyn Classifier>> {
        self.classifiers.get(service_type).cloned()
    }

    /// Registered service type slugs, sorted.
    pub fn service_types(&self) -> Vec<&'static str> {
        let mut types: Vec<&'static str> = self.classifiers.keys().copied().collect();
        types.sort_unstable();
        types
    }
}
