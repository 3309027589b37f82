//! # Code Review Classification
//!
//! Pull-request webhooks are action-driven, so classification is a direct
//! mapping from the `action` field plus the objects that ride along with
//! it. No diffing against prior state is needed.

use serde_json::Value as JsonValue;

use crate::classify::{Classifier, EntityState, EventBatch, PayloadIdentities};
use crate::models::tracked_entity;

/// Classifier for pull-request review webhooks.
pub struct ReviewClassifier;

impl Classifier for ReviewClassifier {
    fn classify(
        &self,
        payload: &JsonValue,
        _prior: Option<&tracked_entity::Model>,
    ) -> Vec<EventBatch> {
        let Some(action) = payload.get("action").and_then(JsonValue::as_str) else {
            return Vec::new();
        };
        let assigned = assignee(payload).is_some();
        let has_review = payload.get("review").is_some_and(JsonValue::is_object);
        let has_comment = payload.get("comment").is_some_and(JsonValue::is_object);

        let events: Vec<&str> = match action {
            "opened" => {
                if assigned {
                    vec!["review_requested"]
                } else {
                    vec!["review_logged"]
                }
            }
            "submitted" if has_review => vec!["review_submitted"],
            "created" if has_comment => vec!["review_commented", "review_commented_author"],
            "closed" => {
                if merged(payload) {
                    vec!["review_merged", "review_merged_all"]
                } else {
                    vec!["review_closed"]
                }
            }
            _ => {
                if assigned {
                    vec!["review_updated"]
                } else {
                    Vec::new()
                }
            }
        };

        events
            .into_iter()
            .map(|event| vec![event.to_string()])
            .collect()
    }

    fn extract_external_id(&self, payload: &JsonValue) -> Option<String> {
        id_string(payload.pointer("/pull_request/id"))
    }

    fn extract_entity_state(&self, payload: &JsonValue) -> Option<EntityState> {
        let external_id = self.extract_external_id(payload)?;
        let closed = payload.get("action").and_then(JsonValue::as_str) == Some("closed");
        Some(EntityState {
            external_id,
            entity_key: id_string(payload.pointer("/pull_request/number"))
                .map(|number| format!("#{number}")),
            assignee_identity: assignee(payload),
            is_resolved: closed || merged(payload),
            snapshot: payload.get("pull_request").cloned(),
        })
    }

    fn extract_identities(&self, payload: &JsonValue) -> PayloadIdentities {
        PayloadIdentities {
            actor: name_at(payload, "/sender/name"),
            assignee: assignee(payload),
            reporter: name_at(payload, "/pull_request/user/name"),
            commenters: Vec::new(),
        }
    }
}

fn assignee(payload: &JsonValue) -> Option<String> {
    name_at(payload, "/pull_request/assignee/name")
}

fn name_at(payload: &JsonValue, pointer: &str) -> Option<String> {
    payload
        .pointer(pointer)
        .and_then(JsonValue::as_str)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
}

fn merged(payload: &JsonValue) -> bool {
    payload
        .pointer("/pull_request/merged")
        .and_then(JsonValue::as_bool)
        .unwrap_or(false)
}

fn id_string(value: Option<&JsonValue>) -> Option<String> {
    match value? {
        JsonValue::String(text) if !text.is_empty() => Some(text.clone()),
        JsonValue::Number(number) => Some(number.to_string()),
        _ => None,
    }
}
