//! # Support Ticket Classification
//!
//! Help desk webhooks carry no event name, only the current ticket, so
//! everything here is a diff between the incoming ticket and the snapshot
//! stored when the previous webhook arrived. All detected sub-events go
//! out as one batch.

use serde_json::Value as JsonValue;

use crate::classify::{Classifier, EntityState, EventBatch, PayloadIdentities};
use crate::models::tracked_entity;

/// Classifier for Zendesk-style help desk webhooks.
pub struct TicketClassifier;

impl Classifier for TicketClassifier {
    fn classify(
        &self,
        payload: &JsonValue,
        prior: Option<&tracked_entity::Model>,
    ) -> Vec<EventBatch> {
        let assigned = assignee_email(payload).is_some();
        let rated = has_rating(payload);

        let mut events: Vec<&str> = Vec::new();
        match prior {
            None => {
                if assigned {
                    events.push("my_ticket_updated");
                    if rated {
                        events.push("my_ticket_rated");
                    }
                } else {
                    events.push("ticket_logged");
                }
                if has_real_comment(payload) {
                    events.push("my_ticket_commented");
                }
                if rated {
                    events.push("ticket_rated");
                }
            }
            Some(state) => {
                if !assigned {
                    return Vec::new();
                }
                let snapshot = state.snapshot.as_ref();
                let previously_assigned = state
                    .assignee_identity
                    .as_deref()
                    .is_some_and(|identity| !identity.is_empty());
                if !previously_assigned {
                    events.push("my_ticket_assigned");
                }
                if assignee_id_changed(payload, snapshot) {
                    events.push("my_ticket_reassigned");
                }
                if rated && !snapshot.is_some_and(has_rating) {
                    events.push("ticket_rated");
                }
                if latest_comment_changed(payload, snapshot) {
                    events.push("my_ticket_commented");
                }
                events.push("my_ticket_updated");
            }
        }

        if events.is_empty() {
            Vec::new()
        } else {
            vec![events.into_iter().map(str::to_string).collect()]
        }
    }

    fn extract_external_id(&self, payload: &JsonValue) -> Option<String> {
        id_string(payload.get("id"))
    }

    fn extract_entity_state(&self, payload: &JsonValue) -> Option<EntityState> {
        let external_id = self.extract_external_id(payload)?;
        Some(EntityState {
            external_id,
            entity_key: payload
                .get("subject")
                .and_then(JsonValue::as_str)
                .filter(|subject| !subject.is_empty())
                .map(str::to_string),
            assignee_identity: assignee_email(payload),
            is_resolved: is_closed(payload),
            snapshot: Some(payload.clone()),
        })
    }

    fn extract_identities(&self, payload: &JsonValue) -> PayloadIdentities {
        PayloadIdentities {
            actor: email_at(payload, "/current_user/email"),
            assignee: assignee_email(payload),
            reporter: email_at(payload, "/requester/email"),
            commenters: Vec::new(),
        }
    }
}

fn assignee_email(payload: &JsonValue) -> Option<String> {
    email_at(payload, "/assignee/email")
}

fn email_at(payload: &JsonValue, pointer: &str) -> Option<String> {
    payload
        .pointer(pointer)
        .and_then(JsonValue::as_str)
        .filter(|email| !email.is_empty())
        .map(str::to_string)
}

fn has_rating(payload: &JsonValue) -> bool {
    payload
        .get("satisfaction_rating")
        .is_some_and(|rating| !rating.is_null())
}

/// A comment is only real when it still differs from the ticket
/// description once all whitespace is stripped. Help desks echo the
/// description as the first comment of a fresh ticket.
fn has_real_comment(payload: &JsonValue) -> bool {
    let comment = payload.get("comment").and_then(JsonValue::as_str).unwrap_or("");
    let description = payload
        .get("description")
        .and_then(JsonValue::as_str)
        .unwrap_or("");
    let stripped = strip_whitespace(comment);
    !stripped.is_empty() && stripped != strip_whitespace(description)
}

fn strip_whitespace(text: &str) -> String {
    text.chars().filter(|ch| !ch.is_whitespace()).collect()
}

fn assignee_id_changed(payload: &JsonValue, snapshot: Option<&JsonValue>) -> bool {
    let current = id_string(payload.pointer("/assignee/id"));
    let previous = snapshot.and_then(|prior| id_string(prior.pointer("/assignee/id")));
    matches!((current, previous), (Some(now), Some(then)) if now != then)
}

fn latest_comment_changed(payload: &JsonValue, snapshot: Option<&JsonValue>) -> bool {
    let Some(current) = id_string(payload.pointer("/latest_comment/id")) else {
        return false;
    };
    match snapshot.and_then(|prior| id_string(prior.pointer("/latest_comment/id"))) {
        Some(previous) => previous != current,
        None => true,
    }
}

fn is_closed(payload: &JsonValue) -> bool {
    payload
        .get("status")
        .and_then(JsonValue::as_str)
        .is_some_and(|status| {
            status.eq_ignore_ascii_case("solved") || status.eq_ignore_ascii_case("closed")
        })
}

fn id_string(value: Option<&JsonValue>) -> Option<String> {
    match value? {
        JsonValue::String(text) if !text.is_empty() => Some(text.clone()),
        JsonValue::Number(number) => Some(number.to_string()),
        _ => None,
    }
}
