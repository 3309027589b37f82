//! # Issue Tracker Classification
//!
//! Classifies webhooks from Jira-style issue trackers. Creation events
//! carry their meaning directly; update events are interpreted against the
//! stored state of the issue, in precedence order: resolution changes beat
//! reopening, reopening beats comments, comments beat reassignment, and
//! everything else is a generic update.

use serde_json::Value as JsonValue;

use crate::classify::{Classifier, EntityState, EventBatch, PayloadIdentities};
use crate::models::tracked_entity;

/// Classifier for Jira-style issue tracker webhooks.
pub struct IssueClassifier;

impl Classifier for IssueClassifier {
    fn classify(
        &self,
        payload: &JsonValue,
        prior: Option<&tracked_entity::Model>,
    ) -> Vec<EventBatch> {
        match payload.get("webhookEvent").and_then(JsonValue::as_str) {
            Some("issue_created") => {
                let event = if assignee(payload).is_some() {
                    "assigned"
                } else {
                    "logged_unassigned"
                };
                vec![vec![event.to_string()]]
            }
            Some("issue_updated") => classify_update(payload, prior),
            _ => Vec::new(),
        }
    }

    fn extract_external_id(&self, payload: &JsonValue) -> Option<String> {
        id_string(payload.pointer("/issue/id"))
    }

    fn extract_entity_state(&self, payload: &JsonValue) -> Option<EntityState> {
        let external_id = self.extract_external_id(payload)?;
        Some(EntityState {
            external_id,
            entity_key: payload
                .pointer("/issue/key")
                .and_then(JsonValue::as_str)
                .map(str::to_string),
            assignee_identity: assignee(payload),
            is_resolved: is_resolved(payload),
            snapshot: payload.get("issue").cloned(),
        })
    }

    fn extract_identities(&self, payload: &JsonValue) -> PayloadIdentities {
        PayloadIdentities {
            actor: name_at(payload, "/user/name"),
            assignee: assignee(payload),
            reporter: name_at(payload, "/issue/fields/reporter/name"),
            commenters: commenters(payload),
        }
    }
}

/// Update events in precedence order. Each event becomes its own
/// single-event batch, so recipients of an earlier event are still
/// excluded from the later ones.
fn classify_update(
    payload: &JsonValue,
    prior: Option<&tracked_entity::Model>,
) -> Vec<EventBatch> {
    let assigned = assignee(payload).is_some();
    let resolved_now = is_resolved(payload);
    let was_resolved = prior.is_some_and(|state| state.is_resolved);
    let (resolve_transition, reopen_transition) = resolution_transitions(payload);

    let mut events: Vec<&str> = Vec::new();
    if resolved_now && (!was_resolved || resolve_transition) {
        if assigned {
            events.push("resolved");
        }
        events.push("resolved_reported");
        events.push("resolved_all");
    } else if !resolved_now && (was_resolved || reopen_transition) {
        events.push(if assigned {
            "reopened"
        } else {
            "reopened_unassigned"
        });
        events.push("reopened_reported");
    } else if payload.get("comment").is_some_and(JsonValue::is_object) {
        if assigned {
            events.push("comment");
        }
        events.push("comment_reported");
        events.push("comment_participated");
    } else if reassigned_from_prior(payload, prior) {
        events.push("reassigned");
    } else {
        if assigned {
            events.push("updated");
        }
        events.push("updated_reported");
        events.push("updated_participated");
    }

    events
        .into_iter()
        .map(|event| vec![event.to_string()])
        .collect()
}

/// Resolution transitions recorded in the changelog:
/// `(resolved, reopened)` for an empty-to-set and set-to-empty change.
fn resolution_transitions(payload: &JsonValue) -> (bool, bool) {
    let mut resolve = false;
    let mut reopen = false;
    let Some(items) = payload
        .pointer("/changelog/items")
        .and_then(JsonValue::as_array)
    else {
        return (resolve, reopen);
    };
    for item in items {
        if item.get("field").and_then(JsonValue::as_str) != Some("resolution") {
            continue;
        }
        let from = item
            .get("field")
            .and_then(|field| field.get("from"))
            .and_then(JsonValue::as_str);
        let to = item
            .get("field")
            .and_then(|field| field.get("to"))
            .and_then(JsonValue::as_str);
        let from_set = from.is_some_and(|value| !value.is_empty());
        let to_set = to.is_some_and(|value| !value.is_empty());
        if !from_set && to_set {
            resolve = true;
        }
        if from_set && !to_set {
            reopen = true;
        }
    }
    (resolve, reopen)
}

fn reassigned_from_prior(payload: &JsonValue, prior: Option<&tracked_entity::Model>) -> bool {
    let Some(previous) = prior
        .and_then(|state| state.assignee_identity.as_deref())
        .filter(|identity| !identity.is_empty())
    else {
        return false;
    };
    assignee(payload).as_deref() != Some(previous)
}

fn assignee(payload: &JsonValue) -> Option<String> {
    name_at(payload, "/issue/fields/assignee/name")
}

fn name_at(payload: &JsonValue, pointer: &str) -> Option<String> {
    payload
        .pointer(pointer)
        .and_then(JsonValue::as_str)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
}

fn commenters(payload: &JsonValue) -> Vec<String> {
    let mut authors: Vec<String> = Vec::new();
    let mut push = |name: Option<String>| {
        if let Some(name) = name {
            if !authors.contains(&name) {
                authors.push(name);
            }
        }
    };
    if let Some(comments) = payload
        .pointer("/issue/fields/comment/comments")
        .and_then(JsonValue::as_array)
    {
        for comment in comments {
            push(name_at(comment, "/author/name"));
        }
    }
    push(name_at(payload, "/comment/author/name"));
    authors
}

/// Resolved means the resolution object is set with a truthy id.
fn is_resolved(payload: &JsonValue) -> bool {
    payload
        .pointer("/issue/fields/resolution")
        .filter(|resolution| !resolution.is_null())
        .and_then(|resolution| resolution.get("id"))
        .is_some_and(truthy)
}

fn truthy(value: &JsonValue) -> bool {
    match value {
        JsonValue::Null => false,
        JsonValue::Bool(flag) => *flag,
        JsonValue::Number(number) => number.as_f64().is_some_and(|float| float != 0.0),
        JsonValue::String(text) => !text.is_empty(),
        _ => true,
    }
}

fn id_string(value: Option<&JsonValue>) -> Option<String> {
    match value? {
        JsonValue::String(text) if !text.is_empty() => Some(text.clone()),
        JsonValue::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use serde_json::json;
    use uuid::Uuid;

    use super::*;

    fn prior_state(
        assignee_identity: Option<&str>,
        is_resolved: bool,
    ) -> tracked_entity::Model {
        tracked_entity::Model {
            id: Uuid::new_v4(),
            service_id: Uuid::new_v4(),
            external_id: "10001".to_string(),
            entity_key: Some("PROJ-1".to_string()),
            assignee_identity: assignee_identity.map(str::to_string),
            is_resolved,
            snapshot: None,
            created_at: Utc::now().into(),
            updated_at: Utc::now().into(),
        }
    }

    fn issue(assignee: Option<&str>, resolution_id: Option<&str>) -> JsonValue {
        json!({
            "id": "10001",
            "key": "PROJ-1",
            "fields": {
                "assignee": assignee.map(|name| json!({"name": name})),
                "reporter": {"name": "reporter"},
                "resolution": resolution_id.map(|id| json!({"id": id, "name": "Fixed"})),
                "status": {"name": "Open"},
                "project": {"key": "PROJ"},
            },
        })
    }

    fn batches(events: &[&str]) -> Vec<EventBatch> {
        events
            .iter()
            .map(|event| vec![event.to_string()])
            .collect()
    }

    #[test]
    fn test_created_with_assignee_is_assigned() {
        let payload = json!({
            "webhookEvent": "issue_created",
            "issue": issue(Some("alice"), None),
            "user": {"name": "bob"},
        });
        let result = IssueClassifier.classify(&payload, None);
        assert_eq!(result, batches(&["assigned"]));
    }

    #[test]
    fn test_created_without_assignee_is_logged_unassigned() {
        let payload = json!({
            "webhookEvent": "issue_created",
            "issue": issue(None, None),
        });
        let result = IssueClassifier.classify(&payload, None);
        assert_eq!(result, batches(&["logged_unassigned"]));
    }

    #[test]
    fn test_updated_to_resolved_emits_resolved_family() {
        let payload = json!({
            "webhookEvent": "issue_updated",
            "issue": issue(Some("alice"), Some("5")),
        });
        let prior = prior_state(Some("alice"), false);
        let result = IssueClassifier.classify(&payload, Some(&prior));
        assert_eq!(
            result,
            batches(&["resolved", "resolved_reported", "resolved_all"])
        );
    }

    #[test]
    fn test_resolved_without_assignee_skips_assignee_event() {
        let payload = json!({
            "webhookEvent": "issue_updated",
            "issue": issue(None, Some("5")),
        });
        let result = IssueClassifier.classify(&payload, None);
        assert_eq!(result, batches(&["resolved_reported", "resolved_all"]));
    }

    #[test]
    fn test_resolution_with_zero_id_does_not_count_as_resolved() {
        let payload = json!({
            "webhookEvent": "issue_updated",
            "issue": {
                "id": "10001",
                "fields": {
                    "assignee": {"name": "alice"},
                    "resolution": {"id": 0},
                },
            },
        });
        let result = IssueClassifier.classify(&payload, None);
        assert_eq!(
            result,
            batches(&["updated", "updated_reported", "updated_participated"])
        );
    }

    #[test]
    fn test_unresolving_a_resolved_issue_emits_reopened() {
        let payload = json!({
            "webhookEvent": "issue_updated",
            "issue": issue(Some("alice"), None),
        });
        let prior = prior_state(Some("alice"), true);
        let result = IssueClassifier.classify(&payload, Some(&prior));
        assert_eq!(result, batches(&["reopened", "reopened_reported"]));
    }

    #[test]
    fn test_reopened_without_assignee_is_reopened_unassigned() {
        let payload = json!({
            "webhookEvent": "issue_updated",
            "issue": issue(None, None),
        });
        let prior = prior_state(Some("alice"), true);
        let result = IssueClassifier.classify(&payload, Some(&prior));
        assert_eq!(result, batches(&["reopened_unassigned", "reopened_reported"]));
    }

    #[test]
    fn test_comment_payload_emits_comment_family() {
        let mut payload = json!({
            "webhookEvent": "issue_updated",
            "issue": issue(Some("alice"), None),
            "comment": {"id": "301", "author": {"name": "carol"}, "body": "done?"},
        });
        let prior = prior_state(Some("alice"), false);
        let result = IssueClassifier.classify(&payload, Some(&prior));
        assert_eq!(
            result,
            batches(&["comment", "comment_reported", "comment_participated"])
        );

        // Resolution still wins over the comment.
        payload["issue"]["fields"]["resolution"] = json!({"id": "5"});
        let result = IssueClassifier.classify(&payload, Some(&prior));
        assert_eq!(
            result,
            batches(&["resolved", "resolved_reported", "resolved_all"])
        );
    }

    #[test]
    fn test_assignee_change_without_comment_is_reassigned() {
        let payload = json!({
            "webhookEvent": "issue_updated",
            "issue": issue(Some("alice"), None),
        });
        let prior = prior_state(Some("bob"), false);
        let result = IssueClassifier.classify(&payload, Some(&prior));
        assert_eq!(result, batches(&["reassigned"]));
    }

    #[test]
    fn test_comment_takes_precedence_over_reassignment() {
        let payload = json!({
            "webhookEvent": "issue_updated",
            "issue": issue(Some("alice"), None),
            "comment": {"author": {"name": "bob"}},
        });
        let prior = prior_state(Some("bob"), false);
        let result = IssueClassifier.classify(&payload, Some(&prior));
        assert_eq!(
            result,
            batches(&["comment", "comment_reported", "comment_participated"])
        );
    }

    #[test]
    fn test_plain_update_emits_updated_family() {
        let payload = json!({
            "webhookEvent": "issue_updated",
            "issue": issue(Some("alice"), None),
        });
        let result = IssueClassifier.classify(&payload, None);
        assert_eq!(
            result,
            batches(&["updated", "updated_reported", "updated_participated"])
        );
    }

    #[test]
    fn test_changelog_entries_leave_steady_resolution_as_update() {
        // The resolution is set both before and after, and the changelog
        // rows do not indicate a fresh transition, so this stays a plain
        // update of a resolved issue.
        let payload = json!({
            "webhookEvent": "issue_updated",
            "issue": issue(Some("alice"), Some("5")),
            "changelog": {
                "items": [
                    {"field": "resolution", "from": null, "to": "5",
                     "fromString": null, "toString": "Fixed"},
                ],
            },
        });
        let prior = prior_state(Some("alice"), true);
        let result = IssueClassifier.classify(&payload, Some(&prior));
        assert_eq!(
            result,
            batches(&["updated", "updated_reported", "updated_participated"])
        );
    }

    #[test]
    fn test_unknown_webhook_event_yields_nothing() {
        let payload = json!({
            "webhookEvent": "worklog_updated",
            "issue": issue(Some("alice"), None),
        });
        assert!(IssueClassifier.classify(&payload, None).is_empty());
        assert!(IssueClassifier.classify(&json!({}), None).is_empty());
    }

    #[test]
    fn test_extract_external_id_handles_string_and_number() {
        let classifier = IssueClassifier;
        let payload = json!({"issue": {"id": "10001"}});
        assert_eq!(
            classifier.extract_external_id(&payload),
            Some("10001".to_string())
        );
        let payload = json!({"issue": {"id": 10002}});
        assert_eq!(
            classifier.extract_external_id(&payload),
            Some("10002".to_string())
        );
        assert_eq!(classifier.extract_external_id(&json!({})), None);
    }

    #[test]
    fn test_extract_entity_state_captures_issue_fields() {
        let payload = json!({
            "webhookEvent": "issue_updated",
            "issue": issue(Some("alice"), Some("5")),
        });
        let state = IssueClassifier
            .extract_entity_state(&payload)
            .expect("state");
        assert_eq!(state.external_id, "10001");
        assert_eq!(state.entity_key.as_deref(), Some("PROJ-1"));
        assert_eq!(state.assignee_identity.as_deref(), Some("alice"));
        assert!(state.is_resolved);
        assert_eq!(state.snapshot, payload.get("issue").cloned());
    }

    #[test]
    fn test_extract_identities_collects_distinct_commenters() {
        let payload = json!({
            "webhookEvent": "issue_updated",
            "user": {"name": "dave"},
            "issue": {
                "id": "10001",
                "fields": {
                    "assignee": {"name": "alice"},
                    "reporter": {"name": "bob"},
                    "comment": {
                        "comments": [
                            {"author": {"name": "carol"}},
                            {"author": {"name": "carol"}},
                            {"author": {"name": "bob"}},
                        ],
                    },
                },
            },
            "comment": {"author": {"name": "erin"}},
        });
        let identities = IssueClassifier.extract_identities(&payload);
        assert_eq!(identities.actor.as_deref(), Some("dave"));
        assert_eq!(identities.assignee.as_deref(), Some("alice"));
        assert_eq!(identities.reporter.as_deref(), Some("bob"));
        assert_eq!(identities.commenters, vec!["carol", "bob", "erin"]);
    }
}
