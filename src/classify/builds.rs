//! # CI Build Classification
//!
//! Build webhooks are tracked per branch. The stored state records whether
//! the last seen build was green, which is what separates a plain failure
//! from a fresh breakage and a plain success from a fix.

use serde_json::Value as JsonValue;

use crate::classify::{Classifier, EntityState, EventBatch, PayloadIdentities};
use crate::models::tracked_entity;

/// Classifier for CI build status webhooks.
pub struct BuildClassifier;

impl Classifier for BuildClassifier {
    fn classify(
        &self,
        payload: &JsonValue,
        prior: Option<&tracked_entity::Model>,
    ) -> Vec<EventBatch> {
        let Some(status) = payload
            .pointer("/build/status")
            .and_then(JsonValue::as_str)
        else {
            return Vec::new();
        };
        let green = status.eq_ignore_ascii_case("success");

        let event = match prior {
            None => {
                if green {
                    "build_succeeded"
                } else {
                    "build_failed"
                }
            }
            Some(state) => {
                if state.is_resolved && !green {
                    "build_failed"
                } else if !state.is_resolved && green {
                    "build_fixed"
                } else if green {
                    "build_succeeded"
                } else {
                    "build_failed"
                }
            }
        };
        vec![vec![event.to_string()]]
    }

    fn extract_external_id(&self, payload: &JsonValue) -> Option<String> {
        branch(payload)
    }

    fn extract_entity_state(&self, payload: &JsonValue) -> Option<EntityState> {
        let branch = branch(payload)?;
        let green = payload
            .pointer("/build/status")
            .and_then(JsonValue::as_str)
            .is_some_and(|status| status.eq_ignore_ascii_case("success"));
        Some(EntityState {
            external_id: branch.clone(),
            entity_key: Some(branch),
            assignee_identity: None,
            is_resolved: green,
            snapshot: payload.get("build").cloned(),
        })
    }

    fn extract_identities(&self, payload: &JsonValue) -> PayloadIdentities {
        PayloadIdentities {
            actor: payload
                .pointer("/actor/name")
                .and_then(JsonValue::as_str)
                .filter(|name| !name.is_empty())
                .map(str::to_string),
            ..PayloadIdentities::default()
        }
    }
}

fn branch(payload: &JsonValue) -> Option<String> {
    payload
        .pointer("/build/branch")
        .and_then(JsonValue::as_str)
        .filter(|branch| !branch.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use serde_json::json;
    use uuid::Uuid;

    use super::*;

    fn build(status: &str) -> JsonValue {
        json!({
            "build": {
                "id": 512,
                "number": 88,
                "status": status,
                "branch": "main",
                "url": "https://ci.example.com/builds/512",
            },
            "actor": {"name": "alice"},
        })
    }

    fn prior_state(was_green: bool) -> tracked_entity::Model {
        tracked_entity::Model {
            id: Uuid::new_v4(),
            service_id: Uuid::new_v4(),
            external_id: "main".to_string(),
            entity_key: Some("main".to_string()),
            assignee_identity: None,
            is_resolved: was_green,
            snapshot: None,
            created_at: Utc::now().into(),
            updated_at: Utc::now().into(),
        }
    }

    #[test]
    fn test_first_build_classifies_by_current_status() {
        assert_eq!(
            BuildClassifier.classify(&build("SUCCESS"), None),
            vec![vec!["build_succeeded".to_string()]]
        );
        assert_eq!(
            BuildClassifier.classify(&build("failure"), None),
            vec![vec!["build_failed".to_string()]]
        );
    }

    #[test]
    fn test_green_to_red_is_build_failed() {
        let prior = prior_state(true);
        assert_eq!(
            BuildClassifier.classify(&build("failure"), Some(&prior)),
            vec![vec!["build_failed".to_string()]]
        );
    }

    #[test]
    fn test_red_to_green_is_build_fixed() {
        let prior = prior_state(false);
        assert_eq!(
            BuildClassifier.classify(&build("Success"), Some(&prior)),
            vec![vec!["build_fixed".to_string()]]
        );
    }

    #[test]
    fn test_steady_states_repeat_their_event() {
        let green = prior_state(true);
        assert_eq!(
            BuildClassifier.classify(&build("success"), Some(&green)),
            vec![vec!["build_succeeded".to_string()]]
        );
        let red = prior_state(false);
        assert_eq!(
            BuildClassifier.classify(&build("failure"), Some(&red)),
            vec![vec!["build_failed".to_string()]]
        );
    }

    #[test]
    fn test_missing_status_yields_nothing() {
        assert!(BuildClassifier.classify(&json!({"build": {}}), None).is_empty());
        assert!(BuildClassifier.classify(&json!({}), None).is_empty());
    }

    #[test]
    fn test_entity_state_tracks_branch_and_greenness() {
        let state = BuildClassifier
            .extract_entity_state(&build("success"))
            .expect("state");
        assert_eq!(state.external_id, "main");
        assert_eq!(state.entity_key.as_deref(), Some("main"));
        assert!(state.is_resolved);
        assert!(state.assignee_identity.is_none());

        let state = BuildClassifier
            .extract_entity_state(&build("failure"))
            .expect("state");
        assert!(!state.is_resolved);
    }
}
