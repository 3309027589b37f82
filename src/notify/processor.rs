//! # Rule Processor
//!
//! Executes resolved rules in priority order: evaluates each rule's extra
//! conditions, renders its template and queues the notification. Failures
//! are isolated per rule so one broken template cannot block the rest of
//! the batch.

use std::collections::HashSet;

use sea_orm::{DatabaseConnection, DbErr};
use serde_json::Value as JsonValue;
use thiserror::Error;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::models::{rule, template};
use crate::render::{RenderEngine, RenderError, Renderer, merge_context};
use crate::repositories::{NotificationRepository, RuleRepository};

/// Per-rule failure; logged and skipped, never fatal for the batch.
#[derive(Debug, Error)]
enum ProcessRuleError {
    #[error("rule has no template")]
    MissingTemplate,
    #[error("template render failed: {0}")]
    Render(#[from] RenderError),
    #[error("notification insert failed: {0}")]
    Queue(#[from] DbErr),
}

/// One condition from a rule's `extra_conditions` map.
#[derive(Debug, Clone, PartialEq, Eq)]
enum RuleCondition {
    /// Comma-separated allow-list of issue project keys.
    Project(String),
    /// Ticket status, compared case-insensitively.
    Status(String),
    /// Ticket group name, compared case-insensitively.
    GroupName(String),
}

impl RuleCondition {
    fn matches(&self, payload: &JsonValue) -> bool {
        match self {
            RuleCondition::Project(allowed) => payload
                .pointer("/issue/fields/project/key")
                .and_then(JsonValue::as_str)
                .is_some_and(|project| {
                    allowed.split(',').any(|key| key.trim() == project)
                }),
            RuleCondition::Status(expected) => payload
                .get("status")
                .and_then(JsonValue::as_str)
                .is_some_and(|status| status.eq_ignore_ascii_case(expected)),
            RuleCondition::GroupName(expected) => payload
                .get("group_name")
                .and_then(JsonValue::as_str)
                .is_some_and(|group| group.eq_ignore_ascii_case(expected)),
        }
    }
}

/// Known condition names from the rule's JSON map. Unknown names and
/// non-string values are ignored, so they always pass.
fn parse_conditions(extra: Option<&JsonValue>) -> Vec<RuleCondition> {
    let Some(map) = extra.and_then(JsonValue::as_object) else {
        return Vec::new();
    };
    let mut conditions = Vec::new();
    for (name, value) in map {
        let Some(value) = value.as_str() else {
            continue;
        };
        match name.as_str() {
            "project" => conditions.push(RuleCondition::Project(value.to_string())),
            "status" => conditions.push(RuleCondition::Status(value.to_string())),
            "group_name" => conditions.push(RuleCondition::GroupName(value.to_string())),
            _ => {}
        }
    }
    conditions
}

/// Result of processing one resolved rule set.
#[derive(Debug, Default)]
pub struct ProcessOutcome {
    /// Users who received a notification in this pass.
    pub notified_user_ids: HashSet<Uuid>,
    /// Notifications queued in this pass.
    pub queued: u64,
}

/// Runs resolved rules and queues their notifications.
pub struct RuleProcessor<'a> {
    db: &'a DatabaseConnection,
    renderer: &'a Renderer,
}

impl<'a> RuleProcessor<'a> {
    pub fn new(db: &'a DatabaseConnection, renderer: &'a Renderer) -> Self {
        Self { db, renderer }
    }

    /// Process rules in the order given. A user already notified within
    /// this pass is skipped for later rules.
    pub async fn process(
        &self,
        matches: &[(rule::Model, Option<template::Model>)],
        payload: &JsonValue,
    ) -> ProcessOutcome {
        let mut outcome = ProcessOutcome::default();
        for (rule, template) in matches {
            if outcome.notified_user_ids.contains(&rule.user_id) {
                continue;
            }
            let conditions = parse_conditions(rule.extra_conditions.as_ref());
            if !conditions.iter().all(|condition| condition.matches(payload)) {
                debug!(rule_id = %rule.id, "extra conditions did not match, skipping rule");
                continue;
            }
            match self.apply_rule(rule, template.as_ref(), payload).await {
                Ok(()) => {
                    outcome.notified_user_ids.insert(rule.user_id);
                    outcome.queued += 1;
                }
                Err(error) => {
                    warn!(
                        rule_id = %rule.id,
                        error = %error,
                        "rule processing failed, continuing with remaining rules"
                    );
                }
            }
        }
        outcome
    }

    async fn apply_rule(
        &self,
        rule: &rule::Model,
        template: Option<&template::Model>,
        payload: &JsonValue,
    ) -> Result<(), ProcessRuleError> {
        let template = template.ok_or(ProcessRuleError::MissingTemplate)?;
        let engine = RenderEngine::from_name(&template.render_engine)?;
        let data = merge_context(
            template.default_options.as_ref(),
            rule.out_template_options.as_ref(),
            payload,
            &rule.trigger,
        );
        let content = self.renderer.render(engine, &template.content, &data)?;

        NotificationRepository::new(self.db)
            .enqueue(rule.user_id, rule.id, rule.out_service_id, content)
            .await?;

        // The notification is queued either way; a missed count is only
        // a statistics glitch.
        if let Err(error) = RuleRepository::new(self.db).increment_fired_count(rule.id).await {
            warn!(rule_id = %rule.id, error = %error, "failed to increment fired count");
        }
        Ok(())
    }
}
