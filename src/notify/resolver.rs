//! # Rule Resolver
//!
//! Decides who an event batch addresses and fetches the matching rules.
//! Resolution is side-effect-free; everything it returns is processed (and
//! mutated) by the rule processor.

use std::collections::{HashMap, HashSet};

use sea_orm::{DatabaseConnection, DbErr};
use uuid::Uuid;

use crate::classify::PayloadIdentities;
use crate::models::{rule, template, tracked_entity};
use crate::repositories::{BindingRepository, RuleRepository, TriggerScope};

/// Whose identity an event type addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Recipient {
    /// Current assignee of the entity.
    Assignee,
    /// Reporter, requester or author.
    Reporter,
    /// Everyone involved: assignee, reporter and commenters.
    Participants,
    /// The assignee on file before this webhook, who lost the assignment.
    PreviousAssignee,
    /// No identity filter; any bound user's rule may match.
    Anonymous,
}

fn recipient_for(event_type: &str) -> Option<Recipient> {
    let recipient = match event_type {
        "assigned" | "updated" | "comment" | "reopened" | "resolved" | "my_ticket_updated"
        | "my_ticket_rated" | "my_ticket_assigned" | "my_ticket_reassigned"
        | "my_ticket_commented" | "review_requested" | "review_commented"
        | "review_updated" => Recipient::Assignee,
        "resolved_reported" | "reopened_reported" | "comment_reported" | "updated_reported"
        | "review_submitted" | "review_commented_author" | "review_merged"
        | "review_closed" => Recipient::Reporter,
        "comment_participated" | "updated_participated" => Recipient::Participants,
        "reassigned" => Recipient::PreviousAssignee,
        "logged_unassigned" | "reopened_unassigned" | "resolved_all" | "ticket_logged"
        | "ticket_rated" | "build_failed" | "build_fixed" | "build_succeeded"
        | "review_logged" | "review_merged_all" => Recipient::Anonymous,
        _ => return None,
    };
    Some(recipient)
}

/// Identities an event addresses, or `None` for anonymous events that
/// carry no identity filter at all.
fn destinations(
    recipient: Recipient,
    identities: &PayloadIdentities,
    prior: Option<&tracked_entity::Model>,
) -> Option<Vec<String>> {
    match recipient {
        Recipient::Anonymous => None,
        Recipient::Assignee => Some(identities.assignee.iter().cloned().collect()),
        Recipient::Reporter => Some(identities.reporter.iter().cloned().collect()),
        Recipient::PreviousAssignee => Some(
            prior
                .and_then(|state| state.assignee_identity.clone())
                .filter(|identity| !identity.is_empty())
                .into_iter()
                .collect(),
        ),
        Recipient::Participants => {
            let mut union: Vec<String> = Vec::new();
            for identity in identities
                .assignee
                .iter()
                .chain(identities.reporter.iter())
                .chain(identities.commenters.iter())
            {
                if !union.contains(identity) {
                    union.push(identity.clone());
                }
            }
            Some(union)
        }
    }
}

/// Resolves event batches into candidate rules.
pub struct RuleResolver<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> RuleResolver<'a> {
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    /// Candidate rules for one event batch, ordered by priority across the
    /// whole batch.
    ///
    /// Identity-addressed events never target the acting user; an event
    /// whose destination resolves to nobody contributes nothing to the
    /// query. Users in `already_notified` are excluded up front.
    pub async fn resolve_batch(
        &self,
        service_id: Uuid,
        batch: &[String],
        identities: &PayloadIdentities,
        prior: Option<&tracked_entity::Model>,
        already_notified: &HashSet<Uuid>,
    ) -> Result<Vec<(rule::Model, Option<template::Model>)>, DbErr> {
        let bindings = BindingRepository::new(self.db)
            .bound_for_service(service_id)
            .await?;
        if bindings.is_empty() {
            return Ok(Vec::new());
        }

        let mut users_by_identity: HashMap<&str, Vec<Uuid>> = HashMap::new();
        let mut all_bound: Vec<Uuid> = Vec::new();
        for binding in &bindings {
            users_by_identity
                .entry(binding.service_username.as_str())
                .or_default()
                .push(binding.user_id);
            if !all_bound.contains(&binding.user_id) {
                all_bound.push(binding.user_id);
            }
        }

        let mut scopes: Vec<TriggerScope> = Vec::new();
        for event_type in batch {
            let Some(recipient) = recipient_for(event_type) else {
                continue;
            };
            let user_ids = match destinations(recipient, identities, prior) {
                None => all_bound.clone(),
                Some(mut targets) => {
                    if let Some(actor) = identities.actor.as_deref() {
                        targets.retain(|identity| identity != actor);
                    }
                    let mut user_ids: Vec<Uuid> = Vec::new();
                    for identity in &targets {
                        if let Some(users) = users_by_identity.get(identity.as_str()) {
                            for user in users {
                                if !user_ids.contains(user) {
                                    user_ids.push(*user);
                                }
                            }
                        }
                    }
                    if user_ids.is_empty() {
                        continue;
                    }
                    user_ids
                }
            };
            scopes.push(TriggerScope {
                trigger: event_type.clone(),
                user_ids,
            });
        }

        if scopes.is_empty() {
            return Ok(Vec::new());
        }
        RuleRepository::new(self.db)
            .find_matching(service_id, &scopes, already_notified)
            .await
    }
}
