//! # Rule Repository
//!
//! Data access for notification rules. The central query here answers
//! "which rules fire for this batch of events", combining per-trigger
//! recipient scopes into a single filtered select with the output
//! template eagerly loaded.

use sea_orm::sea_query::Expr;
use sea_orm::{
    ColumnTrait, Condition, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QueryOrder,
};
use std::collections::HashSet;
use uuid::Uuid;

use crate::models::rule::{Column, Entity as Rule};
use crate::models::template::Entity as Template;
use crate::models::{rule, template};

/// Recipient scope for one trigger inside an event batch
///
/// A rule matches the scope when its trigger equals `trigger` and its owner
/// is one of `user_ids`. Anonymous triggers are expressed the same way, with
/// `user_ids` holding every user bound to the service.
#[derive(Debug, Clone)]
pub struct TriggerScope {
    pub trigger: String,
    pub user_ids: Vec<Uuid>,
}

/// Repository for Rule database operations
pub struct RuleRepository<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> RuleRepository<'a> {
    /// Create a new RuleRepository with the given database connection
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    /// Find the rules that fire for a batch of events on one service
    ///
    /// # Arguments
    /// * `in_service_id` - The service the webhook arrived on
    /// * `scopes` - One recipient scope per trigger in the batch
    /// * `excluded` - Users already notified earlier in this delivery, or the
    ///   actor when self-notification is suppressed
    ///
    /// # Returns
    /// Matching live rules with their output templates, ordered by
    /// `priority_order` ascending
    pub async fn find_matching(
        &self,
        in_service_id: Uuid,
        scopes: &[TriggerScope],
        excluded: &HashSet<Uuid>,
    ) -> Result<Vec<(rule::Model, Option<template::Model>)>, DbErr> {
        if scopes.iter().all(|scope| scope.user_ids.is_empty()) {
            return Ok(Vec::new());
        }

        let mut trigger_match = Condition::any();
        for scope in scopes {
            trigger_match = trigger_match.add(
                Condition::all()
                    .add(Column::Trigger.eq(scope.trigger.as_str()))
                    .add(Column::UserId.is_in(scope.user_ids.iter().copied())),
            );
        }

        let mut query = Rule::find()
            .filter(Column::IsDeleted.eq(false))
            .filter(Column::InServiceId.eq(in_service_id))
            .filter(trigger_match);

        if !excluded.is_empty() {
            query = query.filter(Column::UserId.is_not_in(excluded.iter().copied()));
        }

        query
            .find_also_related(Template)
            .order_by_asc(Column::PriorityOrder)
            .all(self.db)
            .await
    }

    /// Increment the fired counter of a rule by one
    pub async fn increment_fired_count(&self, rule_id: Uuid) -> Result<(), DbErr> {
        Rule::update_many()
            .col_expr(Column::FiredCount, Expr::col(Column::FiredCount).add(1))
            .filter(Column::Id.eq(rule_id))
            .exec(self.db)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use migration::{Migrator, MigratorTrait};
    use sea_orm::{ActiveModelTrait, Database, Set};
    use serde_json::json;

    use crate::models::{service, user};

    async fn setup_test_db() -> DatabaseConnection {
        let db = Database::connect("sqlite::memory:")
            .await
            .expect("Failed to connect to in-memory database");
        Migrator::up(&db, None)
            .await
            .expect("Failed to run migrations");
        db
    }

    async fn seed_user(db: &DatabaseConnection, name: &str) -> Uuid {
        let id = Uuid::new_v4();
        let row = user::ActiveModel {
            id: Set(id),
            name: Set(name.to_string()),
            ..Default::default()
        };
        row.insert(db).await.expect("Failed to insert user");
        id
    }

    async fn seed_service(db: &DatabaseConnection) -> Uuid {
        let id = Uuid::new_v4();
        let row = service::ActiveModel {
            id: Set(id),
            name: Set("Tracker".to_string()),
            service_type: Set("issues".to_string()),
            data: Set(json!({})),
            ..Default::default()
        };
        row.insert(db).await.expect("Failed to insert service");
        id
    }

    async fn seed_template(db: &DatabaseConnection, title: &str) -> Uuid {
        let id = Uuid::new_v4();
        let row = template::ActiveModel {
            id: Set(id),
            title: Set(title.to_string()),
            content: Set("{{event_type}} on {{key}}".to_string()),
            render_engine: Set("text".to_string()),
            ..Default::default()
        };
        row.insert(db).await.expect("Failed to insert template");
        id
    }

    #[allow(clippy::too_many_arguments)]
    async fn seed_rule(
        db: &DatabaseConnection,
        user_id: Uuid,
        in_service_id: Uuid,
        out_service_id: Uuid,
        template_id: Uuid,
        trigger: &str,
        priority: i32,
        deleted: bool,
    ) -> Uuid {
        let id = Uuid::new_v4();
        let row = rule::ActiveModel {
            id: Set(id),
            user_id: Set(user_id),
            trigger: Set(trigger.to_string()),
            in_service_id: Set(in_service_id),
            out_service_id: Set(out_service_id),
            out_template_id: Set(template_id),
            priority_order: Set(priority),
            fired_count: Set(0),
            is_deleted: Set(deleted),
            ..Default::default()
        };
        row.insert(db).await.expect("Failed to insert rule");
        id
    }

    #[tokio::test]
    async fn test_find_matching_orders_by_priority() {
        let db = setup_test_db().await;
        let alice = seed_user(&db, "Alice").await;
        let tracker = seed_service(&db).await;
        let chat = seed_service(&db).await;
        let template_id = seed_template(&db, "Plain").await;
        let low = seed_rule(&db, alice, tracker, chat, template_id, "resolved", 200, false).await;
        let high = seed_rule(&db, alice, tracker, chat, template_id, "resolved", 10, false).await;

        let repo = RuleRepository::new(&db);
        let scopes = vec![TriggerScope {
            trigger: "resolved".to_string(),
            user_ids: vec![alice],
        }];
        let matched = repo
            .find_matching(tracker, &scopes, &HashSet::new())
            .await
            .unwrap();

        assert_eq!(matched.len(), 2);
        assert_eq!(matched[0].0.id, high);
        assert_eq!(matched[1].0.id, low);
    }

    #[tokio::test]
    async fn test_find_matching_loads_template() {
        let db = setup_test_db().await;
        let alice = seed_user(&db, "Alice").await;
        let tracker = seed_service(&db).await;
        let chat = seed_service(&db).await;
        let template_id = seed_template(&db, "Plain").await;
        seed_rule(&db, alice, tracker, chat, template_id, "resolved", 100, false).await;

        let repo = RuleRepository::new(&db);
        let scopes = vec![TriggerScope {
            trigger: "resolved".to_string(),
            user_ids: vec![alice],
        }];
        let matched = repo
            .find_matching(tracker, &scopes, &HashSet::new())
            .await
            .unwrap();

        assert_eq!(matched.len(), 1);
        let template = matched[0].1.as_ref().expect("template should be loaded");
        assert_eq!(template.id, template_id);
        assert_eq!(template.title, "Plain");
    }

    #[tokio::test]
    async fn test_find_matching_respects_exclusions_and_scope() {
        let db = setup_test_db().await;
        let alice = seed_user(&db, "Alice").await;
        let bob = seed_user(&db, "Bob").await;
        let tracker = seed_service(&db).await;
        let chat = seed_service(&db).await;
        let template_id = seed_template(&db, "Plain").await;
        seed_rule(&db, alice, tracker, chat, template_id, "resolved", 100, false).await;
        let bob_rule =
            seed_rule(&db, bob, tracker, chat, template_id, "resolved", 100, false).await;

        let repo = RuleRepository::new(&db);
        let scopes = vec![TriggerScope {
            trigger: "resolved".to_string(),
            user_ids: vec![alice, bob],
        }];
        let excluded: HashSet<Uuid> = [alice].into_iter().collect();
        let matched = repo.find_matching(tracker, &scopes, &excluded).await.unwrap();

        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0].0.id, bob_rule);
    }

    #[tokio::test]
    async fn test_find_matching_skips_deleted_and_foreign_rules() {
        let db = setup_test_db().await;
        let alice = seed_user(&db, "Alice").await;
        let tracker = seed_service(&db).await;
        let other = seed_service(&db).await;
        let chat = seed_service(&db).await;
        let template_id = seed_template(&db, "Plain").await;
        seed_rule(&db, alice, tracker, chat, template_id, "resolved", 100, true).await;
        seed_rule(&db, alice, other, chat, template_id, "resolved", 100, false).await;

        let repo = RuleRepository::new(&db);
        let scopes = vec![TriggerScope {
            trigger: "resolved".to_string(),
            user_ids: vec![alice],
        }];
        let matched = repo
            .find_matching(tracker, &scopes, &HashSet::new())
            .await
            .unwrap();

        assert!(matched.is_empty());
    }

    #[tokio::test]
    async fn test_find_matching_empty_scopes_short_circuits() {
        let db = setup_test_db().await;
        let alice = seed_user(&db, "Alice").await;
        let tracker = seed_service(&db).await;
        let chat = seed_service(&db).await;
        let template_id = seed_template(&db, "Plain").await;
        seed_rule(&db, alice, tracker, chat, template_id, "resolved", 100, false).await;

        let repo = RuleRepository::new(&db);
        let empty_users = vec![TriggerScope {
            trigger: "resolved".to_string(),
            user_ids: Vec::new(),
        }];

        let matched = repo.find_matching(tracker, &[], &HashSet::new()).await.unwrap();
        assert!(matched.is_empty());

        let matched = repo
            .find_matching(tracker, &empty_users, &HashSet::new())
            .await
            .unwrap();
        assert!(matched.is_empty());
    }

    #[tokio::test]
    async fn test_increment_fired_count() {
        let db = setup_test_db().await;
        let alice = seed_user(&db, "Alice").await;
        let tracker = seed_service(&db).await;
        let chat = seed_service(&db).await;
        let template_id = seed_template(&db, "Plain").await;
        let rule_id =
            seed_rule(&db, alice, tracker, chat, template_id, "resolved", 100, false).await;

        let repo = RuleRepository::new(&db);
        repo.increment_fired_count(rule_id).await.unwrap();
        repo.increment_fired_count(rule_id).await.unwrap();

        let row = Rule::find_by_id(rule_id).one(&db).await.unwrap().unwrap();
        assert_eq!(row.fired_count, 2);
    }
}
