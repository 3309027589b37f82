//! # Tracked Entity Repository
//!
//! Data access for the per-service snapshot of external entities. One row
//! exists per (service, external id) pair; webhook processing reads the prior
//! row to classify state transitions and then replaces it wholesale.

use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, Set,
};
use serde_json::Value as JsonValue;
use uuid::Uuid;

use crate::models::tracked_entity::{ActiveModel, Column, Entity as TrackedEntity, Model};

/// Repository for TrackedEntity database operations
pub struct TrackedEntityRepository<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> TrackedEntityRepository<'a> {
    /// Create a new TrackedEntityRepository with the given database connection
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    /// Find the stored snapshot of an external entity, if any
    pub async fn find_by_external(
        &self,
        service_id: Uuid,
        external_id: &str,
    ) -> Result<Option<Model>, DbErr> {
        TrackedEntity::find()
            .filter(Column::ServiceId.eq(service_id))
            .filter(Column::ExternalId.eq(external_id))
            .one(self.db)
            .await
    }

    /// Replace the stored snapshot of an external entity
    ///
    /// Deletes any existing row for the (service, external id) pair and
    /// inserts a fresh one, so the table always holds exactly the latest
    /// observed state.
    pub async fn replace(
        &self,
        service_id: Uuid,
        external_id: &str,
        entity_key: Option<String>,
        assignee_identity: Option<String>,
        is_resolved: bool,
        snapshot: Option<JsonValue>,
    ) -> Result<Model, DbErr> {
        TrackedEntity::delete_many()
            .filter(Column::ServiceId.eq(service_id))
            .filter(Column::ExternalId.eq(external_id))
            .exec(self.db)
            .await?;

        let row = ActiveModel {
            id: Set(Uuid::new_v4()),
            service_id: Set(service_id),
            external_id: Set(external_id.to_string()),
            entity_key: Set(entity_key),
            assignee_identity: Set(assignee_identity),
            is_resolved: Set(is_resolved),
            snapshot: Set(snapshot),
            ..Default::default()
        };
        row.insert(self.db).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use migration::{Migrator, MigratorTrait};
    use sea_orm::{Database, PaginatorTrait};
    use serde_json::json;

    use crate::models::service;

    async fn setup_test_db() -> DatabaseConnection {
        let db = Database::connect("sqlite::memory:")
            .await
            .expect("Failed to connect to in-memory database");
        Migrator::up(&db, None)
            .await
            .expect("Failed to run migrations");
        db
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

    #[tokio::test]
    async fn test_replace_inserts_fresh_row() {
        let db = setup_test_db().await;
        let service_id = seed_service(&db).await;

        let repo = TrackedEntityRepository::new(&db);
        let stored = repo
            .replace(
                service_id,
                "10001",
                Some("PROJ-1".to_string()),
                Some("alice.ext".to_string()),
                false,
                Some(json!({"status": "Open"})),
            )
            .await
            .unwrap();

        assert_eq!(stored.external_id, "10001");
        assert_eq!(stored.entity_key.as_deref(), Some("PROJ-1"));
        assert!(!stored.is_resolved);

        let found = repo.find_by_external(service_id, "10001").await.unwrap();
        assert_eq!(found.map(|row| row.id), Some(stored.id));
    }

    #[tokio::test]
    async fn test_replace_overwrites_previous_row() {
        let db = setup_test_db().await;
        let service_id = seed_service(&db).await;

        let repo = TrackedEntityRepository::new(&db);
        repo.replace(
            service_id,
            "10001",
            Some("PROJ-1".to_string()),
            Some("alice.ext".to_string()),
            false,
            None,
        )
        .await
        .unwrap();
        repo.replace(
            service_id,
            "10001",
            Some("PROJ-1".to_string()),
            Some("bob.ext".to_string()),
            true,
            None,
        )
        .await
        .unwrap();

        let count = TrackedEntity::find().count(&db).await.unwrap();
        assert_eq!(count, 1);

        let current = repo
            .find_by_external(service_id, "10001")
            .await
            .unwrap()
            .expect("row should exist");
        assert_eq!(current.assignee_identity.as_deref(), Some("bob.ext"));
        assert!(current.is_resolved);
    }

    #[tokio::test]
    async fn test_find_by_external_missing() {
        let db = setup_test_db().await;
        let service_id = seed_service(&db).await;

        let repo = TrackedEntityRepository::new(&db);
        let found = repo.find_by_external(service_id, "99999").await.unwrap();

        assert!(found.is_none());
    }
}
