//! # Service Repository
//!
//! Data access for registered service rows. Webhook intake only ever
//! works against live services, so lookups filter out soft-deleted rows.

use sea_orm::{ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter};
use uuid::Uuid;

use crate::models::service::{Column, Entity as Service, Model};

/// Repository for Service database operations
pub struct ServiceRepository<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> ServiceRepository<'a> {
    /// Create a new ServiceRepository with the given database connection
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    /// Find a service by id, skipping soft-deleted rows
    pub async fn find_active(&self, id: Uuid) -> Result<Option<Model>, DbErr> {
        Service::find()
            .filter(Column::Id.eq(id))
            .filter(Column::IsDeleted.eq(false))
            .one(self.db)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use migration::{Migrator, MigratorTrait};
    use sea_orm::{ActiveModelTrait, Database, Set};
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

    async fn seed_service(db: &DatabaseConnection, deleted: bool) -> Uuid {
        let id = Uuid::new_v4();
        let row = service::ActiveModel {
            id: Set(id),
            name: Set("Tracker".to_string()),
            service_type: Set("issues".to_string()),
            data: Set(json!({"validation_key": "k-1"})),
            is_deleted: Set(deleted),
            ..Default::default()
        };
        row.insert(db).await.expect("Failed to insert service");
        id
    }

    #[tokio::test]
    async fn test_find_active_returns_live_service() {
        let db = setup_test_db().await;
        let id = seed_service(&db, false).await;

        let repo = ServiceRepository::new(&db);
        let found = repo.find_active(id).await.unwrap();

        assert!(found.is_some());
        let service = found.unwrap();
        assert_eq!(service.id, id);
        assert_eq!(service.service_type, "issues");
        assert_eq!(service.validation_key(), Some("k-1"));
    }

    #[tokio::test]
    async fn test_find_active_skips_soft_deleted() {
        let db = setup_test_db().await;
        let id = seed_service(&db, true).await;

        let repo = ServiceRepository::new(&db);
        let found = repo.find_active(id).await.unwrap();

        assert!(found.is_none());
    }

    #[tokio::test]
    async fn test_find_active_unknown_id() {
        let db = setup_test_db().await;

        let repo = ServiceRepository::new(&db);
        let found = repo.find_active(Uuid::new_v4()).await.unwrap();

        assert!(found.is_none());
    }
}
