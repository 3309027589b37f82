//! # Notification Repository
//!
//! Data access for queued notifications. Rows are written with status
//! `ready`; a downstream dispatcher owns the rest of the lifecycle.

use sea_orm::{ActiveModelTrait, DatabaseConnection, DbErr, Set};
use uuid::Uuid;

use crate::models::notification::{ActiveModel, Model, STATUS_READY};

/// Repository for Notification database operations
pub struct NotificationRepository<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> NotificationRepository<'a> {
    /// Create a new NotificationRepository with the given database connection
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    /// Queue a rendered notification for delivery
    pub async fn enqueue(
        &self,
        user_id: Uuid,
        rule_id: Uuid,
        service_id: Uuid,
        content: String,
    ) -> Result<Model, DbErr> {
        let row = ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(user_id),
            rule_id: Set(rule_id),
            service_id: Set(service_id),
            content: Set(content),
            status: Set(STATUS_READY.to_string()),
            ..Default::default()
        };
        row.insert(self.db).await
    }
}
