//! # Incoming Log Repository
//!
//! Data access for raw webhook payload logs. Every accepted payload is
//! appended here before classification, and old rows are pruned on a
//! rolling window so the table stays bounded.

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, Set,
};
use serde_json::Value as JsonValue;
use uuid::Uuid;

use crate::models::incoming_log::{ActiveModel, Column, Entity as IncomingLog, Model};

/// Repository for IncomingLog database operations
pub struct IncomingLogRepository<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> IncomingLogRepository<'a> {
    /// Create a new IncomingLogRepository with the given database connection
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    /// Append a raw webhook payload to the log
    pub async fn append(&self, service_id: Uuid, payload: JsonValue) -> Result<Model, DbErr> {
        let row = ActiveModel {
            id: Set(Uuid::new_v4()),
            service_id: Set(service_id),
            payload: Set(payload),
            received_at: Set(Utc::now().into()),
        };
        row.insert(self.db).await
    }

    /// Delete log rows received before the cutoff, returning how many were removed
    pub async fn prune_older_than(&self, cutoff: DateTime<Utc>) -> Result<u64, DbErr> {
        let result = IncomingLog::delete_many()
            .filter(Column::ReceivedAt.lt(cutoff))
            .exec(self.db)
            .await?;
        Ok(result.rows_affected)
    }
}
