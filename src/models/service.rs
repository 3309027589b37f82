//! Service entity model
//!
//! This module contains the SeaORM entity model for the services table. A
//! service is an inbound webhook source or an outbound destination; the
//! `service_type` string selects the classifier for inbound deliveries.

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;
use serde_json::Value as JsonValue;
use uuid::Uuid;

/// Service entity representing a webhook source or notification destination
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "services")]
pub struct Model {
    /// Unique identifier for the service (primary key)
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Display name of the service
    pub name: String,

    /// Source type selecting the classifier (e.g., issues, tickets)
    pub service_type: String,

    /// Per-service settings, including the webhook validation key
    #[sea_orm(column_type = "JsonBinary")]
    pub data: JsonValue,

    /// Soft-delete flag; deleted services reject webhooks
    pub is_deleted: bool,

    /// Timestamp when the service was created
    pub created_at: DateTimeWithTimeZone,

    /// Timestamp when the service was last updated
    pub updated_at: DateTimeWithTimeZone,
}

impl Model {
    /// The validation key webhook tokens must carry for this service.
    pub fn validation_key(&self) -> Option<&str> {
        self.data.get("validation_key").and_then(|v| v.as_str())
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
