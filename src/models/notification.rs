//! Notification entity model
//!
//! This module contains the SeaORM entity model for the notifications table,
//! the outbound queue consumed by downstream delivery workers.

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;
use uuid::Uuid;

/// Status a freshly queued notification starts in.
pub const STATUS_READY: &str = "ready";

/// Notification entity representing one queued outbound message
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "notifications")]
pub struct Model {
    /// Unique identifier for the notification (primary key)
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Recipient user
    pub user_id: Uuid,

    /// Rule that produced this notification
    pub rule_id: Uuid,

    /// Outbound service the notification is destined for
    pub service_id: Uuid,

    /// Rendered message content
    pub content: String,

    /// Queue status; starts at "ready", owned by delivery workers afterwards
    pub status: String,

    /// Timestamp when the notification was created
    pub created_at: DateTimeWithTimeZone,

    /// Timestamp when the notification was last updated
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
