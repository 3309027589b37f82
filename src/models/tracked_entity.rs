//! Tracked entity model
//!
//! Last-known state of one issue/ticket per service, keyed by
//! (service_id, external_id). Classification diffs incoming payloads against
//! this row; the pipeline replaces it (delete-then-insert) after processing.

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;
use serde_json::Value as JsonValue;
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "tracked_entities")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Service the entity belongs to
    pub service_id: Uuid,

    /// Identifier on the source system (issue id, ticket id)
    pub external_id: String,

    /// Human label (issue key, ticket subject)
    pub entity_key: Option<String>,

    /// Identity of the current assignee, if any
    pub assignee_identity: Option<String>,

    /// Whether the entity was resolved as of the last delivery
    pub is_resolved: bool,

    /// Raw payload snapshot from the last delivery
    pub snapshot: Option<JsonValue>,

    pub created_at: DateTimeWithTimeZone,

    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
