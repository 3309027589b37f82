//! Template entity model
//!
//! This module contains the SeaORM entity model for the templates table.
//! Templates hold the notification body source and the render engine that
//! turns it into final content.

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;
use serde_json::Value as JsonValue;
use uuid::Uuid;

/// Template entity for rendering notification content
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "templates")]
pub struct Model {
    /// Unique identifier for the template (primary key)
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Human-readable title
    pub title: String,

    /// Template body source
    pub content: String,

    /// Render engine identifier ("text" or "json")
    pub render_engine: String,

    /// Default context values, overridable per rule and per event
    pub default_options: Option<JsonValue>,

    /// Example payload for previews
    pub example_data: Option<JsonValue>,

    /// Event types this template is written for (informational; matching
    /// goes through rules)
    pub event_types: Option<JsonValue>,

    /// Timestamp when the template was created
    pub created_at: DateTimeWithTimeZone,

    /// Timestamp when the template was last updated
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
