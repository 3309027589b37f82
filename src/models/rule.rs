//! Rule entity model
//!
//! This module contains the SeaORM entity model for the rules table. A rule
//! binds an inbound service + trigger event type to an outbound service +
//! template for one user; matching orders by priority_order ascending.

use super::template::Entity as Template;
use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;
use serde_json::Value as JsonValue;
use uuid::Uuid;

/// Rule entity representing one user subscription
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "rules")]
pub struct Model {
    /// Unique identifier for the rule (primary key)
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Owning user
    pub user_id: Uuid,

    /// Event type this rule fires for, matched exactly
    pub trigger: String,

    /// Inbound service the rule listens on
    pub in_service_id: Uuid,

    /// Outbound service notifications are queued for
    pub out_service_id: Uuid,

    /// Template rendered when the rule fires
    pub out_template_id: Uuid,

    /// Per-rule context overrides merged over the template defaults
    pub out_template_options: Option<JsonValue>,

    /// Condition map (project / status / group_name) gating the rule
    pub extra_conditions: Option<JsonValue>,

    /// Ascending priority; lower fires first
    pub priority_order: i32,

    /// Times this rule has fired
    pub fired_count: i64,

    /// Soft-delete flag; deleted rules never match
    pub is_deleted: bool,

    /// Timestamp when the rule was created
    pub created_at: DateTimeWithTimeZone,

    /// Timestamp when the rule was last updated
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "Template",
        from = "Column::OutTemplateId",
        to = "super::template::Column::Id"
    )]
    Template,
}

impl Related<Template> for Entity {
    fn to() -> RelationDef {
        Relation::Template.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
