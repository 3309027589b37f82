//! Service binding entity model
//!
//! Maps a user to their identity string on one service (assignee login,
//! requester email). Unique per (user_id, service_id). Rule matching joins
//! through bindings to turn service usernames back into user ids.

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;
use serde_json::Value as JsonValue;
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "service_bindings")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Owning user
    pub user_id: Uuid,

    /// Service this binding applies to
    pub service_id: Uuid,

    /// The user's identity on that service; empty means unlinked
    pub service_username: String,

    /// Arbitrary per-service settings
    pub settings: Option<JsonValue>,

    pub created_at: DateTimeWithTimeZone,

    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
