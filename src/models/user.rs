//! User entity model
//!
//! This module contains the SeaORM entity model for the users table. Users
//! own subscription rules and service bindings and receive notifications.

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;
use uuid::Uuid;

/// User entity representing a notification recipient
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    /// Unique identifier for the user (primary key)
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Display name
    pub name: String,

    /// Contact email, if known
    pub email: Option<String>,

    /// Soft-delete flag; deleted users never match rules
    pub is_deleted: bool,

    /// Timestamp when the user was created
    pub created_at: DateTimeWithTimeZone,

    /// Timestamp when the user was last updated
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
