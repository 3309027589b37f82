//! Database migrations for the Fanout API.
//!
//! This module contains all database migrations using SeaORM Migration.

pub use sea_orm_migration::prelude::*;

mod m2026_07_01_000100_create_users;
mod m2026_07_01_000200_create_services;
mod m2026_07_01_000300_create_service_bindings;
mod m2026_07_01_000400_create_templates;
mod m2026_07_01_000500_create_rules;
mod m2026_07_02_000100_create_tracked_entities;
mod m2026_07_02_000200_create_incoming_logs;
mod m2026_07_02_000300_create_notifications;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m2026_07_01_000100_create_users::Migration),
            Box::new(m2026_07_01_000200_create_services::Migration),
            Box::new(m2026_07_01_000300_create_service_bindings::Migration),
            Box::new(m2026_07_01_000400_create_templates::Migration),
            Box::new(m2026_07_01_000500_create_rules::Migration),
            Box::new(m2026_07_02_000100_create_tracked_entities::Migration),
            Box::new(m2026_07_02_000200_create_incoming_logs::Migration),
            Box::new(m2026_07_02_000300_create_notifications::Migration),
        ]
    }
}
