//! Migration to create the tracked_entities table.
//!
//! One row per (service_id, external_id) holding the last-known assignee,
//! resolved flag, and raw payload snapshot. Classification diffs incoming
//! webhooks against this row; the pipeline replaces it after processing.

use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::Statement;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(TrackedEntities::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(TrackedEntities::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(TrackedEntities::ServiceId)
                            .uuid()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(TrackedEntities::ExternalId)
                            .text()
                            .not_null(),
                    )
                    .col(ColumnDef::new(TrackedEntities::EntityKey).text().null())
                    .col(
                        ColumnDef::new(TrackedEntities::AssigneeIdentity)
                            .text()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(TrackedEntities::IsResolved)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(TrackedEntities::Snapshot)
                            .json_binary()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(TrackedEntities::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(TrackedEntities::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_tracked_entities_service_id")
                            .from(TrackedEntities::Table, TrackedEntities::ServiceId)
                            .to(Services::Table, Services::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // At most one row per (service_id, external_id)
        manager
            .get_connection()
            .execute(Statement::from_string(
                manager.get_database_backend(),
                "CREATE UNIQUE INDEX IF NOT EXISTS idx_tracked_entities_service_external ON tracked_entities (service_id, external_id)".to_string(),
            ))
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name("idx_tracked_entities_service_external")
                    .to_owned(),
            )
            .await?;

        manager
            .drop_table(Table::drop().table(TrackedEntities::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum TrackedEntities {
    Table,
    Id,
    ServiceId,
    ExternalId,
    EntityKey,
    AssigneeIdentity,
    IsResolved,
    Snapshot,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Services {
    Table,
    Id,
}
