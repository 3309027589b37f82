//! Migration to create the service_bindings table.
//!
//! A binding maps a user to their identity on one service (assignee login,
//! ticket-requester email) plus arbitrary per-service settings. Rule matching
//! joins through this table to turn service usernames back into user ids.

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
                    .table(ServiceBindings::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ServiceBindings::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ServiceBindings::UserId).uuid().not_null())
                    .col(
                        ColumnDef::new(ServiceBindings::ServiceId)
                            .uuid()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ServiceBindings::ServiceUsername)
                            .text()
                            .not_null()
                            .default(""),
                    )
                    .col(
                        ColumnDef::new(ServiceBindings::Settings)
                            .json_binary()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(ServiceBindings::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(ServiceBindings::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_service_bindings_user_id")
                            .from(ServiceBindings::Table, ServiceBindings::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_service_bindings_service_id")
                            .from(ServiceBindings::Table, ServiceBindings::ServiceId)
                            .to(Services::Table, Services::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // One binding per user per service
        manager
            .get_connection()
            .execute(Statement::from_string(
                manager.get_database_backend(),
                "CREATE UNIQUE INDEX IF NOT EXISTS idx_service_bindings_user_service ON service_bindings (user_id, service_id)".to_string(),
            ))
            .await?;

        // Rule matching filters bindings by service and username
        manager
            .get_connection()
            .execute(Statement::from_string(
                manager.get_database_backend(),
                "CREATE INDEX IF NOT EXISTS idx_service_bindings_service_username ON service_bindings (service_id, service_username)".to_string(),
            ))
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name("idx_service_bindings_user_service")
                    .to_owned(),
            )
            .await?;

        manager
            .drop_index(
                Index::drop()
                    .name("idx_service_bindings_service_username")
                    .to_owned(),
            )
            .await?;

        manager
            .drop_table(Table::drop().table(ServiceBindings::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum ServiceBindings {
    Table,
    Id,
    UserId,
    ServiceId,
    ServiceUsername,
    Settings,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum Services {
    Table,
    Id,
}
