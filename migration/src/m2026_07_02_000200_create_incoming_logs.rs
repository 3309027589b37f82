//! Migration to create the incoming_logs table.
//!
//! Rolling buffer of raw webhook payloads per service. Rows older than the
//! retention window are pruned opportunistically after each delivery, so the
//! only index is on received_at.

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
                    .table(IncomingLogs::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(IncomingLogs::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(IncomingLogs::ServiceId).uuid().not_null())
                    .col(
                        ColumnDef::new(IncomingLogs::Payload)
                            .json_binary()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(IncomingLogs::ReceivedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_incoming_logs_service_id")
                            .from(IncomingLogs::Table, IncomingLogs::ServiceId)
                            .to(Services::Table, Services::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .get_connection()
            .execute(Statement::from_string(
                manager.get_database_backend(),
                "CREATE INDEX IF NOT EXISTS idx_incoming_logs_received_at ON incoming_logs (received_at)".to_string(),
            ))
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("idx_incoming_logs_received_at").to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(IncomingLogs::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum IncomingLogs {
    Table,
    Id,
    ServiceId,
    Payload,
    ReceivedAt,
}

#[derive(DeriveIden)]
enum Services {
    Table,
    Id,
}
