//! Migration to create the services table.
//!
//! A service is an inbound webhook source (issue tracker, ticket system, CI
//! server, code-review tool) or an outbound notification destination. The
//! `service_type` column selects the classifier for inbound deliveries and
//! `data` holds per-service settings including the webhook validation key.

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
                    .table(Services::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Services::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Services::Name).text().not_null())
                    .col(ColumnDef::new(Services::ServiceType).text().not_null())
                    .col(ColumnDef::new(Services::Data).json_binary().not_null())
                    .col(
                        ColumnDef::new(Services::IsDeleted)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Services::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Services::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // Webhook lookups filter on type for non-deleted services
        manager
            .get_connection()
            .execute(Statement::from_string(
                manager.get_database_backend(),
                "CREATE INDEX IF NOT EXISTS idx_services_type ON services (service_type)"
                    .to_string(),
            ))
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("idx_services_type").to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Services::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Services {
    Table,
    Id,
    Name,
    ServiceType,
    Data,
    IsDeleted,
    CreatedAt,
    UpdatedAt,
}
