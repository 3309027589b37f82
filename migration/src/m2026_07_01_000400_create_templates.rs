//! Migration to create the templates table.
//!
//! Templates hold the notification body source, its render engine (text or
//! json), default context options, example data for previews, and the list
//! of event types the template is written for.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Templates::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Templates::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Templates::Title).text().not_null())
                    .col(ColumnDef::new(Templates::Content).text().not_null())
                    .col(
                        ColumnDef::new(Templates::RenderEngine)
                            .text()
                            .not_null()
                            .default("text"),
                    )
                    .col(
                        ColumnDef::new(Templates::DefaultOptions)
                            .json_binary()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Templates::ExampleData)
                            .json_binary()
                            .null(),
                    )
                    .col(ColumnDef::new(Templates::EventTypes).json_binary().null())
                    .col(
                        ColumnDef::new(Templates::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Templates::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Templates::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Templates {
    Table,
    Id,
    Title,
    Content,
    RenderEngine,
    DefaultOptions,
    ExampleData,
    EventTypes,
    CreatedAt,
    UpdatedAt,
}
