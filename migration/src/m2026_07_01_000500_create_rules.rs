//! Migration to create the rules table.
//!
//! A rule binds an inbound service + trigger event type to an outbound
//! service + template for one user. Matching filters on
//! (in_service_id, trigger) and orders by priority_order ascending, so both
//! get an index.

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
                    .table(Rules::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Rules::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Rules::UserId).uuid().not_null())
                    .col(ColumnDef::new(Rules::Trigger).text().not_null())
                    .col(ColumnDef::new(Rules::InServiceId).uuid().not_null())
                    .col(ColumnDef::new(Rules::OutServiceId).uuid().not_null())
                    .col(ColumnDef::new(Rules::OutTemplateId).uuid().not_null())
                    .col(
                        ColumnDef::new(Rules::OutTemplateOptions)
                            .json_binary()
                            .null(),
                    )
                    .col(ColumnDef::new(Rules::ExtraConditions).json_binary().null())
                    .col(
                        ColumnDef::new(Rules::PriorityOrder)
                            .integer()
                            .not_null()
                            .default(100),
                    )
                    .col(
                        ColumnDef::new(Rules::FiredCount)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Rules::IsDeleted)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Rules::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Rules::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_rules_user_id")
                            .from(Rules::Table, Rules::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_rules_in_service_id")
                            .from(Rules::Table, Rules::InServiceId)
                            .to(Services::Table, Services::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_rules_out_service_id")
                            .from(Rules::Table, Rules::OutServiceId)
                            .to(Services::Table, Services::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_rules_out_template_id")
                            .from(Rules::Table, Rules::OutTemplateId)
                            .to(Templates::Table, Templates::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .get_connection()
            .execute(Statement::from_string(
                manager.get_database_backend(),
                "CREATE INDEX IF NOT EXISTS idx_rules_in_service_trigger ON rules (in_service_id, trigger, priority_order)".to_string(),
            ))
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("idx_rules_in_service_trigger").to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Rules::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Rules {
    Table,
    Id,
    UserId,
    Trigger,
    InServiceId,
    OutServiceId,
    OutTemplateId,
    OutTemplateOptions,
    ExtraConditions,
    PriorityOrder,
    FiredCount,
    IsDeleted,
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

#[derive(DeriveIden)]
enum Templates {
    Table,
    Id,
}
