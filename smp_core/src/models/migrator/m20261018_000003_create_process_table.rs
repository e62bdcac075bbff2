use sea_orm_migration::prelude::*;

use super::m20261018_000002_create_service_group_table::ServiceGroup;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Process::Table)
                    .col(ColumnDef::new(Process::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Process::ServiceGroupId).uuid().not_null())
                    .col(ColumnDef::new(Process::ProcessScheme).string().not_null())
                    .col(ColumnDef::new(Process::ProcessValue).string().not_null())
                    .col(ColumnDef::new(Process::Position).integer().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_process_service_group_id")
                            .from(Process::Table, Process::ServiceGroupId)
                            .to(ServiceGroup::Table, ServiceGroup::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_process_service_group_id")
                    .table(Process::Table)
                    .col(Process::ServiceGroupId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Process::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Process {
    Table,
    Id,
    ServiceGroupId,
    ProcessScheme,
    ProcessValue,
    Position,
}
