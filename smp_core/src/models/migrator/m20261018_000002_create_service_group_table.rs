use sea_orm_migration::prelude::*;

use super::m20261018_000001_create_managed_participant_table::ManagedParticipant;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ServiceGroup::Table)
                    .col(
                        ColumnDef::new(ServiceGroup::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ServiceGroup::LookupId).uuid().not_null())
                    .col(ColumnDef::new(ServiceGroup::DocScheme).string().not_null())
                    .col(ColumnDef::new(ServiceGroup::DocValue).string().not_null())
                    .col(ColumnDef::new(ServiceGroup::Position).integer().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_service_group_lookup_id")
                            .from(ServiceGroup::Table, ServiceGroup::LookupId)
                            .to(ManagedParticipant::Table, ManagedParticipant::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // A participant lists each document type once
        manager
            .create_index(
                Index::create()
                    .name("idx_service_group_lookup_doc")
                    .table(ServiceGroup::Table)
                    .col(ServiceGroup::LookupId)
                    .col(ServiceGroup::DocScheme)
                    .col(ServiceGroup::DocValue)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ServiceGroup::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum ServiceGroup {
    Table,
    Id,
    LookupId,
    DocScheme,
    DocValue,
    Position,
}
