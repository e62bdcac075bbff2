use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ManagedParticipant::Table)
                    .col(pk_uuid(ManagedParticipant::Id))
                    .col(string_uniq(ManagedParticipant::ParticipantId))
                    .col(string(ManagedParticipant::Name))
                    .col(string(ManagedParticipant::SmpIdentifier))
                    .col(string_len(ManagedParticipant::Status, 16))
                    .col(string(ManagedParticipant::CreatedAt))
                    .col(string(ManagedParticipant::UpdatedAt))
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ManagedParticipant::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum ManagedParticipant {
    Table,
    Id,
    ParticipantId,
    Name,
    SmpIdentifier,
    Status,
    CreatedAt,
    UpdatedAt,
}
