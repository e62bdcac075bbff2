use sea_orm_migration::prelude::*;

use super::m20261018_000003_create_process_table::Process;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Endpoint::Table)
                    .col(ColumnDef::new(Endpoint::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Endpoint::ProcessId).uuid().not_null())
                    .col(ColumnDef::new(Endpoint::TransportProfile).string().not_null())
                    .col(ColumnDef::new(Endpoint::EndpointReference).string().not_null())
                    .col(
                        ColumnDef::new(Endpoint::RequireBusinessLevelSignature)
                            .boolean()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Endpoint::CertificateDetails).text().not_null())
                    .col(ColumnDef::new(Endpoint::Position).integer().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_endpoint_process_id")
                            .from(Endpoint::Table, Endpoint::ProcessId)
                            .to(Process::Table, Process::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_endpoint_process_id")
                    .table(Endpoint::Table)
                    .col(Endpoint::ProcessId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Endpoint::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Endpoint {
    Table,
    Id,
    ProcessId,
    TransportProfile,
    EndpointReference,
    RequireBusinessLevelSignature,
    CertificateDetails,
    Position,
}
