use sea_orm_migration::prelude::*;

mod m20261018_000001_create_managed_participant_table;
mod m20261018_000002_create_service_group_table;
mod m20261018_000003_create_process_table;
mod m20261018_000004_create_endpoint_table;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20261018_000001_create_managed_participant_table::Migration),
            Box::new(m20261018_000002_create_service_group_table::Migration),
            Box::new(m20261018_000003_create_process_table::Migration),
            Box::new(m20261018_000004_create_endpoint_table::Migration),
        ]
    }
}

#[cfg(test)]
use sea_orm::{Database, DbErr};

#[tokio::test]
async fn test_migrations_okay() -> Result<(), DbErr> {
    let db = Database::connect("sqlite::memory:").await?;
    let schema_manager = SchemaManager::new(&db);

    Migrator::refresh(&db).await?;

    assert!(schema_manager.has_table("managed_participant").await?);
    assert!(schema_manager.has_table("service_group").await?);
    assert!(schema_manager.has_table("process").await?);
    assert!(schema_manager.has_table("endpoint").await?);

    Migrator::down(&db, None).await?;
    assert!(!schema_manager.has_table("managed_participant").await?);

    Ok(())
}
