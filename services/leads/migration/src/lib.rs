use sea_orm_migration::prelude::*;

mod m20250601_000001_create_leads;
mod m20250601_000002_create_failed_notifications;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250601_000001_create_leads::Migration),
            Box::new(m20250601_000002_create_failed_notifications::Migration),
        ]
    }
}
