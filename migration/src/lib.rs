pub use sea_orm_migration::prelude::*;

mod m20240601_000001_create_time_clock_tables;
mod m20240602_000001_enforce_single_open_time_log;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240601_000001_create_time_clock_tables::Migration),
            Box::new(m20240602_000001_enforce_single_open_time_log::Migration),
        ]
    }
}
