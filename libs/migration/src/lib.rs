pub use sea_orm_migration::prelude::*;

mod m20250301_000000_create_providers;
mod m20250301_000001_create_regions;
mod m20250301_000002_create_availability_zones;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250301_000000_create_providers::Migration),
            Box::new(m20250301_000001_create_regions::Migration),
            Box::new(m20250301_000002_create_availability_zones::Migration),
        ]
    }
}
