use sea_orm_migration::{prelude::*, schema::*};

use crate::m20250301_000001_create_regions::Regions;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(AvailabilityZones::Table)
                    .if_not_exists()
                    .col(pk_uuid(AvailabilityZones::Id))
                    .col(uuid(AvailabilityZones::RegionId))
                    .col(string_len(AvailabilityZones::Code, 25))
                    .col(string_len(AvailabilityZones::Name, 100))
                    .col(string_null(AvailabilityZones::Subnet))
                    .col(boolean(AvailabilityZones::Active).default(true))
                    .col(
                        timestamp_with_time_zone(AvailabilityZones::CreatedAt)
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        timestamp_with_time_zone(AvailabilityZones::UpdatedAt)
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_availability_zones_region_id")
                            .from(AvailabilityZones::Table, AvailabilityZones::RegionId)
                            .to(Regions::Table, Regions::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Serves both the cascade UPDATE and the zone-count aggregate
        manager
            .create_index(
                Index::create()
                    .name("idx_availability_zones_region_id")
                    .table(AvailabilityZones::Table)
                    .col(AvailabilityZones::RegionId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(AvailabilityZones::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum AvailabilityZones {
    Table,
    Id,
    RegionId,
    Code,
    Name,
    Subnet,
    Active,
    CreatedAt,
    UpdatedAt,
}
