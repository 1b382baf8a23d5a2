use sea_orm_migration::{prelude::*, schema::*};

use crate::m20250301_000000_create_providers::Providers;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Regions::Table)
                    .if_not_exists()
                    .col(pk_uuid(Regions::Id))
                    .col(uuid(Regions::ProviderId))
                    .col(string_len(Regions::Code, 25))
                    .col(string_len(Regions::Name, 100))
                    .col(string(Regions::Image))
                    .col(double_null(Regions::Latitude).default(0.0))
                    .col(double_null(Regions::Longitude).default(0.0))
                    .col(boolean(Regions::Active).default(true))
                    .col(json_null(Regions::Details))
                    .col(json_null(Regions::Config))
                    .col(
                        timestamp_with_time_zone(Regions::CreatedAt)
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        timestamp_with_time_zone(Regions::UpdatedAt)
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_regions_provider_id")
                            .from(Regions::Table, Regions::ProviderId)
                            .to(Providers::Table, Providers::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_regions_provider_id")
                    .table(Regions::Table)
                    .col(Regions::ProviderId)
                    .to_owned(),
            )
            .await?;

        // Lookups by code are scoped to a provider
        manager
            .create_index(
                Index::create()
                    .name("unique_region_code_per_provider")
                    .table(Regions::Table)
                    .col(Regions::ProviderId)
                    .col(Regions::Code)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Regions::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Regions {
    Table,
    Id,
    ProviderId,
    Code,
    Name,
    Image,
    Latitude,
    Longitude,
    Active,
    Details,
    Config,
    CreatedAt,
    UpdatedAt,
}
