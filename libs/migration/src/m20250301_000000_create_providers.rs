use sea_orm_migration::{prelude::*, schema::*};

/// Providers are owned by another part of the platform; regions only need
/// the ownership columns to validate the customer -> provider -> region chain.
#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Providers::Table)
                    .if_not_exists()
                    .col(pk_uuid(Providers::Id))
                    .col(uuid(Providers::CustomerId))
                    .col(string(Providers::Code))
                    .col(string(Providers::Name))
                    .col(
                        timestamp_with_time_zone(Providers::CreatedAt)
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        timestamp_with_time_zone(Providers::UpdatedAt)
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_providers_customer_id")
                    .table(Providers::Table)
                    .col(Providers::CustomerId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Providers::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Providers {
    Table,
    Id,
    CustomerId,
    Code,
    Name,
    CreatedAt,
    UpdatedAt,
}
