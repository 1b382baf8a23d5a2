//! Schema CLI for the region topology tables, e.g. `migration up` / `migration status`

use migration::Migrator;
use sea_orm_migration::cli;

#[tokio::main]
async fn main() {
    cli::run_cli(Migrator).await;
}
