use sea_orm_migration::prelude::*;

#[tokio::main]
async fn main() {
    cli::run_cli(comply_gateway_migration::Migrator).await;
}
