use sea_orm_migration::prelude::*;

#[tokio::main]
async fn main() {
    cli::run_cli(intake_leads_migration::Migrator).await;
}
