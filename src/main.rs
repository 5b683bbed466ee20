use anyhow::Context;
use bb8_postgres::bb8::Pool;
use bb8_postgres::PostgresConnectionManager;
use bb8_postgres::tokio_postgres::NoTls;
use clap::Parser;
use dotenv::dotenv;
use tracing::info;
use crate::config::Config;
use crate::controller::AppState;

pub mod config;
pub mod controller;
pub mod discovery;
pub mod helpers;
pub mod models;
pub mod repositories;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt::init();

    let config = Config::parse();
    info!("Starting check-in service in {} environment", config.environment);

    let manager = PostgresConnectionManager::new_from_stringlike(&config.database_url, NoTls)
        .context("DATABASE_URL is not a valid postgres connection string")?;
    let postgres_connection = Pool::builder()
        .max_size(config.postgres_pool_size())
        .build(manager)
        .await
        .context("Failed to build the postgres connection pool")?;

    controller::serve(AppState::new(postgres_connection, config)).await
}
