use anyhow::Context;
use secrecy::ExposeSecret;
use trivia_api::configuration::get_configuration;
use trivia_api::db;
use trivia_api::server::app::run_server;
use trivia_api::telemetry::init_tracing;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let settings = get_configuration().context("Failed to load configuration")?;
    let pool = db::establish_connection(settings.database.url.expose_secret())
        .await
        .context("Failed to connect to the database")?;

    tracing::info!("Running db migrations...");
    db::run_migrations(&pool)
        .await
        .context("Failed to run migrations")?;

    run_server(pool, settings.application.address()).await
}
