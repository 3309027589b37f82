//! Service entry point: load configuration, connect storage, run migrations
//! and serve the API.

use anyhow::Result;
use fanout::{config::ConfigLoader, db, server, telemetry};
use migration::{Migrator, MigratorTrait};

#[tokio::main]
async fn main() -> Result<()> {
    let config = ConfigLoader::new().load()?;

    println!("Loaded configuration for profile: {}", config.profile);
    if let Ok(redacted) = config.redacted_json() {
        println!("Configuration: {redacted}");
    }

    telemetry::init_tracing(&config)?;

    let db = db::init_pool(&config).await?;
    Migrator::up(&db, None).await?;

    server::run_server(config, db).await
}
