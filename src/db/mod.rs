pub mod models;
pub mod queries;

use std::time::Duration;

use anyhow::{Context, Result};
use mongodb::{Client, Database, options::ClientOptions};

use crate::config::Config;

/// Create MongoDB connection
pub async fn create_client(config: &Config) -> Result<Client> {
    let mut options = ClientOptions::parse(&config.mongodb_uri)
        .await
        .context("Failed to parse MongoDB connection string")?;
    options.server_selection_timeout =
        Some(Duration::from_secs(config.server_selection_timeout_secs));

    let client =
        Client::with_options(options).context("Failed to create MongoDB client")?;

    // Ping to verify connection
    client
        .database("admin")
        .run_command(mongodb::bson::doc! {"ping": 1})
        .await
        .context("Failed to ping MongoDB")?;

    tracing::info!("✅ Successfully connected to MongoDB");
    Ok(client)
}

/// Get database handle
pub fn get_database(client: &Client, db_name: &str) -> Database {
    client.database(db_name)
}
