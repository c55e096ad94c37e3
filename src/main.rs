use anyhow::Result;

use bookstore::config::Config;
use bookstore::{db, runner};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = Config::from_env()?;
    let client = db::create_client(&config).await?;
    let database = db::get_database(&client, &config.database);

    // Single error boundary: a failed step aborts the rest of the sequence,
    // the connection is still released below.
    if let Err(error) = runner::run(&database).await {
        tracing::error!("❌ query sequence aborted: {error:#}");
    }

    client.shutdown().await;
    tracing::info!("🔌 connection closed");

    Ok(())
}
