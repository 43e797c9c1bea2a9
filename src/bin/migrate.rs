//! Applies pending schema migrations and prints the applied versions.

use railify_pricing::db::Database;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "railify_pricing=info,migrate=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    dotenvy::dotenv().ok();
    let database_url = std::env::var("DATABASE_URL")
        .or_else(|_| std::env::var("DB_URL"))
        .map_err(|_| anyhow::anyhow!("DATABASE_URL or DB_URL environment variable required"))?;

    let db = Database::new(&database_url).await?;
    let versions = db.migrate().await?;

    tracing::info!("{} migration(s) applied", versions.len());
    for version in versions {
        println!("- {}", version);
    }

    Ok(())
}
