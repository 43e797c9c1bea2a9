use moka::future::Cache;
use railify_pricing::config::Config;
use railify_pricing::db::Database;
use railify_pricing::estimate::EstimateService;
use railify_pricing::handlers::AppState;
use railify_pricing::routes::build_router;
use railify_pricing::store::{PgTenantStore, TenantStore};
use railify_pricing::stripe_client::StripeClient;
use railify_pricing::usage::UsageReporter;
use railify_pricing::zip_distance::ZipDirectory;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Main entry point for the application.
///
/// Initializes logging, configuration, the database pool, the zip table and
/// the billing client, then serves the HTTP API.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "railify_pricing=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    let db = Database::new(&config.database_url).await?;
    tracing::info!("Database connection pool established");

    let zips = ZipDirectory::load(&config.zip_data_path).await?;

    let stripe = StripeClient::new(
        config.stripe_api_base.clone(),
        config.stripe_secret_key.clone(),
    )?;
    tracing::info!("Stripe client initialized: {}", config.stripe_api_base);

    // Billing event ids seen in the last 24 hours
    let processed_events = Cache::builder()
        .time_to_live(Duration::from_secs(86400))
        .max_capacity(50_000)
        .build();

    let store: Arc<dyn TenantStore> = Arc::new(PgTenantStore::new(db.pool.clone()));
    let app_state = Arc::new(AppState {
        config: config.clone(),
        store: store.clone(),
        estimates: EstimateService::new(store.clone(), Arc::new(zips)),
        usage: UsageReporter::new(store, stripe),
        processed_events,
    });

    let app = build_router(app_state)?;

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
