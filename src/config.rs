use serde::Deserialize;

pub const DEFAULT_STRIPE_API_BASE: &str = "https://api.stripe.com";

/// Process-wide settings, loaded once at startup and passed explicitly.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub stripe_secret_key: String,
    pub stripe_api_base: String,
    /// Signing secret for billing webhooks. Signatures are not checked when unset.
    pub stripe_webhook_secret: Option<String>,
    /// Shared key for tenant-management endpoints. Open when unset.
    pub internal_api_key: Option<String>,
    /// Zip coordinate table: `zip,latitude,longitude` CSV or the Census ZCTA gazetteer.
    pub zip_data_path: String,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let config = Self {
            database_url: std::env::var("DATABASE_URL")
                .or_else(|_| std::env::var("DB_URL"))
                .map_err(|_| {
                    anyhow::anyhow!("DATABASE_URL or DB_URL environment variable required")
                })
                .and_then(|url| {
                    if url.trim().is_empty() {
                        anyhow::bail!("DATABASE_URL cannot be empty");
                    }
                    if !url.starts_with("postgresql://") && !url.starts_with("postgres://") {
                        anyhow::bail!("DATABASE_URL must start with postgresql:// or postgres://");
                    }
                    Ok(url)
                })?,
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number between 1-65535"))?,
            stripe_secret_key: std::env::var("STRIPE_SECRET_KEY")
                .map_err(|_| anyhow::anyhow!("STRIPE_SECRET_KEY environment variable required"))
                .and_then(|key| {
                    if key.trim().is_empty() {
                        anyhow::bail!("STRIPE_SECRET_KEY cannot be empty");
                    }
                    Ok(key)
                })?,
            stripe_api_base: std::env::var("STRIPE_API_BASE")
                .ok()
                .filter(|s| !s.trim().is_empty())
                .map(|url| validate_http_url("STRIPE_API_BASE", url))
                .transpose()?
                .unwrap_or_else(|| DEFAULT_STRIPE_API_BASE.to_string()),
            stripe_webhook_secret: non_empty_var("STRIPE_WEBHOOK_SECRET"),
            internal_api_key: non_empty_var("INTERNAL_API_KEY"),
            zip_data_path: non_empty_var("ZIP_DATA_PATH").ok_or_else(|| {
                anyhow::anyhow!("ZIP_DATA_PATH environment variable required (CSV or ZCTA gazetteer)")
            })?,
        };

        tracing::info!("Configuration loaded successfully");
        tracing::debug!("Database: {}", database_target(&config.database_url));
        tracing::debug!("Stripe API base: {}", config.stripe_api_base);
        tracing::debug!("Server Port: {}", config.port);
        if config.stripe_webhook_secret.is_none() {
            tracing::warn!("STRIPE_WEBHOOK_SECRET not set, webhook signatures will not be verified");
        }
        if config.internal_api_key.is_none() {
            tracing::warn!("INTERNAL_API_KEY not set, tenant endpoints are unauthenticated");
        }
        tracing::debug!("Zip table: {}", config.zip_data_path);

        Ok(config)
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|s| !s.trim().is_empty())
}

/// `host[:port]/database` of a connection URL, without credentials.
fn database_target(raw: &str) -> String {
    let Ok(parsed) = url::Url::parse(raw) else {
        return "<unparseable url>".to_string();
    };
    let host = parsed.host_str().unwrap_or("localhost");
    let database = parsed.path().trim_start_matches('/');
    match parsed.port() {
        Some(port) => format!("{}:{}/{}", host, port, database),
        None => format!("{}/{}", host, database),
    }
}

fn validate_http_url(name: &str, raw: String) -> anyhow::Result<String> {
    let parsed = url::Url::parse(&raw)
        .map_err(|e| anyhow::anyhow!("{} is not a valid URL: {}", name, e))?;
    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        anyhow::bail!("{} must start with http:// or https://", name);
    }
    Ok(raw.trim_end_matches('/').to_string())
}
