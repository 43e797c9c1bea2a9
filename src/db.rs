use sqlx::{postgres::PgPoolOptions, PgPool};

pub struct Database {
    pub pool: PgPool,
}

impl Database {
    pub async fn new(database_url: &str) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await?;

        sqlx::query("SELECT 1").execute(&pool).await?;

        Ok(Self { pool })
    }

    /// Applies pending migrations from `migrations/` and returns the versions now applied.
    pub async fn migrate(&self) -> anyhow::Result<Vec<i64>> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;

        let versions: Vec<(i64,)> =
            sqlx::query_as("SELECT version FROM _sqlx_migrations WHERE success ORDER BY version")
                .fetch_all(&self.pool)
                .await?;

        Ok(versions.into_iter().map(|(v,)| v).collect())
    }
}
