use crate::errors::{AppError, ResultExt};
use crate::models::{Lead, PricingStyle, ProfileRow, StyleRow, TenantProfile, TravelSettings};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

/// Fields of a lead supplied by the caller; id and timestamp are assigned on insert.
#[derive(Debug, Clone, Default)]
pub struct NewLead {
    pub tenant_id: Uuid,
    pub style_id: Option<Uuid>,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub zip_code: Option<String>,
    pub linear_feet: Option<f64>,
    pub estimate_min: Option<f64>,
    pub estimate_max: Option<f64>,
}

/// Tenant data the pricing and billing paths read and write.
#[async_trait]
pub trait TenantStore: Send + Sync {
    async fn find_style(&self, style_id: Uuid) -> Result<Option<PricingStyle>, AppError>;

    async fn find_tenant_profile(&self, tenant_id: Uuid)
        -> Result<Option<TenantProfile>, AppError>;

    /// Returns false when the tenant does not exist.
    async fn update_travel_settings(
        &self,
        tenant_id: Uuid,
        settings: &TravelSettings,
    ) -> Result<bool, AppError>;

    /// Attaches a billing customer and subscription to a tenant. Returns false when the tenant does not exist.
    async fn link_subscription(
        &self,
        tenant_id: Uuid,
        customer_id: &str,
        subscription_id: &str,
        status: &str,
    ) -> Result<bool, AppError>;

    /// Returns the number of profiles updated.
    async fn update_subscription_status(
        &self,
        subscription_id: &str,
        status: &str,
    ) -> Result<u64, AppError>;

    /// Detaches a subscription from whichever tenant holds it. Returns the number of profiles updated.
    async fn clear_subscription(&self, subscription_id: &str, status: &str)
        -> Result<u64, AppError>;

    async fn insert_lead(&self, lead: NewLead) -> Result<Lead, AppError>;
}

/// Postgres-backed store.
#[derive(Clone)]
pub struct PgTenantStore {
    pool: PgPool,
}

impl PgTenantStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TenantStore for PgTenantStore {
    async fn find_style(&self, style_id: Uuid) -> Result<Option<PricingStyle>, AppError> {
        let row = sqlx::query_as::<_, StyleRow>(
            "SELECT id, tenant_id, price_per_ft_min, price_per_ft_max FROM portfolio WHERE id = $1",
        )
        .bind(style_id)
        .fetch_optional(&self.pool)
        .await
        .with_context(|| format!("loading style {}", style_id))?;

        Ok(row.map(PricingStyle::from))
    }

    async fn find_tenant_profile(
        &self,
        tenant_id: Uuid,
    ) -> Result<Option<TenantProfile>, AppError> {
        let row = sqlx::query_as::<_, ProfileRow>(
            "SELECT id, address_zip, travel_settings, stripe_customer_id,
                    stripe_subscription_id, subscription_status
             FROM profiles WHERE id = $1",
        )
        .bind(tenant_id)
        .fetch_optional(&self.pool)
        .await
        .with_context(|| format!("loading profile {}", tenant_id))?;

        Ok(row.map(TenantProfile::from))
    }

    async fn update_travel_settings(
        &self,
        tenant_id: Uuid,
        settings: &TravelSettings,
    ) -> Result<bool, AppError> {
        let document = serde_json::to_value(settings)
            .map_err(|e| AppError::InternalError(format!("Failed to encode settings: {}", e)))?;

        let result = sqlx::query(
            "UPDATE profiles SET travel_settings = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(tenant_id)
        .bind(document)
        .execute(&self.pool)
        .await
        .context("updating travel settings")?;

        Ok(result.rows_affected() > 0)
    }

    async fn link_subscription(
        &self,
        tenant_id: Uuid,
        customer_id: &str,
        subscription_id: &str,
        status: &str,
    ) -> Result<bool, AppError> {
        let result = sqlx::query(
            "UPDATE profiles
             SET stripe_customer_id = $2,
                 stripe_subscription_id = $3,
                 subscription_status = $4,
                 updated_at = NOW()
             WHERE id = $1",
        )
        .bind(tenant_id)
        .bind(customer_id)
        .bind(subscription_id)
        .bind(status)
        .execute(&self.pool)
        .await
        .context("linking subscription")?;

        Ok(result.rows_affected() > 0)
    }

    async fn update_subscription_status(
        &self,
        subscription_id: &str,
        status: &str,
    ) -> Result<u64, AppError> {
        let result = sqlx::query(
            "UPDATE profiles SET subscription_status = $2, updated_at = NOW()
             WHERE stripe_subscription_id = $1",
        )
        .bind(subscription_id)
        .bind(status)
        .execute(&self.pool)
        .await
        .context("updating subscription status")?;

        Ok(result.rows_affected())
    }

    async fn clear_subscription(
        &self,
        subscription_id: &str,
        status: &str,
    ) -> Result<u64, AppError> {
        let result = sqlx::query(
            "UPDATE profiles
             SET stripe_subscription_id = NULL, subscription_status = $2, updated_at = NOW()
             WHERE stripe_subscription_id = $1",
        )
        .bind(subscription_id)
        .bind(status)
        .execute(&self.pool)
        .await
        .context("clearing subscription")?;

        Ok(result.rows_affected())
    }

    async fn insert_lead(&self, lead: NewLead) -> Result<Lead, AppError> {
        let row = sqlx::query_as::<_, Lead>(
            "INSERT INTO leads (
                id, tenant_id, style_id, name, email, phone, zip_code,
                linear_feet, estimate_min, estimate_max, created_at
             ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
             RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(lead.tenant_id)
        .bind(lead.style_id)
        .bind(&lead.name)
        .bind(&lead.email)
        .bind(&lead.phone)
        .bind(&lead.zip_code)
        .bind(lead.linear_feet)
        .bind(lead.estimate_min)
        .bind(lead.estimate_max)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .context("inserting lead")?;

        tracing::info!("Stored lead {} for tenant {}", row.id, row.tenant_id);
        Ok(row)
    }
}
