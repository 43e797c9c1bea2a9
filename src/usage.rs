use crate::errors::AppError;
use crate::store::TenantStore;
use crate::stripe_client::StripeClient;
use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

pub const DEFAULT_USAGE_QUANTITY: u64 = 1;

/// What `report_usage` did. Skips are normal for tenants still on trial.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UsageOutcome {
    Reported {
        subscription_item_id: String,
        usage_record_id: String,
    },
    SkippedNoSubscription,
    SkippedNoMeteredItem,
}

impl UsageOutcome {
    pub fn status(&self) -> &'static str {
        match self {
            UsageOutcome::Reported { .. } => "reported",
            UsageOutcome::SkippedNoSubscription => "skipped_no_subscription",
            UsageOutcome::SkippedNoMeteredItem => "skipped_no_metered_item",
        }
    }
}

/// Pushes metered usage for a tenant to the billing provider.
#[derive(Clone)]
pub struct UsageReporter {
    store: Arc<dyn TenantStore>,
    stripe: StripeClient,
}

impl UsageReporter {
    pub fn new(store: Arc<dyn TenantStore>, stripe: StripeClient) -> Self {
        Self { store, stripe }
    }

    /// Adds `quantity` units to the tenant's metered line item.
    ///
    /// Missing subscription or metered item is a logged no-op. Provider and
    /// network failures are returned unchanged and never retried.
    pub async fn report_usage(
        &self,
        tenant_id: Uuid,
        quantity: u64,
    ) -> Result<UsageOutcome, AppError> {
        if quantity == 0 {
            return Err(AppError::BadRequest("quantity must be at least 1".to_string()));
        }

        let subscription_id = self
            .store
            .find_tenant_profile(tenant_id)
            .await?
            .and_then(|p| p.stripe_subscription_id)
            .filter(|id| !id.trim().is_empty());

        let Some(subscription_id) = subscription_id else {
            tracing::warn!(
                "Tenant {} has no subscription, dropping {} usage unit(s)",
                tenant_id,
                quantity
            );
            return Ok(UsageOutcome::SkippedNoSubscription);
        };

        let subscription = self.stripe.get_subscription(&subscription_id).await?;

        let Some(item) = subscription.metered_item() else {
            tracing::warn!(
                "Subscription {} for tenant {} has no metered item, dropping {} usage unit(s)",
                subscription_id,
                tenant_id,
                quantity
            );
            return Ok(UsageOutcome::SkippedNoMeteredItem);
        };

        let idempotency_key = Uuid::new_v4().to_string();
        let record = self
            .stripe
            .create_usage_record(&item.id, quantity, Utc::now().timestamp(), &idempotency_key)
            .await?;

        tracing::info!(
            "Reported {} usage unit(s) for tenant {} on {}",
            quantity,
            tenant_id,
            item.id
        );

        Ok(UsageOutcome::Reported {
            subscription_item_id: item.id.clone(),
            usage_record_id: record.id,
        })
    }
}
