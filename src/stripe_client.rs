use crate::errors::AppError;
use serde::Deserialize;
use std::time::Duration;

/// Subset of a billing-provider subscription needed for metered reporting.
#[derive(Debug, Clone, Deserialize)]
pub struct Subscription {
    pub id: String,
    #[serde(default)]
    pub status: Option<String>,
    pub items: SubscriptionItemList,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SubscriptionItemList {
    #[serde(default)]
    pub data: Vec<SubscriptionItem>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SubscriptionItem {
    pub id: String,
    pub price: Option<Price>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Price {
    pub id: Option<String>,
    pub recurring: Option<Recurring>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Recurring {
    pub usage_type: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UsageRecord {
    pub id: String,
    pub quantity: u64,
    #[serde(default)]
    pub subscription_item: Option<String>,
}

impl Subscription {
    /// The first line item billed by reported usage.
    pub fn metered_item(&self) -> Option<&SubscriptionItem> {
        self.items.data.iter().find(|item| {
            item.price
                .as_ref()
                .and_then(|p| p.recurring.as_ref())
                .and_then(|r| r.usage_type.as_deref())
                == Some("metered")
        })
    }
}

/// Client for the billing provider's REST API.
#[derive(Clone)]
pub struct StripeClient {
    client: reqwest::Client,
    base_url: String,
    secret_key: String,
}

impl StripeClient {
    /// Creates a new `StripeClient`.
    ///
    /// # Arguments
    ///
    /// * `base_url` - API root, normally `https://api.stripe.com`.
    /// * `secret_key` - Secret API key used as the bearer token.
    pub fn new(base_url: String, secret_key: String) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| {
                AppError::ExternalApiError(format!("Failed to create Stripe client: {}", e))
            })?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            secret_key,
        })
    }

    /// Retrieves a subscription with its line items.
    pub async fn get_subscription(&self, subscription_id: &str) -> Result<Subscription, AppError> {
        let url = format!("{}/v1/subscriptions/{}", self.base_url, subscription_id);
        tracing::debug!("Fetching subscription {}", subscription_id);

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.secret_key)
            .send()
            .await
            .map_err(|e| AppError::ExternalApiError(format!("Stripe request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AppError::ExternalApiError(format!(
                "Stripe returned {}: {}",
                status, error_text
            )));
        }

        response.json().await.map_err(|e| {
            AppError::ExternalApiError(format!("Failed to parse subscription: {}", e))
        })
    }

    /// Submits an `increment` usage record against a metered line item.
    ///
    /// # Arguments
    ///
    /// * `subscription_item_id` - The metered line item.
    /// * `quantity` - Units to add.
    /// * `timestamp` - Unix seconds the usage occurred at.
    /// * `idempotency_key` - Sent as `Idempotency-Key` so a replayed request is not double counted.
    pub async fn create_usage_record(
        &self,
        subscription_item_id: &str,
        quantity: u64,
        timestamp: i64,
        idempotency_key: &str,
    ) -> Result<UsageRecord, AppError> {
        let url = format!(
            "{}/v1/subscription_items/{}/usage_records",
            self.base_url, subscription_item_id
        );

        let form = [
            ("quantity", quantity.to_string()),
            ("timestamp", timestamp.to_string()),
            ("action", "increment".to_string()),
        ];

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.secret_key)
            .header("Idempotency-Key", idempotency_key)
            .form(&form)
            .send()
            .await
            .map_err(|e| {
                AppError::ExternalApiError(format!("Failed to submit usage record: {}", e))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AppError::ExternalApiError(format!(
                "Stripe usage record failed {}: {}",
                status, error_text
            )));
        }

        let record: UsageRecord = response.json().await.map_err(|e| {
            AppError::ExternalApiError(format!("Failed to parse usage record: {}", e))
        })?;

        tracing::info!(
            "Usage record {} created on item {} (+{})",
            record.id,
            subscription_item_id,
            quantity
        );
        Ok(record)
    }
}
