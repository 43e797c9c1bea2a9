use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Billing-provider event envelope.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StripeEvent {
    pub id: String,

    /// Event type (e.g., "checkout.session.completed")
    #[serde(rename = "type")]
    pub event_type: String,

    pub data: StripeEventData,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StripeEventData {
    /// The object the event is about; its shape depends on `event_type`.
    pub object: Value,
}

/// `data.object` of `checkout.session.completed`.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutSessionObject {
    pub customer: Option<String>,
    pub subscription: Option<String>,
    /// Tenant id set by the checkout page.
    pub client_reference_id: Option<String>,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

impl CheckoutSessionObject {
    pub fn tenant_reference(&self) -> Option<&str> {
        self.client_reference_id
            .as_deref()
            .or_else(|| self.metadata.get("tenant_id").map(String::as_str))
    }
}

/// `data.object` of `customer.subscription.*`.
#[derive(Debug, Clone, Deserialize)]
pub struct SubscriptionObject {
    pub id: String,
    pub status: String,
    pub customer: Option<String>,
}

/// What a processed event changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WebhookAction {
    SubscriptionLinked,
    StatusUpdated,
    SubscriptionCleared,
    Duplicate,
    Ignored,
}

#[derive(Debug, Clone, Serialize)]
pub struct WebhookResponse {
    pub received: bool,
    pub action: WebhookAction,
}
