use crate::errors::AppError;
use crate::handlers::AppState;
use crate::store::TenantStore;
use crate::webhook_models::{
    CheckoutSessionObject, StripeEvent, SubscriptionObject, WebhookAction, WebhookResponse,
};
use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    Json,
};
use chrono::Utc;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::sync::Arc;
use uuid::Uuid;

type HmacSha256 = Hmac<Sha256>;

/// Maximum age of a signed webhook, in seconds.
pub const SIGNATURE_TOLERANCE_SECS: i64 = 300;

/// Billing webhook handler
///
/// Verifies the `Stripe-Signature` header (when a signing secret is configured),
/// drops events already seen, and applies subscription changes to the tenant's profile.
/// A failure to apply returns an error so the provider redelivers the event.
pub async fn stripe_webhook(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<(StatusCode, Json<WebhookResponse>), AppError> {
    if let Some(ref secret) = state.config.stripe_webhook_secret {
        let signature = headers
            .get("Stripe-Signature")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| AppError::Unauthorized("Missing Stripe-Signature header".to_string()))?;
        verify_stripe_signature(&body, signature, secret, Utc::now().timestamp())?;
    }

    let event: StripeEvent = serde_json::from_slice(&body)
        .map_err(|e| AppError::BadRequest(format!("Invalid event payload: {}", e)))?;
    tracing::info!("Received billing event {} ({})", event.id, event.event_type);

    // Claim the id before applying; a failed apply releases it.
    let claim = state
        .processed_events
        .entry(event.id.clone())
        .or_insert_with(async { Utc::now().timestamp() })
        .await;
    if !claim.is_fresh() {
        tracing::debug!("Skipped duplicate billing event {}", event.id);
        return Ok((
            StatusCode::OK,
            Json(WebhookResponse {
                received: true,
                action: WebhookAction::Duplicate,
            }),
        ));
    }

    let action = match apply_event(state.store.as_ref(), &event).await {
        Ok(action) => action,
        Err(e) => {
            state.processed_events.invalidate(&event.id).await;
            return Err(e);
        }
    };

    Ok((
        StatusCode::OK,
        Json(WebhookResponse {
            received: true,
            action,
        }),
    ))
}

/// Applies one event to the store.
pub async fn apply_event(
    store: &dyn TenantStore,
    event: &StripeEvent,
) -> Result<WebhookAction, AppError> {
    match event.event_type.as_str() {
        "checkout.session.completed" => {
            let session: CheckoutSessionObject = parse_object(event)?;

            let (Some(tenant_ref), Some(customer), Some(subscription)) = (
                session.tenant_reference(),
                session.customer.as_deref(),
                session.subscription.as_deref(),
            ) else {
                tracing::warn!(
                    "Checkout session in event {} lacks tenant, customer or subscription",
                    event.id
                );
                return Ok(WebhookAction::Ignored);
            };

            let Ok(tenant_id) = Uuid::parse_str(tenant_ref) else {
                tracing::warn!("Event {} references invalid tenant id {}", event.id, tenant_ref);
                return Ok(WebhookAction::Ignored);
            };

            if !store
                .link_subscription(tenant_id, customer, subscription, "active")
                .await?
            {
                tracing::warn!("Event {} references unknown tenant {}", event.id, tenant_id);
                return Ok(WebhookAction::Ignored);
            }

            tracing::info!("Linked subscription {} to tenant {}", subscription, tenant_id);
            Ok(WebhookAction::SubscriptionLinked)
        }
        "customer.subscription.updated" => {
            let sub: SubscriptionObject = parse_object(event)?;
            let updated = store.update_subscription_status(&sub.id, &sub.status).await?;
            tracing::info!(
                "Subscription {} is now {} ({} profile(s))",
                sub.id,
                sub.status,
                updated
            );
            Ok(WebhookAction::StatusUpdated)
        }
        "customer.subscription.deleted" => {
            let sub: SubscriptionObject = parse_object(event)?;
            let cleared = store.clear_subscription(&sub.id, "canceled").await?;
            tracing::info!("Subscription {} canceled ({} profile(s))", sub.id, cleared);
            Ok(WebhookAction::SubscriptionCleared)
        }
        other => {
            tracing::debug!("Ignoring billing event type {}", other);
            Ok(WebhookAction::Ignored)
        }
    }
}

fn parse_object<T: serde::de::DeserializeOwned>(event: &StripeEvent) -> Result<T, AppError> {
    serde_json::from_value(event.data.object.clone()).map_err(|e| {
        AppError::BadRequest(format!(
            "Unexpected object in {} event: {}",
            event.event_type, e
        ))
    })
}

/// Checks a `t=<unix>,v1=<hex hmac>` header against the raw request body.
pub fn verify_stripe_signature(
    payload: &[u8],
    header: &str,
    secret: &str,
    now: i64,
) -> Result<(), AppError> {
    let mut timestamp = None;
    let mut signatures = Vec::new();
    for part in header.split(',') {
        match part.trim().split_once('=') {
            Some(("t", value)) => timestamp = value.parse::<i64>().ok(),
            Some(("v1", value)) => signatures.push(value),
            _ => {}
        }
    }

    let timestamp = timestamp
        .ok_or_else(|| AppError::Unauthorized("Signature header has no timestamp".to_string()))?;
    if signatures.is_empty() {
        return Err(AppError::Unauthorized(
            "Signature header has no v1 signature".to_string(),
        ));
    }
    if (now - timestamp).abs() > SIGNATURE_TOLERANCE_SECS {
        return Err(AppError::Unauthorized(
            "Signature timestamp outside tolerance".to_string(),
        ));
    }

    let expected = sign_payload(payload, timestamp, secret)?;
    if signatures
        .iter()
        .any(|candidate| constant_time_compare(candidate, &expected))
    {
        Ok(())
    } else {
        tracing::warn!("Invalid billing webhook signature received");
        Err(AppError::Unauthorized("Invalid signature".to_string()))
    }
}

/// Hex HMAC-SHA256 of `"{timestamp}.{payload}"`.
pub fn sign_payload(payload: &[u8], timestamp: i64, secret: &str) -> Result<String, AppError> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| AppError::InternalError(format!("Invalid webhook secret: {}", e)))?;
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Constant-time string comparison
pub(crate) fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    a.as_bytes()
        .iter()
        .zip(b.as_bytes().iter())
        .fold(0u8, |acc, (x, y)| acc | (x ^ y))
        == 0
}
