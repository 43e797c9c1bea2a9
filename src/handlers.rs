use crate::config::Config;
use crate::errors::AppError;
use crate::estimate::EstimateService;
use crate::leads::capture_lead;
use crate::models::*;
use crate::store::TenantStore;
use crate::usage::{UsageOutcome, UsageReporter, DEFAULT_USAGE_QUANTITY};
use crate::webhook_handler::constant_time_compare;
use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use moka::future::Cache;
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

/// Shared application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Config,
    /// Tenant, style and lead persistence.
    pub store: Arc<dyn TenantStore>,
    pub estimates: EstimateService,
    pub usage: UsageReporter,
    /// Billing event ids already applied (24 hour TTL).
    pub processed_events: Cache<String, i64>,
}

/// Health check endpoint.
pub async fn health() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::OK,
        Json(json!({
            "status": "healthy",
            "service": "railify-pricing",
            "version": env!("CARGO_PKG_VERSION")
        })),
    )
}

/// POST /api/v1/estimates
///
/// Quotes a style for the widget. Unknown styles answer 404 with `{"error": ...}`.
#[utoipa::path(
    post,
    path = "/api/v1/estimates",
    request_body = EstimateRequest,
    responses(
        (status = 200, description = "Price quote", body = EstimateResult),
        (status = 404, description = "Style not found")
    )
)]
pub async fn create_estimate(
    State(state): State<Arc<AppState>>,
    Json(req): Json<EstimateRequest>,
) -> Result<Json<EstimateResult>, AppError> {
    tracing::info!(
        "POST /estimates - style {} for {} ft",
        req.style_id,
        req.linear_feet
    );

    let result = state
        .estimates
        .calculate_estimate(req.style_id, req.linear_feet, req.zip_code.as_deref())
        .await?;

    Ok(Json(result))
}

/// POST /api/v1/leads
///
/// Stores a widget lead, with an estimate when a style and footage are supplied.
#[utoipa::path(
    post,
    path = "/api/v1/leads",
    request_body = LeadRequest,
    responses(
        (status = 201, description = "Lead stored", body = LeadResponse),
        (status = 400, description = "Invalid contact details"),
        (status = 404, description = "Unknown tenant or style")
    )
)]
pub async fn create_lead(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LeadRequest>,
) -> Result<(StatusCode, Json<LeadResponse>), AppError> {
    tracing::info!("POST /leads - tenant {}", req.tenant_id);

    let (lead, estimate) = capture_lead(&state.store, &state.estimates, req).await?;

    Ok((StatusCode::CREATED, Json(LeadResponse { lead, estimate })))
}

/// GET /api/v1/tenants/:id/travel-settings
#[utoipa::path(
    get,
    path = "/api/v1/tenants/{id}/travel-settings",
    params(("id" = Uuid, Path, description = "Tenant id")),
    responses(
        (status = 200, description = "Current travel configuration", body = TravelSettingsResponse),
        (status = 404, description = "Tenant not found")
    )
)]
pub async fn get_travel_settings(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(tenant_id): Path<Uuid>,
) -> Result<Json<TravelSettingsResponse>, AppError> {
    require_internal_key(&state.config, &headers)?;

    let profile = state
        .store
        .find_tenant_profile(tenant_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Tenant {} not found", tenant_id)))?;

    Ok(Json(TravelSettingsResponse {
        tenant_id,
        address_zip: profile.address_zip,
        travel_settings: profile.travel_settings,
    }))
}

/// PUT /api/v1/tenants/:id/travel-settings
#[utoipa::path(
    put,
    path = "/api/v1/tenants/{id}/travel-settings",
    params(("id" = Uuid, Path, description = "Tenant id")),
    request_body = TravelSettings,
    responses(
        (status = 200, description = "Settings stored", body = TravelSettings),
        (status = 400, description = "Invalid settings"),
        (status = 404, description = "Tenant not found")
    )
)]
pub async fn put_travel_settings(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(tenant_id): Path<Uuid>,
    Json(settings): Json<TravelSettings>,
) -> Result<Json<TravelSettings>, AppError> {
    require_internal_key(&state.config, &headers)?;
    settings.validate()?;

    if !state
        .store
        .update_travel_settings(tenant_id, &settings)
        .await?
    {
        return Err(AppError::NotFound(format!("Tenant {} not found", tenant_id)));
    }

    tracing::info!(
        "Updated travel settings for tenant {} ({:?})",
        tenant_id,
        settings.pricing_type
    );
    Ok(Json(settings))
}

/// POST /api/v1/tenants/:id/usage
///
/// Reports metered usage. Tenants without a metered subscription get a 200 with a skip status.
#[utoipa::path(
    post,
    path = "/api/v1/tenants/{id}/usage",
    params(("id" = Uuid, Path, description = "Tenant id")),
    request_body = UsageRequest,
    responses(
        (status = 200, description = "Usage reported or skipped", body = UsageResponse),
        (status = 502, description = "Billing provider failure")
    )
)]
pub async fn report_usage(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(tenant_id): Path<Uuid>,
    Json(req): Json<UsageRequest>,
) -> Result<Json<UsageResponse>, AppError> {
    require_internal_key(&state.config, &headers)?;

    let quantity = req.quantity.unwrap_or(DEFAULT_USAGE_QUANTITY);
    let outcome = state.usage.report_usage(tenant_id, quantity).await?;
    let status = outcome.status().to_string();

    let response = match outcome {
        UsageOutcome::Reported {
            subscription_item_id,
            usage_record_id,
        } => UsageResponse {
            status,
            subscription_item_id: Some(subscription_item_id),
            usage_record_id: Some(usage_record_id),
        },
        UsageOutcome::SkippedNoSubscription | UsageOutcome::SkippedNoMeteredItem => {
            UsageResponse {
                status,
                subscription_item_id: None,
                usage_record_id: None,
            }
        }
    };

    Ok(Json(response))
}

/// Validates the `X-Internal-Key` header when an internal key is configured.
fn require_internal_key(config: &Config, headers: &HeaderMap) -> Result<(), AppError> {
    let Some(ref expected) = config.internal_api_key else {
        return Ok(());
    };

    let provided = headers
        .get("X-Internal-Key")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized("Missing X-Internal-Key header".to_string()))?;

    if !constant_time_compare(provided, expected) {
        return Err(AppError::Unauthorized("Invalid internal key".to_string()));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn config(key: Option<&str>) -> Config {
        Config {
            database_url: "postgres://localhost/test".to_string(),
            port: 3000,
            stripe_secret_key: "sk_test".to_string(),
            stripe_api_base: "http://localhost".to_string(),
            stripe_webhook_secret: None,
            internal_api_key: key.map(str::to_string),
            zip_data_path: "tests/fixtures/zipcodes_sample.csv".to_string(),
        }
    }

    #[test]
    fn test_internal_key_open_when_unset() {
        assert!(require_internal_key(&config(None), &HeaderMap::new()).is_ok());
    }

    #[test]
    fn test_internal_key_enforced() {
        let cfg = config(Some("secret"));
        assert!(require_internal_key(&cfg, &HeaderMap::new()).is_err());

        let mut headers = HeaderMap::new();
        headers.insert("X-Internal-Key", HeaderValue::from_static("wrong!"));
        assert!(require_internal_key(&cfg, &headers).is_err());

        headers.insert("X-Internal-Key", HeaderValue::from_static("secret"));
        assert!(require_internal_key(&cfg, &headers).is_ok());
    }
}
