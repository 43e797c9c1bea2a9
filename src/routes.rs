use crate::api_doc::ApiDoc;
use crate::handlers::{self, AppState};
use crate::webhook_handler;
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_governor::{
    governor::GovernorConfigBuilder, key_extractor::SmartIpKeyExtractor, GovernorLayer,
};
use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Builds the full HTTP surface: widget routes (rate limited per client IP),
/// internal tenant and webhook routes, health and API docs.
pub fn build_router(state: Arc<AppState>) -> anyhow::Result<Router> {
    // 10 requests/second per IP, burst of 20
    let governor_conf = Arc::new(
        GovernorConfigBuilder::default()
            .per_second(10)
            .burst_size(20)
            .key_extractor(SmartIpKeyExtractor)
            .finish()
            .ok_or_else(|| anyhow::anyhow!("invalid rate limiter configuration"))?,
    );

    // Widget-facing routes
    let public_routes = Router::new()
        .route("/api/v1/estimates", post(handlers::create_estimate))
        .route("/api/v1/leads", post(handlers::create_lead))
        .layer(
            ServiceBuilder::new()
                .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
                .layer(GovernorLayer {
                    config: governor_conf,
                }),
        );

    let internal_routes = Router::new()
        .route(
            "/api/v1/tenants/:id/travel-settings",
            get(handlers::get_travel_settings).put(handlers::put_travel_settings),
        )
        .route("/api/v1/tenants/:id/usage", post(handlers::report_usage))
        .route(
            "/api/v1/webhooks/stripe",
            post(webhook_handler::stripe_webhook),
        )
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES));

    Ok(Router::new()
        .route("/health", get(handlers::health))
        .merge(public_routes)
        .merge(internal_routes)
        .with_state(state)
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()))
}
