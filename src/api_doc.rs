use crate::models::{
    ApplicationType, EstimateBreakdown, EstimateRequest, EstimateResult, Lead, LeadRequest,
    LeadResponse, PricingType, TravelSettings, TravelSettingsResponse, TravelTier, UsageRequest,
    UsageResponse,
};
use utoipa::OpenApi;

/// OpenAPI document for the public and internal endpoints.
#[derive(OpenApi)]
#[openapi(
    info(title = "Railify Pricing API", description = "Estimates, leads and metered billing"),
    paths(
        crate::handlers::create_estimate,
        crate::handlers::create_lead,
        crate::handlers::get_travel_settings,
        crate::handlers::put_travel_settings,
        crate::handlers::report_usage,
    ),
    components(schemas(
        EstimateRequest,
        EstimateResult,
        EstimateBreakdown,
        LeadRequest,
        LeadResponse,
        Lead,
        TravelSettings,
        TravelSettingsResponse,
        TravelTier,
        PricingType,
        ApplicationType,
        UsageRequest,
        UsageResponse,
    ))
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_lists_estimate_path() {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/api/v1/estimates"));
        assert!(doc
            .paths
            .paths
            .contains_key("/api/v1/tenants/{id}/travel-settings"));
    }
}
