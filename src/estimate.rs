use crate::errors::AppError;
use crate::models::{
    ApplicationType, EstimateBreakdown, EstimateResult, PricingStyle, TravelSettings,
};
use crate::store::TenantStore;
use crate::travel::calculate_travel_fee;
use crate::zip_distance::ZipDirectory;
use std::sync::Arc;
use uuid::Uuid;

/// Pure price arithmetic for a style, footage, distance and travel configuration.
pub fn compose_estimate(
    style: &PricingStyle,
    linear_feet: f64,
    distance: f64,
    settings: Option<&TravelSettings>,
) -> EstimateResult {
    let travel_fee = calculate_travel_fee(distance, settings);

    let base_min = style.price_per_ft_min * linear_feet;
    let base_max = style.price_per_ft_max * linear_feet;

    let surcharge = match settings.map(|s| s.application_type) {
        Some(ApplicationType::PerFootSurcharge) => travel_fee * linear_feet,
        _ => travel_fee,
    };

    EstimateResult {
        min_price: base_min + surcharge,
        max_price: base_max + surcharge,
        distance,
        breakdown: EstimateBreakdown {
            base_min,
            base_max,
            travel_fee,
            price_per_ft_min: style.price_per_ft_min,
            price_per_ft_max: style.price_per_ft_max,
        },
    }
}

/// Produces quotes for the widget from stored styles and tenant settings.
#[derive(Clone)]
pub struct EstimateService {
    store: Arc<dyn TenantStore>,
    zips: Arc<ZipDirectory>,
}

impl EstimateService {
    pub fn new(store: Arc<dyn TenantStore>, zips: Arc<ZipDirectory>) -> Self {
        Self { store, zips }
    }

    /// Quote for `linear_feet` of `style_id` delivered to `zip_code`.
    ///
    /// An unknown style is `AppError::NotFound`. A tenant without a profile,
    /// shop zip or travel settings gets a quote with no travel fee.
    pub async fn calculate_estimate(
        &self,
        style_id: Uuid,
        linear_feet: f64,
        zip_code: Option<&str>,
    ) -> Result<EstimateResult, AppError> {
        let style = self
            .store
            .find_style(style_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Style not found".to_string()))?;

        self.quote_style(&style, linear_feet, zip_code).await
    }

    /// Quote for a style the caller already loaded.
    pub async fn quote_style(
        &self,
        style: &PricingStyle,
        linear_feet: f64,
        zip_code: Option<&str>,
    ) -> Result<EstimateResult, AppError> {
        let profile = self.store.find_tenant_profile(style.tenant_id).await?;
        if profile.is_none() {
            tracing::warn!(
                "Style {} belongs to tenant {} with no profile, quoting without travel fee",
                style.id,
                style.tenant_id
            );
        }

        let shop_zip = profile
            .as_ref()
            .and_then(|p| p.address_zip.as_deref())
            .filter(|z| !z.trim().is_empty());
        let customer_zip = zip_code.filter(|z| !z.trim().is_empty());

        let distance = match (shop_zip, customer_zip) {
            (Some(shop), Some(customer)) => self.zips.distance_miles(shop, customer),
            _ => 0.0,
        };

        let settings = profile.as_ref().and_then(|p| p.travel_settings.as_ref());
        let result = compose_estimate(style, linear_feet, distance, settings);

        tracing::debug!(
            "Estimate for style {}: {:.2}-{:.2} ({} mi, travel fee {:.2})",
            style.id,
            result.min_price,
            result.max_price,
            result.distance,
            result.breakdown.travel_fee
        );

        Ok(result)
    }
}
