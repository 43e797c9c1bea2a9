use bigdecimal::{BigDecimal, ToPrimitive};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

// ============ Domain Models ============

/// A handrail design with a price-per-linear-foot range, owned by a tenant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PricingStyle {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub price_per_ft_min: f64,
    pub price_per_ft_max: f64,
}

/// A fabrication shop's profile as read at estimate and billing time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TenantProfile {
    pub id: Uuid,
    pub address_zip: Option<String>,
    /// `None` means the tenant never configured travel pricing (or the stored
    /// document could not be read); both mean "no travel fee".
    pub travel_settings: Option<TravelSettings>,
    pub stripe_customer_id: Option<String>,
    pub stripe_subscription_id: Option<String>,
    pub subscription_status: Option<String>,
}

/// How the travel fee is derived from the distance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PricingType {
    RadiusTiers,
    PerMile,
    Flat,
}

/// How the travel fee is folded into the quote.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationType {
    /// Added once to each bound.
    #[default]
    Flat,
    /// Multiplied by the linear footage before being added.
    PerFootSurcharge,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct TravelTier {
    /// Upper bound of the tier, in miles (inclusive).
    pub radius: f64,
    pub price: f64,
}

/// Tenant-configured travel pricing, stored as JSON on the profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct TravelSettings {
    pub pricing_type: PricingType,
    #[serde(default)]
    pub application_type: ApplicationType,
    #[serde(default)]
    pub tiers: Vec<TravelTier>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rate_per_mile: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_fee: Option<f64>,
}

/// Price quote returned to the widget. Never persisted by the calculator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EstimateResult {
    pub min_price: f64,
    pub max_price: f64,
    /// Shop-to-customer distance in whole miles, 0 when unknown.
    pub distance: f64,
    pub breakdown: EstimateBreakdown,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EstimateBreakdown {
    pub base_min: f64,
    pub base_max: f64,
    pub travel_fee: f64,
    pub price_per_ft_min: f64,
    pub price_per_ft_max: f64,
}

// ============ Database Models ============

/// Row shape of `portfolio`; prices are `numeric` columns.
#[derive(Debug, Clone, FromRow)]
pub struct StyleRow {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub price_per_ft_min: BigDecimal,
    pub price_per_ft_max: BigDecimal,
}

impl From<StyleRow> for PricingStyle {
    fn from(row: StyleRow) -> Self {
        Self {
            id: row.id,
            tenant_id: row.tenant_id,
            price_per_ft_min: row.price_per_ft_min.to_f64().unwrap_or(0.0),
            price_per_ft_max: row.price_per_ft_max.to_f64().unwrap_or(0.0),
        }
    }
}

/// Row shape of `profiles`; `travel_settings` is raw `jsonb`.
#[derive(Debug, Clone, FromRow)]
pub struct ProfileRow {
    pub id: Uuid,
    pub address_zip: Option<String>,
    pub travel_settings: Option<serde_json::Value>,
    pub stripe_customer_id: Option<String>,
    pub stripe_subscription_id: Option<String>,
    pub subscription_status: Option<String>,
}

impl From<ProfileRow> for TenantProfile {
    fn from(row: ProfileRow) -> Self {
        Self {
            id: row.id,
            address_zip: row.address_zip,
            travel_settings: row
                .travel_settings
                .and_then(|raw| TravelSettings::from_stored(row.id, raw)),
            stripe_customer_id: row.stripe_customer_id,
            stripe_subscription_id: row.stripe_subscription_id,
            subscription_status: row.subscription_status,
        }
    }
}

/// A lead captured through the widget.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, ToSchema)]
pub struct Lead {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub style_id: Option<Uuid>,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub zip_code: Option<String>,
    pub linear_feet: Option<f64>,
    pub estimate_min: Option<f64>,
    pub estimate_max: Option<f64>,
    pub created_at: DateTime<Utc>,
}

// ============ API Request/Response Models ============

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct EstimateRequest {
    pub style_id: Uuid,
    pub linear_feet: f64,
    /// Customer's zip code.
    #[serde(default)]
    pub zip_code: Option<String>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct LeadRequest {
    pub tenant_id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub zip_code: Option<String>,
    #[serde(default)]
    pub style_id: Option<Uuid>,
    #[serde(default)]
    pub linear_feet: Option<f64>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct LeadResponse {
    pub lead: Lead,
    pub estimate: Option<EstimateResult>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct UsageRequest {
    /// Units to add; 1 when omitted.
    #[serde(default)]
    pub quantity: Option<u64>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UsageResponse {
    /// One of `reported`, `skipped_no_subscription`, `skipped_no_metered_item`.
    pub status: String,
    pub subscription_item_id: Option<String>,
    pub usage_record_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TravelSettingsResponse {
    pub tenant_id: Uuid,
    pub address_zip: Option<String>,
    pub travel_settings: Option<TravelSettings>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::str::FromStr;

    #[test]
    fn test_estimate_result_serializes_camel_case() {
        let result = EstimateResult {
            min_price: 200.0,
            max_price: 300.0,
            distance: 0.0,
            breakdown: EstimateBreakdown {
                base_min: 200.0,
                base_max: 300.0,
                travel_fee: 0.0,
                price_per_ft_min: 10.0,
                price_per_ft_max: 15.0,
            },
        };

        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["minPrice"], 200.0);
        assert_eq!(value["maxPrice"], 300.0);
        assert_eq!(value["breakdown"]["travelFee"], 0.0);
        assert_eq!(value["breakdown"]["pricePerFtMax"], 15.0);
    }

    #[test]
    fn test_travel_settings_defaults() {
        let settings: TravelSettings =
            serde_json::from_value(json!({"pricing_type": "flat", "base_fee": 50})).unwrap();
        assert_eq!(settings.application_type, ApplicationType::Flat);
        assert!(settings.tiers.is_empty());
        assert_eq!(settings.base_fee, Some(50.0));
        assert_eq!(settings.rate_per_mile, None);
    }

    #[test]
    fn test_style_row_converts_numeric_prices() {
        let row = StyleRow {
            id: Uuid::new_v4(),
            tenant_id: Uuid::new_v4(),
            price_per_ft_min: BigDecimal::from_str("10.50").unwrap(),
            price_per_ft_max: BigDecimal::from_str("15").unwrap(),
        };
        let style = PricingStyle::from(row);
        assert_eq!(style.price_per_ft_min, 10.5);
        assert_eq!(style.price_per_ft_max, 15.0);
    }

    #[test]
    fn test_profile_row_with_unreadable_settings_degrades() {
        let row = ProfileRow {
            id: Uuid::new_v4(),
            address_zip: Some("10001".to_string()),
            travel_settings: Some(json!({"pricing_type": "teleport"})),
            stripe_customer_id: None,
            stripe_subscription_id: None,
            subscription_status: None,
        };
        let profile = TenantProfile::from(row);
        assert!(profile.travel_settings.is_none());
        assert_eq!(profile.address_zip.as_deref(), Some("10001"));
    }

    #[test]
    fn test_usage_request_quantity_optional() {
        let req: UsageRequest = serde_json::from_value(json!({})).unwrap();
        assert_eq!(req.quantity, None);
    }
}
