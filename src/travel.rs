use crate::errors::AppError;
use crate::models::{PricingType, TravelSettings, TravelTier};
use uuid::Uuid;

/// Travel surcharge for a job `distance` miles from the shop.
///
/// Unconfigured tenants and zero distance pay nothing. With radius tiers the
/// first tier (by ascending radius) that covers the distance wins; a distance
/// beyond every tier is charged nothing.
pub fn calculate_travel_fee(distance: f64, settings: Option<&TravelSettings>) -> f64 {
    let Some(settings) = settings else {
        return 0.0;
    };
    if distance == 0.0 {
        return 0.0;
    }

    match settings.pricing_type {
        PricingType::RadiusTiers => select_tier(&settings.tiers, distance)
            .map(|tier| tier.price)
            .unwrap_or_else(|| {
                tracing::debug!("Distance {} exceeds all configured tiers", distance);
                0.0
            }),
        PricingType::PerMile => {
            settings.base_fee.unwrap_or(0.0) + distance * settings.rate_per_mile.unwrap_or(0.0)
        }
        PricingType::Flat => settings.base_fee.unwrap_or(0.0),
    }
}

fn select_tier(tiers: &[TravelTier], distance: f64) -> Option<TravelTier> {
    let mut sorted = tiers.to_vec();
    sorted.sort_by(|a, b| a.radius.total_cmp(&b.radius));
    sorted.into_iter().find(|tier| distance <= tier.radius)
}

impl TravelSettings {
    /// Lenient read of a stored document: anything unreadable means "unconfigured".
    pub fn from_stored(tenant_id: Uuid, raw: serde_json::Value) -> Option<Self> {
        if raw.is_null() {
            return None;
        }
        match serde_json::from_value(raw) {
            Ok(settings) => Some(settings),
            Err(e) => {
                tracing::warn!(
                    "Ignoring unreadable travel_settings for tenant {}: {}",
                    tenant_id,
                    e
                );
                None
            }
        }
    }

    /// Checks settings submitted by a tenant before they are stored.
    pub fn validate(&self) -> Result<(), AppError> {
        let check = |name: &str, value: Option<f64>| match value {
            Some(v) if !v.is_finite() || v < 0.0 => Err(AppError::BadRequest(format!(
                "{} must be a non-negative number",
                name
            ))),
            _ => Ok(()),
        };

        check("base_fee", self.base_fee)?;
        check("rate_per_mile", self.rate_per_mile)?;
        for tier in &self.tiers {
            check("tier radius", Some(tier.radius))?;
            check("tier price", Some(tier.price))?;
        }

        if self.pricing_type == PricingType::RadiusTiers && self.tiers.is_empty() {
            return Err(AppError::BadRequest(
                "radius_tiers pricing requires at least one tier".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ApplicationType;

    fn tiers(pairs: &[(f64, f64)]) -> TravelSettings {
        TravelSettings {
            pricing_type: PricingType::RadiusTiers,
            application_type: ApplicationType::Flat,
            tiers: pairs
                .iter()
                .map(|&(radius, price)| TravelTier { radius, price })
                .collect(),
            rate_per_mile: None,
            base_fee: None,
        }
    }

    #[test]
    fn test_no_settings_no_fee() {
        assert_eq!(calculate_travel_fee(30.0, None), 0.0);
    }

    #[test]
    fn test_zero_distance_no_fee() {
        let settings = TravelSettings {
            pricing_type: PricingType::Flat,
            application_type: ApplicationType::Flat,
            tiers: vec![],
            rate_per_mile: None,
            base_fee: Some(50.0),
        };
        assert_eq!(calculate_travel_fee(0.0, Some(&settings)), 0.0);
    }

    #[test]
    fn test_tiers_sorted_before_selection() {
        let settings = tiers(&[(50.0, 20.0), (10.0, 5.0)]);
        assert_eq!(calculate_travel_fee(30.0, Some(&settings)), 20.0);
        assert_eq!(calculate_travel_fee(10.0, Some(&settings)), 5.0);
        assert_eq!(calculate_travel_fee(3.0, Some(&settings)), 5.0);
    }

    #[test]
    fn test_beyond_last_tier_is_free() {
        let settings = tiers(&[(10.0, 5.0), (50.0, 20.0)]);
        assert_eq!(calculate_travel_fee(51.0, Some(&settings)), 0.0);
    }

    #[test]
    fn test_per_mile() {
        let settings = TravelSettings {
            pricing_type: PricingType::PerMile,
            application_type: ApplicationType::PerFootSurcharge,
            tiers: vec![],
            rate_per_mile: Some(2.0),
            base_fee: Some(10.0),
        };
        assert_eq!(calculate_travel_fee(5.0, Some(&settings)), 20.0);
    }

    #[test]
    fn test_per_mile_defaults_to_zero() {
        let settings = TravelSettings {
            pricing_type: PricingType::PerMile,
            application_type: ApplicationType::Flat,
            tiers: vec![],
            rate_per_mile: None,
            base_fee: None,
        };
        assert_eq!(calculate_travel_fee(120.0, Some(&settings)), 0.0);
    }

    #[test]
    fn test_validate_rejects_negative_amounts() {
        let mut settings = tiers(&[(10.0, -1.0)]);
        assert!(settings.validate().is_err());

        settings.tiers[0].price = 5.0;
        assert!(settings.validate().is_ok());

        settings.base_fee = Some(f64::NAN);
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_validate_requires_tiers() {
        assert!(tiers(&[]).validate().is_err());
    }

    #[test]
    fn test_from_stored_null_is_unconfigured() {
        assert!(TravelSettings::from_stored(Uuid::nil(), serde_json::Value::Null).is_none());
    }
}
