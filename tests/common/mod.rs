//! In-memory `TenantStore` shared by the integration tests.
#![allow(dead_code)]

use async_trait::async_trait;
use chrono::Utc;
use railify_pricing::errors::AppError;
use railify_pricing::models::{Lead, PricingStyle, TenantProfile, TravelSettings};
use railify_pricing::store::{NewLead, TenantStore};
use railify_pricing::zip_distance::ZipDirectory;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

#[derive(Default)]
pub struct InMemoryStore {
    pub styles: Mutex<HashMap<Uuid, PricingStyle>>,
    pub profiles: Mutex<HashMap<Uuid, TenantProfile>>,
    pub leads: Mutex<Vec<Lead>>,
}

impl InMemoryStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn add_tenant(&self, profile: TenantProfile) -> Uuid {
        let id = profile.id;
        self.profiles.lock().unwrap().insert(id, profile);
        id
    }

    pub fn add_style(&self, tenant_id: Uuid, min: f64, max: f64) -> Uuid {
        let id = Uuid::new_v4();
        self.styles.lock().unwrap().insert(
            id,
            PricingStyle {
                id,
                tenant_id,
                price_per_ft_min: min,
                price_per_ft_max: max,
            },
        );
        id
    }

    pub fn profile(&self, tenant_id: Uuid) -> Option<TenantProfile> {
        self.profiles.lock().unwrap().get(&tenant_id).cloned()
    }
}

/// The 24-zip fixture table (real coordinates for major US city zips).
pub fn sample_zips() -> ZipDirectory {
    ZipDirectory::from_csv(include_str!("../fixtures/zipcodes_sample.csv")).unwrap()
}

pub fn tenant(address_zip: Option<&str>, settings: Option<TravelSettings>) -> TenantProfile {
    TenantProfile {
        id: Uuid::new_v4(),
        address_zip: address_zip.map(str::to_string),
        travel_settings: settings,
        ..Default::default()
    }
}

#[async_trait]
impl TenantStore for InMemoryStore {
    async fn find_style(&self, style_id: Uuid) -> Result<Option<PricingStyle>, AppError> {
        Ok(self.styles.lock().unwrap().get(&style_id).cloned())
    }

    async fn find_tenant_profile(
        &self,
        tenant_id: Uuid,
    ) -> Result<Option<TenantProfile>, AppError> {
        Ok(self.profile(tenant_id))
    }

    async fn update_travel_settings(
        &self,
        tenant_id: Uuid,
        settings: &TravelSettings,
    ) -> Result<bool, AppError> {
        let mut profiles = self.profiles.lock().unwrap();
        Ok(match profiles.get_mut(&tenant_id) {
            Some(p) => {
                p.travel_settings = Some(settings.clone());
                true
            }
            None => false,
        })
    }

    async fn link_subscription(
        &self,
        tenant_id: Uuid,
        customer_id: &str,
        subscription_id: &str,
        status: &str,
    ) -> Result<bool, AppError> {
        let mut profiles = self.profiles.lock().unwrap();
        Ok(match profiles.get_mut(&tenant_id) {
            Some(p) => {
                p.stripe_customer_id = Some(customer_id.to_string());
                p.stripe_subscription_id = Some(subscription_id.to_string());
                p.subscription_status = Some(status.to_string());
                true
            }
            None => false,
        })
    }

    async fn update_subscription_status(
        &self,
        subscription_id: &str,
        status: &str,
    ) -> Result<u64, AppError> {
        let mut count = 0;
        for p in self.profiles.lock().unwrap().values_mut() {
            if p.stripe_subscription_id.as_deref() == Some(subscription_id) {
                p.subscription_status = Some(status.to_string());
                count += 1;
            }
        }
        Ok(count)
    }

    async fn clear_subscription(
        &self,
        subscription_id: &str,
        status: &str,
    ) -> Result<u64, AppError> {
        let mut count = 0;
        for p in self.profiles.lock().unwrap().values_mut() {
            if p.stripe_subscription_id.as_deref() == Some(subscription_id) {
                p.stripe_subscription_id = None;
                p.subscription_status = Some(status.to_string());
                count += 1;
            }
        }
        Ok(count)
    }

    async fn insert_lead(&self, lead: NewLead) -> Result<Lead, AppError> {
        let stored = Lead {
            id: Uuid::new_v4(),
            tenant_id: lead.tenant_id,
            style_id: lead.style_id,
            name: lead.name,
            email: lead.email,
            phone: lead.phone,
            zip_code: lead.zip_code,
            linear_feet: lead.linear_feet,
            estimate_min: lead.estimate_min,
            estimate_max: lead.estimate_max,
            created_at: Utc::now(),
        };
        self.leads.lock().unwrap().push(stored.clone());
        Ok(stored)
    }
}
