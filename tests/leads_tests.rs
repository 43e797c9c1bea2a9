/// Lead capture workflow tests
mod common;

use common::{sample_zips, tenant, InMemoryStore};
use railify_pricing::errors::AppError;
use railify_pricing::estimate::EstimateService;
use railify_pricing::leads::capture_lead;
use railify_pricing::models::{ApplicationType, LeadRequest, PricingType, TravelSettings};
use railify_pricing::store::TenantStore;
use std::sync::Arc;
use uuid::Uuid;

fn setup() -> (Arc<InMemoryStore>, Arc<dyn TenantStore>, EstimateService) {
    let store = InMemoryStore::new();
    let dyn_store: Arc<dyn TenantStore> = store.clone();
    let estimates = EstimateService::new(dyn_store.clone(), Arc::new(sample_zips()));
    (store, dyn_store, estimates)
}

fn request(tenant_id: Uuid) -> LeadRequest {
    LeadRequest {
        tenant_id,
        name: "  Dana Smith ".to_string(),
        email: "Dana@Example.com".to_string(),
        phone: Some("(212) 736-5000".to_string()),
        zip_code: Some("10002".to_string()),
        style_id: None,
        linear_feet: None,
    }
}

#[tokio::test]
async fn test_lead_with_estimate() {
    let (store, dyn_store, estimates) = setup();
    let settings = TravelSettings {
        pricing_type: PricingType::Flat,
        application_type: ApplicationType::Flat,
        tiers: vec![],
        rate_per_mile: None,
        base_fee: Some(75.0),
    };
    let tenant_id = store.add_tenant(tenant(Some("10001"), Some(settings)));
    let style_id = store.add_style(tenant_id, 10.0, 15.0);

    let mut req = request(tenant_id);
    req.style_id = Some(style_id);
    req.linear_feet = Some(20.0);

    let (lead, estimate) = capture_lead(&dyn_store, &estimates, req).await.unwrap();
    let estimate = estimate.unwrap();

    assert_eq!(estimate.min_price, 275.0);
    assert_eq!(lead.estimate_min, Some(275.0));
    assert_eq!(lead.estimate_max, Some(375.0));
    assert_eq!(lead.name, "Dana Smith");
    assert_eq!(lead.email, "dana@example.com");
    assert_eq!(lead.phone.as_deref(), Some("+12127365000"));
    assert_eq!(store.leads.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_lead_without_style_has_no_estimate() {
    let (store, dyn_store, estimates) = setup();
    let tenant_id = store.add_tenant(tenant(None, None));

    let (lead, estimate) = capture_lead(&dyn_store, &estimates, request(tenant_id))
        .await
        .unwrap();

    assert!(estimate.is_none());
    assert!(lead.estimate_min.is_none());
}

#[tokio::test]
async fn test_invalid_contact_details_rejected() {
    let (store, dyn_store, estimates) = setup();
    let tenant_id = store.add_tenant(tenant(None, None));

    let mut bad_email = request(tenant_id);
    bad_email.email = "nope".to_string();
    assert!(matches!(
        capture_lead(&dyn_store, &estimates, bad_email).await,
        Err(AppError::BadRequest(_))
    ));

    let mut bad_phone = request(tenant_id);
    bad_phone.phone = Some("123".to_string());
    assert!(matches!(
        capture_lead(&dyn_store, &estimates, bad_phone).await,
        Err(AppError::BadRequest(_))
    ));

    assert!(store.leads.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_unknown_tenant_or_style() {
    let (store, dyn_store, estimates) = setup();

    let err = capture_lead(&dyn_store, &estimates, request(Uuid::new_v4()))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));

    let tenant_id = store.add_tenant(tenant(None, None));
    let mut req = request(tenant_id);
    req.style_id = Some(Uuid::new_v4());
    req.linear_feet = Some(10.0);
    let err = capture_lead(&dyn_store, &estimates, req).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
    assert!(store.leads.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_style_from_another_tenant_rejected() {
    let (store, dyn_store, estimates) = setup();
    let tenant_a = store.add_tenant(tenant(None, None));
    let tenant_b = store.add_tenant(tenant(None, None));
    let foreign_style = store.add_style(tenant_b, 99.0, 120.0);

    let mut req = request(tenant_a);
    req.style_id = Some(foreign_style);
    req.linear_feet = Some(10.0);
    let err = capture_lead(&dyn_store, &estimates, req).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));

    let mut without_feet = request(tenant_a);
    without_feet.style_id = Some(foreign_style);
    let err = capture_lead(&dyn_store, &estimates, without_feet)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));

    assert!(store.leads.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_style_without_footage_is_checked_and_kept() {
    let (store, dyn_store, estimates) = setup();
    let tenant_id = store.add_tenant(tenant(None, None));

    let mut unknown = request(tenant_id);
    unknown.style_id = Some(Uuid::new_v4());
    let err = capture_lead(&dyn_store, &estimates, unknown)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));

    let style_id = store.add_style(tenant_id, 10.0, 15.0);
    let mut req = request(tenant_id);
    req.style_id = Some(style_id);
    let (lead, estimate) = capture_lead(&dyn_store, &estimates, req).await.unwrap();

    assert!(estimate.is_none());
    assert_eq!(lead.style_id, Some(style_id));
    assert_eq!(store.leads.lock().unwrap().len(), 1);
}
