use crate::errors::AppError;
use crate::estimate::EstimateService;
use crate::models::{EstimateResult, Lead, LeadRequest};
use crate::store::{NewLead, TenantStore};
use phonenumber::country::Id as CountryId;
use phonenumber::Mode;
use regex::Regex;
use std::sync::{Arc, OnceLock};

/// Validate email address
///
/// Checks for:
/// - Basic email format (contains @ and .)
/// - Placeholder patterns (repeated digits like 9999, 1111)
/// - Valid domain structure
pub fn is_valid_email(email: &str) -> bool {
    if email.len() < 5 || !email.contains('@') || !email.contains('.') {
        return false;
    }

    let fake_patterns = ["999999", "111111", "000000", "123456789"];
    for pattern in &fake_patterns {
        if email.contains(pattern) {
            tracing::warn!("Rejected email with placeholder pattern '{}'", pattern);
            return false;
        }
    }

    static EMAIL_REGEX: OnceLock<Regex> = OnceLock::new();
    let email_regex = EMAIL_REGEX.get_or_init(|| {
        Regex::new(
            r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)+$",
        )
        .unwrap()
    });

    email_regex.is_match(email)
}

/// Validate and normalize a North American phone number
///
/// Returns: (is_valid, normalized_phone_or_error_msg), where the normalized
/// form is E.164 (+12127365000).
pub fn validate_us_phone(raw: &str) -> (bool, String) {
    if raw.trim().is_empty() || raw.len() < 7 {
        return (false, "Phone too short".to_string());
    }

    match phonenumber::parse(Some(CountryId::US), raw) {
        Ok(number) => {
            if number.code().value() == 1 && phonenumber::is_valid(&number) {
                let formatted = number.format().mode(Mode::E164).to_string();
                tracing::debug!("Valid phone: {} -> {}", raw, formatted);
                (true, formatted)
            } else {
                (false, "Invalid US phone number".to_string())
            }
        }
        Err(e) => (false, format!("Parse error: {:?}", e)),
    }
}

/// Validates a widget submission, prices it when a style and footage are given,
/// and stores it as a lead. The style must belong to the lead's tenant.
pub async fn capture_lead(
    store: &Arc<dyn TenantStore>,
    estimates: &EstimateService,
    request: LeadRequest,
) -> Result<(Lead, Option<EstimateResult>), AppError> {
    let name = request.name.trim().to_string();
    if name.is_empty() {
        return Err(AppError::BadRequest("name is required".to_string()));
    }

    let email = request.email.trim().to_lowercase();
    if !is_valid_email(&email) {
        return Err(AppError::BadRequest("invalid email address".to_string()));
    }

    let phone = match request.phone.as_deref().map(str::trim) {
        Some(raw) if !raw.is_empty() => {
            let (valid, normalized) = validate_us_phone(raw);
            if !valid {
                return Err(AppError::BadRequest(format!("invalid phone: {}", normalized)));
            }
            Some(normalized)
        }
        _ => None,
    };

    if store.find_tenant_profile(request.tenant_id).await?.is_none() {
        return Err(AppError::NotFound("Tenant not found".to_string()));
    }

    let zip_code = request
        .zip_code
        .map(|z| z.trim().to_string())
        .filter(|z| !z.is_empty());

    // Styles are only quoted for the tenant that owns them.
    let style = match request.style_id {
        Some(style_id) => Some(
            store
                .find_style(style_id)
                .await?
                .filter(|s| s.tenant_id == request.tenant_id)
                .ok_or_else(|| AppError::NotFound("Style not found".to_string()))?,
        ),
        None => None,
    };

    let estimate = match (style.as_ref(), request.linear_feet) {
        (Some(style), Some(linear_feet)) => Some(
            estimates
                .quote_style(style, linear_feet, zip_code.as_deref())
                .await?,
        ),
        _ => None,
    };

    let lead = store
        .insert_lead(NewLead {
            tenant_id: request.tenant_id,
            style_id: request.style_id,
            name,
            email,
            phone,
            zip_code,
            linear_feet: request.linear_feet,
            estimate_min: estimate.as_ref().map(|e| e.min_price),
            estimate_max: estimate.as_ref().map(|e| e.max_price),
        })
        .await?;

    Ok((lead, estimate))
}
