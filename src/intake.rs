/// Preparation of widget submissions before they are scored
///
/// Callers of the scoring core own business validation. For the embeddable
/// widget that means:
/// 1. Verify the widget key (when one is configured)
/// 2. Require a real email address
/// 3. Normalize the phone to E.164
/// 4. Fill the campaign tag from the landing page's UTM parameters
/// 5. Fingerprint the submission for duplicate detection
use crate::errors::AppError;
use crate::models::{LeadAttributes, LeadSource, WidgetSubmission};
use phonenumber::country::Id as CountryId;
use phonenumber::Mode;
use regex::Regex;
use sha2::{Digest, Sha256};
use std::sync::OnceLock;
use url::Url;

/// Validate email address
///
/// Checks for:
/// - Basic email format (contains @ and .)
/// - Fake/placeholder patterns (repeated digits like 9999, 1111)
/// - Minimum length requirements
pub fn is_valid_email(email: &str) -> bool {
    if email.len() < 5 || !email.contains('@') || !email.contains('.') {
        return false;
    }

    let fake_patterns = ["999999", "111111", "000000", "123456789"];

    for pattern in &fake_patterns {
        if email.contains(pattern) {
            tracing::warn!(
                "❌ Invalid email detected (fake pattern '{}'): {}",
                pattern,
                redact_email(email)
            );
            return false;
        }
    }

    static EMAIL_REGEX: OnceLock<Regex> = OnceLock::new();
    // RFC 5322 simplified: local@domain.tld
    let email_regex = EMAIL_REGEX.get_or_init(|| {
        Regex::new(
            r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$",
        )
        .expect("email regex is valid")
    });

    if !email_regex.is_match(email) {
        tracing::warn!("❌ Invalid email format: {}", redact_email(email));
        return false;
    }

    true
}

/// Email with the local part masked, for logs: `***@example.com`.
pub fn redact_email(email: &str) -> String {
    match email.rsplit_once('@') {
        Some((_, domain)) => format!("***@{}", domain),
        None => "***".to_string(),
    }
}

/// Normalize a phone number to E.164 using the given default region.
///
/// Numbers that fail to parse or validate are returned trimmed rather than
/// dropped: the lead still supplied a phone, and the CRM can follow up.
pub fn normalize_phone(raw: &str, region: CountryId) -> String {
    let trimmed = raw.trim();

    match phonenumber::parse(Some(region), trimmed) {
        Ok(number) if phonenumber::is_valid(&number) => {
            let formatted = number.format().mode(Mode::E164).to_string();
            tracing::debug!("✓ Phone normalized to E.164 for region {:?}", region);
            formatted
        }
        Ok(_) => {
            tracing::warn!("Phone not valid for region {:?}, keeping raw value", region);
            trimmed.to_string()
        }
        Err(e) => {
            tracing::warn!("Failed to parse phone: {:?}", e);
            trimmed.to_string()
        }
    }
}

/// `utm_campaign` query parameter of a landing page URL, if any.
pub fn extract_utm_campaign(page_url: &str) -> Option<String> {
    let url = Url::parse(page_url).ok()?;
    url.query_pairs()
        .find(|(key, value)| key == "utm_campaign" && !value.is_empty())
        .map(|(_, value)| value.into_owned())
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Validates a widget submission and maps it onto scoring attributes.
pub fn prepare_submission(
    submission: WidgetSubmission,
    region: CountryId,
) -> Result<LeadAttributes, AppError> {
    let email = non_empty(submission.email)
        .map(|e| e.to_lowercase())
        .ok_or_else(|| AppError::BadRequest("Email is required".to_string()))?;

    if !is_valid_email(&email) {
        return Err(AppError::BadRequest("Invalid email address".to_string()));
    }

    let page_url = non_empty(submission.page_url);
    let utm_campaign = non_empty(submission.utm_campaign)
        .or_else(|| page_url.as_deref().and_then(extract_utm_campaign));

    Ok(LeadAttributes {
        source: Some(submission.source.unwrap_or(LeadSource::WebForm)),
        email: Some(email),
        phone: non_empty(submission.phone).map(|p| normalize_phone(&p, region)),
        company: non_empty(submission.company),
        // the message is scored as typed
        message: submission.message.filter(|m| !m.is_empty()),
        utm_campaign,
        page_url,
    })
}

/// Stable SHA-256 key identifying a submission, so cache keys hold no raw PII.
///
/// Covers every scored attribute plus the contact name: two submissions share
/// a fingerprint only when they would produce the same captured lead.
pub fn fingerprint(attrs: &LeadAttributes, name: Option<&str>) -> String {
    let fields = [
        attrs.source.as_ref().map(LeadSource::as_str),
        attrs.email.as_deref(),
        attrs.phone.as_deref(),
        attrs.company.as_deref(),
        attrs.message.as_deref(),
        attrs.utm_campaign.as_deref(),
        attrs.page_url.as_deref(),
        name,
    ];

    let mut hasher = Sha256::new();
    for field in fields {
        // absent and empty are distinct
        match field {
            Some(value) => {
                hasher.update([0x01_u8]);
                hasher.update(value.as_bytes());
            }
            None => hasher.update([0x00_u8]),
        }
        hasher.update([0x1f_u8]);
    }
    hex::encode(hasher.finalize())
}

/// Checks the widget key header against the configured key.
///
/// No configured key means the endpoint is open.
pub fn verify_widget_key(
    expected: Option<&str>,
    provided: Option<&str>,
) -> Result<(), AppError> {
    let Some(expected) = expected else {
        return Ok(());
    };

    let provided = provided
        .ok_or_else(|| AppError::Unauthorized("Missing X-Widget-Key header".to_string()))?;

    if !constant_time_compare(provided, expected) {
        tracing::warn!("Invalid widget key received");
        return Err(AppError::Unauthorized("Invalid widget key".to_string()));
    }

    Ok(())
}

/// Constant-time string comparison
fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    a.as_bytes()
        .iter()
        .zip(b.as_bytes().iter())
        .fold(0u8, |acc, (x, y)| acc | (x ^ y))
        == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn submission(email: &str) -> WidgetSubmission {
        WidgetSubmission {
            email: Some(email.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_email_required() {
        let err = prepare_submission(WidgetSubmission::default(), CountryId::MX).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));

        let err = prepare_submission(submission("   "), CountryId::MX).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[test]
    fn test_fake_email_rejected() {
        let err = prepare_submission(submission("5599999999@gmail.com"), CountryId::MX);
        assert!(err.is_err());
    }

    #[test]
    fn test_email_is_normalized_and_source_defaults() {
        let attrs = prepare_submission(submission("  Ana@Empresa.MX "), CountryId::MX).unwrap();
        assert_eq!(attrs.email.as_deref(), Some("ana@empresa.mx"));
        assert_eq!(attrs.source, Some(LeadSource::WebForm));
    }

    #[test]
    fn test_explicit_source_is_kept() {
        let mut sub = submission("ana@empresa.mx");
        sub.source = Some(LeadSource::Whatsapp);
        let attrs = prepare_submission(sub, CountryId::MX).unwrap();
        assert_eq!(attrs.source, Some(LeadSource::Whatsapp));
    }

    #[test]
    fn test_utm_campaign_from_page_url() {
        let mut sub = submission("ana@empresa.mx");
        sub.page_url =
            Some("https://acme.mx/pricing?utm_source=fb&utm_campaign=black-friday".to_string());
        let attrs = prepare_submission(sub, CountryId::MX).unwrap();
        assert_eq!(attrs.utm_campaign.as_deref(), Some("black-friday"));
    }

    #[test]
    fn test_explicit_utm_campaign_wins() {
        let mut sub = submission("ana@empresa.mx");
        sub.utm_campaign = Some("spring".to_string());
        sub.page_url = Some("https://acme.mx/?utm_campaign=other".to_string());
        let attrs = prepare_submission(sub, CountryId::MX).unwrap();
        assert_eq!(attrs.utm_campaign.as_deref(), Some("spring"));
    }

    #[test]
    fn test_extract_utm_campaign_edge_cases() {
        assert_eq!(extract_utm_campaign("not a url"), None);
        assert_eq!(extract_utm_campaign("https://acme.mx/"), None);
        assert_eq!(extract_utm_campaign("https://acme.mx/?utm_campaign="), None);
    }

    #[test]
    fn test_unparsable_phone_is_kept() {
        assert_eq!(normalize_phone("  abc  ", CountryId::MX), "abc");
    }

    #[test]
    fn test_fingerprint_is_stable_and_distinguishes_fields() {
        let a = LeadAttributes {
            email: Some("a@b.com".to_string()),
            message: Some("hola".to_string()),
            ..Default::default()
        };
        let b = LeadAttributes {
            email: Some("a@b.com".to_string()),
            phone: Some("hola".to_string()),
            ..Default::default()
        };
        assert_eq!(fingerprint(&a, None), fingerprint(&a.clone(), None));
        assert_ne!(fingerprint(&a, None), fingerprint(&b, None));
        assert_eq!(fingerprint(&a, None).len(), 64);
    }

    #[test]
    fn test_fingerprint_covers_every_scored_field_and_name() {
        let base = LeadAttributes {
            source: Some(LeadSource::ColdOutreach),
            email: Some("ana@empresa.mx".to_string()),
            ..Default::default()
        };
        let key = fingerprint(&base, None);

        let variants = [
            LeadAttributes {
                source: Some(LeadSource::Referral),
                ..base.clone()
            },
            LeadAttributes {
                company: Some("Empresa SA".to_string()),
                ..base.clone()
            },
            LeadAttributes {
                utm_campaign: Some("spring".to_string()),
                ..base.clone()
            },
            LeadAttributes {
                message: Some(String::new()),
                ..base.clone()
            },
        ];
        for variant in &variants {
            assert_ne!(fingerprint(variant, None), key, "{:?}", variant);
        }
        assert_ne!(fingerprint(&base, Some("Ana")), key);
        assert_ne!(fingerprint(&base, Some("Ana")), fingerprint(&base, Some("Luis")));
    }

    #[test]
    fn test_redact_email_keeps_domain_only() {
        assert_eq!(redact_email("ana.lopez@empresa.mx"), "***@empresa.mx");
        assert_eq!(redact_email("not-an-email"), "***");
    }

    #[test]
    fn test_widget_key() {
        assert!(verify_widget_key(None, None).is_ok());
        assert!(verify_widget_key(Some("secret"), Some("secret")).is_ok());
        assert!(matches!(
            verify_widget_key(Some("secret"), None),
            Err(AppError::Unauthorized(_))
        ));
        assert!(matches!(
            verify_widget_key(Some("secret"), Some("secreT")),
            Err(AppError::Unauthorized(_))
        ));
    }
}
