use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;

// ============ Lead Models ============

/// Acquisition channel a lead arrived through.
///
/// Unknown channels are kept verbatim in `Other` so they round-trip back to
/// the caller untouched; they score with the default source weight.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum LeadSource {
    WebForm,
    FacebookAds,
    InstagramAds,
    LinkedinOrganic,
    GoogleAds,
    Referral,
    Whatsapp,
    ColdOutreach,
    Other(String),
}

impl LeadSource {
    /// Wire name of the channel (e.g. `"web-form"`).
    pub fn as_str(&self) -> &str {
        match self {
            LeadSource::WebForm => "web-form",
            LeadSource::FacebookAds => "facebook-ads",
            LeadSource::InstagramAds => "instagram-ads",
            LeadSource::LinkedinOrganic => "linkedin-organic",
            LeadSource::GoogleAds => "google-ads",
            LeadSource::Referral => "referral",
            LeadSource::Whatsapp => "whatsapp",
            LeadSource::ColdOutreach => "cold-outreach",
            LeadSource::Other(raw) => raw,
        }
    }
}

impl From<&str> for LeadSource {
    fn from(raw: &str) -> Self {
        match raw {
            "web-form" => LeadSource::WebForm,
            "facebook-ads" => LeadSource::FacebookAds,
            "instagram-ads" => LeadSource::InstagramAds,
            "linkedin-organic" => LeadSource::LinkedinOrganic,
            "google-ads" => LeadSource::GoogleAds,
            "referral" => LeadSource::Referral,
            "whatsapp" => LeadSource::Whatsapp,
            "cold-outreach" => LeadSource::ColdOutreach,
            other => LeadSource::Other(other.to_string()),
        }
    }
}

impl From<String> for LeadSource {
    fn from(raw: String) -> Self {
        LeadSource::from(raw.as_str())
    }
}

impl From<LeadSource> for String {
    fn from(source: LeadSource) -> Self {
        source.as_str().to_string()
    }
}

impl fmt::Display for LeadSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw lead/contact attributes as submitted by CRM forms or the widget.
///
/// Every field is optional. A field counts as present when it is a non-empty
/// string; absent fields simply contribute nothing to the score.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct LeadAttributes {
    /// Acquisition channel (`web-form`, `referral`, ... or any other string).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>, example = "web-form")]
    pub source: Option<LeadSource>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    /// Organization name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    /// Free text left by the lead.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Marketing campaign tag.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub utm_campaign: Option<String>,
    /// Landing page the lead came from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_url: Option<String>,
}

/// Coarse quality classification derived from the score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Temperature {
    Hot,
    Warm,
    Cold,
}

/// Actionability classification: temperature plus business overrides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
    Low,
}

/// Points awarded by each scoring rule.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ScoreBreakdown {
    /// Channel weight (0-25).
    pub source: u8,
    /// Email and phone completeness (0-20).
    pub contact: u8,
    /// Company signal (0-15).
    pub company: u8,
    /// Message length, campaign tag and pricing page (0-20).
    pub engagement: u8,
    /// Business hours and weekday at evaluation time (0-10).
    pub timing: u8,
    /// Buying-intent keywords in the message (0-10).
    pub keywords: u8,
}

impl ScoreBreakdown {
    /// Sum of all contributions clamped to [0, 100].
    pub fn total(&self) -> u8 {
        let sum = u16::from(self.source)
            + u16::from(self.contact)
            + u16::from(self.company)
            + u16::from(self.engagement)
            + u16::from(self.timing)
            + u16::from(self.keywords);
        sum.min(100) as u8
    }
}

/// Full result of qualifying one lead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Qualification {
    pub score: u8,
    pub temperature: Temperature,
    pub priority: Priority,
    pub breakdown: ScoreBreakdown,
    /// Moment the timing rule was evaluated against.
    #[schema(value_type = String, format = DateTime)]
    pub evaluated_at: DateTime<FixedOffset>,
}

// ============ Request/Response Models ============

/// One lead to qualify, optionally pinned to an evaluation time.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct QualifyRequest {
    #[serde(flatten)]
    pub lead: LeadAttributes,
    /// RFC 3339 timestamp; the service clock is used when absent.
    #[serde(default)]
    #[schema(value_type = Option<String>, format = DateTime)]
    pub evaluated_at: Option<DateTime<FixedOffset>>,
}

/// Qualify payload - can be a single object or an array
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum QualifyPayload {
    Single(QualifyRequest),
    Batch(Vec<QualifyRequest>),
}

impl QualifyPayload {
    /// Convert to a vec of requests for uniform processing
    pub fn into_requests(self) -> Vec<QualifyRequest> {
        match self {
            QualifyPayload::Single(request) => vec![request],
            QualifyPayload::Batch(requests) => requests,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct QualifyResponse {
    pub evaluated: usize,
    pub results: Vec<Qualification>,
}

/// Submission posted by the embeddable lead-capture widget.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct WidgetSubmission {
    #[serde(default)]
    pub name: Option<String>,
    /// Required; placeholder addresses are rejected.
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    /// Defaults to `web-form`.
    #[serde(default)]
    #[schema(value_type = Option<String>, example = "web-form")]
    pub source: Option<LeadSource>,
    #[serde(default)]
    pub utm_campaign: Option<String>,
    #[serde(default)]
    pub page_url: Option<String>,
}

/// Response for a captured widget lead.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CapturedLead {
    /// Correlation id for this submission.
    #[schema(value_type = String, example = "3f1c2a9e-8b7d-4e5f-9a0b-1c2d3e4f5a6b")]
    pub submission_id: uuid::Uuid,
    /// True when the same submission was already captured recently.
    pub duplicate: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Normalized attributes the score was computed from.
    pub lead: LeadAttributes,
    pub qualification: Qualification,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_sources_parse() {
        let attrs: LeadAttributes =
            serde_json::from_str(r#"{"source": "linkedin-organic"}"#).unwrap();
        assert_eq!(attrs.source, Some(LeadSource::LinkedinOrganic));
    }

    #[test]
    fn test_unknown_source_is_preserved() {
        let attrs: LeadAttributes =
            serde_json::from_str(r#"{"source": "tiktok-ads"}"#).unwrap();
        assert_eq!(
            attrs.source,
            Some(LeadSource::Other("tiktok-ads".to_string()))
        );

        let json = serde_json::to_value(&attrs).unwrap();
        assert_eq!(json["source"], "tiktok-ads");
    }

    #[test]
    fn test_parse_single_and_batch_payloads() {
        let single: QualifyPayload =
            serde_json::from_str(r#"{"email": "a@b.com"}"#).unwrap();
        assert_eq!(single.into_requests().len(), 1);

        let batch: QualifyPayload = serde_json::from_str(
            r#"[{"email": "a@b.com"}, {"source": "referral", "evaluated_at": "2025-01-06T10:00:00-06:00"}]"#,
        )
        .unwrap();
        let requests = batch.into_requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[1].lead.source, Some(LeadSource::Referral));
        assert!(requests[1].evaluated_at.is_some());
    }

    #[test]
    fn test_breakdown_total_clamps() {
        let breakdown = ScoreBreakdown {
            source: 25,
            contact: 20,
            company: 15,
            engagement: 20,
            timing: 10,
            keywords: 10,
        };
        assert_eq!(breakdown.total(), 100);
    }

    #[test]
    fn test_classifications_serialize_lowercase() {
        assert_eq!(serde_json::to_value(Temperature::Hot).unwrap(), "hot");
        assert_eq!(serde_json::to_value(Priority::Medium).unwrap(), "medium");
    }
}
