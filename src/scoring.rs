//! Lead scoring and classification.
//!
//! A lead's score is the sum of six independent rules, clamped to [0, 100]:
//!
//! | Rule       | Points | Signal                                             |
//! |------------|--------|----------------------------------------------------|
//! | source     | 0-25   | acquisition channel weight                         |
//! | contact    | 0-20   | email and phone present                            |
//! | company    | 0-15   | company present, longer than 3 chars               |
//! | engagement | 0-20   | long message, campaign tag, pricing landing page   |
//! | timing     | 0-10   | business hours and weekday at evaluation time      |
//! | keywords   | 0-10   | buying-intent keywords in the message              |
//!
//! The timing rule reads the evaluation time, not the lead's creation time.
//! `score` uses the current local time; the `*_at` variants take the time
//! explicitly so re-scoring an old lead is reproducible.

use chrono::{DateTime, Datelike, FixedOffset, Local, Timelike};

use crate::models::{
    LeadAttributes, LeadSource, Priority, Qualification, ScoreBreakdown, Temperature,
};

/// Weight for missing or unrecognized sources.
pub const DEFAULT_SOURCE_WEIGHT: u8 = 10;

/// Buying-intent keywords, matched against the lower-cased message.
pub const INTENT_KEYWORDS: [&str; 8] = [
    "presupuesto",
    "cotización",
    "precio",
    "contratar",
    "urgente",
    "proyecto",
    "necesito",
    "cuando",
];

const URGENCY_KEYWORD: &str = "urgente";
const PRICING_PATH: &str = "/pricing";

const HOT_THRESHOLD: u8 = 80;
const WARM_THRESHOLD: u8 = 50;

/// Returns the channel weight for a source.
pub fn source_weight(source: Option<&LeadSource>) -> u8 {
    match source {
        Some(LeadSource::WebForm) => 25,
        Some(LeadSource::FacebookAds) => 20,
        Some(LeadSource::InstagramAds) => 20,
        Some(LeadSource::LinkedinOrganic) => 25,
        Some(LeadSource::GoogleAds) => 22,
        Some(LeadSource::Referral) => 25,
        Some(LeadSource::Whatsapp) => 18,
        Some(LeadSource::ColdOutreach) => 10,
        Some(LeadSource::Other(_)) | None => DEFAULT_SOURCE_WEIGHT,
    }
}

/// Non-empty value of an optional field.
fn present(field: &Option<String>) -> Option<&str> {
    field.as_deref().filter(|value| !value.is_empty())
}

fn contact_points(attrs: &LeadAttributes) -> u8 {
    let mut points = 0;
    if present(&attrs.email).is_some() {
        points += 10;
    }
    if present(&attrs.phone).is_some() {
        points += 10;
    }
    points
}

fn company_points(attrs: &LeadAttributes) -> u8 {
    match present(&attrs.company) {
        Some(company) if company.chars().count() > 3 => 15,
        Some(_) => 10,
        None => 0,
    }
}

fn engagement_points(attrs: &LeadAttributes) -> u8 {
    let mut points = 0;
    if present(&attrs.message).is_some_and(|message| message.chars().count() > 50) {
        points += 10;
    }
    if present(&attrs.utm_campaign).is_some() {
        points += 5;
    }
    if present(&attrs.page_url).is_some_and(|url| url.contains(PRICING_PATH)) {
        points += 5;
    }
    points
}

fn timing_points<T: Datelike + Timelike>(at: &T) -> u8 {
    let mut points = 0;
    if (9..=17).contains(&at.hour()) {
        points += 5;
    }
    // Monday = 1 .. Friday = 5
    if at.weekday().number_from_monday() <= 5 {
        points += 5;
    }
    points
}

/// Number of distinct intent keywords contained in the message.
///
/// Plain substring containment: "precios" counts as "precio", and a keyword
/// embedded in an unrelated word still matches.
pub fn keyword_matches(message: &str) -> usize {
    let lowered = message.to_lowercase();
    INTENT_KEYWORDS
        .iter()
        .filter(|keyword| lowered.contains(*keyword))
        .count()
}

fn keyword_points(attrs: &LeadAttributes) -> u8 {
    match present(&attrs.message) {
        Some(message) => (keyword_matches(message) * 2).min(10) as u8,
        None => 0,
    }
}

/// Per-rule contributions for `attrs` evaluated at `at`.
pub fn breakdown_at<T: Datelike + Timelike>(
    attrs: &LeadAttributes,
    at: &T,
) -> ScoreBreakdown {
    ScoreBreakdown {
        source: source_weight(attrs.source.as_ref()),
        contact: contact_points(attrs),
        company: company_points(attrs),
        engagement: engagement_points(attrs),
        timing: timing_points(at),
        keywords: keyword_points(attrs),
    }
}

/// Score in [0, 100] for `attrs` evaluated at `at`.
pub fn score_at<T: Datelike + Timelike>(attrs: &LeadAttributes, at: &T) -> u8 {
    breakdown_at(attrs, at).total()
}

/// Score in [0, 100] evaluated against the current local time.
pub fn score(attrs: &LeadAttributes) -> u8 {
    score_at(attrs, &Local::now())
}

/// Temperature for a score.
pub fn temperature(score: u8) -> Temperature {
    if score >= HOT_THRESHOLD {
        Temperature::Hot
    } else if score >= WARM_THRESHOLD {
        Temperature::Warm
    } else {
        Temperature::Cold
    }
}

/// Priority from an already computed score plus the categorical overrides.
///
/// Precedence, lowest to highest: temperature, referral, cold outreach,
/// an "urgente" message.
fn priority_for_score(attrs: &LeadAttributes, score: u8) -> Priority {
    let mut priority = match temperature(score) {
        Temperature::Hot => Priority::High,
        Temperature::Warm => Priority::Medium,
        Temperature::Cold => Priority::Low,
    };

    match attrs.source {
        Some(LeadSource::Referral) => priority = Priority::High,
        Some(LeadSource::ColdOutreach) => priority = Priority::Low,
        _ => {}
    }

    if present(&attrs.message)
        .is_some_and(|message| message.to_lowercase().contains(URGENCY_KEYWORD))
    {
        priority = Priority::High;
    }

    priority
}

/// Priority for `attrs`. Computes the score at the current local time when
/// none is supplied.
pub fn priority(attrs: &LeadAttributes, score: Option<u8>) -> Priority {
    let score = score.unwrap_or_else(|| self::score(attrs));
    priority_for_score(attrs, score)
}

/// Like [`priority`] but a missing score is computed at `at`.
pub fn priority_at<T: Datelike + Timelike>(
    attrs: &LeadAttributes,
    score: Option<u8>,
    at: &T,
) -> Priority {
    let score = score.unwrap_or_else(|| score_at(attrs, at));
    priority_for_score(attrs, score)
}

/// Score, temperature and priority in one pass against a single evaluation time.
pub fn qualify_at(attrs: &LeadAttributes, at: DateTime<FixedOffset>) -> Qualification {
    let breakdown = breakdown_at(attrs, &at);
    let score = breakdown.total();
    let qualification = Qualification {
        score,
        temperature: temperature(score),
        priority: priority_for_score(attrs, score),
        breakdown,
        evaluated_at: at,
    };

    tracing::debug!(
        score = qualification.score,
        temperature = ?qualification.temperature,
        priority = ?qualification.priority,
        source = attrs.source.as_ref().map(LeadSource::as_str).unwrap_or("none"),
        "Lead qualified"
    );

    qualification
}
