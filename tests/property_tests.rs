/// Property-based tests using proptest
/// Tests invariants of the lead score that should hold for all inputs
use chrono::{NaiveDate, NaiveDateTime};
use proptest::prelude::*;
use rust_lead_qualifier::intake::is_valid_email;
use rust_lead_qualifier::models::{LeadAttributes, LeadSource, Temperature};
use rust_lead_qualifier::scoring::{breakdown_at, score_at, temperature};

fn source_strategy() -> impl Strategy<Value = Option<LeadSource>> {
    prop::option::of(prop_oneof![
        Just(LeadSource::WebForm),
        Just(LeadSource::FacebookAds),
        Just(LeadSource::InstagramAds),
        Just(LeadSource::LinkedinOrganic),
        Just(LeadSource::GoogleAds),
        Just(LeadSource::Referral),
        Just(LeadSource::Whatsapp),
        Just(LeadSource::ColdOutreach),
        "[a-z-]{0,12}".prop_map(LeadSource::from),
    ])
}

fn text() -> impl Strategy<Value = Option<String>> {
    prop::option::of("\\PC{0,80}")
}

fn attrs_strategy() -> impl Strategy<Value = LeadAttributes> {
    (source_strategy(), text(), text(), text(), text(), text(), text()).prop_map(
        |(source, email, phone, company, message, utm_campaign, page_url)| LeadAttributes {
            source,
            email,
            phone,
            company,
            message,
            utm_campaign,
            page_url,
        },
    )
}

/// Any minute of January 2025 (covers every weekday and hour).
fn time_strategy() -> impl Strategy<Value = NaiveDateTime> {
    (1u32..=31, 0u32..24, 0u32..60).prop_map(|(day, hour, minute)| {
        NaiveDate::from_ymd_opt(2025, 1, day)
            .unwrap()
            .and_hms_opt(hour, minute, 0)
            .unwrap()
    })
}

proptest! {
    #[test]
    fn score_is_always_within_bounds(attrs in attrs_strategy(), at in time_strategy()) {
        let score = score_at(&attrs, &at);
        prop_assert!(score <= 100);
        prop_assert_eq!(score, breakdown_at(&attrs, &at).total());
    }

    #[test]
    fn score_is_deterministic_for_fixed_time(attrs in attrs_strategy(), at in time_strategy()) {
        prop_assert_eq!(score_at(&attrs, &at), score_at(&attrs.clone(), &at));
    }

    #[test]
    fn empty_lead_scores_only_default_source_and_timing(at in time_strategy()) {
        let score = score_at(&LeadAttributes::default(), &at);
        prop_assert!([10, 15, 20].contains(&score));
    }

    #[test]
    fn adding_email_never_lowers_score(
        attrs in attrs_strategy(),
        email in "[a-z]{1,10}@[a-z]{1,10}\\.com",
        at in time_strategy()
    ) {
        let without = LeadAttributes { email: None, ..attrs.clone() };
        let with = LeadAttributes { email: Some(email), ..attrs };
        prop_assert!(score_at(&with, &at) >= score_at(&without, &at));
    }

    #[test]
    fn adding_any_field_never_lowers_score(
        attrs in attrs_strategy(),
        value in "\\PC{1,80}",
        field in 0usize..6,
        at in time_strategy()
    ) {
        let mut without = attrs.clone();
        let mut with = attrs;
        let (slot_without, slot_with) = match field {
            0 => (&mut without.email, &mut with.email),
            1 => (&mut without.phone, &mut with.phone),
            2 => (&mut without.company, &mut with.company),
            3 => (&mut without.message, &mut with.message),
            4 => (&mut without.utm_campaign, &mut with.utm_campaign),
            _ => (&mut without.page_url, &mut with.page_url),
        };
        *slot_without = None;
        *slot_with = Some(value);
        prop_assert!(score_at(&with, &at) >= score_at(&without, &at));
    }

    #[test]
    fn temperature_is_monotonic(a in 0u8..=100, b in 0u8..=100) {
        let rank = |t: Temperature| match t {
            Temperature::Cold => 0,
            Temperature::Warm => 1,
            Temperature::Hot => 2,
        };
        if a <= b {
            prop_assert!(rank(temperature(a)) <= rank(temperature(b)));
        }
    }

    #[test]
    fn email_validation_never_panics(email in "\\PC*") {
        let _ = is_valid_email(&email);
    }
}
