use chrono::{DateTime, FixedOffset, Local, Offset, Utc};
use phonenumber::country::Id as CountryId;

/// Clock the timing rule is evaluated against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoringClock {
    /// Server local time.
    Local,
    /// A fixed UTC offset, independent of where the service runs.
    Fixed(FixedOffset),
}

impl ScoringClock {
    /// Current time on this clock.
    pub fn now(&self) -> DateTime<FixedOffset> {
        match self {
            ScoringClock::Local => {
                let now = Local::now();
                now.with_timezone(now.offset())
            }
            ScoringClock::Fixed(offset) => Utc::now().with_timezone(offset),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub scoring_clock: ScoringClock,
    pub widget_api_key: Option<String>,
    pub default_phone_region: CountryId,
    pub dedupe_ttl_secs: u64,
    pub rate_limit_per_second: u64,
    pub rate_limit_burst: u32,
    pub max_body_bytes: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 3000,
            scoring_clock: ScoringClock::Local,
            widget_api_key: None,
            default_phone_region: CountryId::MX,
            dedupe_ttl_secs: 300,
            rate_limit_per_second: 10,
            rate_limit_burst: 20,
            max_body_bytes: 64 * 1024,
        }
    }
}

impl Config {
    /// Milliseconds between rate limiter refills, so that a steady client gets
    /// `rate_limit_per_second` requests through each second.
    pub fn replenish_interval_ms(&self) -> u64 {
        (1000 / self.rate_limit_per_second.max(1)).max(1)
    }

    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let defaults = Self::default();

        let config = Self {
            port: std::env::var("PORT")
                .unwrap_or_else(|_| defaults.port.to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number between 1-65535"))?,
            scoring_clock: match std::env::var("SCORING_UTC_OFFSET")
                .ok()
                .filter(|s| !s.trim().is_empty())
            {
                Some(raw) => ScoringClock::Fixed(parse_utc_offset(raw.trim())?),
                None => defaults.scoring_clock,
            },
            widget_api_key: std::env::var("WIDGET_API_KEY")
                .ok()
                .filter(|s| !s.trim().is_empty()),
            default_phone_region: match std::env::var("DEFAULT_PHONE_REGION")
                .ok()
                .filter(|s| !s.trim().is_empty())
            {
                Some(region) => region.trim().to_uppercase().parse().map_err(|_| {
                    anyhow::anyhow!(
                        "DEFAULT_PHONE_REGION must be an ISO 3166 country code, got '{}'",
                        region
                    )
                })?,
                None => defaults.default_phone_region,
            },
            dedupe_ttl_secs: parse_positive("DEDUPE_TTL_SECS", defaults.dedupe_ttl_secs)?,
            rate_limit_per_second: parse_positive(
                "RATE_LIMIT_PER_SECOND",
                defaults.rate_limit_per_second,
            )?,
            rate_limit_burst: parse_positive("RATE_LIMIT_BURST", defaults.rate_limit_burst)?,
            max_body_bytes: parse_positive("MAX_BODY_BYTES", defaults.max_body_bytes)?,
        };

        tracing::debug!("Server Port: {}", config.port);
        tracing::debug!("Scoring clock: {:?}", config.scoring_clock);
        tracing::debug!("Default phone region: {:?}", config.default_phone_region);
        if config.widget_api_key.is_none() {
            tracing::warn!(
                "WIDGET_API_KEY not set - lead capture endpoint accepts unsigned submissions"
            );
        }

        Ok(config)
    }
}

/// Reads a numeric env var that must be greater than zero.
fn parse_positive<T>(name: &str, default: T) -> anyhow::Result<T>
where
    T: std::str::FromStr + PartialOrd + Default,
{
    let Ok(raw) = std::env::var(name) else {
        return Ok(default);
    };

    match raw.trim().parse::<T>() {
        Ok(value) if value > T::default() => Ok(value),
        _ => anyhow::bail!("{} must be a positive number, got '{}'", name, raw),
    }
}

/// Parses `+HH:MM`, `-HH:MM` or `Z`/`UTC` into a fixed offset.
pub fn parse_utc_offset(raw: &str) -> anyhow::Result<FixedOffset> {
    if raw.eq_ignore_ascii_case("z") || raw.eq_ignore_ascii_case("utc") {
        return Ok(Utc.fix());
    }

    raw.parse::<FixedOffset>().map_err(|e| {
        anyhow::anyhow!(
            "SCORING_UTC_OFFSET must look like -06:00, got '{}': {}",
            raw,
            e
        )
    })
}
