use crate::config::Config;
use crate::errors::{AppError, ResultExt};
use crate::intake;
use crate::models::*;
use crate::scoring;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use moka::future::Cache;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

/// Header carrying the widget's shared key.
pub const WIDGET_KEY_HEADER: &str = "X-Widget-Key";

/// Shared application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Config,
    /// Recently captured widget submissions, keyed by submission fingerprint.
    /// Repeats inside the TTL are answered from here instead of re-scoring.
    pub capture_cache: Cache<String, CapturedLead>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let capture_cache = Cache::builder()
            .time_to_live(Duration::from_secs(config.dedupe_ttl_secs))
            .max_capacity(10_000)
            .build();

        Self {
            config,
            capture_cache,
        }
    }
}

/// Health check endpoint.
///
/// Returns the service status and version.
#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Service is healthy"))
)]
pub async fn health() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::OK,
        Json(json!({
            "status": "healthy",
            "service": env!("CARGO_PKG_NAME"),
            "version": env!("CARGO_PKG_VERSION")
        })),
    )
}

/// POST /api/v1/leads/qualify
///
/// Scores one lead or an array of leads. Each lead may pin `evaluated_at`;
/// otherwise the service clock is read once for the whole request.
/// Never rejects a well-formed body: missing fields score zero.
#[utoipa::path(
    post,
    path = "/api/v1/leads/qualify",
    request_body(
        content = QualifyRequest,
        description = "A single lead or an array of leads"
    ),
    responses(
        (status = 200, description = "Leads qualified", body = QualifyResponse),
        (status = 400, description = "Body is not valid JSON for a lead")
    )
)]
pub async fn qualify_leads(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<QualifyPayload>, JsonRejection>,
) -> Result<Json<QualifyResponse>, AppError> {
    let Json(payload) = payload?;
    let requests = payload.into_requests();
    tracing::info!("POST /leads/qualify - {} lead(s)", requests.len());

    let now = state.config.scoring_clock.now();
    let results: Vec<Qualification> = requests
        .iter()
        .map(|request| scoring::qualify_at(&request.lead, request.evaluated_at.unwrap_or(now)))
        .collect();

    Ok(Json(QualifyResponse {
        evaluated: results.len(),
        results,
    }))
}

/// POST /api/v1/leads/capture
///
/// Entry point for the embeddable lead-capture widget.
///
/// Flow:
/// 1. Verify the widget key (if configured).
/// 2. Validate email and normalize phone / campaign tag.
/// 3. Deduplicate by submission fingerprint.
/// 4. Score against the service clock.
///
/// Returns 201 for a new submission, 200 with `duplicate: true` for a repeat.
#[utoipa::path(
    post,
    path = "/api/v1/leads/capture",
    request_body = WidgetSubmission,
    params(
        ("X-Widget-Key" = Option<String>, Header, description = "Widget key, required when configured")
    ),
    responses(
        (status = 201, description = "Lead captured and qualified", body = CapturedLead),
        (status = 200, description = "Duplicate submission, previous result returned", body = CapturedLead),
        (status = 400, description = "Missing or invalid email"),
        (status = 401, description = "Missing or invalid widget key")
    )
)]
pub async fn capture_lead(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    payload: Result<Json<WidgetSubmission>, JsonRejection>,
) -> Result<(StatusCode, Json<CapturedLead>), AppError> {
    let provided_key = headers
        .get(WIDGET_KEY_HEADER)
        .and_then(|v| v.to_str().ok());
    intake::verify_widget_key(state.config.widget_api_key.as_deref(), provided_key)?;

    let Json(submission) = payload?;
    let name = submission
        .name
        .as_ref()
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty());

    let lead = intake::prepare_submission(submission, state.config.default_phone_region)
        .context("Widget submission rejected")?;

    let key = intake::fingerprint(&lead, name.as_deref());
    let entry = state
        .capture_cache
        .entry(key)
        .or_insert_with(async {
            let qualification = scoring::qualify_at(&lead, state.config.scoring_clock.now());
            CapturedLead {
                submission_id: Uuid::new_v4(),
                duplicate: false,
                name,
                lead: lead.clone(),
                qualification,
            }
        })
        .await;

    if entry.is_fresh() {
        let captured = entry.into_value();
        tracing::info!(
            submission_id = %captured.submission_id,
            score = captured.qualification.score,
            temperature = ?captured.qualification.temperature,
            priority = ?captured.qualification.priority,
            "✅ Lead captured"
        );
        Ok((StatusCode::CREATED, Json(captured)))
    } else {
        let mut captured = entry.into_value();
        captured.duplicate = true;
        tracing::warn!(
            submission_id = %captured.submission_id,
            "⚠️  Duplicate widget submission"
        );
        Ok((StatusCode::OK, Json(captured)))
    }
}
