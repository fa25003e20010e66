use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_governor::{
    governor::GovernorConfigBuilder, key_extractor::SmartIpKeyExtractor, GovernorLayer,
};
use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::config::Config;
use crate::handlers::{self, AppState};
use crate::models::{
    CapturedLead, LeadAttributes, Priority, Qualification, QualifyRequest, QualifyResponse,
    ScoreBreakdown, Temperature, WidgetSubmission,
};

#[derive(OpenApi)]
#[openapi(
    info(title = "Lead Qualifier API", description = "Lead scoring and classification"),
    paths(handlers::health, handlers::qualify_leads, handlers::capture_lead),
    components(schemas(
        LeadAttributes,
        QualifyRequest,
        QualifyResponse,
        Qualification,
        ScoreBreakdown,
        Temperature,
        Priority,
        WidgetSubmission,
        CapturedLead
    ))
)]
pub struct ApiDoc;

/// Lead endpoints. Callers layer rate limiting and body limits on top.
pub fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/v1/leads/qualify", post(handlers::qualify_leads))
        .route("/api/v1/leads/capture", post(handlers::capture_lead))
}

/// Lead endpoints behind the request body limit and the per-IP rate limiter.
///
/// The limiter allows `rate_limit_burst` requests up front, then refills one
/// slot every `1000 / rate_limit_per_second` ms.
pub fn limited_api_routes(config: &Config) -> anyhow::Result<Router<Arc<AppState>>> {
    let governor_conf = Arc::new(
        GovernorConfigBuilder::default()
            .per_millisecond(config.replenish_interval_ms())
            .burst_size(config.rate_limit_burst)
            .key_extractor(SmartIpKeyExtractor)
            .finish()
            .ok_or_else(|| anyhow::anyhow!("Invalid rate limit configuration"))?,
    );

    Ok(api_routes().layer(
        ServiceBuilder::new()
            .layer(RequestBodyLimitLayer::new(config.max_body_bytes))
            .layer(GovernorLayer {
                config: governor_conf,
            }),
    ))
}

/// Full application: health check, the given API routes and the docs.
pub fn app(state: Arc<AppState>, api: Router<Arc<AppState>>) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .merge(api)
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        // The widget is embedded on customer sites
        .layer(CorsLayer::permissive())
}
