use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use rust_lead_qualifier::config::Config;
use rust_lead_qualifier::handlers::AppState;
use rust_lead_qualifier::routes;

/// Main entry point for the application.
///
/// Initializes tracing, loads configuration, builds the capture dedupe cache
/// and the HTTP routes with their middleware (body limit, rate limiting),
/// then starts the Axum server.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rust_lead_qualifier=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    tracing::info!("Configuration loaded successfully");

    let app_state = Arc::new(AppState::new(config.clone()));
    tracing::info!(
        "Capture dedupe cache initialized ({}s TTL, 10k capacity)",
        config.dedupe_ttl_secs
    );

    let api = routes::limited_api_routes(&config)?;
    tracing::info!(
        "Rate limit: {} req/s per IP, burst {}",
        config.rate_limit_per_second,
        config.rate_limit_burst
    );

    // Health check stays outside the rate limiter
    let app = routes::app(app_state, api);

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
