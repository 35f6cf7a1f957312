// =============================================================================
// PARTS CATALOG - Main Entry Point
// =============================================================================
// Loads configuration, installs logging and metrics, then serves the router.
// =============================================================================

use std::sync::Arc;

use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use parts_catalog::config::Config;
use parts_catalog::metrics::setup_metrics;
use parts_catalog::{router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env is optional
    dotenvy::dotenv().ok();

    // RUST_LOG controls log levels, e.g. RUST_LOG=info,parts_catalog=debug
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,parts_catalog=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    info!("Starting parts catalog...");

    let config = Config::from_env()?;
    match &config.upstream {
        Some(upstream) => info!(
            port = config.port,
            upstream = %upstream.base_url,
            api_key = upstream.api_key.is_some(),
            "Configuration loaded"
        ),
        None => warn!(
            port = config.port,
            "STOCK_API_BASE_URL is not set; listings will show sample data"
        ),
    }

    let metrics_handle = setup_metrics()?;
    info!("Prometheus metrics initialized");

    let port = config.port;
    let state = Arc::new(AppState::new(config, metrics_handle)?);
    let app = router(state);

    let addr = format!("0.0.0.0:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(address = %addr, "Parts catalog is listening");

    axum::serve(listener, app).await?;

    Ok(())
}
