// =============================================================================
// PARTS CATALOG - Library Root
// =============================================================================
// Server-rendered catalog for an upstream auto-parts stock API.
//
// WHAT THIS SERVICE DOES:
// - Renders browsable, filterable listing and detail pages
// - Proxies upstream pages as JSON and the Excel export as a download
// - Looks single items up in the Excel export
// - Falls back to built-in sample records when the upstream is unusable
//
// The service keeps no state between requests: every page is built from the
// upstream response fetched for that request.
// =============================================================================

pub mod catalog;
pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod models;
pub mod navigation;
pub mod normalize;
pub mod render;
pub mod sample;
pub mod sheet;
pub mod upstream;

use std::sync::Arc;

use axum::{routing::get, Router};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::upstream::UpstreamClient;

// -----------------------------------------------------------------------------
// APPLICATION STATE
// -----------------------------------------------------------------------------
// Read-only after startup, shared by all handlers behind an Arc.
pub struct AppState {
    pub config: Config,

    /// `None` in sample mode (no upstream configured)
    pub upstream: Option<UpstreamClient>,

    /// Prometheus metrics handle
    pub metrics_handle: metrics_exporter_prometheus::PrometheusHandle,
}

impl AppState {
    /// Builds the state, constructing the upstream client when configured.
    pub fn new(
        config: Config,
        metrics_handle: metrics_exporter_prometheus::PrometheusHandle,
    ) -> AppResult<Self> {
        let upstream = config.upstream.as_ref().map(UpstreamClient::new).transpose()?;
        Ok(Self {
            config,
            upstream,
            metrics_handle,
        })
    }

    pub fn upstream(&self) -> AppResult<&UpstreamClient> {
        self.upstream.as_ref().ok_or(AppError::NotConfigured)
    }
}

// -----------------------------------------------------------------------------
// ROUTES
// -----------------------------------------------------------------------------
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        // ----- Health & Metrics -----
        .route("/health", get(handlers::health_check))
        .route("/metrics", get(handlers::metrics_handler))
        // ----- HTML pages -----
        .route("/", get(handlers::listing_page))
        .route("/stock", get(handlers::listing_page))
        .route("/stock/detail", get(handlers::detail_page))
        // ----- JSON / proxy API -----
        .route("/api/stock", get(handlers::stock_passthrough))
        .route("/api/stock/item", get(handlers::stock_items))
        .route("/api/stock/excel", get(handlers::stock_excel))
        .route("/api/stock/lookup", get(handlers::lookup_item))
        .route("/api/debug/stock", get(handlers::debug_stock))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
