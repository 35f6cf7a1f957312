// =============================================================================
// CONFIGURATION MODULE
// =============================================================================
// Loads service configuration from environment variables.
//
// The upstream base URL is optional: without it the service runs in
// "sample mode" and the listing routes serve the built-in sample records.
// =============================================================================

use anyhow::{Context, Result};
use std::env;

/// Default number of rows requested when downloading the Excel export for
/// item lookups.
const DEFAULT_LOOKUP_SHEET_SIZE: u32 = 1000;

// -----------------------------------------------------------------------------
// CONFIG STRUCT
// -----------------------------------------------------------------------------
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port (default: 8080)
    pub port: u16,

    /// Upstream stock API settings; `None` when `STOCK_API_BASE_URL` is unset
    pub upstream: Option<UpstreamConfig>,

    /// Public origin of this site, e.g. `https://parts.example.com`.
    /// Used for canonical links in rendered pages.
    pub site_origin: Option<String>,

    /// Page size used when pulling the Excel export for lookups
    pub lookup_sheet_size: u32,
}

/// Everything the upstream client needs at construction time.
#[derive(Debug, Clone)]
pub struct UpstreamConfig {
    /// Listing endpoint, e.g. `https://api.example.com/stock`
    pub base_url: String,

    /// Sent verbatim as the `Authorization` header when present
    pub api_key: Option<String>,

    pub user_agent: String,
}

impl UpstreamConfig {
    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
            user_agent: default_user_agent(),
        }
    }
}

impl Config {
    // -------------------------------------------------------------------------
    // LOAD CONFIGURATION FROM ENVIRONMENT
    // -------------------------------------------------------------------------
    /// Creates a Config by reading environment variables.
    ///
    /// # Returns
    /// - `Ok(Config)` when every present variable parses
    /// - `Err` if `PORT` or `LOOKUP_SHEET_SIZE` is not a number
    pub fn from_env() -> Result<Self> {
        let port = env::var("PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse()
            .context("Failed to parse PORT as a number")?;

        let lookup_sheet_size = match non_empty_var("LOOKUP_SHEET_SIZE") {
            Some(raw) => raw
                .parse()
                .context("Failed to parse LOOKUP_SHEET_SIZE as a number")?,
            None => DEFAULT_LOOKUP_SHEET_SIZE,
        };

        let upstream = non_empty_var("STOCK_API_BASE_URL").map(|base_url| {
            let mut upstream = UpstreamConfig::new(base_url, non_empty_var("STOCK_API_KEY"));
            if let Some(agent) = non_empty_var("UPSTREAM_USER_AGENT") {
                upstream.user_agent = agent;
            }
            upstream
        });

        Ok(Self {
            port,
            upstream,
            site_origin: non_empty_var("SITE_ORIGIN")
                .map(|origin| origin.trim_end_matches('/').to_string()),
            lookup_sheet_size,
        })
    }
}

/// Reads an environment variable, treating blank values as unset.
fn non_empty_var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn default_user_agent() -> String {
    format!("parts-catalog/{}", env!("CARGO_PKG_VERSION"))
}
