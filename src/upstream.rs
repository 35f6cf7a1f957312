// =============================================================================
// UPSTREAM CLIENT MODULE
// =============================================================================
// The only way this service talks to the stock API.
//
// Requests are plain GETs with `size`/`page` query parameters and an optional
// `Authorization` header carrying the API key. There are no retries: one
// failed call produces exactly one error for the caller to handle.
// =============================================================================

use std::time::Instant;

use axum::body::Bytes;
use reqwest::{header, Client, RequestBuilder, Response};
use serde_json::Value;

use crate::catalog;
use crate::config::UpstreamConfig;
use crate::error::{AppError, AppResult};
use crate::metrics;
use crate::models::{PageInfo, StockItem};
use crate::normalize::{extract_list, normalize_list};

/// Upper bound on pages pulled by a search without an explicit page.
pub const MAX_SEARCH_PAGES: u32 = 5;

// -----------------------------------------------------------------------------
// RESPONSE TYPES
// -----------------------------------------------------------------------------

/// Body of a listing response: JSON when it parses, raw text otherwise.
#[derive(Debug, Clone, PartialEq)]
pub enum UpstreamBody {
    Json(Value),
    Text(String),
}

impl UpstreamBody {
    fn from_text(text: String) -> Self {
        match serde_json::from_str(&text) {
            Ok(value) => UpstreamBody::Json(value),
            Err(_) => UpstreamBody::Text(text),
        }
    }
}

/// Normalized records from one or more pages.
#[derive(Debug, Clone)]
pub struct FetchedItems {
    pub items: Vec<StockItem>,
    pub page_info: PageInfo,
}

// -----------------------------------------------------------------------------
// CLIENT
// -----------------------------------------------------------------------------
#[derive(Debug, Clone)]
pub struct UpstreamClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl UpstreamClient {
    /// Builds the client. No timeout is configured: a slow upstream holds
    /// the request until the caller gives up.
    ///
    /// # Errors
    /// Returns [`AppError::UpstreamUnavailable`] when the TLS backend cannot
    /// be initialised.
    pub fn new(config: &UpstreamConfig) -> AppResult<Self> {
        let client = Client::builder().user_agent(&config.user_agent).build()?;
        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            api_key: config.api_key.clone(),
        })
    }

    fn excel_url(&self) -> String {
        format!("{}/excel", self.base_url)
    }

    fn get(&self, url: &str, size: u32, page: u32) -> RequestBuilder {
        let request = self
            .client
            .get(url)
            .query(&[("size", size), ("page", page)])
            .header(header::CACHE_CONTROL, "no-cache");

        match &self.api_key {
            Some(key) => request.header(header::AUTHORIZATION, key),
            None => request,
        }
    }

    /// Sends the request and turns non-2xx statuses into errors.
    async fn send(&self, request: RequestBuilder, operation: &'static str) -> AppResult<Response> {
        let start = Instant::now();
        let result = request.send().await;
        let elapsed = start.elapsed().as_secs_f64();

        let response = match result {
            Ok(response) => response,
            Err(err) => {
                metrics::record_upstream_request(operation, "unavailable", elapsed);
                tracing::warn!(operation, error = %err, "Upstream request failed");
                return Err(AppError::UpstreamUnavailable(err));
            }
        };

        let status = response.status();
        if !status.is_success() {
            metrics::record_upstream_request(operation, "error_status", elapsed);
            tracing::warn!(operation, status = status.as_u16(), "Upstream returned an error status");
            return Err(AppError::UpstreamStatus {
                status: status.as_u16(),
                url: response.url().to_string(),
            });
        }

        metrics::record_upstream_request(operation, "ok", elapsed);
        tracing::debug!(operation, url = %response.url(), "Upstream request succeeded");
        Ok(response)
    }

    // -------------------------------------------------------------------------
    // RAW PAGE
    // -------------------------------------------------------------------------
    /// Fetches one listing page: `GET {base}?size=&page=`.
    ///
    /// The body is returned as JSON when it parses and as raw text
    /// otherwise; callers that need JSON decide what text means to them.
    pub async fn fetch_page(&self, size: u32, page: u32) -> AppResult<UpstreamBody> {
        let response = self.send(self.get(&self.base_url, size, page), "page").await?;
        let text = response.text().await?;
        Ok(UpstreamBody::from_text(text))
    }

    // -------------------------------------------------------------------------
    // EXCEL EXPORT
    // -------------------------------------------------------------------------
    /// Downloads the spreadsheet export: `GET {base}/excel?size=&page=`.
    pub async fn fetch_excel(&self, size: u32, page: u32) -> AppResult<Bytes> {
        let url = self.excel_url();
        let response = self.send(self.get(&url, size, page), "excel").await?;
        Ok(response.bytes().await?)
    }

    // -------------------------------------------------------------------------
    // NORMALIZED ITEMS
    // -------------------------------------------------------------------------
    /// Fetches one page and normalizes it. Returns the items and the raw
    /// record count (before incomplete records are dropped).
    async fn fetch_normalized(&self, size: u32, page: u32) -> AppResult<(Vec<StockItem>, usize)> {
        match self.fetch_page(size, page).await? {
            UpstreamBody::Json(value) => {
                let records = extract_list(&value);
                Ok((normalize_list(records), records.len()))
            }
            UpstreamBody::Text(_) => Err(AppError::UpstreamMalformed(format!(
                "page {page} of {} is not JSON",
                self.base_url
            ))),
        }
    }

    /// Fetches normalized items.
    ///
    /// With an explicit `page` this is a single call. Without one, pages
    /// `0..MAX_SEARCH_PAGES` are fetched one after another, stopping at the
    /// first short page. A failure on the first page is returned; a failure
    /// on a later page ends the loop with what was collected so far.
    pub async fn fetch_items(&self, size: u32, page: Option<u32>) -> AppResult<FetchedItems> {
        if let Some(page) = page {
            let (items, returned) = self.fetch_normalized(size, page).await?;
            return Ok(FetchedItems {
                items,
                page_info: catalog::page_info(Some(page), size, returned, 1),
            });
        }

        let mut items = Vec::new();
        let mut last_returned = 0;
        let mut pages_fetched = 0;

        for page in 0..MAX_SEARCH_PAGES {
            let (mut batch, returned) = match self.fetch_normalized(size, page).await {
                Ok(fetched) => fetched,
                Err(err) if page == 0 => return Err(err),
                Err(err) => {
                    tracing::warn!(page, error = %err, "Stopping multi-page fetch early");
                    break;
                }
            };

            items.append(&mut batch);
            last_returned = returned;
            pages_fetched += 1;

            if catalog::is_last_page(returned, size) {
                break;
            }
        }

        tracing::debug!(pages_fetched, count = items.len(), "Multi-page fetch finished");

        Ok(FetchedItems {
            items,
            page_info: catalog::page_info(None, size, last_returned, pages_fetched),
        })
    }
}
