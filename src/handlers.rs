// =============================================================================
// HANDLERS MODULE
// =============================================================================
// HTTP request handlers.
//
// Two families of routes with different failure policies:
// - listing routes (HTML pages, `/api/stock/item`) never fail because of the
//   upstream; they fall back to the sample records instead
// - passthrough routes (`/api/stock`, `/api/debug/stock`, `/api/stock/excel`)
//   and the lookup route return the upstream failure to the caller
// =============================================================================

use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    Json,
};
use chrono::Utc;

use crate::catalog;
use crate::error::{AppError, AppResult};
use crate::metrics;
use crate::models::*;
use crate::navigation;
use crate::render::{self, DetailView, ListingView};
use crate::sample::sample_items;
use crate::sheet;
use crate::upstream::{FetchedItems, UpstreamBody, UpstreamClient};
use crate::AppState;

const XLSX_CONTENT_TYPE: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

// =============================================================================
// HEALTH & METRICS
// =============================================================================

/// Liveness probe
///
/// GET /health
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        service: "parts-catalog".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        upstream_configured: state.upstream.is_some(),
    })
}

/// Prometheus metrics endpoint
///
/// GET /metrics
pub async fn metrics_handler(State(state): State<Arc<AppState>>) -> String {
    state.metrics_handle.render()
}

// =============================================================================
// SHARED LISTING LOGIC
// =============================================================================

/// Filtered, sorted records plus where they came from.
struct Listing {
    items: Vec<StockItem>,
    page_info: PageInfo,
    source: ListingSource,
}

/// Fetches from the upstream, or serves the sample records when there is no
/// upstream or the fetch fails. Filters and sort apply to both.
async fn load_listing(
    state: &AppState,
    query: &StockQuery,
    page: Option<u32>,
    size: u32,
    route: &'static str,
) -> Listing {
    let fetched = match state.upstream() {
        Ok(client) => client.fetch_items(size, page).await,
        Err(err) => Err(err),
    };

    let (FetchedItems { items, page_info }, source) = match fetched {
        Ok(fetched) => (fetched, ListingSource::Upstream),
        Err(err) => {
            tracing::warn!(route, error = %err, "Serving sample records");
            metrics::record_fallback(route);
            let items = sample_items();
            let page_info = catalog::page_info(page, size, items.len(), 0);
            (FetchedItems { items, page_info }, ListingSource::Sample)
        }
    };

    let items = catalog::apply(items, &query.criteria(), query.sort_mode());
    metrics::set_items_returned(route, items.len());

    Listing {
        items,
        page_info,
        source,
    }
}

fn canonical_url(state: &AppState, path_and_query: &str) -> Option<String> {
    state
        .config
        .site_origin
        .as_ref()
        .map(|origin| format!("{origin}{path_and_query}"))
}

// =============================================================================
// HTML PAGES
// =============================================================================

/// Listing page
///
/// GET /
/// GET /stock?brand=&model=&q=&hasPic=&minPrice=&maxPrice=&sort=&size=&page=
pub async fn listing_page(
    State(state): State<Arc<AppState>>,
    Query(query): Query<StockQuery>,
) -> Html<String> {
    let start = Instant::now();
    let page = query.page_request(PageRequest::LISTING);

    let listing = load_listing(&state, &query, Some(page.page), page.size, "/stock").await;

    let path = format!(
        "/stock?{}",
        render::query_string(
            query
                .link_params()
                .into_iter()
                .chain([("page", page.page.to_string())])
        )
    );
    let html = render::render_listing(&ListingView {
        items: &listing.items,
        query: &query,
        page,
        page_info: &listing.page_info,
        source: listing.source,
        canonical: canonical_url(&state, &path),
    });

    metrics::record_http_request("GET", "/stock", 200, start.elapsed().as_secs_f64());
    Html(html)
}

/// Detail page with prev/next links inside the same listing page
///
/// GET /stock/detail?key=&i=&page=&size=&...listing filters
pub async fn detail_page(
    State(state): State<Arc<AppState>>,
    Query(query): Query<DetailQuery>,
) -> Html<String> {
    let start = Instant::now();
    let listing_query = &query.listing;
    let page = listing_query.page_request(PageRequest::LISTING);

    let listing = load_listing(&state, listing_query, Some(page.page), page.size, "/stock/detail").await;

    let nav = query
        .key()
        .and_then(|key| navigation::locate(&listing.items, key, query.index_hint()));
    if nav.is_none() {
        tracing::info!(key = ?query.key(), "Detail key not found on page");
    }

    let canonical = query.key().and_then(|key| {
        canonical_url(
            &state,
            &format!("/stock/detail?{}", render::query_string([("key", key.to_string())])),
        )
    });
    let html = render::render_detail(&DetailView {
        nav,
        query: listing_query,
        page,
        source: listing.source,
        canonical,
    });

    metrics::record_http_request("GET", "/stock/detail", 200, start.elapsed().as_secs_f64());
    Html(html)
}

// =============================================================================
// JSON API
// =============================================================================

/// Normalized, filtered item list
///
/// GET /api/stock/item?brand=&model=&year=&num=&q=&hasPic=&minPrice=&maxPrice=&sort=&size=&page=
///
/// Without `page`, up to five upstream pages are searched.
pub async fn stock_items(
    State(state): State<Arc<AppState>>,
    Query(query): Query<StockQuery>,
) -> Json<StockListResponse> {
    let start = Instant::now();
    let size = query.page_request(PageRequest::LISTING).size;

    let listing = load_listing(&state, &query, query.explicit_page(), size, "/api/stock/item").await;

    metrics::record_http_request("GET", "/api/stock/item", 200, start.elapsed().as_secs_f64());
    Json(StockListResponse {
        items: listing.items,
        page_info: listing.page_info,
        source: listing.source,
        sort: query.sort_mode(),
        fetched_at: Utc::now(),
    })
}

fn passthrough_response(body: UpstreamBody) -> Response {
    match body {
        UpstreamBody::Json(value) => Json(value).into_response(),
        UpstreamBody::Text(text) => text.into_response(),
    }
}

async fn proxy_page(state: &AppState, query: &PageQuery, defaults: PageRequest) -> AppResult<Response> {
    let page = query.page_request(defaults);
    let body = state.upstream()?.fetch_page(page.size, page.page).await?;
    Ok(passthrough_response(body))
}

/// One upstream page, passed through untouched
///
/// GET /api/stock?size=&page=
pub async fn stock_passthrough(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PageQuery>,
) -> AppResult<Response> {
    let start = Instant::now();
    let result = proxy_page(&state, &query, PageRequest::LISTING).await;
    record_result("/api/stock", &result, start);
    result
}

/// Raw upstream page for diagnostics, small by default
///
/// GET /api/debug/stock?size=&page=
pub async fn debug_stock(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PageQuery>,
) -> AppResult<Response> {
    let start = Instant::now();
    let result = proxy_page(&state, &query, PageRequest::DEBUG).await;
    record_result("/api/debug/stock", &result, start);
    result
}

async fn excel_response(state: &AppState, page: PageRequest) -> AppResult<Response> {
    let bytes = state.upstream()?.fetch_excel(page.size, page.page).await?;
    let disposition = format!(r#"attachment; filename="stock_{}_{}.xlsx""#, page.size, page.page);
    Ok((
        [
            (header::CONTENT_TYPE, XLSX_CONTENT_TYPE.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    )
        .into_response())
}

/// Excel export passthrough
///
/// GET /api/stock/excel?size=&page=
pub async fn stock_excel(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PageQuery>,
) -> AppResult<Response> {
    let start = Instant::now();
    let result = excel_response(&state, query.page_request(PageRequest::LISTING)).await;
    record_result("/api/stock/excel", &result, start);
    result
}

async fn lookup(state: &AppState, query: LookupQuery) -> AppResult<Json<StockItem>> {
    // Cells are read trimmed, so the key is too
    let key = query
        .num
        .map(|key| key.trim().to_string())
        .filter(|key| !key.is_empty())
        .ok_or(AppError::MissingParameter("num"))?;

    let client: &UpstreamClient = state.upstream()?;
    let bytes = client
        .fetch_excel(state.config.lookup_sheet_size, 0)
        .await
        .map_err(AppError::into_gateway)?;
    let rows = sheet::parse_workbook(&bytes).map_err(AppError::into_gateway)?;

    tracing::debug!(rows = rows.len(), key = %key, "Searching Excel export");
    sheet::lookup_by_key(&rows, &key)
        .map(Json)
        .ok_or_else(|| AppError::NotFound(key))
}

/// Item lookup through the Excel export
///
/// GET /api/stock/lookup?num=JS0260
///
/// # Response
/// - 200 OK: the matching row as a stock item
/// - 400 Bad Request: `num` missing
/// - 404 Not Found: no row has that part number (exact, case-sensitive)
/// - 502 Bad Gateway: the export could not be fetched or read
pub async fn lookup_item(
    State(state): State<Arc<AppState>>,
    Query(query): Query<LookupQuery>,
) -> AppResult<Json<StockItem>> {
    let start = Instant::now();
    let result = lookup(&state, query).await;
    record_result("/api/stock/lookup", &result, start);
    result
}

fn record_result<T>(endpoint: &str, result: &AppResult<T>, start: Instant) {
    let status = match result {
        Ok(_) => StatusCode::OK.as_u16(),
        Err(AppError::UpstreamStatus { status, .. }) => *status,
        Err(AppError::NotFound(_)) => StatusCode::NOT_FOUND.as_u16(),
        Err(AppError::MissingParameter(_)) => StatusCode::BAD_REQUEST.as_u16(),
        Err(AppError::NotConfigured) => StatusCode::SERVICE_UNAVAILABLE.as_u16(),
        Err(_) => StatusCode::BAD_GATEWAY.as_u16(),
    };
    metrics::record_http_request("GET", endpoint, status, start.elapsed().as_secs_f64());
}
