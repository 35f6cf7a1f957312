// =============================================================================
// MODELS MODULE
// =============================================================================
// Data structures shared by the catalog engine, the renderers and the API.
//
// Nothing here is persisted: every value is built from the upstream response
// of the current request and dropped once the response is written.
// =============================================================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// =============================================================================
// STOCK ITEM
// =============================================================================
// One normalized part record. `num` is the key within a fetched page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StockItem {
    /// Part number
    pub num: String,

    /// Product name
    pub product: String,

    /// OE (original equipment) reference code
    pub oe: String,

    /// Vehicle make
    pub brand: String,

    /// Vehicle model code
    pub model: String,

    /// The upstream has no year field; kept so year filters have a target
    pub year: String,

    /// First picture URL, or empty
    pub image: String,

    /// Raw price text as sent by the upstream ("" when absent)
    pub price: String,

    /// Every picture URL, in upstream order
    #[serde(default)]
    pub images: Vec<String>,
}

impl StockItem {
    /// Parsed price, `None` when missing or not a finite number.
    ///
    /// # Example
    /// ```
    /// # use parts_catalog::models::StockItem;
    /// let item = StockItem { price: " 12.50 ".into(), ..Default::default() };
    /// assert_eq!(item.price_value(), Some(12.5));
    /// ```
    pub fn price_value(&self) -> Option<f64> {
        self.price
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|value| value.is_finite())
    }

    pub fn has_image(&self) -> bool {
        !self.image.is_empty()
    }

    /// Listings only show records carrying both a key and a name.
    pub fn is_listable(&self) -> bool {
        !self.num.is_empty() && !self.product.is_empty()
    }
}

// =============================================================================
// FILTERS & SORTING
// =============================================================================

/// Conjunctive filter set. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterCriteria {
    pub brand: Option<String>,
    pub model: Option<String>,
    pub year: Option<String>,
    pub num: Option<String>,

    /// Substring searched in product, num and OE
    pub q: Option<String>,

    pub has_pic: bool,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
}

impl FilterCriteria {
    pub fn has_price_bounds(&self) -> bool {
        self.min_price.is_some() || self.max_price.is_some()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SortMode {
    /// Upstream order
    #[default]
    Default,
    PriceAsc,
    PriceDesc,
    NameAsc,
}

impl SortMode {
    /// Parses a `sort` query value; anything unrecognised keeps upstream order.
    pub fn from_param(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            Some("price_asc") => SortMode::PriceAsc,
            Some("price_desc") => SortMode::PriceDesc,
            Some("name_asc") => SortMode::NameAsc,
            _ => SortMode::Default,
        }
    }

    pub fn as_param(self) -> &'static str {
        match self {
            SortMode::Default => "default",
            SortMode::PriceAsc => "price_asc",
            SortMode::PriceDesc => "price_desc",
            SortMode::NameAsc => "name_asc",
        }
    }
}

// =============================================================================
// PAGINATION
// =============================================================================

/// Largest page size we forward upstream
pub const MAX_PAGE_SIZE: u32 = 200;

/// Page window requested from the upstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub size: u32,
    pub page: u32,
}

impl PageRequest {
    pub const LISTING: PageRequest = PageRequest { size: 20, page: 0 };
    pub const DEBUG: PageRequest = PageRequest { size: 5, page: 0 };

    /// Builds a request from raw query values, falling back to `defaults`
    /// for anything missing or unparseable.
    pub fn from_params(size: Option<&str>, page: Option<&str>, defaults: PageRequest) -> Self {
        let size = size
            .and_then(|raw| raw.trim().parse::<u32>().ok())
            .filter(|size| *size > 0)
            .unwrap_or(defaults.size)
            .min(MAX_PAGE_SIZE);
        let page = page
            .and_then(|raw| raw.trim().parse::<u32>().ok())
            .unwrap_or(defaults.page);
        Self { size, page }
    }
}

/// Pagination metadata for a listing.
///
/// The upstream never reports totals, so the last-page flag is only a guess
/// made from the size of the last fetched page.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PageInfo {
    /// Requested page; `None` for a multi-page search
    pub page: Option<u32>,
    pub size: u32,

    /// Raw records returned by the last fetched page, before filtering
    pub returned: usize,

    pub pages_fetched: u32,

    /// True when the last fetched page came back short
    pub is_last_page_approx: bool,
}

// =============================================================================
// API REQUEST STRUCTURES
// =============================================================================

/// Listing query string, shared by the HTML pages and `GET /api/stock/item`.
///
/// Every value arrives as text: HTML forms submit empty strings for untouched
/// inputs, so parsing is lenient and blanks count as "not set".
///
/// # Example
/// `GET /stock?brand=Toyota&q=filter&hasPic=1&minPrice=10&sort=price_asc&page=2`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StockQuery {
    pub brand: Option<String>,
    pub model: Option<String>,
    pub year: Option<String>,
    pub num: Option<String>,
    pub q: Option<String>,
    #[serde(rename = "hasPic")]
    pub has_pic: Option<String>,
    #[serde(rename = "minPrice")]
    pub min_price: Option<String>,
    #[serde(rename = "maxPrice")]
    pub max_price: Option<String>,
    pub sort: Option<String>,
    pub size: Option<String>,
    pub page: Option<String>,
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|value| !value.is_empty())
}

impl StockQuery {
    pub fn criteria(&self) -> FilterCriteria {
        let owned = |value: &Option<String>| non_blank(value).map(str::to_string);
        let price = |value: &Option<String>| {
            non_blank(value)
                .and_then(|raw| raw.parse::<f64>().ok())
                .filter(|bound| bound.is_finite())
        };

        FilterCriteria {
            brand: owned(&self.brand),
            model: owned(&self.model),
            year: owned(&self.year),
            num: owned(&self.num),
            q: owned(&self.q),
            has_pic: matches!(non_blank(&self.has_pic), Some("1" | "true" | "on" | "yes")),
            min_price: price(&self.min_price),
            max_price: price(&self.max_price),
        }
    }

    pub fn sort_mode(&self) -> SortMode {
        SortMode::from_param(non_blank(&self.sort))
    }

    pub fn page_request(&self, defaults: PageRequest) -> PageRequest {
        PageRequest::from_params(non_blank(&self.size), non_blank(&self.page), defaults)
    }

    /// The page, only when the caller asked for one.
    pub fn explicit_page(&self) -> Option<u32> {
        non_blank(&self.page).and_then(|raw| raw.parse().ok())
    }

    /// Non-blank parameters in a fixed order, minus `page`. Used to build
    /// links that keep the current filters.
    pub fn link_params(&self) -> Vec<(&'static str, String)> {
        [
            ("brand", &self.brand),
            ("model", &self.model),
            ("year", &self.year),
            ("num", &self.num),
            ("q", &self.q),
            ("hasPic", &self.has_pic),
            ("minPrice", &self.min_price),
            ("maxPrice", &self.max_price),
            ("sort", &self.sort),
            ("size", &self.size),
        ]
        .into_iter()
        .filter_map(|(name, value)| non_blank(value).map(|value| (name, value.to_string())))
        .collect()
    }
}

/// Query string of the HTML detail page: the listing query that produced the
/// page plus the item key and its position hint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DetailQuery {
    pub key: Option<String>,
    pub i: Option<String>,
    #[serde(flatten)]
    pub listing: StockQuery,
}

impl DetailQuery {
    pub fn key(&self) -> Option<&str> {
        non_blank(&self.key)
    }

    pub fn index_hint(&self) -> Option<usize> {
        non_blank(&self.i).and_then(|raw| raw.parse().ok())
    }
}

/// `GET /api/stock/lookup?num=`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LookupQuery {
    pub num: Option<String>,
}

/// `size`/`page` pair for the passthrough routes.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageQuery {
    pub size: Option<String>,
    pub page: Option<String>,
}

impl PageQuery {
    pub fn page_request(&self, defaults: PageRequest) -> PageRequest {
        PageRequest::from_params(non_blank(&self.size), non_blank(&self.page), defaults)
    }
}

// =============================================================================
// API RESPONSES
// =============================================================================

/// Where a listing's records came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ListingSource {
    Upstream,
    Sample,
}

/// Response body of `GET /api/stock/item`
#[derive(Debug, Clone, Serialize)]
pub struct StockListResponse {
    pub items: Vec<StockItem>,
    pub page_info: PageInfo,
    pub source: ListingSource,
    pub sort: SortMode,
    pub fetched_at: DateTime<Utc>,
}

/// Simple health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,

    /// Whether an upstream base URL is configured
    pub upstream_configured: bool,
}

// =============================================================================
// ERROR RESPONSES
// =============================================================================

/// API error response body
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error type/code
    pub error: String,

    /// Human-readable error message
    pub message: String,

    /// HTTP status: the upstream's own status when it sent one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
            status: None,
        }
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn price_value_rejects_garbage_and_non_finite() {
        let mut item = StockItem::default();
        assert_eq!(item.price_value(), None);

        item.price = "bad".into();
        assert_eq!(item.price_value(), None);

        item.price = "NaN".into();
        assert_eq!(item.price_value(), None);

        item.price = "inf".into();
        assert_eq!(item.price_value(), None);

        item.price = "100".into();
        assert_eq!(item.price_value(), Some(100.0));
    }

    #[test]
    fn listable_requires_num_and_product() {
        let both = StockItem { num: "A1".into(), product: "Filter".into(), ..Default::default() };
        let no_name = StockItem { num: "A1".into(), ..Default::default() };
        let no_num = StockItem { product: "Filter".into(), ..Default::default() };

        assert!(both.is_listable());
        assert!(!no_name.is_listable());
        assert!(!no_num.is_listable());
    }

    #[test]
    fn sort_mode_unknown_values_keep_upstream_order() {
        assert_eq!(SortMode::from_param(Some("price_asc")), SortMode::PriceAsc);
        assert_eq!(SortMode::from_param(Some("price_desc")), SortMode::PriceDesc);
        assert_eq!(SortMode::from_param(Some("name_asc")), SortMode::NameAsc);
        assert_eq!(SortMode::from_param(Some("random")), SortMode::Default);
        assert_eq!(SortMode::from_param(None), SortMode::Default);
    }

    #[test]
    fn page_request_defaults_and_clamps() {
        let listing = PageRequest::from_params(None, None, PageRequest::LISTING);
        assert_eq!(listing, PageRequest { size: 20, page: 0 });

        let debug = PageRequest::from_params(Some(""), Some("x"), PageRequest::DEBUG);
        assert_eq!(debug, PageRequest { size: 5, page: 0 });

        let zero = PageRequest::from_params(Some("0"), Some("3"), PageRequest::LISTING);
        assert_eq!(zero, PageRequest { size: 20, page: 3 });

        let huge = PageRequest::from_params(Some("5000"), None, PageRequest::LISTING);
        assert_eq!(huge.size, MAX_PAGE_SIZE);
    }

    #[test]
    fn stock_query_treats_blanks_as_unset() {
        let query = StockQuery {
            brand: Some("  ".into()),
            q: Some(" filter ".into()),
            has_pic: Some("on".into()),
            min_price: Some("".into()),
            max_price: Some("abc".into()),
            sort: Some("price_desc".into()),
            ..Default::default()
        };

        let criteria = query.criteria();
        assert_eq!(criteria.brand, None);
        assert_eq!(criteria.q.as_deref(), Some("filter"));
        assert!(criteria.has_pic);
        assert!(!criteria.has_price_bounds());
        assert_eq!(query.sort_mode(), SortMode::PriceDesc);
        assert_eq!(query.explicit_page(), None);
    }

    #[test]
    fn link_params_keep_filters_but_not_page() {
        let query = StockQuery {
            brand: Some("Toyota".into()),
            model: Some("".into()),
            size: Some("10".into()),
            page: Some("3".into()),
            ..Default::default()
        };
        assert_eq!(
            query.link_params(),
            vec![("brand", "Toyota".to_string()), ("size", "10".to_string())]
        );
        assert_eq!(query.explicit_page(), Some(3));
    }
}
