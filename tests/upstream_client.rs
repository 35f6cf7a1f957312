//! Integration tests for `UpstreamClient`.
//!
//! Each test stands up a `wiremock` server playing the stock API, so no real
//! network traffic is made.

use serde_json::json;
use wiremock::matchers::{header, header_exists, method, path, query_param};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

use parts_catalog::config::UpstreamConfig;
use parts_catalog::error::AppError;
use parts_catalog::upstream::{UpstreamBody, UpstreamClient, MAX_SEARCH_PAGES};

fn client_for(server: &MockServer, api_key: Option<&str>) -> UpstreamClient {
    let config = UpstreamConfig::new(format!("{}/stock", server.uri()), api_key.map(String::from));
    UpstreamClient::new(&config).expect("failed to build test UpstreamClient")
}

/// `count` listable records whose part numbers start at `first`.
fn records(first: usize, count: usize) -> serde_json::Value {
    let list: Vec<_> = (first..first + count)
        .map(|n| json!({"num": format!("P{n}"), "name": format!("Part {n}")}))
        .collect();
    json!({"data": {"content": list}})
}

async fn mount_page(server: &MockServer, page: u32, body: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path("/stock"))
        .and(query_param("page", page.to_string()))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .mount(server)
        .await;
}

// ---------------------------------------------------------------------------
// Single page
// ---------------------------------------------------------------------------

#[tokio::test]
async fn fetch_page_sends_size_page_and_api_key() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/stock"))
        .and(query_param("size", "7"))
        .and(query_param("page", "2"))
        .and(header("Authorization", "secret-key"))
        .and(header("Cache-Control", "no-cache"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&json!([{"num": "A"}])))
        .expect(1)
        .mount(&server)
        .await;

    let body = client_for(&server, Some("secret-key"))
        .fetch_page(7, 2)
        .await
        .expect("page fetched");

    assert_eq!(body, UpstreamBody::Json(json!([{"num": "A"}])));
}

#[tokio::test]
async fn fetch_page_omits_authorization_without_key() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/stock"))
        .and(header_exists("Authorization"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/stock"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&json!([])))
        .mount(&server)
        .await;

    let body = client_for(&server, None).fetch_page(20, 0).await;
    assert!(body.is_ok(), "expected Ok, got: {body:?}");

    let requests: Vec<Request> = server.received_requests().await.unwrap_or_default();
    assert!(requests.iter().all(|r| !r.headers.contains_key("authorization")));
}

#[tokio::test]
async fn non_json_body_is_returned_as_text() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/stock"))
        .respond_with(ResponseTemplate::new(200).set_body_string("maintenance window"))
        .mount(&server)
        .await;

    let body = client_for(&server, None).fetch_page(20, 0).await.expect("page fetched");
    assert_eq!(body, UpstreamBody::Text("maintenance window".into()));
}

#[tokio::test]
async fn non_success_status_carries_the_code() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/stock"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    let err = client_for(&server, None).fetch_page(20, 0).await.unwrap_err();
    assert!(
        matches!(err, AppError::UpstreamStatus { status: 403, .. }),
        "unexpected error: {err:?}"
    );
}

#[tokio::test]
async fn explicit_page_is_one_request() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/stock"))
        .and(query_param("page", "3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&records(0, 2)))
        .expect(1)
        .mount(&server)
        .await;

    let fetched = client_for(&server, None)
        .fetch_items(2, Some(3))
        .await
        .expect("items fetched");

    assert_eq!(fetched.items.len(), 2);
    assert_eq!(fetched.page_info.page, Some(3));
    assert_eq!(fetched.page_info.pages_fetched, 1);
    // Exactly `size` records: not flagged as last even if nothing follows
    assert!(!fetched.page_info.is_last_page_approx);
}

// ---------------------------------------------------------------------------
// Multi-page search
// ---------------------------------------------------------------------------

#[tokio::test]
async fn search_stops_at_first_short_page() {
    let server = MockServer::start().await;
    mount_page(&server, 0, records(0, 2)).await;
    mount_page(&server, 1, records(2, 1)).await;

    let fetched = client_for(&server, None)
        .fetch_items(2, None)
        .await
        .expect("items fetched");

    let nums: Vec<_> = fetched.items.iter().map(|item| item.num.as_str()).collect();
    assert_eq!(nums, ["P0", "P1", "P2"]);
    assert_eq!(fetched.page_info.page, None);
    assert_eq!(fetched.page_info.pages_fetched, 2);
    assert!(fetched.page_info.is_last_page_approx);

    let requests = server.received_requests().await.unwrap_or_default();
    assert_eq!(requests.len(), 2);
}

#[tokio::test]
async fn search_is_capped_at_five_pages() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/stock"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&records(0, 2)))
        .mount(&server)
        .await;

    let fetched = client_for(&server, None)
        .fetch_items(2, None)
        .await
        .expect("items fetched");

    assert_eq!(fetched.page_info.pages_fetched, MAX_SEARCH_PAGES);
    assert_eq!(fetched.items.len(), 2 * MAX_SEARCH_PAGES as usize);

    let requests = server.received_requests().await.unwrap_or_default();
    assert_eq!(requests.len(), MAX_SEARCH_PAGES as usize);
}

#[tokio::test]
async fn search_keeps_earlier_pages_when_a_later_page_fails() {
    let server = MockServer::start().await;
    mount_page(&server, 0, records(0, 2)).await;
    Mock::given(method("GET"))
        .and(path("/stock"))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let fetched = client_for(&server, None)
        .fetch_items(2, None)
        .await
        .expect("first page kept");

    assert_eq!(fetched.items.len(), 2);
    assert_eq!(fetched.page_info.pages_fetched, 1);
}

#[tokio::test]
async fn search_fails_when_the_first_page_fails() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/stock"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&server)
        .await;

    let err = client_for(&server, None).fetch_items(2, None).await.unwrap_err();
    assert!(matches!(err, AppError::UpstreamStatus { status: 502, .. }));
}

#[tokio::test]
async fn text_body_is_malformed_for_item_fetches() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/stock"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let err = client_for(&server, None).fetch_items(20, Some(0)).await.unwrap_err();
    assert!(matches!(err, AppError::UpstreamMalformed(_)));
}

// ---------------------------------------------------------------------------
// Excel export
// ---------------------------------------------------------------------------

#[tokio::test]
async fn fetch_excel_hits_the_excel_path() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/stock/excel"))
        .and(query_param("size", "1000"))
        .and(query_param("page", "0"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0x50, 0x4b, 0x03, 0x04]))
        .mount(&server)
        .await;

    let bytes = client_for(&server, None)
        .fetch_excel(1000, 0)
        .await
        .expect("excel fetched");
    assert_eq!(&bytes[..], &[0x50, 0x4b, 0x03, 0x04]);
}
