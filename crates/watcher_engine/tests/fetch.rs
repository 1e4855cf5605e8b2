use std::time::Duration;

use watcher_engine::{FailureKind, FetchSettings, Fetcher, ReqwestFetcher, SearchQuery};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn settings_for(server: &MockServer) -> FetchSettings {
    FetchSettings {
        base_url: format!("{}/angebote", server.uri()),
        ..FetchSettings::default()
    }
}

#[tokio::test]
async fn fetcher_returns_body_for_search_page() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/angebote"))
        .and(query_param("q", "roomba 780"))
        .and(query_param("o", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>offers</html>"))
        .mount(&server)
        .await;

    let fetcher = ReqwestFetcher::new(settings_for(&server)).expect("client");
    let query = SearchQuery::new("roomba 780");

    let body = fetcher.fetch_page(&query, 2).await.expect("fetch ok");
    assert_eq!(body, "<html>offers</html>");
}

#[tokio::test]
async fn fetcher_passes_price_bounds_through() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/angebote"))
        .and(query_param("price", "50,300"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .mount(&server)
        .await;

    let fetcher = ReqwestFetcher::new(settings_for(&server)).expect("client");
    let query = SearchQuery {
        min_price: Some(50),
        max_price: Some(300),
        ..SearchQuery::new("velo")
    };

    fetcher.fetch_page(&query, 1).await.expect("fetch ok");
}

#[tokio::test]
async fn fetcher_fails_on_http_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/angebote"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let fetcher = ReqwestFetcher::new(settings_for(&server)).expect("client");
    let err = fetcher
        .fetch_page(&SearchQuery::new("roomba"), 1)
        .await
        .unwrap_err();
    assert_eq!(err.kind, FailureKind::HttpStatus(404));
}

#[tokio::test]
async fn fetcher_times_out_on_slow_response() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/angebote"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_delay(Duration::from_millis(250))
                .set_body_string("slow"),
        )
        .mount(&server)
        .await;

    let settings = FetchSettings {
        request_timeout: Duration::from_millis(50),
        ..settings_for(&server)
    };
    let fetcher = ReqwestFetcher::new(settings).expect("client");

    let err = fetcher
        .fetch_page(&SearchQuery::new("roomba"), 1)
        .await
        .unwrap_err();
    assert_eq!(err.kind, FailureKind::Timeout);
}

#[tokio::test]
async fn fetcher_rejects_unparsable_base_url() {
    let settings = FetchSettings {
        base_url: "not a url".to_string(),
        ..FetchSettings::default()
    };
    let fetcher = ReqwestFetcher::new(settings).expect("client");

    let err = fetcher
        .fetch_page(&SearchQuery::new("roomba"), 1)
        .await
        .unwrap_err();
    assert_eq!(err.kind, FailureKind::InvalidUrl);
}
