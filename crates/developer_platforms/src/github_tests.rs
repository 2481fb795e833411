use super::*;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[test]
fn test_robots_file_url_trims_trailing_slash() {
    assert_eq!(
        robots_file_url("http://localhost:8080/", "acme", "widgets", "release/1.x"),
        "http://localhost:8080/acme/widgets/release/1.x/.github/GH-ROBOTS.txt"
    );
}

#[tokio::test]
async fn test_fetch_file_returns_body_on_ok() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/acme/widgets/main/.github/GH-ROBOTS.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_string("User-agent: *\nDisallow:\n"))
        .mount(&server)
        .await;

    let fetcher = HttpFileFetcher::new().unwrap();
    let url = robots_file_url(&server.uri(), "acme", "widgets", "main");
    let content = fetcher.fetch_file(&url).await.unwrap();

    assert_eq!(content.as_deref(), Some("User-agent: *\nDisallow:\n"));
}

#[tokio::test]
async fn test_fetch_file_returns_none_on_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let fetcher = HttpFileFetcher::new().unwrap();
    let content = fetcher
        .fetch_file(&format!("{}/missing.txt", server.uri()))
        .await
        .unwrap();

    assert!(content.is_none());
}

#[tokio::test]
async fn test_fetch_file_fails_on_other_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let fetcher = HttpFileFetcher::new().unwrap();
    let url = format!("{}/data.csv", server.uri());
    let result = fetcher.fetch_file(&url).await;

    match result {
        Err(Error::HttpStatus { url: failed, status }) => {
            assert_eq!(failed, url);
            assert_eq!(status, 503);
        }
        other => panic!("expected HTTP status error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_fetch_file_reports_timeouts() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
        .mount(&server)
        .await;

    let fetcher = HttpFileFetcher::with_timeout(Duration::from_millis(100)).unwrap();
    let result = fetcher.fetch_file(&format!("{}/slow", server.uri())).await;

    assert!(matches!(result, Err(Error::Timeout { .. })));
}
