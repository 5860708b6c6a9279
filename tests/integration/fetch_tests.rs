//! Fetcher behaviour against a mock HTTP server

use flate2::write::GzEncoder;
use flate2::Compression;
use readengine::config::FetchConfig;
use readengine::fetch::{DecodeError, FetchError, Fetcher};
use std::io::Write;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{header, header_exists, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const PAGE: &str = "<html><head><title>Hello</title></head><body><p>Hello there</p></body></html>";

fn test_fetcher() -> Fetcher {
    let config = FetchConfig {
        user_agent: "ReadEngineTest/1.0".to_string(),
        ..FetchConfig::default()
    };
    Fetcher::new(&config).expect("Failed to build fetcher")
}

fn gzip(data: &[u8]) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

#[tokio::test]
async fn test_fetch_sends_browser_headers() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/article"))
        .and(header("user-agent", "ReadEngineTest/1.0"))
        .and(header("cache-control", "max-age=0"))
        .and(header("referer", base_url.as_str()))
        .and(header_exists("accept"))
        .and(header_exists("accept-encoding"))
        .and(header_exists("accept-language"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(PAGE)
                .insert_header("content-type", "text/html"),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let text = test_fetcher()
        .fetch(&format!("{}/article", base_url), &CancellationToken::new())
        .await
        .expect("fetch should succeed");

    assert_eq!(text, PAGE);
}

#[tokio::test]
async fn test_fetch_decodes_gzip() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/gz"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(gzip(PAGE.as_bytes()))
                .insert_header("content-encoding", "gzip")
                .insert_header("content-type", "text/html"),
        )
        .mount(&mock_server)
        .await;

    let text = test_fetcher()
        .fetch(&format!("{}/gz", mock_server.uri()), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(text, PAGE);
}

#[tokio::test]
async fn test_fetch_transcodes_gbk() {
    let mock_server = MockServer::start().await;

    let mut body = br#"<html><head><meta http-equiv="Content-Type" content="text/html; charset=GBK"><title>"#.to_vec();
    body.extend_from_slice(&[0xd6, 0xd0, 0xce, 0xc4]);
    body.extend_from_slice(b"</title></head><body></body></html>");

    Mock::given(method("GET"))
        .and(path("/gbk"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(body)
                .insert_header("content-type", "text/html"),
        )
        .mount(&mock_server)
        .await;

    let text = test_fetcher()
        .fetch(&format!("{}/gbk", mock_server.uri()), &CancellationToken::new())
        .await
        .unwrap();

    assert!(text.contains("<title>中文</title>"));
}

#[tokio::test]
async fn test_fetch_unsupported_charset() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/koi"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(r#"<html><head><meta charset="koi8-r"></head></html>"#),
        )
        .mount(&mock_server)
        .await;

    let err = test_fetcher()
        .fetch(&format!("{}/koi", mock_server.uri()), &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        FetchError::Decode(DecodeError::UnsupportedCharset(ref charset)) if charset == "koi8-r"
    ));
}

#[tokio::test]
async fn test_fetch_timeout() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(PAGE)
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&mock_server)
        .await;

    let fetcher = test_fetcher().with_timeout(Duration::from_millis(200));
    let err = fetcher
        .fetch(&format!("{}/slow", mock_server.uri()), &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(err.is_timeout(), "expected timeout, got {:?}", err);
}

#[tokio::test]
async fn test_fetch_cancelled() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
        .mount(&mock_server)
        .await;

    let cancel = CancellationToken::new();
    cancel.cancel();

    let err = test_fetcher()
        .fetch(&format!("{}/slow", mock_server.uri()), &cancel)
        .await
        .unwrap_err();

    assert!(matches!(err, FetchError::Cancelled { .. }));
}

#[tokio::test]
async fn test_fetch_status_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let err = test_fetcher()
        .fetch(&format!("{}/missing", mock_server.uri()), &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(err, FetchError::Status { status: 404, .. }));
}

#[tokio::test]
async fn test_fetch_rejects_non_http() {
    let err = test_fetcher()
        .fetch("ftp://example.com/file.html", &CancellationToken::new())
        .await
        .unwrap_err();
    assert!(matches!(err, FetchError::InvalidUrl { .. }));
}

#[tokio::test]
async fn test_image_exists() {
    let mock_server = MockServer::start().await;

    Mock::given(method("HEAD"))
        .and(path("/ok.png"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&mock_server)
        .await;

    let fetcher = test_fetcher();
    let timeout = Duration::from_secs(2);
    assert!(fetcher.image_exists(&format!("{}/ok.png", mock_server.uri()), timeout).await);
    assert!(!fetcher.image_exists(&format!("{}/gone.png", mock_server.uri()), timeout).await);
}
