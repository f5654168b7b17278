use std::io::Write;

use axum::{http::StatusCode, routing::get, Router};
use tokio::net::TcpListener;

use super::*;

const EMPTY_SHA256: &str = "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";

async fn serve(router: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

#[test]
fn test_sha256_hex_of_empty_input() {
    assert_eq!(sha256_hex(b""), EMPTY_SHA256);
}

#[test]
fn test_parse_fingerprint_accepts_sha256sum_output() {
    let parsed = parse_fingerprint(b"abc123  example.csv\n").unwrap();

    assert_eq!(parsed.as_str(), "abc123");
}

#[test]
fn test_parse_fingerprint_rejects_blank_body() {
    assert_eq!(parse_fingerprint(b" \n"), None);
}

#[test]
fn test_from_location_prefers_url() {
    let source = MappingSource::from_location("mapping.csv", Some("http://host/map.csv".into()), false).unwrap();
    assert!(matches!(source, MappingSource::Url { ref address, .. } if address == "http://host/map.csv"));

    let source = MappingSource::from_location("mapping.csv", Some(String::new()), false).unwrap();
    assert!(matches!(source, MappingSource::File { .. }));
    assert_eq!(source.location(), "mapping.csv");
}

#[tokio::test]
async fn test_file_source_reads_content_and_hashes_it() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "repo;main;build").unwrap();
    let source = MappingSource::file(file.path());

    let content = source.fetch_content().await.unwrap();
    let fingerprint = source.fetch_fingerprint().await.unwrap();

    assert_eq!(content, b"repo;main;build\n");
    assert_eq!(fingerprint.as_str(), sha256_hex(b"repo;main;build\n"));
}

#[tokio::test]
async fn test_file_fingerprint_changes_with_content() {
    let file = tempfile::NamedTempFile::new().unwrap();
    std::fs::write(file.path(), "repo;main;a\n").unwrap();
    let source = MappingSource::file(file.path());
    let before = source.fetch_fingerprint().await.unwrap();

    std::fs::write(file.path(), "repo;main;b\n").unwrap();
    let after = source.fetch_fingerprint().await.unwrap();

    assert_ne!(before, after);
}

#[tokio::test]
async fn test_file_fingerprint_describes_the_bytes_read() {
    let file = tempfile::NamedTempFile::new().unwrap();
    std::fs::write(file.path(), "repo;main;a\n").unwrap();
    let source = MappingSource::file(file.path());
    let content = source.fetch_content().await.unwrap();

    std::fs::write(file.path(), "repo;main;b\n").unwrap();
    let fingerprint = source.content_fingerprint(&content).unwrap();

    assert_eq!(fingerprint.as_str(), sha256_hex(b"repo;main;a\n"));
    assert_ne!(fingerprint, source.fetch_fingerprint().await.unwrap());
}

#[test]
fn test_url_source_has_no_local_fingerprint() {
    let source = MappingSource::url("http://host/map.csv", false).unwrap();

    assert_eq!(source.content_fingerprint(b"repo;main;a\n"), None);
}

#[tokio::test]
async fn test_missing_file_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let source = MappingSource::file(dir.path().join("example-notexistent.csv"));

    let err = source.fetch_content().await.unwrap_err();

    assert!(matches!(err, SourceError::Io { .. }));
}

#[tokio::test]
async fn test_url_source_fetches_content_and_companion_fingerprint() {
    let base = serve(
        Router::new()
            .route("/example.csv", get(|| async { "repo;main;build\n" }))
            .route("/example.csv.sha256", get(|| async { "deadbeef  example.csv\n" })),
    )
    .await;
    let source = MappingSource::url(format!("{base}/example.csv"), false).unwrap();

    let content = source.fetch_content().await.unwrap();
    let fingerprint = source.fetch_fingerprint().await.unwrap();

    assert_eq!(content, b"repo;main;build\n");
    assert_eq!(fingerprint.as_str(), "deadbeef");
}

#[tokio::test]
async fn test_url_source_reports_non_success_status() {
    let base = serve(Router::new().route(
        "/example.csv",
        get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
    ))
    .await;
    let source = MappingSource::url(format!("{base}/example.csv"), false).unwrap();

    let content = source.fetch_content().await.unwrap_err();
    let fingerprint = source.fetch_fingerprint().await.unwrap_err();

    assert!(matches!(content, SourceError::Status { status: 500, .. }));
    // Unknown routes answer 404.
    assert!(matches!(fingerprint, SourceError::Status { status: 404, .. }));
}

#[tokio::test]
async fn test_url_source_rejects_empty_fingerprint() {
    let base = serve(
        Router::new()
            .route("/example.csv", get(|| async { "repo;main;build\n" }))
            .route("/example.csv.sha256", get(|| async { "" })),
    )
    .await;
    let source = MappingSource::url(format!("{base}/example.csv"), false).unwrap();

    let err = source.fetch_fingerprint().await.unwrap_err();

    assert!(matches!(err, SourceError::EmptyFingerprint { .. }));
}
