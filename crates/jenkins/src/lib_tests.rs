use std::sync::{Arc, Mutex};

use axum::{
    extract::{RawQuery, State},
    http::{HeaderMap, StatusCode, Uri},
    routing::post,
    Router,
};
use tokio::net::TcpListener;

use super::*;

#[derive(Debug, Clone)]
struct Seen {
    path: String,
    query: Option<String>,
    authorization: Option<String>,
}

type Log = Arc<Mutex<Vec<Seen>>>;

async fn record(
    State(log): State<Log>,
    uri: Uri,
    RawQuery(query): RawQuery,
    headers: HeaderMap,
) -> StatusCode {
    log.lock().unwrap().push(Seen {
        path: uri.path().to_string(),
        query,
        authorization: headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
    });
    if uri.path().contains("broken") {
        StatusCode::FORBIDDEN
    } else {
        StatusCode::CREATED
    }
}

async fn mock_server() -> (String, Log) {
    let log: Log = Arc::default();
    let router = Router::new()
        .route("/job/{job}/build", post(record))
        .route("/job/{folder}/job/{job}/build", post(record))
        .with_state(Arc::clone(&log));
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    (format!("http://{addr}"), log)
}

fn config(url: &str) -> JenkinsConfig {
    JenkinsConfig {
        url: url.to_string(),
        folder: None,
        user: None,
        token: "secret".to_string(),
        accept_invalid_certs: false,
    }
}

fn job(name: &str) -> JobId {
    JobId::new(name).unwrap()
}

#[test]
fn test_job_url_trims_trailing_slash() {
    let trigger = JenkinsTrigger::new(config("http://localhost:8081/")).unwrap();

    assert_eq!(trigger.job_url(&job("job1")), "http://localhost:8081/job/job1/build");
}

#[test]
fn test_job_url_includes_folder() {
    let trigger = JenkinsTrigger::new(JenkinsConfig {
        folder: Some("multi".to_string()),
        ..config("https://ci")
    })
    .unwrap();

    assert_eq!(trigger.project_url(), "https://ci/job/multi");
    assert_eq!(trigger.job_url(&job("app")), "https://ci/job/multi/job/app/build");
}

#[test]
fn test_missing_url_or_token_is_rejected() {
    assert!(matches!(JenkinsTrigger::new(config("")), Err(JenkinsError::MissingUrl)));
    assert!(matches!(
        JenkinsTrigger::new(JenkinsConfig {
            token: String::new(),
            ..config("https://ci")
        }),
        Err(JenkinsError::MissingToken)
    ));
}

#[tokio::test]
async fn test_fire_without_user_sends_token_query() {
    let (base, log) = mock_server().await;
    let trigger = JenkinsTrigger::new(config(&base)).unwrap();

    trigger.fire(&job("job1")).await.unwrap();

    let seen = log.lock().unwrap().clone();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].path, "/job/job1/build");
    assert_eq!(seen[0].query.as_deref(), Some("token=secret"));
    assert_eq!(seen[0].authorization, None);
}

#[tokio::test]
async fn test_fire_with_user_uses_basic_auth() {
    let (base, log) = mock_server().await;
    let trigger = JenkinsTrigger::new(JenkinsConfig {
        user: Some("ci".to_string()),
        folder: Some("multi".to_string()),
        ..config(&base)
    })
    .unwrap();

    trigger.fire(&job("job2")).await.unwrap();

    let seen = log.lock().unwrap().clone();
    assert_eq!(seen[0].path, "/job/multi/job/job2/build");
    assert_eq!(seen[0].query, None);
    // base64("ci:secret")
    assert_eq!(seen[0].authorization.as_deref(), Some("Basic Y2k6c2VjcmV0"));
}

#[tokio::test]
async fn test_fire_reports_non_success_status() {
    let (base, _) = mock_server().await;
    let trigger = JenkinsTrigger::new(config(&base)).unwrap();

    let err = trigger.fire(&job("broken")).await.unwrap_err();

    assert_eq!(
        err,
        TriggerError::Status {
            job: job("broken"),
            status: 403
        }
    );
}

#[tokio::test]
async fn test_fire_reports_unreachable_server() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    let trigger = JenkinsTrigger::new(config(&format!("http://{addr}"))).unwrap();

    let err = trigger.fire(&job("job1")).await.unwrap_err();

    assert!(matches!(err, TriggerError::Request { .. }));
}
