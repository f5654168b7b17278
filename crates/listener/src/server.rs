//! HTTP routes and the serve loop.
//!
//! | Route | Purpose |
//! |-------|---------|
//! | `GET /` | plain trigger: 200 scheduled, 400 bad request, 404 no mapping |
//! | `POST /` | GitLab push webhook: 200 unless the body is malformed |
//! | `GET /health/live` | always 200 |
//! | `GET /health/ready` | 200 once a mapping is active, 503 before |

use std::future::Future;
use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Query, State},
    http::StatusCode,
    routing::get,
    Router,
};
use relay::TriggerRelay;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn};

use crate::requests::{parse_gitlab_push, parse_query};

#[derive(Clone)]
struct AppState {
    relay: Arc<TriggerRelay>,
}

/// Builds the router for `relay`.
pub fn router(relay: Arc<TriggerRelay>) -> Router {
    Router::new()
        .route("/", get(handle_plain_get).post(handle_webhook))
        .route("/health/live", get(|| async { StatusCode::OK }))
        .route("/health/ready", get(readiness))
        .layer(TraceLayer::new_for_http())
        .with_state(AppState { relay })
}

/// Serves `relay` on `listener` until `shutdown` completes.
///
/// In-flight requests are allowed to finish; pending triggers are not waited
/// for.
pub async fn serve<F>(listener: TcpListener, relay: Arc<TriggerRelay>, shutdown: F) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    if let Ok(addr) = listener.local_addr() {
        info!(%addr, "serving");
    }
    axum::serve(listener, router(relay))
        .with_graceful_shutdown(shutdown)
        .await
}

async fn handle_plain_get(
    State(state): State<AppState>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> StatusCode {
    let event = match parse_query(&pairs, state.relay.resolver().file_matching()) {
        Ok(event) => event,
        Err(e) => {
            warn!(error = %e, "aborting request handling");
            return StatusCode::BAD_REQUEST;
        }
    };

    match state.relay.handle_event(&event) {
        Ok(_) => StatusCode::OK,
        Err(_) => StatusCode::NOT_FOUND,
    }
}

async fn handle_webhook(State(state): State<AppState>, body: Bytes) -> StatusCode {
    let events = match parse_gitlab_push(&body, state.relay.resolver().file_matching()) {
        Ok(events) => events,
        Err(e) => {
            warn!(error = %e, "aborting request handling");
            return StatusCode::BAD_REQUEST;
        }
    };

    for event in &events {
        if let Err(e) = state.relay.handle_event(event) {
            debug!(repository = %event.repository, reason = %e, "webhook repository not mapped");
        }
    }
    StatusCode::OK
}

async fn readiness(State(state): State<AppState>) -> StatusCode {
    if state.relay.is_ready() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}

#[cfg(test)]
#[path = "server_tests.rs"]
mod tests;
