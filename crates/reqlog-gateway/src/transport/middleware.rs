//! Request recording middleware.
//!
//! Responsibilities:
//! - Capture method, URI, body size, client IP and user agent on entry
//! - Append the initial record before the handler runs
//! - Hand the handler a per-request `QueryTally` (request extension)
//! - Patch the query count once the response is built, off the request path
//!
//! The middleware never changes the response: append and patch failures are
//! logged by the recorder and otherwise ignored.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{ConnectInfo, Request, State},
    http::header,
    middleware::Next,
    response::Response,
};

use reqlog_core::recorder::{QueryTally, RequestInfo};

use crate::app_state::AppState;

/// Per-request query counter, available to handlers as `Extension<SharedTally>`.
pub type SharedTally = Arc<QueryTally>;

pub async fn record_request(State(state): State<AppState>, mut req: Request, next: Next) -> Response {
    let started = Instant::now();
    let info = request_info(&req);
    let recorder = state.recorder().clone();

    let open = {
        let recorder = recorder.clone();
        match tokio::task::spawn_blocking(move || recorder.start(info, started)).await {
            Ok(open) => Some(open),
            Err(e) => {
                tracing::warn!(error = %e, "request log append task failed");
                None
            }
        }
    };

    let tally: SharedTally = Arc::new(QueryTally::new());
    req.extensions_mut().insert(Arc::clone(&tally));

    let resp = next.run(req).await;

    if let Some(open) = open {
        // Detached: the response does not wait for the patch.
        drop(tokio::task::spawn_blocking(move || recorder.finish(open, &tally)));
    }

    resp
}

fn request_info(req: &Request) -> RequestInfo {
    let headers = req.headers();

    let content_length = headers
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok());

    let user_agent = headers
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();

    let ip = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ci| ci.0.ip().to_string())
        .unwrap_or_else(|| "unknown".into());

    let uri = req
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| req.uri().path().to_string());

    RequestInfo {
        method: req.method().as_str().to_string(),
        uri,
        content_length,
        ip,
        user_agent,
    }
}
