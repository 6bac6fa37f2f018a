//! reqlog gateway
//!
//! - Every request is appended to the request log and patched on completion
//! - `GET /admin/logs` renders records + statistics
//! - `POST /admin/logs/clear` truncates the log (Bearer token)

use std::net::SocketAddr;

use axum::{routing::get, Router};
use tracing_subscriber::{fmt, EnvFilter};

use reqlog_gateway::{app_state, config, router};

#[tokio::main]
async fn main() {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let path = std::env::var("REQLOG_CONFIG").unwrap_or_else(|_| config::DEFAULT_CONFIG_PATH.into());
    let cfg = config::load_from_file(&path).expect("config load failed");
    let listen: SocketAddr = cfg
        .server
        .listen
        .parse()
        .expect("server.listen must be a valid SocketAddr");

    let state = app_state::AppState::new(cfg).expect("app state init failed");
    tracing::info!(log = %state.store().path().display(), "request log ready");

    let host = Router::new().route("/", get(|| async { "ok" }));
    let app = router::build_router(state, host);

    tracing::info!(%listen, "reqlog-gateway starting");
    let listener = tokio::net::TcpListener::bind(listen).await.expect("failed to bind");

    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .await
        .expect("server failed");
}
