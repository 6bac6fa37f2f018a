//! Axum router wiring.
//!
//! The host application's routes and the admin endpoints share one router;
//! every request, admin ones included, passes through the recording layer.

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use crate::{app_state::AppState, ops, transport};

pub fn build_router(state: AppState, app: Router) -> Router {
    let admin = Router::new()
        .route("/healthz", get(ops::healthz))
        .route("/admin/logs", get(ops::view_logs))
        .route("/admin/logs/clear", post(ops::clear_logs))
        .with_state(state.clone());

    app.merge(admin).layer(middleware::from_fn_with_state(
        state,
        transport::middleware::record_request,
    ))
}
