//! Operational and admin HTTP endpoints.
//!
//! - `/healthz`           : liveness
//! - `/admin/logs`        : parsed records + statistics (JSON)
//! - `/admin/logs/clear`  : truncate the request log (Bearer token)

use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::Local;
use serde_json::json;

use reqlog_core::error::{Result, ReqLogError};
use reqlog_core::record::{parse_all, LogRecord};
use reqlog_core::stats::{aggregate, Statistics};

use crate::app_state::AppState;

pub async fn healthz() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

pub async fn view_logs(State(state): State<AppState>) -> Response {
    let store = std::sync::Arc::clone(state.store());
    let max = state.cfg().admin.max_records;

    let loaded = tokio::task::spawn_blocking(move || -> Result<Option<Vec<LogRecord>>> {
        match parse_all(&store) {
            Ok(records) => Ok(Some(records.collect())),
            Err(ReqLogError::NotFound) => Ok(None),
            Err(e) => Err(e),
        }
    })
    .await
    .map_err(|e| ReqLogError::Internal(format!("log read task failed: {e}")))
    .and_then(|r| r);

    let records = match loaded {
        Ok(Some(records)) => records,
        Ok(None) => {
            return Json(json!({
                "ok": true,
                "empty": true,
                "msg": "No logs found.",
                "stats": Statistics::default(),
                "time_range_summary": Statistics::default().time_range.summary(),
                "records": [],
            }))
            .into_response();
        }
        Err(e) => {
            tracing::warn!(error = %e, "request log read failed");
            return error_response(&e);
        }
    };

    let stats = aggregate(&records, Local::now().naive_local());
    let skip = records.len().saturating_sub(max);

    Json(json!({
        "ok": true,
        "empty": false,
        "time_range_summary": stats.time_range.summary(),
        "stats": stats,
        "records": &records[skip..],
    }))
    .into_response()
}

pub async fn clear_logs(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim);

    if let Err(e) = state.authorize_admin(bearer) {
        tracing::warn!("clear logs rejected: bad or missing admin token");
        return error_response(&e);
    }

    let store = std::sync::Arc::clone(state.store());
    let res = tokio::task::spawn_blocking(move || store.clear())
        .await
        .map_err(|e| ReqLogError::Internal(format!("log clear task failed: {e}")))
        .and_then(|r| r);

    match res {
        Ok(()) => {
            tracing::info!(path = %state.store().path().display(), "request log cleared");
            Json(json!({ "ok": true, "msg": "Logs cleared successfully" })).into_response()
        }
        Err(e) => {
            tracing::warn!(error = %e, "request log clear failed");
            error_response(&e)
        }
    }
}

fn status_for(e: &ReqLogError) -> StatusCode {
    match e {
        ReqLogError::AuthFailed => StatusCode::UNAUTHORIZED,
        ReqLogError::NotFound => StatusCode::NOT_FOUND,
        ReqLogError::BadRequest(_) | ReqLogError::UnsupportedVersion => StatusCode::BAD_REQUEST,
        ReqLogError::Io(_) | ReqLogError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn error_response(e: &ReqLogError) -> Response {
    let body = json!({
        "ok": false,
        "code": e.client_code().as_str(),
        "msg": e.to_string(),
    });
    (status_for(e), Json(body)).into_response()
}
