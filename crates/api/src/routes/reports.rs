//! CSP violation report ingestion.

use axum::extract::{Request, State};
use axum::http::Method;
use axum::routing::any;
use axum::Router;
use chrono::Utc;
use event_store_core::report::{CspReport, CspReportPayload};
use event_store_core::validation;

use crate::error::{AppError, AppResult, PARSE_FAILED, READ_FAILED};
use crate::state::AppState;

/// Path browsers are configured to report to (`report-uri /e`).
pub const REPORT_PATH: &str = "/e";

/// Fixed acknowledgement body.
pub const RECEIVED: &str = "JSON received";

/// Largest body read; matches the transport's default limit.
pub const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

/// POST /e -- read, decode, stamp, validate and persist one report.
///
/// Every method is routed here so the 405 can advertise `POST` alone.
async fn ingest_report(State(state): State<AppState>, request: Request) -> AppResult<&'static str> {
    if request.method() != Method::POST {
        return Err(AppError::MethodNotAllowed(Method::POST));
    }

    let body = axum::body::to_bytes(request.into_body(), MAX_BODY_BYTES)
        .await
        .map_err(|e| {
            tracing::debug!(error = %e, "Failed to read report body");
            AppError::BadRequest(READ_FAILED)
        })?;

    let payload = CspReportPayload::from_slice(&body).map_err(|e| {
        tracing::debug!(error = %e, "Failed to parse report body");
        AppError::BadRequest(PARSE_FAILED)
    })?;

    let report = CspReport::received(payload.details, Utc::now());

    if let Err(reason) = validation::validate(&report, &state.rules) {
        tracing::warn!(%reason, ?report, "Request failed validation");
        return Err(AppError::Validation(reason));
    }

    state.persist(report).await?;

    Ok(RECEIVED)
}

/// Mount the ingestion route.
pub fn router() -> Router<AppState> {
    Router::new().route(REPORT_PATH, any(ingest_report))
}
