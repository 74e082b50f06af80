use std::collections::BTreeMap;

use axum::extract::State;
use axum::http::{header, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::any;
use axum::Router;

use crate::error::{AppError, AppResult};
use crate::state::AppState;

pub const HEALTHCHECK_PATH: &str = "/healthcheck";

/// GET /healthcheck -- `{"<key>": true}` with 200 when the store answers a
/// ping, `{"<key>": false}` with 503 when it does not.
async fn healthcheck(State(state): State<AppState>, method: Method) -> AppResult<Response> {
    if method != Method::GET {
        return Err(AppError::MethodNotAllowed(Method::GET));
    }

    let healthy = state.store.ping().await;
    let status = if healthy {
        StatusCode::OK
    } else {
        tracing::warn!(store = state.store.name(), "Healthcheck: store unreachable");
        StatusCode::SERVICE_UNAVAILABLE
    };

    let mut payload = BTreeMap::new();
    payload.insert(state.config.healthcheck_key.as_str(), healthy);
    let body = serde_json::to_vec(&payload).map_err(|e| {
        AppError::InternalError(format!("Cannot encode healthcheck response: {e}"))
    })?;

    Ok((status, [(header::CONTENT_TYPE, "application/json")], body).into_response())
}

/// Mount the healthcheck route.
pub fn router() -> Router<AppState> {
    Router::new().route(HEALTHCHECK_PATH, any(healthcheck))
}
