#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Method, Request};
use axum::response::Response;
use axum::Router;
use event_store_api::background::report_writer::{self, ReportWriter};
use event_store_api::config::{LogFormat, PersistenceMode, ServerConfig};
use event_store_api::router::build_app_router;
use event_store_api::state::{AppState, Persistence};
use event_store_core::store::{MemoryReportStore, ReportStore};
use event_store_core::validation::{RuleSet, RuleSetVersion, DEFAULT_DOCUMENT_URI_PATTERN};
use event_store_db::DbConfig;
use http_body_util::BodyExt;
use tower::ServiceExt;

/// Build a test `ServerConfig` with safe defaults. The database settings
/// are never used: tests run against [`MemoryReportStore`].
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        db: DbConfig::new("postgres://localhost/event_store_test"),
        request_timeout_secs: 30,
        shutdown_timeout_secs: 5,
        persistence_mode: PersistenceMode::Sync,
        persistence_queue_capacity: 16,
        ruleset_version: RuleSetVersion::V2,
        document_uri_pattern: DEFAULT_DOCUMENT_URI_PATTERN.to_string(),
        healthcheck_key: "mongo".to_string(),
        log_format: LogFormat::Text,
    }
}

/// Build the full application router around `store` with synchronous
/// persistence.
pub fn build_test_app(store: Arc<MemoryReportStore>) -> Router {
    build_app_with(store, test_config(), Persistence::Sync)
}

/// Build the router with queued persistence. The caller runs the returned
/// writer once the router (and its queue handles) has been dropped.
pub fn build_queued_test_app(store: Arc<MemoryReportStore>) -> (Router, ReportWriter) {
    build_queued_app_with(store, test_config())
}

pub fn build_queued_app_with(
    store: Arc<dyn ReportStore>,
    config: ServerConfig,
) -> (Router, ReportWriter) {
    let (queue, writer) = report_writer::channel(store.clone(), config.persistence_queue_capacity);
    (
        build_app_with(store, config, Persistence::Queued(queue)),
        writer,
    )
}

pub fn build_app_with(
    store: Arc<dyn ReportStore>,
    config: ServerConfig,
    persistence: Persistence,
) -> Router {
    let rules = RuleSet::for_version(config.ruleset_version, &config.document_uri_pattern)
        .expect("test rule set");
    let state = AppState {
        store,
        rules: Arc::new(rules),
        persistence,
        config: Arc::new(config.clone()),
    };
    build_app_router(state, &config)
}

pub async fn send(app: Router, method: Method, uri: &str, body: impl Into<Body>) -> Response {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .body(body.into())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn get(app: Router, uri: &str) -> Response {
    send(app, Method::GET, uri, Body::empty()).await
}

pub async fn post(app: Router, uri: &str, body: &str) -> Response {
    send(app, Method::POST, uri, body.to_string()).await
}

pub async fn body_text(response: Response) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// A report body accepted by the default rule set.
pub fn valid_payload(document_uri: &str) -> String {
    serde_json::json!({
        "csp-report": {
            "document-uri": document_uri,
            "referrer": "",
            "blocked-uri": "https://evil.example.com/",
            "violated-directive": "directive",
            "original-policy": "policy"
        }
    })
    .to_string()
}

pub const WRITER_TIMEOUT: Duration = Duration::from_secs(5);
