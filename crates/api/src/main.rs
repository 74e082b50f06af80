use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use event_store_api::background::report_writer;
use event_store_api::config::{LogFormat, PersistenceMode, ServerConfig};
use event_store_api::router::build_app_router;
use event_store_api::state::{AppState, Persistence};
use event_store_core::store::ReportStore;
use event_store_core::validation::RuleSet;
use event_store_db::PgReportStore;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Configuration ---
    let config = ServerConfig::from_env().expect("Invalid configuration");

    // --- Tracing ---
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        "event_store_api=debug,event_store_db=debug,tower_http=debug".into()
    });
    let registry = tracing_subscriber::registry().with(filter);
    match config.log_format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Text => registry.with(tracing_subscriber::fmt::layer()).init(),
    }

    tracing::info!(
        host = %config.host,
        port = config.port,
        persistence = ?config.persistence_mode,
        ruleset = config.ruleset_version.as_str(),
        "Loaded server configuration"
    );

    // --- Validation rules ---
    let rules = RuleSet::for_version(config.ruleset_version, &config.document_uri_pattern)
        .expect("Invalid CSP rule set configuration");

    // --- Database ---
    let pool = event_store_db::create_pool(&config.db)
        .await
        .expect("Failed to connect to database");
    tracing::info!("Database connection pool created");

    event_store_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Database migrations applied");

    let store: Arc<dyn ReportStore> =
        Arc::new(PgReportStore::new(pool.clone(), config.store_ping_timeout()));

    // --- Persistence ---
    let (persistence, writer_handle) = match config.persistence_mode {
        PersistenceMode::Sync => (Persistence::Sync, None),
        PersistenceMode::Queued => {
            let (queue, writer) =
                report_writer::channel(Arc::clone(&store), config.persistence_queue_capacity);
            (Persistence::Queued(queue), Some(tokio::spawn(writer.run())))
        }
    };

    // --- App state ---
    let state = AppState {
        store,
        rules: Arc::new(rules),
        persistence,
        config: Arc::new(config.clone()),
    };

    let app = build_app_router(state, &config);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "event-store: listening for events");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    // --- Post-shutdown cleanup ---
    // The router (and every queue handle in it) is gone, so the writer
    // finishes once its backlog is empty.
    if let Some(handle) = writer_handle {
        let timeout = Duration::from_secs(config.shutdown_timeout_secs);
        match tokio::time::timeout(timeout, handle).await {
            Ok(Ok(stats)) => tracing::info!(
                persisted = stats.persisted,
                failed = stats.failed,
                "Report writer drained"
            ),
            Ok(Err(e)) => tracing::error!(error = %e, "Report writer task failed"),
            Err(_) => tracing::error!(
                timeout_secs = config.shutdown_timeout_secs,
                "Report writer did not drain before the shutdown timeout"
            ),
        }
    }

    pool.close().await;
    tracing::info!("Graceful shutdown complete");
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
