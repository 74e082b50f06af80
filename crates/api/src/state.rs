use std::sync::Arc;

use event_store_core::report::CspReport;
use event_store_core::store::ReportStore;
use event_store_core::validation::RuleSet;

use crate::background::report_writer::ReportQueue;
use crate::config::ServerConfig;
use crate::error::{AppError, AppResult};

/// Where accepted reports go.
#[derive(Debug, Clone)]
pub enum Persistence {
    /// Insert inline; the response waits for the result.
    Sync,
    /// Hand off to the background writer; the response does not wait.
    Queued(ReportQueue),
}

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Report store, shared by every request.
    pub store: Arc<dyn ReportStore>,
    /// Active constraint table.
    pub rules: Arc<RuleSet>,
    pub persistence: Persistence,
    pub config: Arc<ServerConfig>,
}

impl AppState {
    /// Persist one accepted report according to the configured policy.
    ///
    /// Both the synchronous insert and the queue hand-off run on their own
    /// task, so a client disconnect or request timeout cannot abandon a
    /// report that has already been accepted.
    pub async fn persist(&self, report: CspReport) -> AppResult<()> {
        match &self.persistence {
            Persistence::Sync => {
                let store = Arc::clone(&self.store);
                tokio::spawn(async move {
                    let result = store.insert(&report).await;
                    if let Err(e) = &result {
                        tracing::error!(
                            error = %e,
                            document_uri = %report.details.document_uri,
                            report_time = %report.report_time(),
                            "Failed to persist report"
                        );
                    }
                    result
                })
                .await
                    .map_err(|e| AppError::InternalError(format!("insert task failed: {e}")))??;
                Ok(())
            }
            Persistence::Queued(queue) => queue
                .dispatch(report)
                .await
                .map_err(|e| AppError::InternalError(format!("enqueue task failed: {e}")))?
                .map_err(|e| AppError::InternalError(e.to_string())),
        }
    }
}
