//! [`ReportStore`] backed by PostgreSQL.

use std::time::Duration;

use async_trait::async_trait;
use event_store_core::report::CspReport;
use event_store_core::store::{ReportStore, StoreError};

use crate::repositories::ReportRepo;
use crate::DbPool;

/// PostgreSQL `query_canceled`, raised when `statement_timeout` fires.
const QUERY_CANCELED: &str = "57014";

/// Shares one pool across all handlers. Each operation checks out its own
/// connection, so no external locking is needed.
#[derive(Debug, Clone)]
pub struct PgReportStore {
    pool: DbPool,
    ping_timeout: Duration,
}

impl PgReportStore {
    /// `ping_timeout` bounds the whole liveness probe, including a
    /// connection stalled mid-query.
    pub fn new(pool: DbPool, ping_timeout: Duration) -> Self {
        Self { pool, ping_timeout }
    }
}

#[async_trait]
impl ReportStore for PgReportStore {
    fn name(&self) -> &'static str {
        "postgres"
    }

    async fn insert(&self, report: &CspReport) -> Result<(), StoreError> {
        let id = ReportRepo::insert(&self.pool, report)
            .await
            .map_err(classify_sqlx_error)?;
        tracing::debug!(report_id = id, "Report persisted");
        Ok(())
    }

    async fn ping(&self) -> bool {
        match tokio::time::timeout(self.ping_timeout, crate::health_check(&self.pool)).await {
            Ok(Ok(())) => true,
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "Database ping failed");
                false
            }
            Err(_) => {
                tracing::warn!(
                    timeout_ms = self.ping_timeout.as_millis() as u64,
                    "Database ping timed out"
                );
                false
            }
        }
    }
}

/// Map a sqlx error onto the store taxonomy.
///
/// - Pool exhaustion and statement timeouts are [`StoreError::Timeout`].
/// - Errors raised by the server for this statement are [`StoreError::Rejected`].
/// - Everything else (I/O, TLS, closed pool) is [`StoreError::Unavailable`].
fn classify_sqlx_error(err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::PoolTimedOut => StoreError::Timeout,
        sqlx::Error::Database(db_err) => {
            if db_err.code().as_deref() == Some(QUERY_CANCELED) {
                StoreError::Timeout
            } else {
                StoreError::Rejected(db_err.to_string())
            }
        }
        other => StoreError::Unavailable(other.to_string()),
    }
}
