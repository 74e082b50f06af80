//! The persistence seam consumed by the HTTP handlers.
//!
//! Implementations own their connection handling and must be safe to share
//! across concurrent requests without external locking.

pub mod memory;

use async_trait::async_trait;

use crate::report::CspReport;

pub use memory::MemoryReportStore;

/// Errors surfaced by a [`ReportStore`].
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Store operation timed out")]
    Timeout,

    #[error("Store rejected the write: {0}")]
    Rejected(String),
}

/// Append-only storage for accepted reports.
#[async_trait]
pub trait ReportStore: Send + Sync {
    /// Short backend name used in logs.
    fn name(&self) -> &'static str;

    /// Append one report. No upsert; once this returns `Ok` the record is
    /// committed and visible to subsequent reads.
    async fn insert(&self, report: &CspReport) -> Result<(), StoreError>;

    /// Cheap liveness probe, independent of any table.
    async fn ping(&self) -> bool;
}
