//! In-process [`ReportStore`] for tests and local runs without a database.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{ReportStore, StoreError};
use crate::report::CspReport;

/// Keeps reports in a vector. Can be switched offline to simulate an
/// unreachable backend.
#[derive(Debug)]
pub struct MemoryReportStore {
    reports: RwLock<Vec<CspReport>>,
    online: AtomicBool,
}

impl Default for MemoryReportStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryReportStore {
    pub fn new() -> Self {
        Self {
            reports: RwLock::new(Vec::new()),
            online: AtomicBool::new(true),
        }
    }

    /// A store whose ping fails and whose inserts return
    /// [`StoreError::Unavailable`].
    pub fn offline() -> Self {
        let store = Self::new();
        store.set_online(false);
        store
    }

    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }

    /// Snapshot of every stored report, in insertion order.
    pub async fn reports(&self) -> Vec<CspReport> {
        self.reports.read().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.reports.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl ReportStore for MemoryReportStore {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn insert(&self, report: &CspReport) -> Result<(), StoreError> {
        if !self.online.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("memory store is offline".into()));
        }
        self.reports.write().await.push(report.clone());
        Ok(())
    }

    async fn ping(&self) -> bool {
        self.online.load(Ordering::SeqCst)
    }
}
