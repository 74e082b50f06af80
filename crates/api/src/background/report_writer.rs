//! Queued report persistence.
//!
//! Handlers push accepted reports into a bounded channel through a
//! [`ReportQueue`]; a single [`ReportWriter`] task drains it into the store.
//! The writer exits once every queue handle is dropped and the backlog is
//! empty, so shutdown never abandons an accepted report.

use std::sync::Arc;

use event_store_core::report::CspReport;
use event_store_core::store::ReportStore;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// The writer task is gone; nothing can be queued.
#[derive(Debug, thiserror::Error)]
#[error("report writer has shut down")]
pub struct WriterClosed;

/// Cloneable producer side, held in application state.
#[derive(Debug, Clone)]
pub struct ReportQueue {
    sender: mpsc::Sender<CspReport>,
}

impl ReportQueue {
    /// Wait for a free slot, then hand the report to the writer.
    ///
    /// Cancelling this future before it returns leaves nothing queued.
    pub async fn enqueue(&self, report: CspReport) -> Result<(), WriterClosed> {
        let permit = self.sender.reserve().await.map_err(|_| WriterClosed)?;
        permit.send(report);
        Ok(())
    }

    /// Enqueue on a separate task, so the hand-off completes even if the
    /// request that accepted the report is dropped while the queue is full.
    /// A report that cannot be queued is logged here.
    pub fn dispatch(&self, report: CspReport) -> JoinHandle<Result<(), WriterClosed>> {
        let queue = self.clone();
        tokio::spawn(async move {
            let document_uri = report.details.document_uri.clone();
            let report_time = report.report_time();
            let result = queue.enqueue(report).await;
            if let Err(e) = &result {
                tracing::error!(
                    error = %e,
                    %document_uri,
                    %report_time,
                    "Accepted report could not be queued"
                );
            }
            result
        })
    }
}

/// Totals reported when the writer stops.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct WriterStats {
    pub persisted: u64,
    pub failed: u64,
}

/// Consumer side. Run it with `tokio::spawn(writer.run())`.
pub struct ReportWriter {
    store: Arc<dyn ReportStore>,
    receiver: mpsc::Receiver<CspReport>,
}

/// Create a queue holding at most `capacity` pending reports.
pub fn channel(store: Arc<dyn ReportStore>, capacity: usize) -> (ReportQueue, ReportWriter) {
    let (sender, receiver) = mpsc::channel(capacity.max(1));
    (ReportQueue { sender }, ReportWriter { store, receiver })
}

impl ReportWriter {
    /// Insert queued reports one at a time until the channel closes.
    ///
    /// Each report is attempted exactly once. Failures are logged with
    /// enough context to find the report in the request logs.
    pub async fn run(mut self) -> WriterStats {
        tracing::info!(store = self.store.name(), "Report writer started");
        let mut stats = WriterStats::default();

        while let Some(report) = self.receiver.recv().await {
            match self.store.insert(&report).await {
                Ok(()) => stats.persisted += 1,
                Err(e) => {
                    stats.failed += 1;
                    tracing::error!(
                        error = %e,
                        document_uri = %report.details.document_uri,
                        report_time = %report.report_time(),
                        "Failed to persist queued report"
                    );
                }
            }
        }

        tracing::info!(
            persisted = stats.persisted,
            failed = stats.failed,
            "Report queue closed, writer shutting down"
        );
        stats
    }
}
