//! Row model for the append-only `reports` table.

use event_store_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A persisted report. Immutable once created (no `updated_at`).
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct StoredReport {
    pub id: DbId,
    pub document_uri: String,
    pub referrer: String,
    pub blocked_uri: String,
    pub violated_directive: String,
    pub original_policy: String,
    /// Server-assigned receipt time.
    pub date_time: Timestamp,
    pub created_at: Timestamp,
}
