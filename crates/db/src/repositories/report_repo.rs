//! Repository for the `reports` table. Insert and read only.

use event_store_core::report::CspReport;
use event_store_core::types::DbId;
use sqlx::PgPool;

use crate::models::StoredReport;

/// Column list for `reports` SELECT queries.
const COLUMNS: &str = "\
    id, document_uri, referrer, blocked_uri, \
    violated_directive, original_policy, date_time, created_at";

/// Column list for `reports` INSERT statements (excludes `id` and `created_at`).
const INSERT_COLUMNS: &str = "\
    document_uri, referrer, blocked_uri, \
    violated_directive, original_policy, date_time";

/// Provides query operations for stored reports.
pub struct ReportRepo;

impl ReportRepo {
    /// Insert one report, returning the new row id.
    pub async fn insert(pool: &PgPool, report: &CspReport) -> Result<DbId, sqlx::Error> {
        let query = format!(
            "INSERT INTO reports ({INSERT_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING id"
        );
        let details = &report.details;
        let (id,): (DbId,) = sqlx::query_as(&query)
            .bind(&details.document_uri)
            .bind(&details.referrer)
            .bind(&details.blocked_uri)
            .bind(&details.violated_directive)
            .bind(&details.original_policy)
            .bind(report.report_time())
            .fetch_one(pool)
            .await?;
        Ok(id)
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<StoredReport>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM reports WHERE id = $1");
        sqlx::query_as::<_, StoredReport>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Most recent reports first.
    pub async fn list_recent(pool: &PgPool, limit: i64) -> Result<Vec<StoredReport>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM reports ORDER BY date_time DESC, id DESC LIMIT $1");
        sqlx::query_as::<_, StoredReport>(&query)
            .bind(limit)
            .fetch_all(pool)
            .await
    }

    pub async fn count(pool: &PgPool) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM reports")
            .fetch_one(pool)
            .await?;
        Ok(count)
    }
}
