use async_trait::async_trait;
use sqlx::PgPool;

use kasira_application::{AuditLogEntry, AuditLogQuery, AuditLogRepository, clamp_page_limit};
use kasira_core::{AppError, AppResult};

use crate::postgres_rows::AuditLogRow;


/// PostgreSQL-backed repository for audit log read models.
#[derive(Clone)]
pub struct PostgresAuditLogRepository {
    pool: PgPool,
}

impl PostgresAuditLogRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AuditLogRepository for PostgresAuditLogRepository {
    async fn list_entries(&self, query: AuditLogQuery) -> AppResult<Vec<AuditLogEntry>> {
        let capped_limit = i64::try_from(clamp_page_limit(query.limit))
            .map_err(|error| AppError::Validation(format!("invalid limit: {error}")))?;
        let capped_offset = i64::try_from(query.offset)
            .map_err(|error| AppError::Validation(format!("invalid offset: {error}")))?;
        let rows = sqlx::query_as::<_, AuditLogRow>(
            r#"
            SELECT
                id,
                event,
                subject_type,
                subject_id,
                causer_id,
                changes,
                ip,
                user_agent,
                created_at
            FROM audit_log_entries
            WHERE ($1::TIMESTAMPTZ IS NULL OR created_at >= $1)
                AND ($2::TIMESTAMPTZ IS NULL OR created_at <= $2)
                AND ($3::TEXT IS NULL OR event = $3)
                AND ($4::TEXT IS NULL OR subject_type = $4)
            ORDER BY created_at DESC, id
            LIMIT $5
            OFFSET $6
            "#,
        )
        .bind(query.date_from)
        .bind(query.date_to)
        .bind(query.event.map(|event| event.as_str()))
        .bind(query.subject_type.map(|subject_type| subject_type.as_str()))
        .bind(capped_limit)
        .bind(capped_offset)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list audit log entries: {error}")))?;

        rows.into_iter().map(AuditLogRow::into_entry).collect()
    }
}
