use async_trait::async_trait;
use kasira_application::{ApprovalListQuery, ApprovalRepository, clamp_page_limit};
use kasira_core::{AppError, AppResult};
use kasira_domain::{ApprovalRequest, ApprovalRequestId};
use sqlx::PgPool;

use crate::postgres_rows::ApprovalRequestRow;

/// PostgreSQL-backed approval request reads.
#[derive(Clone)]
pub struct PostgresApprovalRepository {
    pool: PgPool,
}

impl PostgresApprovalRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ApprovalRepository for PostgresApprovalRepository {
    async fn find_request(
        &self,
        request_id: ApprovalRequestId,
    ) -> AppResult<Option<ApprovalRequest>> {
        sqlx::query_as::<_, ApprovalRequestRow>(
            r#"
            SELECT id, subject_type, subject_id, payload, status, stage_history,
                requested_by, requested_at
            FROM approval_requests
            WHERE id = $1
            "#,
        )
        .bind(request_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to find approval request: {error}")))?
        .map(ApprovalRequestRow::into_request)
        .transpose()
    }

    async fn list_requests(&self, query: ApprovalListQuery) -> AppResult<Vec<ApprovalRequest>> {
        let limit = i64::try_from(clamp_page_limit(query.limit))
            .map_err(|error| AppError::Validation(format!("invalid limit: {error}")))?;
        let offset = i64::try_from(query.offset)
            .map_err(|error| AppError::Validation(format!("invalid offset: {error}")))?;

        let rows = sqlx::query_as::<_, ApprovalRequestRow>(
            r#"
            SELECT id, subject_type, subject_id, payload, status, stage_history,
                requested_by, requested_at
            FROM approval_requests
            WHERE ($1::TEXT IS NULL OR workflow_type = $1)
                AND ($2::TEXT IS NULL OR status = $2)
            ORDER BY requested_at DESC, id
            LIMIT $3
            OFFSET $4
            "#,
        )
        .bind(query.workflow_type.map(|workflow_type| workflow_type.as_str()))
        .bind(query.status.map(|status| status.as_str()))
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list approval requests: {error}")))?;

        rows.into_iter()
            .map(ApprovalRequestRow::into_request)
            .collect()
    }
}
