use super::*;

impl PostgresStoreTransaction {
    pub(super) async fn insert_approval_request_impl(
        &mut self,
        request: &ApprovalRequest,
    ) -> AppResult<()> {
        let subject = request.subject();
        sqlx::query(
            r#"
            INSERT INTO approval_requests (
                id,
                workflow_type,
                subject_type,
                subject_id,
                payload,
                status,
                stage_history,
                requested_by,
                requested_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(request.id().as_uuid())
        .bind(request.workflow_type().as_str())
        .bind(subject.subject_type().as_str())
        .bind(subject.id())
        .bind(Json(request.payload()))
        .bind(request.status().as_str())
        .bind(Json(request.stage_history()))
        .bind(request.requested_by().as_i64())
        .bind(request.requested_at())
        .execute(&mut *self.transaction)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to insert approval request: {error}"))
        })?;

        Ok(())
    }

    pub(super) async fn compare_and_set_approval_status_impl(
        &mut self,
        request_id: ApprovalRequestId,
        expected: ApprovalStatus,
        next: ApprovalStatus,
        record: &StageRecord,
    ) -> AppResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE approval_requests
            SET status = $3,
                stage_history = stage_history || jsonb_build_array($4::JSONB),
                updated_at = now()
            WHERE id = $1
                AND status = $2
            "#,
        )
        .bind(request_id.as_uuid())
        .bind(expected.as_str())
        .bind(next.as_str())
        .bind(Json(record))
        .execute(&mut *self.transaction)
        .await
        .map_err(|error| AppError::Internal(format!("failed to update approval status: {error}")))?;

        Ok(result.rows_affected() == 1)
    }
}
