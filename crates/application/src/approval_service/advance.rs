use chrono::Utc;
use kasira_domain::{AuditChanges, AuditEvent, AuditMetadata, AuditSubjectType, StageRecord};
use serde_json::Value;
use tracing::{info, warn};

use crate::AuditRecord;

use super::*;

impl ApprovalService {
    /// Records a stage decision and moves the request forward.
    ///
    /// Checks run in a fixed order: existence, the caller's expected status,
    /// the pipeline transition, the stage permission, decider independence,
    /// then the note. Neither the requester nor a principal who already
    /// decided an earlier stage may decide the request. The status write is a
    /// compare-and-set against the loaded status, so of two competing
    /// approvers exactly one wins and the other gets `Conflict`.
    pub async fn advance(
        &self,
        actor: &Actor,
        request_id: ApprovalRequestId,
        input: AdvanceInput,
        metadata: AuditMetadata,
    ) -> AppResult<ApprovalRequest> {
        let mut request = self.load(request_id).await?;
        let current = request.status();

        if let Some(expected) = input.expected_status
            && expected != current
        {
            warn!(
                request_id = %request_id,
                expected = expected.as_str(),
                current = current.as_str(),
                "approval request moved before the decision arrived"
            );
            return Err(AppError::Conflict(format!(
                "approval request '{request_id}' is '{}', not '{}'",
                current.as_str(),
                expected.as_str()
            )));
        }

        let pipeline = request.pipeline();
        let (stage, next) = pipeline.transition(current, input.decision)?;
        actor.require(stage.required_permission())?;
        if let Err(error) = request.ensure_independent_decider(actor.employee_id()) {
            warn!(
                request_id = %request_id,
                actor_id = %actor.employee_id(),
                stage = stage.name(),
                "approval decision refused for a non-independent decider"
            );
            return Err(error);
        }

        let note = input
            .note
            .map(|note| note.trim().to_owned())
            .filter(|note| !note.is_empty());
        if input.decision == Decision::Reject && note.is_none() {
            return Err(AppError::Validation("a rejection requires a note".to_owned()));
        }

        let record = StageRecord {
            stage: stage.name().to_owned(),
            actor_id: actor.employee_id(),
            actor_role_at_time: actor.role_at_time().to_owned(),
            decision: input.decision,
            note,
            decided_at: Utc::now(),
        };

        let mut transaction = self.store.begin().await?;

        let swapped = transaction
            .compare_and_set_approval_status(request_id, current, next, &record)
            .await?;
        if !swapped {
            warn!(
                request_id = %request_id,
                expected = current.as_str(),
                "approval status changed concurrently"
            );
            return Err(AppError::Conflict(format!(
                "approval request '{request_id}' was decided concurrently"
            )));
        }
        request.record_decision(next, record);

        let event = match input.decision {
            Decision::Approve => AuditEvent::Approved,
            Decision::Reject => AuditEvent::Rejected,
        };
        AuditRecord {
            event,
            subject_type: AuditSubjectType::ApprovalRequest,
            subject_id: request_id.to_string(),
            causer_id: Some(actor.employee_id()),
            changes: AuditChanges::single(
                "status",
                Value::from(current.as_str()),
                Value::from(next.as_str()),
            ),
            metadata: metadata.clone(),
        }
        .write(transaction.as_mut())
        .await?;

        if next == pipeline.approved_terminal() {
            self.side_effects
                .apply(
                    transaction.as_mut(),
                    &request,
                    actor.employee_id(),
                    metadata,
                )
                .await?;
        }

        transaction.commit().await?;

        info!(
            request_id = %request_id,
            stage = stage.name(),
            decision = input.decision.as_str(),
            from = current.as_str(),
            to = next.as_str(),
            actor_id = %actor.employee_id(),
            "approval request advanced"
        );

        Ok(request)
    }
}
