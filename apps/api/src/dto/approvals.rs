use kasira_domain::{ApprovalRequest, StageOutcome, StageProgress, StageRecord};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Query string of the approval listing.
#[derive(Debug, Default, Deserialize)]
pub struct ApprovalListParams {
    #[serde(rename = "type")]
    pub workflow_type: Option<String>,
    pub status: Option<String>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

/// Incoming price change proposal.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/submit-price-change-request.ts"
)]
pub struct SubmitPriceChangeRequest {
    pub product_id: i64,
    pub new_price: i64,
    pub reason: String,
}

/// Incoming account suspension or reactivation proposal.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/submit-suspension-request.ts"
)]
pub struct SubmitSuspensionRequest {
    pub employee_id: i64,
    pub reason: String,
    #[serde(default)]
    #[ts(optional)]
    pub action: Option<String>,
}

/// Incoming stage decision.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/advance-approval-request.ts"
)]
pub struct AdvanceApprovalRequest {
    pub decision: String,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    #[ts(optional)]
    pub expected_status: Option<String>,
}

/// One recorded stage decision.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/stage-record-response.ts"
)]
pub struct StageRecordResponse {
    pub stage: String,
    pub actor_id: i64,
    pub actor_role_at_time: String,
    pub decision: String,
    pub note: Option<String>,
    pub decided_at: String,
}

impl From<&StageRecord> for StageRecordResponse {
    fn from(record: &StageRecord) -> Self {
        Self {
            stage: record.stage.clone(),
            actor_id: record.actor_id.as_i64(),
            actor_role_at_time: record.actor_role_at_time.clone(),
            decision: record.decision.as_str().to_owned(),
            note: record.note.clone(),
            decided_at: record.decided_at.to_rfc3339(),
        }
    }
}

/// Outcome of one stage derived from the request status.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/stage-outcome-response.ts"
)]
pub struct StageOutcomeResponse {
    pub stage: String,
    pub progress: String,
}

impl From<StageOutcome> for StageOutcomeResponse {
    fn from(outcome: StageOutcome) -> Self {
        let progress = match outcome.progress {
            StageProgress::Pending => "pending",
            StageProgress::Approved => "approved",
            StageProgress::Rejected => "rejected",
            StageProgress::NotReached => "not_reached",
        };

        Self {
            stage: outcome.stage.to_owned(),
            progress: progress.to_owned(),
        }
    }
}

/// API representation of an approval request.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/approval-request-response.ts"
)]
pub struct ApprovalRequestResponse {
    pub request_id: String,
    pub workflow_type: String,
    pub subject_type: String,
    pub subject_id: i64,
    #[ts(type = "Record<string, unknown>")]
    pub payload: serde_json::Value,
    pub status: String,
    pub stage_history: Vec<StageRecordResponse>,
    pub stage_outcomes: Vec<StageOutcomeResponse>,
    pub requested_by: i64,
    pub requested_at: String,
}

impl From<&ApprovalRequest> for ApprovalRequestResponse {
    fn from(request: &ApprovalRequest) -> Self {
        let subject = request.subject();

        Self {
            request_id: request.id().to_string(),
            workflow_type: request.workflow_type().as_str().to_owned(),
            subject_type: subject.subject_type().as_str().to_owned(),
            subject_id: subject.id(),
            payload: request.payload().to_value(),
            status: request.status().as_str().to_owned(),
            stage_history: request
                .stage_history()
                .iter()
                .map(StageRecordResponse::from)
                .collect(),
            stage_outcomes: request
                .pipeline()
                .stage_outcomes(request.status())
                .into_iter()
                .map(StageOutcomeResponse::from)
                .collect(),
            requested_by: request.requested_by().as_i64(),
            requested_at: request.requested_at().to_rfc3339(),
        }
    }
}
