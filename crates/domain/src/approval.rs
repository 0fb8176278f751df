use std::fmt::{Display, Formatter};
use std::str::FromStr;

use chrono::{DateTime, Utc};
use kasira_core::{AppError, AppResult, EmployeeId};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use uuid::Uuid;

use crate::{AuditSubjectType, PipelineDefinition, ProductId};

/// Approval request identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ApprovalRequestId(Uuid);

impl ApprovalRequestId {
    /// Creates a random request identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a request identifier from an existing UUID value.
    #[must_use]
    pub fn from_uuid(value: Uuid) -> Self {
        Self(value)
    }

    /// Returns the underlying UUID value.
    #[must_use]
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for ApprovalRequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for ApprovalRequestId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

impl FromStr for ApprovalRequestId {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(value).map(Self).map_err(|error| {
            AppError::Validation(format!("invalid approval request id '{value}': {error}"))
        })
    }
}

/// Business process driven through the approval engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowType {
    /// Product price change.
    PriceChange,
    /// Employee account suspension or reactivation.
    Suspension,
}

impl WorkflowType {
    /// Returns a stable storage value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PriceChange => "price_change",
            Self::Suspension => "suspension",
        }
    }
}

impl FromStr for WorkflowType {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "price_change" => Ok(Self::PriceChange),
            "suspension" => Ok(Self::Suspension),
            _ => Err(AppError::Validation(format!(
                "unknown workflow type '{value}'"
            ))),
        }
    }
}

/// Status of an approval request. Which values are reachable depends on the
/// workflow's pipeline definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalStatus {
    /// Waiting for the first stage.
    Pending,
    /// Finance approved a price change.
    FinanceApproved,
    /// Finance rejected a price change.
    FinanceRejected,
    /// Manager approved a suspension.
    ManagerApproved,
    /// Manager rejected a suspension.
    ManagerRejected,
    /// Owner approved; the side effect has been applied.
    OwnerApproved,
    /// Owner rejected.
    OwnerRejected,
}

impl ApprovalStatus {
    /// Returns a stable storage value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::FinanceApproved => "finance_approved",
            Self::FinanceRejected => "finance_rejected",
            Self::ManagerApproved => "manager_approved",
            Self::ManagerRejected => "manager_rejected",
            Self::OwnerApproved => "owner_approved",
            Self::OwnerRejected => "owner_rejected",
        }
    }
}

impl FromStr for ApprovalStatus {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "pending" => Ok(Self::Pending),
            "finance_approved" => Ok(Self::FinanceApproved),
            "finance_rejected" => Ok(Self::FinanceRejected),
            "manager_approved" => Ok(Self::ManagerApproved),
            "manager_rejected" => Ok(Self::ManagerRejected),
            "owner_approved" => Ok(Self::OwnerApproved),
            "owner_rejected" => Ok(Self::OwnerRejected),
            _ => Err(AppError::Validation(format!(
                "unknown approval status '{value}'"
            ))),
        }
    }
}

/// Stage decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    /// Move the request forward.
    Approve,
    /// Stop the request.
    Reject,
}

impl Decision {
    /// Returns a stable storage value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Approve => "approve",
            Self::Reject => "reject",
        }
    }
}

impl FromStr for Decision {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "approve" => Ok(Self::Approve),
            "reject" => Ok(Self::Reject),
            _ => Err(AppError::Validation(format!("unknown decision '{value}'"))),
        }
    }
}

/// Account change requested through the suspension pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountAction {
    /// Block the account.
    #[default]
    Suspend,
    /// Lift a suspension.
    Activate,
}

impl AccountAction {
    /// Returns a stable storage value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Suspend => "suspend",
            Self::Activate => "activate",
        }
    }
}

impl FromStr for AccountAction {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "suspend" => Ok(Self::Suspend),
            "activate" => Ok(Self::Activate),
            _ => Err(AppError::Validation(format!(
                "unknown account action '{value}'"
            ))),
        }
    }
}

/// Entity the request is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "snake_case")]
pub enum SubjectRef {
    /// A product whose price changes.
    Product(ProductId),
    /// An employee whose account status changes.
    Employee(EmployeeId),
}

impl SubjectRef {
    /// Returns the audit subject type for the referenced entity.
    #[must_use]
    pub fn subject_type(&self) -> AuditSubjectType {
        match self {
            Self::Product(_) => AuditSubjectType::Product,
            Self::Employee(_) => AuditSubjectType::Employee,
        }
    }

    /// Returns the referenced storage key.
    #[must_use]
    pub fn id(&self) -> i64 {
        match self {
            Self::Product(product_id) => product_id.as_i64(),
            Self::Employee(employee_id) => employee_id.as_i64(),
        }
    }
}

/// Proposed change carried by a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ApprovalPayload {
    /// Price change proposal; `old_price` is captured at submission.
    PriceChange {
        /// Price when the request was submitted.
        old_price: i64,
        /// Proposed price.
        new_price: i64,
        /// Business justification.
        reason: String,
    },
    /// Account status change proposal.
    Suspension {
        /// Justification shown to approvers.
        reason: String,
        /// Change applied on final approval.
        #[serde(default)]
        action: AccountAction,
    },
}

impl ApprovalPayload {
    /// Returns the workflow this payload belongs to.
    #[must_use]
    pub fn workflow_type(&self) -> WorkflowType {
        match self {
            Self::PriceChange { .. } => WorkflowType::PriceChange,
            Self::Suspension { .. } => WorkflowType::Suspension,
        }
    }

    /// Validates the fields each workflow requires.
    pub fn validate(&self) -> AppResult<()> {
        match self {
            Self::PriceChange {
                old_price,
                new_price,
                reason,
            } => {
                if *new_price <= 0 {
                    return Err(AppError::Validation(format!(
                        "new price must be greater than zero, got {new_price}"
                    )));
                }
                if new_price == old_price {
                    return Err(AppError::Validation(
                        "new price must differ from the current price".to_owned(),
                    ));
                }
                require_text(reason, "price change reason")
            }
            Self::Suspension { reason, .. } => require_text(reason, "suspension reason"),
        }
    }

    /// Returns the payload as a JSON value for audit snapshots.
    #[must_use]
    pub fn to_value(&self) -> Value {
        match self {
            Self::PriceChange {
                old_price,
                new_price,
                reason,
            } => json!({"old_price": old_price, "new_price": new_price, "reason": reason}),
            Self::Suspension { reason, action } => {
                json!({"reason": reason, "action": action.as_str()})
            }
        }
    }
}

/// One decision appended to a request's stage history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageRecord {
    /// Stage that was acted on.
    pub stage: String,
    /// Deciding principal.
    pub actor_id: EmployeeId,
    /// Primary role of the actor when deciding.
    pub actor_role_at_time: String,
    /// Decision taken.
    pub decision: Decision,
    /// Approver note; mandatory for rejections.
    pub note: Option<String>,
    /// Decision timestamp.
    pub decided_at: DateTime<Utc>,
}

/// Generic approval envelope shared by every workflow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalRequest {
    id: ApprovalRequestId,
    subject: SubjectRef,
    payload: ApprovalPayload,
    status: ApprovalStatus,
    stage_history: Vec<StageRecord>,
    requested_by: EmployeeId,
    requested_at: DateTime<Utc>,
}

impl ApprovalRequest {
    /// Creates a new request in its pipeline's initial status.
    pub fn submit(
        subject: SubjectRef,
        payload: ApprovalPayload,
        requested_by: EmployeeId,
        requested_at: DateTime<Utc>,
    ) -> AppResult<Self> {
        payload.validate()?;

        let subject_matches = matches!(
            (&payload, &subject),
            (ApprovalPayload::PriceChange { .. }, SubjectRef::Product(_))
                | (ApprovalPayload::Suspension { .. }, SubjectRef::Employee(_))
        );
        if !subject_matches {
            return Err(AppError::Validation(format!(
                "{} requests cannot target a {}",
                payload.workflow_type().as_str(),
                subject.subject_type().as_str()
            )));
        }

        let pipeline = PipelineDefinition::for_workflow(payload.workflow_type());

        Ok(Self {
            id: ApprovalRequestId::new(),
            subject,
            payload,
            status: pipeline.initial_status(),
            stage_history: Vec::new(),
            requested_by,
            requested_at,
        })
    }

    /// Restores a persisted request without re-running submission checks.
    #[must_use]
    pub fn restore(
        id: ApprovalRequestId,
        subject: SubjectRef,
        payload: ApprovalPayload,
        status: ApprovalStatus,
        stage_history: Vec<StageRecord>,
        requested_by: EmployeeId,
        requested_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            subject,
            payload,
            status,
            stage_history,
            requested_by,
            requested_at,
        }
    }

    /// Returns the request identifier.
    #[must_use]
    pub fn id(&self) -> ApprovalRequestId {
        self.id
    }

    /// Returns the workflow type.
    #[must_use]
    pub fn workflow_type(&self) -> WorkflowType {
        self.payload.workflow_type()
    }

    /// Returns the referenced entity.
    #[must_use]
    pub fn subject(&self) -> SubjectRef {
        self.subject
    }

    /// Returns the proposed change.
    #[must_use]
    pub fn payload(&self) -> &ApprovalPayload {
        &self.payload
    }

    /// Returns the current status.
    #[must_use]
    pub fn status(&self) -> ApprovalStatus {
        self.status
    }

    /// Returns decisions in the order they were taken.
    #[must_use]
    pub fn stage_history(&self) -> &[StageRecord] {
        &self.stage_history
    }

    /// Returns the submitting principal.
    #[must_use]
    pub fn requested_by(&self) -> EmployeeId {
        self.requested_by
    }

    /// Returns the submission timestamp.
    #[must_use]
    pub fn requested_at(&self) -> DateTime<Utc> {
        self.requested_at
    }

    /// Returns the pipeline this request runs through.
    #[must_use]
    pub fn pipeline(&self) -> &'static PipelineDefinition {
        PipelineDefinition::for_workflow(self.workflow_type())
    }

    /// Records a decision and moves to the next status.
    pub fn record_decision(&mut self, next_status: ApprovalStatus, record: StageRecord) {
        self.status = next_status;
        self.stage_history.push(record);
    }

    /// Rejects a decider who submitted the request or already decided a stage.
    pub fn ensure_independent_decider(&self, employee_id: EmployeeId) -> AppResult<()> {
        if employee_id == self.requested_by {
            return Err(AppError::Forbidden(
                "the requester cannot decide their own approval request".to_owned(),
            ));
        }

        if self
            .stage_history
            .iter()
            .any(|record| record.actor_id == employee_id)
        {
            return Err(AppError::Forbidden(
                "each stage must be decided by a different principal".to_owned(),
            ));
        }

        Ok(())
    }

    /// Returns the attribute set recorded when the request is created.
    #[must_use]
    pub fn audit_snapshot(&self) -> Value {
        json!({
            "workflow_type": self.workflow_type().as_str(),
            "subject_type": self.subject.subject_type().as_str(),
            "subject_id": self.subject.id(),
            "status": self.status.as_str(),
            "payload": self.payload.to_value(),
            "requested_by": self.requested_by.as_i64(),
        })
    }
}

fn require_text(value: &str, label: &str) -> AppResult<()> {
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!("{label} is required")));
    }

    Ok(())
}
