//! Ordered-stage approval pipelines.
//!
//! Both workflows run through the same engine: a pipeline is an initial
//! status plus an ordered list of stages. Each stage acts from exactly one
//! status, requires one permission and maps approve/reject to a destination
//! status. A status no stage acts from is terminal.

use kasira_core::{AppError, AppResult};
use serde::Serialize;

use crate::{ApprovalStatus, Decision, Permission, WorkflowType};

/// One step of a pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stage {
    name: &'static str,
    acts_from: ApprovalStatus,
    required_permission: Permission,
    on_approve: ApprovalStatus,
    on_reject: ApprovalStatus,
}

impl Stage {
    /// Returns the stage name recorded in stage history.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Returns the status this stage acts from.
    #[must_use]
    pub fn acts_from(&self) -> ApprovalStatus {
        self.acts_from
    }

    /// Returns the permission an actor needs for this stage.
    #[must_use]
    pub fn required_permission(&self) -> Permission {
        self.required_permission
    }

    /// Returns the destination status for a decision.
    #[must_use]
    pub fn destination(&self, decision: Decision) -> ApprovalStatus {
        match decision {
            Decision::Approve => self.on_approve,
            Decision::Reject => self.on_reject,
        }
    }
}

/// Per-stage progress derived from the canonical request status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StageProgress {
    /// The stage is waiting for a decision.
    Pending,
    /// The stage approved.
    Approved,
    /// The stage rejected.
    Rejected,
    /// An earlier stage has not approved yet, or rejected.
    NotReached,
}

/// Derived outcome of one stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StageOutcome {
    /// Stage name.
    pub stage: &'static str,
    /// Derived progress.
    pub progress: StageProgress,
}

/// Configured pipeline for one workflow type.
#[derive(Debug, PartialEq, Eq)]
pub struct PipelineDefinition {
    workflow_type: WorkflowType,
    initial_status: ApprovalStatus,
    approved_terminal: ApprovalStatus,
    stages: &'static [Stage],
}

const PRICE_CHANGE_STAGES: &[Stage] = &[
    Stage {
        name: "finance",
        acts_from: ApprovalStatus::Pending,
        required_permission: Permission::PriceChangesApproveFinance,
        on_approve: ApprovalStatus::FinanceApproved,
        on_reject: ApprovalStatus::FinanceRejected,
    },
    Stage {
        name: "owner",
        acts_from: ApprovalStatus::FinanceApproved,
        required_permission: Permission::PriceChangesApproveOwner,
        on_approve: ApprovalStatus::OwnerApproved,
        on_reject: ApprovalStatus::OwnerRejected,
    },
];

const SUSPENSION_STAGES: &[Stage] = &[
    Stage {
        name: "manager",
        acts_from: ApprovalStatus::Pending,
        required_permission: Permission::SuspensionApproveManager,
        on_approve: ApprovalStatus::ManagerApproved,
        on_reject: ApprovalStatus::ManagerRejected,
    },
    Stage {
        name: "owner",
        acts_from: ApprovalStatus::ManagerApproved,
        required_permission: Permission::SuspensionApproveOwner,
        on_approve: ApprovalStatus::OwnerApproved,
        on_reject: ApprovalStatus::OwnerRejected,
    },
];

static PRICE_CHANGE_PIPELINE: PipelineDefinition = PipelineDefinition {
    workflow_type: WorkflowType::PriceChange,
    initial_status: ApprovalStatus::Pending,
    approved_terminal: ApprovalStatus::OwnerApproved,
    stages: PRICE_CHANGE_STAGES,
};

static SUSPENSION_PIPELINE: PipelineDefinition = PipelineDefinition {
    workflow_type: WorkflowType::Suspension,
    initial_status: ApprovalStatus::Pending,
    approved_terminal: ApprovalStatus::OwnerApproved,
    stages: SUSPENSION_STAGES,
};

impl PipelineDefinition {
    /// Returns the pipeline configured for a workflow type.
    #[must_use]
    pub fn for_workflow(workflow_type: WorkflowType) -> &'static Self {
        match workflow_type {
            WorkflowType::PriceChange => &PRICE_CHANGE_PIPELINE,
            WorkflowType::Suspension => &SUSPENSION_PIPELINE,
        }
    }

    /// Returns the workflow type.
    #[must_use]
    pub fn workflow_type(&self) -> WorkflowType {
        self.workflow_type
    }

    /// Returns the status new requests start in.
    #[must_use]
    pub fn initial_status(&self) -> ApprovalStatus {
        self.initial_status
    }

    /// Returns the terminal status that triggers the side effect.
    #[must_use]
    pub fn approved_terminal(&self) -> ApprovalStatus {
        self.approved_terminal
    }

    /// Returns stages in order.
    #[must_use]
    pub fn stages(&self) -> &'static [Stage] {
        self.stages
    }

    /// Returns whether the status belongs to this pipeline.
    #[must_use]
    pub fn recognizes(&self, status: ApprovalStatus) -> bool {
        status == self.initial_status
            || self
                .stages
                .iter()
                .any(|stage| stage.on_approve == status || stage.on_reject == status)
    }

    /// Returns the stage acting from the status, if any.
    #[must_use]
    pub fn current_stage(&self, status: ApprovalStatus) -> Option<&'static Stage> {
        self.stages.iter().find(|stage| stage.acts_from == status)
    }

    /// Returns whether the status is a known status without outgoing transitions.
    #[must_use]
    pub fn is_terminal(&self, status: ApprovalStatus) -> bool {
        self.recognizes(status) && self.current_stage(status).is_none()
    }

    /// Resolves the stage to act on and the status it leads to.
    pub fn transition(
        &self,
        status: ApprovalStatus,
        decision: Decision,
    ) -> AppResult<(&'static Stage, ApprovalStatus)> {
        if !self.recognizes(status) {
            return Err(AppError::InvalidTransition(format!(
                "status '{}' is not part of the {} pipeline",
                status.as_str(),
                self.workflow_type.as_str()
            )));
        }

        let stage = self.current_stage(status).ok_or_else(|| {
            AppError::InvalidTransition(format!(
                "{} request is already in terminal status '{}'",
                self.workflow_type.as_str(),
                status.as_str()
            ))
        })?;

        Ok((stage, stage.destination(decision)))
    }

    /// Returns per-stage progress derived from the request status.
    ///
    /// The request status is the only stored state; stage-level views are
    /// projections of it and can never disagree with it.
    #[must_use]
    pub fn stage_outcomes(&self, status: ApprovalStatus) -> Vec<StageOutcome> {
        let mut reached = self.recognizes(status);
        self.stages
            .iter()
            .map(|stage| {
                let progress = if !reached {
                    StageProgress::NotReached
                } else if status == stage.acts_from {
                    reached = false;
                    StageProgress::Pending
                } else if status == stage.on_reject {
                    reached = false;
                    StageProgress::Rejected
                } else {
                    StageProgress::Approved
                };

                StageOutcome {
                    stage: stage.name,
                    progress,
                }
            })
            .collect()
    }
}
