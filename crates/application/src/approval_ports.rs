use async_trait::async_trait;
use kasira_core::AppResult;
use kasira_domain::{ApprovalRequest, ApprovalRequestId, ApprovalStatus, WorkflowType};

/// Query parameters for approval request listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApprovalListQuery {
    /// Maximum rows returned.
    pub limit: usize,
    /// Number of rows skipped for offset pagination.
    pub offset: usize,
    /// Optional workflow filter.
    pub workflow_type: Option<WorkflowType>,
    /// Optional status filter.
    pub status: Option<ApprovalStatus>,
}

impl ApprovalListQuery {
    /// Returns whether a request passes every filter.
    #[must_use]
    pub fn matches(&self, request: &ApprovalRequest) -> bool {
        self.workflow_type
            .is_none_or(|workflow_type| request.workflow_type() == workflow_type)
            && self.status.is_none_or(|status| request.status() == status)
    }
}

/// Repository port for reading approval requests.
#[async_trait]
pub trait ApprovalRepository: Send + Sync {
    /// Finds a request by id.
    async fn find_request(
        &self,
        request_id: ApprovalRequestId,
    ) -> AppResult<Option<ApprovalRequest>>;

    /// Lists requests newest first.
    async fn list_requests(&self, query: ApprovalListQuery) -> AppResult<Vec<ApprovalRequest>>;
}
