use async_trait::async_trait;
use chrono::{DateTime, Utc};
use kasira_core::{AppResult, EmployeeId};
use kasira_domain::{AuditChanges, AuditEvent, AuditMetadata, AuditSubjectType};
use uuid::Uuid;

/// Append-only audit log row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditLogEntry {
    /// Stable entry identifier.
    pub entry_id: Uuid,
    /// Kind of mutation or decision.
    pub event: AuditEvent,
    /// Kind of entity affected.
    pub subject_type: AuditSubjectType,
    /// Identifier of the affected entity.
    pub subject_id: String,
    /// Principal that caused the entry; `None` for system bootstrap.
    pub causer_id: Option<EmployeeId>,
    /// Field-level diff.
    pub changes: AuditChanges,
    /// Request context.
    pub metadata: AuditMetadata,
    /// Write timestamp.
    pub created_at: DateTime<Utc>,
}

/// Query parameters for audit log listing.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AuditLogQuery {
    /// Maximum rows returned.
    pub limit: usize,
    /// Number of rows skipped for offset pagination.
    pub offset: usize,
    /// Inclusive lower bound on `created_at`.
    pub date_from: Option<DateTime<Utc>>,
    /// Inclusive upper bound on `created_at`.
    pub date_to: Option<DateTime<Utc>>,
    /// Optional event filter.
    pub event: Option<AuditEvent>,
    /// Optional subject type filter.
    pub subject_type: Option<AuditSubjectType>,
}

impl AuditLogQuery {
    /// Returns whether an entry passes every filter.
    #[must_use]
    pub fn matches(&self, entry: &AuditLogEntry) -> bool {
        self.date_from.is_none_or(|from| entry.created_at >= from)
            && self.date_to.is_none_or(|to| entry.created_at <= to)
            && self.event.is_none_or(|event| entry.event == event)
            && self
                .subject_type
                .is_none_or(|subject_type| entry.subject_type == subject_type)
    }
}

/// Repository port for reading the audit log. Appends go through a store
/// transaction so they commit together with the audited mutation.
#[async_trait]
pub trait AuditLogRepository: Send + Sync {
    /// Lists entries newest first.
    async fn list_entries(&self, query: AuditLogQuery) -> AppResult<Vec<AuditLogEntry>>;
}
