use std::sync::Arc;

use chrono::Utc;
use kasira_core::{AppError, AppResult, EmployeeId};
use kasira_domain::{AuditChanges, AuditEvent, AuditMetadata, AuditSubjectType, Permission};
use uuid::Uuid;

use crate::{
    Actor, AuditLogEntry, AuditLogQuery, AuditLogRepository, StoreTransaction, clamp_page_limit,
};

/// Audit entry about to be appended.
#[derive(Debug, Clone)]
pub struct AuditRecord {
    /// Kind of mutation or decision.
    pub event: AuditEvent,
    /// Kind of entity affected.
    pub subject_type: AuditSubjectType,
    /// Identifier of the affected entity.
    pub subject_id: String,
    /// Causing principal; `None` for system bootstrap.
    pub causer_id: Option<EmployeeId>,
    /// Field-level diff.
    pub changes: AuditChanges,
    /// Request context.
    pub metadata: AuditMetadata,
}

impl AuditRecord {
    /// Appends the entry through the transaction that carries the audited write.
    pub async fn write(self, transaction: &mut dyn StoreTransaction) -> AppResult<AuditLogEntry> {
        if self.event == AuditEvent::Updated && self.changes.is_empty() {
            return Err(AppError::Internal(format!(
                "refusing to audit an update of {} '{}' without changes",
                self.subject_type.as_str(),
                self.subject_id
            )));
        }

        let entry = AuditLogEntry {
            entry_id: Uuid::new_v4(),
            event: self.event,
            subject_type: self.subject_type,
            subject_id: self.subject_id,
            causer_id: self.causer_id,
            changes: self.changes,
            metadata: self.metadata,
            created_at: Utc::now(),
        };
        transaction.append_audit_entry(&entry).await?;

        Ok(entry)
    }
}

/// Application service for reading the audit trail.
#[derive(Clone)]
pub struct AuditLogService {
    repository: Arc<dyn AuditLogRepository>,
}

impl AuditLogService {
    /// Creates a new audit log service.
    #[must_use]
    pub fn new(repository: Arc<dyn AuditLogRepository>) -> Self {
        Self { repository }
    }

    /// Lists audit entries newest first.
    pub async fn list(&self, actor: &Actor, query: AuditLogQuery) -> AppResult<Vec<AuditLogEntry>> {
        actor.require(Permission::AuditLogView)?;

        if let (Some(from), Some(to)) = (query.date_from, query.date_to)
            && from > to
        {
            return Err(AppError::Validation(
                "date_from must not be after date_to".to_owned(),
            ));
        }

        self.repository
            .list_entries(AuditLogQuery {
                limit: clamp_page_limit(query.limit),
                ..query
            })
            .await
    }
}
