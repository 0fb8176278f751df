use kasira_application::AuditLogEntry;
use kasira_core::AppError;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Query string of the audit log listing.
#[derive(Debug, Default, Deserialize)]
pub struct AuditLogParams {
    pub date_from: Option<String>,
    pub date_to: Option<String>,
    pub event: Option<String>,
    pub subject_type: Option<String>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

/// API representation of one audit entry.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/audit-log-entry-response.ts"
)]
pub struct AuditLogEntryResponse {
    pub entry_id: String,
    pub event: String,
    pub subject_type: String,
    pub subject_id: String,
    pub causer_id: Option<i64>,
    #[ts(type = "Record<string, unknown>")]
    pub changes: serde_json::Value,
    pub ip: Option<String>,
    pub user_agent: Option<String>,
    pub created_at: String,
}

impl TryFrom<AuditLogEntry> for AuditLogEntryResponse {
    type Error = AppError;

    fn try_from(entry: AuditLogEntry) -> Result<Self, Self::Error> {
        let changes = serde_json::to_value(&entry.changes).map_err(|error| {
            AppError::Internal(format!("failed to serialize audit changes: {error}"))
        })?;

        Ok(Self {
            entry_id: entry.entry_id.to_string(),
            event: entry.event.as_str().to_owned(),
            subject_type: entry.subject_type.as_str().to_owned(),
            subject_id: entry.subject_id,
            causer_id: entry.causer_id.map(|causer_id| causer_id.as_i64()),
            changes,
            ip: entry.metadata.ip,
            user_agent: entry.metadata.user_agent,
            created_at: entry.created_at.to_rfc3339(),
        })
    }
}
