//! Row types and conversions shared by the PostgreSQL adapters.

use std::collections::BTreeSet;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use kasira_application::{AuditLogEntry, EmployeeCredentials};
use kasira_core::{AppError, AppResult, EmployeeId};
use kasira_domain::{
    AccountStatus, ApprovalPayload, ApprovalRequest, ApprovalRequestId, ApprovalStatus,
    AuditChanges, AuditEvent, AuditMetadata, AuditSubjectType, EmailAddress, Employee, Permission,
    Price, Principal, Product, ProductId, StageRecord, SubjectRef,
};
use sqlx::types::Json;
use sqlx::{FromRow, PgConnection};
use tracing::warn;
use uuid::Uuid;

#[derive(Debug, FromRow)]
pub(crate) struct EmployeeRow {
    pub id: i64,
    pub display_name: String,
    pub email: String,
    pub password_hash: String,
    pub account_status: String,
}

impl EmployeeRow {
    pub(crate) fn into_employee(self) -> AppResult<Employee> {
        Employee::new(
            EmployeeId::new(self.id),
            self.display_name,
            EmailAddress::new(self.email)?,
            AccountStatus::from_str(&self.account_status)?,
        )
    }

    pub(crate) fn into_credentials(self) -> AppResult<EmployeeCredentials> {
        let password_hash = self.password_hash.clone();
        Ok(EmployeeCredentials {
            employee: self.into_employee()?,
            password_hash,
        })
    }
}

#[derive(Debug, FromRow)]
pub(crate) struct ProductRow {
    pub id: i64,
    pub name: String,
    pub sku: String,
    pub price: i64,
}

impl ProductRow {
    pub(crate) fn into_product(self) -> AppResult<Product> {
        Product::new(
            ProductId::new(self.id),
            self.name,
            self.sku,
            Price::new(self.price)?,
        )
    }
}

#[derive(Debug, FromRow)]
pub(crate) struct ApprovalRequestRow {
    pub id: Uuid,
    pub subject_type: String,
    pub subject_id: i64,
    pub payload: Json<ApprovalPayload>,
    pub status: String,
    pub stage_history: Json<Vec<StageRecord>>,
    pub requested_by: i64,
    pub requested_at: DateTime<Utc>,
}

impl ApprovalRequestRow {
    pub(crate) fn into_request(self) -> AppResult<ApprovalRequest> {
        let subject = match AuditSubjectType::from_str(&self.subject_type)? {
            AuditSubjectType::Product => SubjectRef::Product(ProductId::new(self.subject_id)),
            AuditSubjectType::Employee => SubjectRef::Employee(EmployeeId::new(self.subject_id)),
            other => {
                return Err(AppError::Internal(format!(
                    "approval request '{}' has unsupported subject type '{}'",
                    self.id,
                    other.as_str()
                )));
            }
        };

        Ok(ApprovalRequest::restore(
            ApprovalRequestId::from_uuid(self.id),
            subject,
            self.payload.0,
            ApprovalStatus::from_str(&self.status)?,
            self.stage_history.0,
            EmployeeId::new(self.requested_by),
            self.requested_at,
        ))
    }
}

#[derive(Debug, FromRow)]
pub(crate) struct AuditLogRow {
    pub id: Uuid,
    pub event: String,
    pub subject_type: String,
    pub subject_id: String,
    pub causer_id: Option<i64>,
    pub changes: Json<AuditChanges>,
    pub ip: Option<String>,
    pub user_agent: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl AuditLogRow {
    pub(crate) fn into_entry(self) -> AppResult<AuditLogEntry> {
        Ok(AuditLogEntry {
            entry_id: self.id,
            event: AuditEvent::from_str(&self.event)?,
            subject_type: AuditSubjectType::from_str(&self.subject_type)?,
            subject_id: self.subject_id,
            causer_id: self.causer_id.map(EmployeeId::new),
            changes: self.changes.0,
            metadata: AuditMetadata {
                ip: self.ip,
                user_agent: self.user_agent,
            },
            created_at: self.created_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct EmployeeRoleRow {
    role_name: String,
    is_primary: bool,
}

/// Loads the authorization projection of an employee.
///
/// Returns `None` when the employee has no primary role.
pub(crate) async fn fetch_principal(
    connection: &mut PgConnection,
    employee_id: EmployeeId,
) -> AppResult<Option<Principal>> {
    let roles = sqlx::query_as::<_, EmployeeRoleRow>(
        r#"
        SELECT role_name, is_primary
        FROM employee_roles
        WHERE employee_id = $1
        ORDER BY is_primary DESC, role_name
        "#,
    )
    .bind(employee_id.as_i64())
    .fetch_all(&mut *connection)
    .await
    .map_err(|error| AppError::Internal(format!("failed to load employee roles: {error}")))?;

    let Some(primary_role) = roles
        .iter()
        .find(|row| row.is_primary)
        .map(|row| row.role_name.clone())
    else {
        return Ok(None);
    };
    let additional_roles: BTreeSet<String> = roles
        .into_iter()
        .filter(|row| !row.is_primary)
        .map(|row| row.role_name)
        .collect();

    let direct_names = sqlx::query_scalar::<_, String>(
        r#"
        SELECT permission
        FROM employee_direct_permissions
        WHERE employee_id = $1
        ORDER BY permission
        "#,
    )
    .bind(employee_id.as_i64())
    .fetch_all(&mut *connection)
    .await
    .map_err(|error| AppError::Internal(format!("failed to load direct permissions: {error}")))?;

    Ok(Some(Principal::new(
        employee_id,
        primary_role,
        additional_roles,
        parse_stored_permissions(direct_names),
    )))
}

/// Parses stored permission names, skipping names this build no longer knows.
pub(crate) fn parse_stored_permissions(names: Vec<String>) -> BTreeSet<Permission> {
    names
        .into_iter()
        .filter_map(|name| match Permission::from_str(&name) {
            Ok(permission) => Some(permission),
            Err(_) => {
                warn!(permission = name.as_str(), "ignoring unknown stored permission");
                None
            }
        })
        .collect()
}

/// Maps unique violations to `Conflict` and everything else to `Internal`.
pub(crate) fn map_unique_violation(error: sqlx::Error, conflict: &str, context: &str) -> AppError {
    if let sqlx::Error::Database(database_error) = &error
        && database_error.code().as_deref() == Some("23505")
    {
        return AppError::Conflict(conflict.to_owned());
    }

    AppError::Internal(format!("failed to {context}: {error}"))
}
