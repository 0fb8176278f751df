use std::collections::BTreeMap;
use std::str::FromStr;

use kasira_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Kind of tracked mutation or decision recorded in the audit log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditEvent {
    /// A tracked entity was created.
    Created,
    /// A tracked entity was updated.
    Updated,
    /// A tracked entity was deleted.
    Deleted,
    /// A pipeline stage approved a request.
    Approved,
    /// A pipeline stage rejected a request.
    Rejected,
}

impl AuditEvent {
    /// Returns a stable storage value for this event.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Updated => "updated",
            Self::Deleted => "deleted",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }
}

impl FromStr for AuditEvent {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "created" => Ok(Self::Created),
            "updated" => Ok(Self::Updated),
            "deleted" => Ok(Self::Deleted),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            _ => Err(AppError::Validation(format!("unknown audit event '{value}'"))),
        }
    }
}

/// Kind of entity an audit entry is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditSubjectType {
    /// Product catalog entry.
    Product,
    /// Employee account.
    Employee,
    /// Authorization projection of an employee.
    Principal,
    /// Approval pipeline request.
    ApprovalRequest,
}

impl AuditSubjectType {
    /// Returns a stable storage value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Product => "product",
            Self::Employee => "employee",
            Self::Principal => "principal",
            Self::ApprovalRequest => "approval_request",
        }
    }
}

impl FromStr for AuditSubjectType {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "product" => Ok(Self::Product),
            "employee" => Ok(Self::Employee),
            "principal" => Ok(Self::Principal),
            "approval_request" => Ok(Self::ApprovalRequest),
            _ => Err(AppError::Validation(format!(
                "unknown audit subject type '{value}'"
            ))),
        }
    }
}

/// Old and new value of one audited field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldChange {
    /// Value before the mutation; absent for creations.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old: Option<Value>,
    /// Value after the mutation; absent for deletions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new: Option<Value>,
}

/// Field-level audit diff keyed by field name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AuditChanges(BTreeMap<String, FieldChange>);

impl AuditChanges {
    /// Records every attribute of a new entity as "new".
    pub fn created(attributes: &Value) -> AppResult<Self> {
        let attributes = as_object(attributes, "created")?;
        Ok(Self(
            attributes
                .iter()
                .map(|(field, value)| {
                    (
                        field.clone(),
                        FieldChange {
                            old: None,
                            new: Some(value.clone()),
                        },
                    )
                })
                .collect(),
        ))
    }

    /// Records the final snapshot of a deleted entity as "old".
    pub fn deleted(snapshot: &Value) -> AppResult<Self> {
        let snapshot = as_object(snapshot, "deleted")?;
        Ok(Self(
            snapshot
                .iter()
                .map(|(field, value)| {
                    (
                        field.clone(),
                        FieldChange {
                            old: Some(value.clone()),
                            new: None,
                        },
                    )
                })
                .collect(),
        ))
    }

    /// Computes the field-level diff between pre- and post-images.
    ///
    /// Unchanged fields are omitted. A field missing on one side is recorded
    /// without that side.
    pub fn updated(before: &Value, after: &Value) -> AppResult<Self> {
        let before = as_object(before, "updated")?;
        let after = as_object(after, "updated")?;

        let mut changes = BTreeMap::new();
        for field in before.keys().chain(after.keys()) {
            if changes.contains_key(field) {
                continue;
            }
            let old = before.get(field);
            let new = after.get(field);
            if old != new {
                changes.insert(
                    field.clone(),
                    FieldChange {
                        old: old.cloned(),
                        new: new.cloned(),
                    },
                );
            }
        }

        Ok(Self(changes))
    }

    /// Records a single field transition.
    #[must_use]
    pub fn single(field: impl Into<String>, old: Value, new: Value) -> Self {
        Self(BTreeMap::from([(
            field.into(),
            FieldChange {
                old: Some(old),
                new: Some(new),
            },
        )]))
    }

    /// Returns whether no field changed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the change recorded for a field.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&FieldChange> {
        self.0.get(field)
    }

    /// Returns every recorded field change.
    #[must_use]
    pub fn fields(&self) -> &BTreeMap<String, FieldChange> {
        &self.0
    }
}

/// Request context captured with an audit entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditMetadata {
    /// Client address, if known.
    pub ip: Option<String>,
    /// Client user agent, if known.
    pub user_agent: Option<String>,
}

fn as_object<'a>(value: &'a Value, event: &str) -> AppResult<&'a Map<String, Value>> {
    value.as_object().ok_or_else(|| {
        AppError::Validation(format!(
            "audit '{event}' image must be a JSON object, got {value}"
        ))
    })
}
