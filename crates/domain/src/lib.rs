//! Domain entities and invariants.

#![forbid(unsafe_code)]

mod approval;
mod audit;
mod employee;
mod pipeline;
mod principal;
mod product;
mod role;
mod security;

pub use approval::{
    AccountAction, ApprovalPayload, ApprovalRequest, ApprovalRequestId, ApprovalStatus, Decision,
    StageRecord, SubjectRef, WorkflowType,
};
pub use audit::{AuditChanges, AuditEvent, AuditMetadata, AuditSubjectType, FieldChange};
pub use employee::{AccountStatus, EmailAddress, Employee};
pub use pipeline::{PipelineDefinition, Stage, StageOutcome, StageProgress};
pub use principal::{DirectPermissionDiff, EffectivePermissions, Principal};
pub use product::{Price, Product, ProductId};
pub use role::{DefaultRole, Role};
pub use security::{Permission, PermissionCatalog};
