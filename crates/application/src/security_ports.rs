mod audit;
mod principals;

pub use audit::{AuditLogEntry, AuditLogQuery, AuditLogRepository};
pub use principals::PrincipalRepository;
