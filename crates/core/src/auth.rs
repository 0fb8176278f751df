use serde::{Deserialize, Serialize};

use crate::EmployeeId;

/// User information persisted in the authenticated session.
///
/// Only the identity is stored; roles and grants are re-read on every request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    employee_id: EmployeeId,
    display_name: String,
    email: String,
}

impl UserIdentity {
    /// Creates a user identity for an authenticated employee.
    #[must_use]
    pub fn new(
        employee_id: EmployeeId,
        display_name: impl Into<String>,
        email: impl Into<String>,
    ) -> Self {
        Self {
            employee_id,
            display_name: display_name.into(),
            email: email.into(),
        }
    }

    /// Returns the employee identifier of the signed-in principal.
    #[must_use]
    pub fn employee_id(&self) -> EmployeeId {
        self.employee_id
    }

    /// Returns the display name for the current user.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.display_name.as_str()
    }

    /// Returns the login email.
    #[must_use]
    pub fn email(&self) -> &str {
        self.email.as_str()
    }
}
