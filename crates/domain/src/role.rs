use std::collections::BTreeSet;

use kasira_core::{AppResult, NonEmptyString};
use serde::{Deserialize, Serialize};

use crate::Permission;

/// Named bundle of permissions assignable as a primary or additional role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    name: NonEmptyString,
    permissions: BTreeSet<Permission>,
}

impl Role {
    /// Creates a role, normalizing the name to trimmed lowercase.
    pub fn new(
        name: impl Into<String>,
        permissions: impl IntoIterator<Item = Permission>,
    ) -> AppResult<Self> {
        let name = NonEmptyString::new(name.into().trim().to_lowercase())?;

        Ok(Self {
            name,
            permissions: permissions.into_iter().collect(),
        })
    }

    /// Returns the role name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Returns the role's grants.
    #[must_use]
    pub fn permissions(&self) -> &BTreeSet<Permission> {
        &self.permissions
    }
}

/// Roles seeded for a fresh shop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefaultRole {
    /// Shop owner; final approver of every pipeline.
    Owner,
    /// Store manager.
    Manager,
    /// Finance staff.
    Finance,
    /// Human resources.
    Hr,
    /// Floor staff.
    Staff,
}

impl DefaultRole {
    /// Returns every seeded role.
    #[must_use]
    pub fn all() -> &'static [Self] {
        &[
            Self::Owner,
            Self::Manager,
            Self::Finance,
            Self::Hr,
            Self::Staff,
        ]
    }

    /// Returns the stable role name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Owner => "owner",
            Self::Manager => "manager",
            Self::Finance => "finance",
            Self::Hr => "hr",
            Self::Staff => "staff",
        }
    }

    /// Returns the seeded grants for this role.
    #[must_use]
    pub fn permissions(&self) -> Vec<Permission> {
        match self {
            Self::Owner => Permission::all().to_vec(),
            Self::Manager => vec![
                Permission::ProductsView,
                Permission::PriceChangesRequest,
                Permission::EmployeesView,
                Permission::SuspensionRequest,
                Permission::SuspensionApproveManager,
                Permission::ApprovalsView,
            ],
            Self::Finance => vec![
                Permission::ProductsView,
                Permission::PriceChangesApproveFinance,
                Permission::ApprovalsView,
                Permission::AuditLogView,
            ],
            Self::Hr => vec![
                Permission::EmployeesView,
                Permission::EmployeesCreate,
                Permission::SuspensionRequest,
                Permission::ApprovalsView,
            ],
            Self::Staff => vec![Permission::ProductsView, Permission::PriceChangesRequest],
        }
    }

    /// Builds the role definition.
    pub fn definition(&self) -> AppResult<Role> {
        Role::new(self.as_str(), self.permissions())
    }
}
