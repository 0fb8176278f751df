use std::collections::{BTreeMap, BTreeSet};
use std::str::FromStr;

use kasira_core::AppError;
use serde::{Deserialize, Serialize};

/// Permissions enforced by application policy checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    /// Allows reading product data.
    ProductsView,
    /// Allows creating products and editing their non-price attributes.
    ProductsManage,
    /// Allows submitting price-change requests.
    PriceChangesRequest,
    /// Allows acting on the finance stage of a price change.
    PriceChangesApproveFinance,
    /// Allows acting on the owner stage of a price change.
    PriceChangesApproveOwner,
    /// Allows reading employee data.
    EmployeesView,
    /// Allows provisioning employee accounts.
    EmployeesCreate,
    /// Allows changing primary and additional roles of employees.
    EmployeesRolesManage,
    /// Allows submitting account suspension requests.
    SuspensionRequest,
    /// Allows acting on the manager stage of a suspension.
    SuspensionApproveManager,
    /// Allows acting on the owner stage of a suspension.
    SuspensionApproveOwner,
    /// Allows reading approval requests.
    ApprovalsView,
    /// Allows editing direct permission grants.
    PermissionsManage,
    /// Allows reading audit log entries.
    AuditLogView,
}

impl Permission {
    /// Returns a stable storage value for this permission.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ProductsView => "products.view",
            Self::ProductsManage => "products.manage",
            Self::PriceChangesRequest => "price_changes.request",
            Self::PriceChangesApproveFinance => "price_changes.approve_finance",
            Self::PriceChangesApproveOwner => "price_changes.approve_owner",
            Self::EmployeesView => "employees.view",
            Self::EmployeesCreate => "employees.create",
            Self::EmployeesRolesManage => "employees.roles.manage",
            Self::SuspensionRequest => "employees.suspension.request",
            Self::SuspensionApproveManager => "employees.suspension.approve_manager",
            Self::SuspensionApproveOwner => "employees.suspension.approve_owner",
            Self::ApprovalsView => "approvals.view",
            Self::PermissionsManage => "permissions.manage",
            Self::AuditLogView => "audit_log.view",
        }
    }

    /// Returns the catalog module this permission is grouped under.
    #[must_use]
    pub fn module(&self) -> &'static str {
        match self {
            Self::ProductsView | Self::ProductsManage => "products",
            Self::PriceChangesRequest
            | Self::PriceChangesApproveFinance
            | Self::PriceChangesApproveOwner => "price_changes",
            Self::EmployeesView | Self::EmployeesCreate | Self::EmployeesRolesManage => {
                "employees"
            }
            Self::SuspensionRequest
            | Self::SuspensionApproveManager
            | Self::SuspensionApproveOwner => "suspensions",
            Self::ApprovalsView => "approvals",
            Self::PermissionsManage | Self::AuditLogView => "security",
        }
    }

    /// Returns all known permissions.
    #[must_use]
    pub fn all() -> &'static [Self] {
        const ALL: &[Permission] = &[
            Permission::ProductsView,
            Permission::ProductsManage,
            Permission::PriceChangesRequest,
            Permission::PriceChangesApproveFinance,
            Permission::PriceChangesApproveOwner,
            Permission::EmployeesView,
            Permission::EmployeesCreate,
            Permission::EmployeesRolesManage,
            Permission::SuspensionRequest,
            Permission::SuspensionApproveManager,
            Permission::SuspensionApproveOwner,
            Permission::ApprovalsView,
            Permission::PermissionsManage,
            Permission::AuditLogView,
        ];

        ALL
    }

    /// Parses a transport value into a permission.
    pub fn from_transport(value: &str) -> Result<Self, AppError> {
        Self::from_str(value)
    }
}

impl FromStr for Permission {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::all()
            .iter()
            .copied()
            .find(|permission| permission.as_str() == value)
            .ok_or_else(|| AppError::Validation(format!("unknown permission value '{value}'")))
    }
}

/// Permission names grouped by module, used to render management screens and
/// to validate permission names on write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermissionCatalog {
    grouped: BTreeMap<&'static str, Vec<Permission>>,
}

impl PermissionCatalog {
    /// Builds the catalog from every known permission.
    #[must_use]
    pub fn standard() -> Self {
        let mut grouped: BTreeMap<&'static str, Vec<Permission>> = BTreeMap::new();
        for permission in Permission::all() {
            grouped
                .entry(permission.module())
                .or_default()
                .push(*permission);
        }

        Self { grouped }
    }

    /// Returns every permission in catalog order.
    #[must_use]
    pub fn all(&self) -> Vec<Permission> {
        self.grouped.values().flatten().copied().collect()
    }

    /// Returns permissions keyed by module name.
    #[must_use]
    pub fn grouped(&self) -> &BTreeMap<&'static str, Vec<Permission>> {
        &self.grouped
    }

    /// Validates a list of transport names against the catalog.
    pub fn parse_names<S: AsRef<str>>(
        &self,
        names: &[S],
    ) -> Result<BTreeSet<Permission>, AppError> {
        names
            .iter()
            .map(|name| Permission::from_transport(name.as_ref()))
            .collect()
    }
}

impl Default for PermissionCatalog {
    fn default() -> Self {
        Self::standard()
    }
}
