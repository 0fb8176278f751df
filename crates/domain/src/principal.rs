//! Principal authorization projection and effective permission resolution.
//!
//! Effective permissions are the union of the primary role, every
//! additional role and the direct-grant overlay. Role-derived permissions
//! can never be masked by the overlay.

use std::collections::BTreeSet;

use kasira_core::EmployeeId;
use serde::{Deserialize, Serialize};

use crate::{Permission, Role};

/// Authorization view of an employee.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    id: EmployeeId,
    primary_role: String,
    additional_roles: BTreeSet<String>,
    direct_permissions: BTreeSet<Permission>,
}

impl Principal {
    /// Creates a principal projection.
    #[must_use]
    pub fn new(
        id: EmployeeId,
        primary_role: impl Into<String>,
        additional_roles: impl IntoIterator<Item = String>,
        direct_permissions: impl IntoIterator<Item = Permission>,
    ) -> Self {
        Self {
            id,
            primary_role: primary_role.into(),
            additional_roles: additional_roles.into_iter().collect(),
            direct_permissions: direct_permissions.into_iter().collect(),
        }
    }

    /// Returns the principal identifier.
    #[must_use]
    pub fn id(&self) -> EmployeeId {
        self.id
    }

    /// Returns the primary role name.
    #[must_use]
    pub fn primary_role(&self) -> &str {
        self.primary_role.as_str()
    }

    /// Returns additional role names.
    #[must_use]
    pub fn additional_roles(&self) -> &BTreeSet<String> {
        &self.additional_roles
    }

    /// Returns the stored direct-grant overlay.
    #[must_use]
    pub fn direct_permissions(&self) -> &BTreeSet<Permission> {
        &self.direct_permissions
    }

    /// Returns the primary role followed by additional roles.
    pub fn role_names(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.primary_role.as_str())
            .chain(self.additional_roles.iter().map(String::as_str))
    }

    /// Returns a copy with a replaced direct-grant overlay.
    #[must_use]
    pub fn with_direct_permissions(mut self, direct_permissions: BTreeSet<Permission>) -> Self {
        self.direct_permissions = direct_permissions;
        self
    }
}

/// Effective permissions split by source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffectivePermissions {
    role_derived: BTreeSet<Permission>,
    direct: BTreeSet<Permission>,
}

impl EffectivePermissions {
    /// Resolves effective permissions from the principal and role definitions.
    ///
    /// Roles not referenced by the principal are ignored, so callers may pass
    /// the whole role catalog.
    #[must_use]
    pub fn resolve(principal: &Principal, roles: &[Role]) -> Self {
        let assigned: BTreeSet<&str> = principal.role_names().collect();
        let role_derived: BTreeSet<Permission> = roles
            .iter()
            .filter(|role| assigned.contains(role.name()))
            .flat_map(|role| role.permissions().iter().copied())
            .collect();
        let direct = principal
            .direct_permissions()
            .difference(&role_derived)
            .copied()
            .collect();

        Self {
            role_derived,
            direct,
        }
    }

    /// Returns permissions granted through roles.
    #[must_use]
    pub fn role_derived(&self) -> &BTreeSet<Permission> {
        &self.role_derived
    }

    /// Returns direct grants not already covered by a role.
    #[must_use]
    pub fn direct(&self) -> &BTreeSet<Permission> {
        &self.direct
    }

    /// Returns whether the permission is granted from any source.
    #[must_use]
    pub fn contains(&self, permission: Permission) -> bool {
        self.role_derived.contains(&permission) || self.direct.contains(&permission)
    }

    /// Returns the union of both sources.
    #[must_use]
    pub fn all(&self) -> BTreeSet<Permission> {
        self.role_derived.union(&self.direct).copied().collect()
    }
}

/// Change set computed for a direct-grant sync.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirectPermissionDiff {
    /// Grants to add to the overlay.
    pub additions: BTreeSet<Permission>,
    /// Grants to remove from the overlay.
    pub removals: BTreeSet<Permission>,
}

impl DirectPermissionDiff {
    /// Computes the overlay change that makes `direct` equal `desired - role_derived`.
    ///
    /// Role-derived entries are dropped from both sides: adding them is
    /// redundant and removing them is impossible through this path.
    #[must_use]
    pub fn compute(effective: &EffectivePermissions, desired: &BTreeSet<Permission>) -> Self {
        let additions = desired
            .iter()
            .filter(|permission| {
                !effective.role_derived.contains(permission)
                    && !effective.direct.contains(permission)
            })
            .copied()
            .collect();
        let removals = effective.direct.difference(desired).copied().collect();

        Self {
            additions,
            removals,
        }
    }

    /// Returns whether the diff changes nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.additions.is_empty() && self.removals.is_empty()
    }

    /// Applies the diff to a stored overlay.
    #[must_use]
    pub fn apply_to(&self, current: &BTreeSet<Permission>) -> BTreeSet<Permission> {
        current
            .union(&self.additions)
            .filter(|permission| !self.removals.contains(permission))
            .copied()
            .collect()
    }
}
