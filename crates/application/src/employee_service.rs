//! Employee provisioning, role assignment and password sign-in.

use std::collections::BTreeSet;
use std::sync::Arc;

use kasira_core::{AppError, AppResult, EmployeeId, UserIdentity};
use kasira_domain::{
    AuditChanges, AuditEvent, AuditMetadata, AuditSubjectType, DefaultRole, EmailAddress, Employee,
    Permission, Role,
};
use serde_json::{Value, json};
use tracing::info;

use crate::{
    Actor, AuditRecord, EmployeeRepository, NewEmployee, PasswordHasher, PrincipalRepository,
    TransactionalStore,
};

mod login;
mod temporary_password;

pub use login::LoginOutcome;

/// Input for provisioning an employee account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEmployeeInput {
    /// Display name.
    pub display_name: String,
    /// Login email.
    pub email: String,
    /// Primary role name.
    pub primary_role: String,
    /// Additional role names.
    pub additional_roles: Vec<String>,
}

/// Result of provisioning: the account plus its one-shot password.
#[derive(Debug, Clone)]
pub struct CreatedEmployee {
    /// Provisioned employee.
    pub employee: Employee,
    /// Temporary password. Only its hash is stored; it is never shown again.
    pub temporary_password: String,
}

/// Application service for employee accounts.
#[derive(Clone)]
pub struct EmployeeService {
    employee_repository: Arc<dyn EmployeeRepository>,
    principal_repository: Arc<dyn PrincipalRepository>,
    store: Arc<dyn TransactionalStore>,
    password_hasher: Arc<dyn PasswordHasher>,
}

impl EmployeeService {
    /// Creates a new employee service.
    #[must_use]
    pub fn new(
        employee_repository: Arc<dyn EmployeeRepository>,
        principal_repository: Arc<dyn PrincipalRepository>,
        store: Arc<dyn TransactionalStore>,
        password_hasher: Arc<dyn PasswordHasher>,
    ) -> Self {
        Self {
            employee_repository,
            principal_repository,
            store,
            password_hasher,
        }
    }

    /// Finds an employee.
    pub async fn find_employee(
        &self,
        actor: &Actor,
        employee_id: EmployeeId,
    ) -> AppResult<Employee> {
        if actor.employee_id() != employee_id {
            actor.require(Permission::EmployeesView)?;
        }

        self.employee_repository
            .find_employee(employee_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("employee '{employee_id}' not found")))
    }

    /// Provisions an employee and returns a one-shot temporary password.
    pub async fn create_employee(
        &self,
        actor: &Actor,
        input: NewEmployeeInput,
        metadata: AuditMetadata,
    ) -> AppResult<CreatedEmployee> {
        actor.require(Permission::EmployeesCreate)?;
        self.provision(Some(actor.employee_id()), input, metadata)
            .await
    }

    /// Creates the first owner account of an empty installation.
    pub async fn bootstrap_owner(
        &self,
        display_name: &str,
        email: &str,
    ) -> AppResult<CreatedEmployee> {
        if self.employee_repository.count_employees().await? > 0 {
            return Err(AppError::Conflict(
                "employees already exist; bootstrap is only allowed on an empty shop".to_owned(),
            ));
        }

        self.provision(
            None,
            NewEmployeeInput {
                display_name: display_name.to_owned(),
                email: email.to_owned(),
                primary_role: DefaultRole::Owner.as_str().to_owned(),
                additional_roles: Vec::new(),
            },
            AuditMetadata::default(),
        )
        .await
    }

    /// Replaces an employee's primary and additional roles.
    pub async fn assign_roles(
        &self,
        actor: &Actor,
        employee_id: EmployeeId,
        primary_role: &str,
        additional_roles: &[String],
        metadata: AuditMetadata,
    ) -> AppResult<()> {
        actor.require(Permission::EmployeesRolesManage)?;

        let roles = self.principal_repository.list_roles().await?;
        let (primary_role, additional_roles) =
            resolve_role_names(&roles, primary_role, additional_roles)?;

        let mut transaction = self.store.begin().await?;
        let principal = transaction
            .find_principal_for_update(employee_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("employee '{employee_id}' not found")))?;

        let before = role_snapshot(principal.primary_role(), principal.additional_roles());
        let after = role_snapshot(&primary_role, &additional_roles);
        let changes = AuditChanges::updated(&before, &after)?;
        if changes.is_empty() {
            return Ok(());
        }

        transaction
            .replace_roles(employee_id, &primary_role, &additional_roles)
            .await?;

        AuditRecord {
            event: AuditEvent::Updated,
            subject_type: AuditSubjectType::Principal,
            subject_id: employee_id.to_string(),
            causer_id: Some(actor.employee_id()),
            changes,
            metadata,
        }
        .write(transaction.as_mut())
        .await?;

        transaction.commit().await?;

        info!(
            employee_id = %employee_id,
            primary_role = primary_role.as_str(),
            causer_id = %actor.employee_id(),
            "employee roles reassigned"
        );

        Ok(())
    }

    async fn provision(
        &self,
        causer_id: Option<EmployeeId>,
        input: NewEmployeeInput,
        metadata: AuditMetadata,
    ) -> AppResult<CreatedEmployee> {
        let email = EmailAddress::new(input.email)?;
        if input.display_name.trim().is_empty() {
            return Err(AppError::Validation("display name must not be empty".to_owned()));
        }

        let roles = self.principal_repository.list_roles().await?;
        let (primary_role, additional_roles) =
            resolve_role_names(&roles, &input.primary_role, &input.additional_roles)?;

        if self
            .employee_repository
            .find_credentials_by_email(email.as_str())
            .await?
            .is_some()
        {
            return Err(AppError::Conflict(format!(
                "an employee with email '{}' already exists",
                email.as_str()
            )));
        }

        let temporary_password = temporary_password::generate()?;
        let password_hash = self.password_hasher.hash_password(&temporary_password)?;

        let mut transaction = self.store.begin().await?;
        let employee = transaction
            .insert_employee(NewEmployee {
                display_name: input.display_name.trim().to_owned(),
                email,
                password_hash,
                primary_role: primary_role.clone(),
                additional_roles: additional_roles.clone(),
            })
            .await?;

        let mut snapshot = employee.audit_snapshot();
        if let (Value::Object(fields), Value::Object(role_fields)) =
            (&mut snapshot, role_snapshot(&primary_role, &additional_roles))
        {
            fields.extend(role_fields);
        }

        AuditRecord {
            event: AuditEvent::Created,
            subject_type: AuditSubjectType::Employee,
            subject_id: employee.id().to_string(),
            causer_id,
            changes: AuditChanges::created(&snapshot)?,
            metadata,
        }
        .write(transaction.as_mut())
        .await?;

        transaction.commit().await?;

        info!(
            employee_id = %employee.id(),
            primary_role = primary_role.as_str(),
            "employee provisioned"
        );

        Ok(CreatedEmployee {
            employee,
            temporary_password,
        })
    }

    fn identity(employee: &Employee) -> UserIdentity {
        UserIdentity::new(
            employee.id(),
            employee.display_name(),
            employee.email().as_str(),
        )
    }
}

fn resolve_role_names(
    roles: &[Role],
    primary_role: &str,
    additional_roles: &[String],
) -> AppResult<(String, BTreeSet<String>)> {
    let known = |name: &str| -> AppResult<String> {
        let name = name.trim().to_lowercase();
        if roles.iter().any(|role| role.name() == name) {
            Ok(name)
        } else {
            Err(AppError::Validation(format!("unknown role '{name}'")))
        }
    };

    let primary_role = known(primary_role)?;
    let additional_roles = additional_roles
        .iter()
        .map(|name| known(name))
        .filter(|name| !matches!(name, Ok(name) if name == &primary_role))
        .collect::<AppResult<BTreeSet<_>>>()?;

    Ok((primary_role, additional_roles))
}

fn role_snapshot(primary_role: &str, additional_roles: &BTreeSet<String>) -> Value {
    json!({
        "primary_role": primary_role,
        "additional_roles": additional_roles.iter().collect::<Vec<_>>(),
    })
}
