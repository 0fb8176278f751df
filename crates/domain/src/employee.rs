//! Employee account types.

use std::str::FromStr;

use kasira_core::{AppError, AppResult, EmployeeId, NonEmptyString};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// Validated email address.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EmailAddress(String);

impl EmailAddress {
    /// Creates a validated email address.
    ///
    /// Performs basic structural validation: non-empty, exactly one `@`,
    /// non-empty local part and a domain containing at least one `.`.
    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        let value = value.into();
        let trimmed = value.trim().to_lowercase();

        if trimmed.is_empty() {
            return Err(AppError::Validation(
                "email address must not be empty".to_owned(),
            ));
        }

        let Some((local, domain)) = trimmed.split_once('@') else {
            return Err(AppError::Validation(
                "email address must contain exactly one '@'".to_owned(),
            ));
        };

        if local.is_empty() || domain.contains('@') {
            return Err(AppError::Validation(
                "email address must contain exactly one '@' and a local part".to_owned(),
            ));
        }

        if domain.is_empty() || !domain.contains('.') {
            return Err(AppError::Validation(
                "email domain must contain at least one '.'".to_owned(),
            ));
        }

        if trimmed.len() > 254 {
            return Err(AppError::Validation(
                "email address must not exceed 254 characters".to_owned(),
            ));
        }

        Ok(Self(trimmed))
    }

    /// Returns the validated email string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

/// Login state of an employee account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountStatus {
    /// Account may sign in and act.
    Active,
    /// Account is blocked.
    Suspended,
}

impl AccountStatus {
    /// Returns a stable storage value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Suspended => "suspended",
        }
    }
}

impl FromStr for AccountStatus {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "active" => Ok(Self::Active),
            "suspended" => Ok(Self::Suspended),
            _ => Err(AppError::Validation(format!(
                "unknown account status '{value}'"
            ))),
        }
    }
}

/// Employee account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Employee {
    id: EmployeeId,
    display_name: NonEmptyString,
    email: EmailAddress,
    account_status: AccountStatus,
}

impl Employee {
    /// Creates a validated employee.
    pub fn new(
        id: EmployeeId,
        display_name: impl Into<String>,
        email: EmailAddress,
        account_status: AccountStatus,
    ) -> AppResult<Self> {
        Ok(Self {
            id,
            display_name: NonEmptyString::new(display_name)?,
            email,
            account_status,
        })
    }

    /// Returns the employee identifier.
    #[must_use]
    pub fn id(&self) -> EmployeeId {
        self.id
    }

    /// Returns the display name.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.display_name.as_str()
    }

    /// Returns the login email.
    #[must_use]
    pub fn email(&self) -> &EmailAddress {
        &self.email
    }

    /// Returns the account status.
    #[must_use]
    pub fn account_status(&self) -> AccountStatus {
        self.account_status
    }

    /// Returns whether the account may act.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.account_status == AccountStatus::Active
    }

    /// Returns a copy with another account status.
    #[must_use]
    pub fn with_account_status(mut self, account_status: AccountStatus) -> Self {
        self.account_status = account_status;
        self
    }

    /// Returns the audited attribute set.
    #[must_use]
    pub fn audit_snapshot(&self) -> Value {
        json!({
            "display_name": self.display_name(),
            "email": self.email.as_str(),
            "account_status": self.account_status.as_str(),
        })
    }
}
