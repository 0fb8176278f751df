use tracing::{info, warn};

use super::*;

/// Result of a sign-in attempt.
#[derive(Debug)]
pub enum LoginOutcome {
    /// Credentials matched an active account.
    Authenticated(UserIdentity),
    /// Sign-in failed. No reason is given to avoid account enumeration.
    Failed,
}

impl EmployeeService {
    /// Authenticates an employee with email and password.
    ///
    /// Unknown emails, wrong passwords and suspended accounts all return
    /// `LoginOutcome::Failed`.
    pub async fn login(&self, email: &str, password: &str) -> AppResult<LoginOutcome> {
        let normalized = email.trim().to_lowercase();
        let Some(credentials) = self
            .employee_repository
            .find_credentials_by_email(&normalized)
            .await?
        else {
            // Hash anyway so unknown emails take as long as wrong passwords.
            let _ = self.password_hasher.hash_password(password);
            return Ok(LoginOutcome::Failed);
        };

        let password_valid = self
            .password_hasher
            .verify_password(password, &credentials.password_hash)?;
        if !password_valid {
            warn!(employee_id = %credentials.employee.id(), "login rejected: invalid password");
            return Ok(LoginOutcome::Failed);
        }

        if !credentials.employee.is_active() {
            warn!(employee_id = %credentials.employee.id(), "login rejected: account suspended");
            return Ok(LoginOutcome::Failed);
        }

        info!(employee_id = %credentials.employee.id(), "employee signed in");
        Ok(LoginOutcome::Authenticated(Self::identity(&credentials.employee)))
    }
}
