use std::env;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;

use kasira_core::AppError;
use tracing_subscriber::EnvFilter;

/// What the binary was asked to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiCommand {
    /// Run the HTTP server.
    Serve,
    /// Apply migrations and exit.
    Migrate,
    /// Provision the first owner account and exit.
    BootstrapOwner {
        /// Owner display name.
        display_name: String,
        /// Owner login email.
        email: String,
    },
}

impl ApiCommand {
    /// Parses the command from process arguments, without the program name.
    pub fn parse(mut args: impl Iterator<Item = String>) -> Result<Self, AppError> {
        match args.next().as_deref() {
            None | Some("serve") => Ok(Self::Serve),
            Some("migrate") => Ok(Self::Migrate),
            Some("bootstrap-owner") => {
                let (Some(display_name), Some(email)) = (args.next(), args.next()) else {
                    return Err(AppError::Validation(
                        "usage: kasira-api bootstrap-owner <display_name> <email>".to_owned(),
                    ));
                };
                Ok(Self::BootstrapOwner {
                    display_name,
                    email,
                })
            }
            Some(other) => Err(AppError::Validation(format!(
                "unknown command '{other}'; expected serve, migrate or bootstrap-owner"
            ))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub command: ApiCommand,
    pub database_url: String,
    pub frontend_url: String,
    pub api_host: String,
    pub api_port: u16,
    pub cookie_secure: bool,
    pub seed_default_roles: bool,
}

impl ApiConfig {
    pub fn load() -> Result<Self, AppError> {
        let command = ApiCommand::parse(env::args().skip(1))?;

        let database_url = required_env("DATABASE_URL")?;
        let frontend_url =
            env::var("FRONTEND_URL").unwrap_or_else(|_| "http://localhost:3000".to_owned());
        let api_host = env::var("API_HOST").unwrap_or_else(|_| "127.0.0.1".to_owned());
        let api_port = env::var("API_PORT")
            .ok()
            .and_then(|value| value.parse::<u16>().ok())
            .unwrap_or(3001);
        let cookie_secure = env_flag("SESSION_COOKIE_SECURE", false);
        let seed_default_roles = env_flag("SEED_DEFAULT_ROLES", true);

        Ok(Self {
            command,
            database_url,
            frontend_url,
            api_host,
            api_port,
            cookie_secure,
            seed_default_roles,
        })
    }

    pub fn socket_address(&self) -> Result<SocketAddr, AppError> {
        let host = IpAddr::from_str(&self.api_host).map_err(|error| {
            AppError::Internal(format!("invalid API_HOST '{}': {error}", self.api_host))
        })?;
        Ok(SocketAddr::from((host, self.api_port)))
    }
}

pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}

fn required_env(name: &str) -> Result<String, AppError> {
    let value = env::var(name).map_err(|_| AppError::Validation(format!("{name} is required")))?;
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!("{name} must not be empty")));
    }

    Ok(value)
}

fn env_flag(name: &str, default: bool) -> bool {
    env::var(name)
        .ok()
        .map(|value| parse_flag(&value))
        .unwrap_or(default)
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "true" | "1" | "yes"
    )
}
