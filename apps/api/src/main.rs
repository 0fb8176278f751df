//! Kasira back-office API composition root.

#![forbid(unsafe_code)]

mod api_config;
mod api_router;
mod api_services;
mod auth;
mod dto;
mod error;
mod handlers;
mod middleware;
mod state;

use kasira_core::AppError;
use tracing::info;

use crate::api_config::{ApiCommand, ApiConfig, init_tracing};
use crate::api_router::build_router;
use crate::api_services::{
    ServicePorts, build_app_state, build_postgres_session_layer, connect_and_migrate,
};

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = ApiConfig::load()?;
    let pool = connect_and_migrate(&config.database_url).await?;

    if config.command == ApiCommand::Migrate {
        info!("database migrations applied successfully");
        return Ok(());
    }

    let app_state = build_app_state(
        ServicePorts::postgres(&pool),
        &config.frontend_url,
        Some(pool.clone()),
    );

    if config.seed_default_roles {
        app_state
            .authorization_service
            .ensure_default_roles()
            .await?;
    }

    if let ApiCommand::BootstrapOwner {
        display_name,
        email,
    } = &config.command
    {
        let created = app_state
            .employee_service
            .bootstrap_owner(display_name, email)
            .await?;
        info!(employee_id = %created.employee.id(), "owner account provisioned");
        println!(
            "owner {} created; temporary password: {}",
            created.employee.email().as_str(),
            created.temporary_password
        );
        return Ok(());
    }

    let session_layer = build_postgres_session_layer(pool, config.cookie_secure).await?;
    let app = build_router(app_state, session_layer)?;

    let address = config.socket_address()?;
    let listener = tokio::net::TcpListener::bind(address)
        .await
        .map_err(|error| AppError::Internal(format!("failed to bind listener: {error}")))?;

    info!(%address, "kasira-api listening");

    axum::serve(listener, app)
        .await
        .map_err(|error| AppError::Internal(format!("api server error: {error}")))
}
