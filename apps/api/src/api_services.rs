mod database;
mod sessions;
mod state_builder;

pub use database::connect_and_migrate;
pub use sessions::build_postgres_session_layer;
#[cfg(test)]
pub(crate) use sessions::configure_session_layer;
pub use state_builder::{ServicePorts, build_app_state};
