mod password;
mod session;
mod session_helpers;

pub use password::login_handler;
pub use session::{logout_handler, me_handler};
pub(crate) use session_helpers::extract_request_context;

pub const SESSION_USER_KEY: &str = "user_identity";
