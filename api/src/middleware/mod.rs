mod auth;
mod rbac;

pub use auth::authenticate_jwt;
pub use rbac::{ensure_admin, ensure_logged_in, ensure_user_or_admin};
