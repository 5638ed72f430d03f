pub mod auth;

pub use auth::{issue_token, require_admin, require_user, Claims};
