pub mod auth;

pub use auth::{require_admin_key, require_purchase_key};
