// libs/account-cell/src/lib.rs
pub mod handlers;
pub mod models;
pub mod router;
pub mod services;

// Re-export the pieces other cells consume
pub use models::{AccountError, RegisterRole, UserRecord};
pub use services::account::AccountService;
