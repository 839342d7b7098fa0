// libs/account-cell/src/services/mod.rs
pub mod account;
pub mod moderation;
