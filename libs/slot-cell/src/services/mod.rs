pub mod conflict;
pub mod slot;
pub mod validation;
