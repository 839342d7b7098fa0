// libs/consultation-cell/src/services/mod.rs
pub mod booking;
pub mod decision;
