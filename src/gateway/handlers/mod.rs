//! Request handlers, grouped by concern

pub mod admin;
pub mod health;
pub mod orders;
pub mod transfer;
pub mod wallet;
