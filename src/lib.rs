// Public API for integration tests and library usage

pub mod aggregate;
pub mod config;
pub mod error;
pub mod phase;
pub mod profile;
pub mod questions;
pub mod scoring;
pub mod session;
pub mod store;
pub mod types;
