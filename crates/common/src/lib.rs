//! Shared utilities, configuration, and error handling for Gatehouse
//!
//! This crate provides common functionality used across the Gatehouse
//! application:
//! - Configuration management following 12-factor principles
//! - The shared API error envelope
//! - Input validation helpers

pub mod config;
pub mod error;
pub mod validation;

pub use config::Config;
pub use error::envelope;
pub use validation::is_valid_email;
