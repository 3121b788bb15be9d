//! Shared types, errors, and configuration for commonfee.
//!
//! This crate provides common types used across all other crates:
//! - Currency and decimal rounding helpers
//! - Typed IDs for type-safe entity references
//! - Application-wide error types
//! - Configuration management

pub mod config;
pub mod error;
pub mod types;

pub use config::{AppConfig, EngineConfig};
pub use error::{AppError, AppResult};
