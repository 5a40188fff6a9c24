//! Shared types, errors, and configuration for E-Finance.
//!
//! This crate provides common types used across all other crates:
//! - Money helpers with decimal precision
//! - Typed IDs for type-safe entity references
//! - Pagination types for list endpoints
//! - Application-wide error types
//! - Configuration management
//! - JWT issuing/validation and transactional email

pub mod auth;
pub mod config;
pub mod email;
pub mod error;
pub mod jwt;
pub mod types;

pub use auth::{Claims, TokenKind, TokenPair};
pub use config::{AppConfig, EmailConfig, JwtConfig};
pub use email::{EmailError, EmailService};
pub use error::{AppError, AppResult};
pub use jwt::{JwtError, JwtService};
