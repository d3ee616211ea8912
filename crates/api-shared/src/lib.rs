//! # API Shared
//!
//! Shared utilities and definitions for clindex APIs.
//!
//! Contains:
//! - Shared services like `HealthService`
//! - Bearer-token authentication usable by any API surface
//!
//! Used by `api-rest` and the `clindex-run` binary for common functionality.

pub mod auth;
pub mod health;

pub use auth::{AuthError, BearerTokens, TokenSpecError};
pub use health::{HealthRes, HealthService};
