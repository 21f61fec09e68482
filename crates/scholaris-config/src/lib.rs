//! # Scholaris Config
//!
//! Configuration structures loaded from environment variables. Every struct
//! exposes `from_env()` and falls back to development defaults when a
//! variable is missing or does not parse.
//!
//! - [`cors`]: allowed browser origins
//! - [`jwt`]: token signing secret and lifetimes
//! - [`library`]: loan period and overdue fine
//! - [`radio`]: radio schedule file and speech pacing
//! - [`rate_limit`]: governor buckets for general and auth routes
//! - [`server`]: bind address
//! - [`storage`]: upload directory and limits
//! - [`tally`]: accounting gateway endpoint
//!
//! ```ignore
//! use scholaris_config::{JwtConfig, ServerConfig};
//!
//! let jwt = JwtConfig::from_env();
//! let server = ServerConfig::from_env();
//! ```

use std::str::FromStr;

pub mod cors;
pub mod jwt;
pub mod library;
pub mod radio;
pub mod rate_limit;
pub mod server;
pub mod storage;
pub mod tally;

pub use cors::CorsConfig;
pub use jwt::JwtConfig;
pub use library::LibraryConfig;
pub use radio::RadioConfig;
pub use rate_limit::RateLimitConfig;
pub use server::ServerConfig;
pub use storage::StorageConfig;
pub use tally::TallyConfig;

/// Reads and parses an environment variable, falling back to `default`.
pub(crate) fn env_or<T: FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

pub(crate) fn env_string_or(key: &str, default: &str) -> String {
    std::env::var(key)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}
