//! # Scholaris Core
//!
//! Core types, errors, and utilities for the Scholaris API.
//!
//! This crate provides foundational types used throughout the application:
//!
//! - [`errors`]: Application error type with HTTP response conversion
//! - [`file_storage`]: Storage backend abstraction for uploaded files
//! - [`pagination`]: Pagination utilities for API responses
//! - [`password`]: Password hashing and verification
//! - [`permissions`]: Permission constants and the role to permission table
//! - [`serde`]: Custom serde deserialization helpers for query strings
//!
//! # Example
//!
//! ```ignore
//! use scholaris_core::errors::AppError;
//! use scholaris_core::pagination::PaginationParams;
//! use scholaris_core::password::{hash_password, verify_password};
//!
//! let error = AppError::not_found(anyhow::anyhow!("Student not found"));
//! let hash = hash_password("secure_password")?;
//! let limit = PaginationParams::default().limit();
//! ```

pub mod errors;
pub mod file_storage;
pub mod pagination;
pub mod password;
pub mod permissions;
pub mod serde;

pub use errors::AppError;
pub use pagination::{PaginationMeta, PaginationParams};
pub use password::{hash_password, verify_password};
