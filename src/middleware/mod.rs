//! Middleware modules for request processing.
//!
//! - [`auth`]: bearer token extractor and permission-based extractors
//! - [`role`]: role parsing, hierarchy and role-gated router layers
//!
//! # Authentication Flow
//!
//! 1. Client sends request with `Authorization: Bearer <token>` header
//! 2. `AuthUser` extractor validates the JWT and extracts claims
//! 3. Permission extractors check the permission list carried in the token
//! 4. Handler executes if all checks pass
//!
//! ```ignore
//! use crate::middleware::auth::RequireHostelWrite;
//!
//! async fn allocate(RequireHostelWrite(auth_user): RequireHostelWrite) -> impl IntoResponse {
//!     // Only executes if the token carries "hostel:write"
//! }
//! ```

pub mod auth;
pub mod role;
