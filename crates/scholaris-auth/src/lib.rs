//! # Scholaris Auth
//!
//! JWT claim types and token helpers.
//!
//! - [`claims`]: access and refresh token claims
//! - [`jwt`]: token creation and verification
//!
//! ```ignore
//! use scholaris_auth::{create_access_token, verify_token, TokenSubject};
//!
//! let token = create_access_token(&subject, &jwt_config)?;
//! let claims = verify_token(&token, &jwt_config)?;
//! ```

pub mod claims;
pub mod jwt;

pub use claims::{Claims, RefreshTokenClaims};
pub use jwt::{
    TokenSubject, create_access_token, create_refresh_token, verify_refresh_token, verify_token,
};
