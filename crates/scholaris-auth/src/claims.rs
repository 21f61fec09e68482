//! JWT claim structures.
//!
//! - [`Claims`]: access token claims carrying role, school scope and permissions
//! - [`RefreshTokenClaims`]: long-lived token used only to mint new access tokens

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Access token claims.
///
/// `school_id` is `None` only for the global `admin` role. `permissions`
/// are resolved from the role at login so request handling never needs a
/// database round trip for authorization.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Claims {
    /// User ID (subject claim)
    pub sub: String,
    pub email: String,
    /// Role name, one of the `user_role` enum values
    pub role: String,
    pub school_id: Option<Uuid>,
    pub permissions: Vec<String>,
    /// Expiration (Unix timestamp)
    pub exp: usize,
    /// Issued at (Unix timestamp)
    pub iat: usize,
}

/// Refresh token claims.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshTokenClaims {
    pub sub: String,
    pub email: String,
    pub exp: usize,
    pub iat: usize,
    /// Unique token identifier so two refresh tokens issued in the same
    /// second still differ.
    pub jti: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_claims_roundtrip_through_json() {
        let school_id = Uuid::new_v4();
        let claims = Claims {
            sub: "user-1".to_string(),
            email: "teacher@school.test".to_string(),
            role: "teacher".to_string(),
            school_id: Some(school_id),
            permissions: vec!["attendance:mark".to_string()],
            exp: 2,
            iat: 1,
        };
        let json = serde_json::to_string(&claims).unwrap();
        assert!(json.contains(r#""role":"teacher""#));

        let back: Claims = serde_json::from_str(&json).unwrap();
        assert_eq!(back.school_id, Some(school_id));
        assert_eq!(back.permissions, vec!["attendance:mark"]);
    }

    #[test]
    fn test_refresh_claims_do_not_parse_as_access_claims() {
        let json = r#"{"sub":"u","email":"e@x.test","exp":2,"iat":1,"jti":"j"}"#;
        assert!(serde_json::from_str::<Claims>(json).is_err());
        assert!(serde_json::from_str::<RefreshTokenClaims>(json).is_ok());
    }
}
