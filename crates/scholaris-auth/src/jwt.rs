//! Token creation and verification.
//!
//! Access tokens embed everything authorization needs (role, school scope,
//! permissions). Refresh tokens only identify the user; the permission set is
//! recomputed from the current database row when they are exchanged.

use chrono::Utc;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use uuid::Uuid;

use scholaris_config::JwtConfig;
use scholaris_core::AppError;
use scholaris_core::permissions::permissions_for_role;

use crate::claims::{Claims, RefreshTokenClaims};

/// Identity a token is issued for.
#[derive(Debug, Clone)]
pub struct TokenSubject<'a> {
    pub user_id: Uuid,
    pub email: &'a str,
    pub role: &'a str,
    pub school_id: Option<Uuid>,
}

fn now() -> usize {
    Utc::now().timestamp() as usize
}

fn expires_at(iat: usize, lifetime_secs: i64) -> usize {
    (iat as i64 + lifetime_secs).max(0) as usize
}

pub fn create_access_token(
    subject: &TokenSubject<'_>,
    jwt_config: &JwtConfig,
) -> Result<String, AppError> {
    let iat = now();
    let claims = Claims {
        sub: subject.user_id.to_string(),
        email: subject.email.to_string(),
        role: subject.role.to_string(),
        school_id: subject.school_id,
        permissions: permissions_for_role(subject.role),
        exp: expires_at(iat, jwt_config.access_token_expiry),
        iat,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(jwt_config.secret.as_bytes()),
    )
    .map_err(|e| AppError::internal(anyhow::anyhow!("Failed to create token: {}", e)))
}

pub fn create_refresh_token(
    user_id: Uuid,
    email: &str,
    jwt_config: &JwtConfig,
) -> Result<String, AppError> {
    let iat = now();
    let claims = RefreshTokenClaims {
        sub: user_id.to_string(),
        email: email.to_string(),
        exp: expires_at(iat, jwt_config.refresh_token_expiry),
        iat,
        jti: Uuid::new_v4().to_string(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(jwt_config.secret.as_bytes()),
    )
    .map_err(|e| AppError::internal(anyhow::anyhow!("Failed to create refresh token: {}", e)))
}

pub fn verify_token(token: &str, jwt_config: &JwtConfig) -> Result<Claims, AppError> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(jwt_config.secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|_| AppError::unauthorized("Invalid or expired token"))
}

pub fn verify_refresh_token(
    token: &str,
    jwt_config: &JwtConfig,
) -> Result<RefreshTokenClaims, AppError> {
    decode::<RefreshTokenClaims>(
        token,
        &DecodingKey::from_secret(jwt_config.secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|_| AppError::unauthorized("Invalid or expired refresh token"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> JwtConfig {
        JwtConfig {
            secret: "test_secret_key_for_testing_purposes".to_string(),
            access_token_expiry: 3600,
            refresh_token_expiry: 604800,
        }
    }

    fn subject(role: &str) -> TokenSubject<'_> {
        TokenSubject {
            user_id: Uuid::new_v4(),
            email: "someone@school.test",
            role,
            school_id: Some(Uuid::new_v4()),
        }
    }

    #[test]
    fn test_access_token_carries_role_permissions() {
        let token = create_access_token(&subject("parent"), &config()).unwrap();
        let claims = verify_token(&token, &config()).unwrap();
        assert_eq!(claims.role, "parent");
        assert!(claims.permissions.contains(&"leaves:parent_decide".to_string()));
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn test_wrong_secret_is_unauthorized() {
        let token = create_access_token(&subject("teacher"), &config()).unwrap();
        let other = JwtConfig {
            secret: "another".to_string(),
            ..config()
        };
        let err = verify_token(&token, &other).unwrap_err();
        assert_eq!(err.status.as_u16(), 401);
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let expired = JwtConfig {
            access_token_expiry: -120,
            ..config()
        };
        let token = create_access_token(&subject("student"), &expired).unwrap();
        assert!(verify_token(&token, &config()).is_err());
    }

    #[test]
    fn test_refresh_token_is_not_an_access_token() {
        let user_id = Uuid::new_v4();
        let refresh = create_refresh_token(user_id, "a@b.test", &config()).unwrap();
        assert!(verify_token(&refresh, &config()).is_err());

        let claims = verify_refresh_token(&refresh, &config()).unwrap();
        assert_eq!(claims.sub, user_id.to_string());
    }
}
