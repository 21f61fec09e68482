use scholaris_auth::{
    TokenSubject, create_access_token, create_refresh_token, verify_refresh_token,
};
use scholaris_config::JwtConfig;
use scholaris_core::{AppError, hash_password, verify_password};
use sqlx::PgPool;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::metrics;
use crate::modules::users::model::User;
use crate::modules::users::service::UserService;

use super::model::{
    ChangePasswordRequest, LoginRequest, LoginResponse, RefreshTokenRequest,
    RefreshTokenResponse,
};

const TOKEN_TYPE: &str = "Bearer";

pub struct AuthService;

impl AuthService {
    fn access_token_for(user: &User, jwt_config: &JwtConfig) -> Result<String, AppError> {
        let token = create_access_token(
            &TokenSubject {
                user_id: user.id,
                email: &user.email,
                role: user.role.as_str(),
                school_id: user.school_id,
            },
            jwt_config,
        )?;
        metrics::track_jwt_issued();
        Ok(token)
    }

    #[instrument(skip(db, jwt_config, dto), fields(user.email = %dto.email))]
    pub async fn login(
        db: &PgPool,
        jwt_config: &JwtConfig,
        dto: LoginRequest,
    ) -> Result<LoginResponse, AppError> {
        let invalid = || AppError::unauthorized("Invalid email or password");

        let Some(user) = UserService::find_by_email(db, &dto.email).await? else {
            metrics::track_user_login_failure("unknown_email");
            warn!("Login attempt for unknown email");
            return Err(invalid());
        };

        let credentials = UserService::credentials(db, user.id).await?;
        if !verify_password(&dto.password, &credentials.password)? {
            metrics::track_user_login_failure("bad_password");
            warn!(user.id = %user.id, "Login attempt with wrong password");
            return Err(invalid());
        }

        let access_token = Self::access_token_for(&user, jwt_config)?;
        let refresh_token = create_refresh_token(user.id, &user.email, jwt_config)?;

        metrics::track_user_login_success(user.role.as_str());
        info!(user.id = %user.id, user.role = %user.role, "User logged in");

        Ok(LoginResponse {
            access_token,
            refresh_token,
            token_type: TOKEN_TYPE.to_string(),
            expires_in: jwt_config.access_token_expiry,
            user,
        })
    }

    /// Issues a new access token. Role and school are re-read so changes
    /// since login take effect.
    #[instrument(skip_all)]
    pub async fn refresh(
        db: &PgPool,
        jwt_config: &JwtConfig,
        dto: RefreshTokenRequest,
    ) -> Result<RefreshTokenResponse, AppError> {
        let claims = verify_refresh_token(&dto.refresh_token, jwt_config)?;
        let user_id = Uuid::parse_str(&claims.sub)
            .map_err(|_| AppError::unauthorized("Invalid or expired refresh token"))?;

        let user = UserService::get_user(db, user_id, None, None)
            .await
            .map_err(|_| AppError::unauthorized("User no longer exists"))?;

        Ok(RefreshTokenResponse {
            access_token: Self::access_token_for(&user, jwt_config)?,
            token_type: TOKEN_TYPE.to_string(),
            expires_in: jwt_config.access_token_expiry,
        })
    }

    #[instrument(skip(db, dto))]
    pub async fn change_password(
        db: &PgPool,
        user_id: Uuid,
        dto: ChangePasswordRequest,
    ) -> Result<(), AppError> {
        let credentials = UserService::credentials(db, user_id).await?;
        if !verify_password(&dto.current_password, &credentials.password)? {
            return Err(AppError::bad_request(anyhow::anyhow!("Current password is incorrect")));
        }
        if dto.current_password == dto.new_password {
            return Err(AppError::bad_request(anyhow::anyhow!(
                "New password must differ from the current password"
            )));
        }

        let hashed = hash_password(&dto.new_password)?;
        sqlx::query("UPDATE users SET password = $1, updated_at = NOW() WHERE id = $2")
            .bind(&hashed)
            .bind(user_id)
            .execute(db)
            .await?;

        info!(user.id = %user_id, "Password changed");
        Ok(())
    }
}
