use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum_extra::TypedHeader;
use axum_extra::headers::{Authorization, authorization::Bearer};
use scholaris_auth::{Claims, verify_token};
use scholaris_core::AppError;
use uuid::Uuid;

use crate::modules::users::model::UserRole;
use crate::state::AppState;

/// Extractor that validates the bearer token and exposes its claims.
#[derive(Debug, Clone)]
pub struct AuthUser(pub Claims);

impl AuthUser {
    pub fn has_permission(&self, permission: &str) -> bool {
        self.0.permissions.iter().any(|p| p == permission)
    }

    pub fn has_any_permission(&self, permissions: &[&str]) -> bool {
        permissions.iter().any(|p| self.has_permission(p))
    }

    /// `None` only for the global admin.
    pub fn school_id(&self) -> Option<Uuid> {
        self.0.school_id
    }

    pub fn user_id(&self) -> Result<Uuid, AppError> {
        Uuid::parse_str(&self.0.sub)
            .map_err(|_| AppError::unauthorized("Invalid user ID in token"))
    }

    pub fn email(&self) -> &str {
        &self.0.email
    }

    pub fn role(&self) -> Result<UserRole, AppError> {
        self.0
            .role
            .parse()
            .map_err(|_| AppError::unauthorized("Invalid role in token"))
    }

    pub fn is_system_admin(&self) -> bool {
        self.0.role == UserRole::Admin.as_str()
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) =
            TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
                .await
                .map_err(|e| {
                    if e.is_missing() {
                        AppError::unauthorized("Missing authorization header")
                    } else {
                        AppError::unauthorized("Invalid authorization header format")
                    }
                })?;

        let claims = verify_token(bearer.token(), &state.jwt_config)?;

        Ok(AuthUser(claims))
    }
}

/// Declares an extractor that authenticates and then requires one permission.
#[macro_export]
macro_rules! require_permission {
    ($name:ident, $permission:expr) => {
        #[derive(Debug, Clone)]
        pub struct $name(pub $crate::middleware::auth::AuthUser);

        impl axum::extract::FromRequestParts<$crate::state::AppState> for $name {
            type Rejection = scholaris_core::AppError;

            async fn from_request_parts(
                parts: &mut axum::http::request::Parts,
                state: &$crate::state::AppState,
            ) -> Result<Self, Self::Rejection> {
                let auth_user =
                    $crate::middleware::auth::AuthUser::from_request_parts(parts, state).await?;

                if !auth_user.has_permission($permission) {
                    return Err(scholaris_core::AppError::forbidden(format!(
                        "Access denied. Missing required permission: {}",
                        $permission
                    )));
                }

                Ok($name(auth_user))
            }
        }
    };
}

use scholaris_core::permissions as p;

require_permission!(RequireSchoolsManage, p::SCHOOLS_MANAGE);

require_permission!(RequireUsersRead, p::USERS_READ);
require_permission!(RequireUsersWrite, p::USERS_WRITE);
require_permission!(RequireStudentsRead, p::STUDENTS_READ);
require_permission!(RequireStudentsWrite, p::STUDENTS_WRITE);
require_permission!(RequireTeachersRead, p::TEACHERS_READ);
require_permission!(RequireTeachersWrite, p::TEACHERS_WRITE);

require_permission!(RequireClassesRead, p::CLASSES_READ);
require_permission!(RequireClassesWrite, p::CLASSES_WRITE);
require_permission!(RequireAttendanceRead, p::ATTENDANCE_READ);
require_permission!(RequireAttendanceMark, p::ATTENDANCE_MARK);
require_permission!(RequireAttendanceCheckIn, p::ATTENDANCE_CHECK_IN);
require_permission!(RequireExamsRead, p::EXAMS_READ);
require_permission!(RequireExamsWrite, p::EXAMS_WRITE);
require_permission!(RequireResultsWrite, p::RESULTS_WRITE);
require_permission!(RequireContentsRead, p::CONTENTS_READ);
require_permission!(RequireContentsWrite, p::CONTENTS_WRITE);
require_permission!(RequireCertificatesRead, p::CERTIFICATES_READ);
require_permission!(RequireCertificatesWrite, p::CERTIFICATES_WRITE);

require_permission!(RequireLibraryRead, p::LIBRARY_READ);
require_permission!(RequireLibraryWrite, p::LIBRARY_WRITE);
require_permission!(RequireHostelRead, p::HOSTEL_READ);
require_permission!(RequireHostelWrite, p::HOSTEL_WRITE);
require_permission!(RequireInventoryRead, p::INVENTORY_READ);
require_permission!(RequireInventoryWrite, p::INVENTORY_WRITE);
require_permission!(RequireTransportRead, p::TRANSPORT_READ);
require_permission!(RequireTransportWrite, p::TRANSPORT_WRITE);

require_permission!(RequireMessagesSend, p::MESSAGES_SEND);
require_permission!(RequireBroadcastSend, p::BROADCAST_SEND);
require_permission!(RequireNoticesRead, p::NOTICES_READ);
require_permission!(RequireNoticesWrite, p::NOTICES_WRITE);

require_permission!(RequireLeavesRead, p::LEAVES_READ);
require_permission!(RequireLeavesRequest, p::LEAVES_REQUEST);
require_permission!(RequireLeavesParentDecide, p::LEAVES_PARENT_DECIDE);
require_permission!(RequireLeavesSchoolDecide, p::LEAVES_SCHOOL_DECIDE);
require_permission!(RequireGatePassesVerify, p::GATE_PASSES_VERIFY);

require_permission!(RequireRadioRead, p::RADIO_READ);
require_permission!(RequireRadioWrite, p::RADIO_WRITE);
require_permission!(RequireUploadsWrite, p::UPLOADS_WRITE);
require_permission!(RequireTallyAccess, p::TALLY_ACCESS);

#[cfg(test)]
mod tests {
    use super::*;

    fn auth_user(role: &str, school_id: Option<Uuid>) -> AuthUser {
        AuthUser(Claims {
            sub: Uuid::new_v4().to_string(),
            email: "test@example.com".to_string(),
            role: role.to_string(),
            school_id,
            permissions: scholaris_core::permissions::permissions_for_role(role),
            exp: 9999999999,
            iat: 1234567890,
        })
    }

    #[test]
    fn test_has_permission_follows_role_table() {
        let staff = auth_user("staff", Some(Uuid::new_v4()));
        assert!(staff.has_permission(p::INVENTORY_WRITE));
        assert!(!staff.has_permission(p::EXAMS_WRITE));
        assert!(staff.has_any_permission(&[p::EXAMS_WRITE, p::HOSTEL_READ]));
    }

    #[test]
    fn test_user_id_parses_subject() {
        let user = auth_user("teacher", None);
        assert_eq!(user.user_id().unwrap().to_string(), user.0.sub);

        let mut broken = user.clone();
        broken.0.sub = "not-a-uuid".to_string();
        assert!(broken.user_id().is_err());
    }

    #[test]
    fn test_role_and_system_admin() {
        assert!(auth_user("admin", None).is_system_admin());
        let teacher = auth_user("teacher", Some(Uuid::new_v4()));
        assert!(!teacher.is_system_admin());
        assert_eq!(teacher.role().unwrap(), UserRole::Teacher);
        assert!(auth_user("janitor", None).role().is_err());
    }
}
