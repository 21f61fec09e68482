use scholaris_core::AppError;
use uuid::Uuid;

use crate::middleware::auth::AuthUser;

/// School for operations that need one (create, list).
///
/// The global admin has no school in its token and must name one; everyone
/// else always works in their own school and `specified` is ignored.
pub fn school_for_scoped_operation(
    auth_user: &AuthUser,
    specified: Option<Uuid>,
) -> Result<Uuid, AppError> {
    if auth_user.is_system_admin() {
        return specified.ok_or_else(|| {
            AppError::bad_request(anyhow::anyhow!(
                "System admin must specify school_id for this operation"
            ))
        });
    }

    own_school(auth_user)
}

/// Scope for operations on an existing resource (get, update, delete).
///
/// `None` means unrestricted and is only returned for the global admin.
/// Services bind it as `($n::uuid IS NULL OR school_id = $n)`.
pub fn resource_scope(auth_user: &AuthUser) -> Result<Option<Uuid>, AppError> {
    if auth_user.is_system_admin() {
        return Ok(None);
    }

    own_school(auth_user).map(Some)
}

pub fn own_school(auth_user: &AuthUser) -> Result<Uuid, AppError> {
    auth_user
        .school_id()
        .ok_or_else(|| AppError::forbidden("User must be associated with a school"))
}

/// Rejects access to a resource from another school.
pub fn verify_school_access(auth_user: &AuthUser, resource_school_id: Uuid) -> Result<(), AppError> {
    match resource_scope(auth_user)? {
        Some(school_id) if school_id != resource_school_id => Err(AppError::forbidden(
            "You can only access resources from your own school",
        )),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use scholaris_auth::Claims;

    fn auth_user(role: &str, school_id: Option<Uuid>) -> AuthUser {
        AuthUser(Claims {
            sub: Uuid::new_v4().to_string(),
            email: "test@example.com".to_string(),
            role: role.to_string(),
            school_id,
            permissions: vec![],
            exp: 9999999999,
            iat: 1234567890,
        })
    }

    #[test]
    fn test_system_admin_must_specify_school() {
        let admin = auth_user("admin", None);
        let err = school_for_scoped_operation(&admin, None).unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);

        let school = Uuid::new_v4();
        assert_eq!(school_for_scoped_operation(&admin, Some(school)).unwrap(), school);
    }

    #[test]
    fn test_school_user_ignores_specified_school() {
        let own = Uuid::new_v4();
        let teacher = auth_user("teacher", Some(own));
        assert_eq!(
            school_for_scoped_operation(&teacher, Some(Uuid::new_v4())).unwrap(),
            own
        );
    }

    #[test]
    fn test_resource_scope() {
        assert_eq!(resource_scope(&auth_user("admin", None)).unwrap(), None);
        let own = Uuid::new_v4();
        assert_eq!(
            resource_scope(&auth_user("school_admin", Some(own))).unwrap(),
            Some(own)
        );
        let err = resource_scope(&auth_user("teacher", None)).unwrap_err();
        assert_eq!(err.status, StatusCode::FORBIDDEN);
    }

    #[test]
    fn test_verify_school_access() {
        let own = Uuid::new_v4();
        let staff = auth_user("staff", Some(own));
        assert!(verify_school_access(&staff, own).is_ok());
        assert!(verify_school_access(&staff, Uuid::new_v4()).is_err());
        assert!(verify_school_access(&auth_user("admin", None), Uuid::new_v4()).is_ok());
    }
}
