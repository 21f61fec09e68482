use axum::http::StatusCode;
use scholaris::middleware::auth::AuthUser;
use scholaris::middleware::role::{check_any_role, check_can_manage};
use scholaris::modules::users::model::UserRole;
use scholaris_auth::Claims;
use scholaris_core::permissions::{self, permissions_for_role};
use uuid::Uuid;

fn create_test_auth_user(role: &str, school_id: Option<Uuid>) -> AuthUser {
    AuthUser(Claims {
        sub: Uuid::new_v4().to_string(),
        email: "test@example.com".to_string(),
        role: role.to_string(),
        school_id,
        permissions: permissions_for_role(role),
        exp: 9999999999,
        iat: 1234567890,
    })
}

#[test]
fn test_check_any_role_match() {
    let auth_user = create_test_auth_user("teacher", Some(Uuid::new_v4()));
    assert!(check_any_role(&auth_user, &[UserRole::Teacher, UserRole::Staff]).is_ok());
}

#[test]
fn test_check_any_role_no_match_is_forbidden() {
    let auth_user = create_test_auth_user("student", Some(Uuid::new_v4()));
    let err = check_any_role(&auth_user, &[UserRole::SchoolAdmin]).unwrap_err();
    assert_eq!(err.status, StatusCode::FORBIDDEN);
}

#[test]
fn test_unknown_role_in_token_is_rejected() {
    let auth_user = create_test_auth_user("principal", Some(Uuid::new_v4()));
    assert!(check_any_role(&auth_user, &UserRole::ALL).is_err());
    assert!(auth_user.role().is_err());
}

#[test]
fn test_system_admin_has_no_school() {
    let admin = create_test_auth_user("admin", None);
    assert!(admin.is_system_admin());
    assert!(admin.has_permission(permissions::SCHOOLS_MANAGE));

    let school_admin = create_test_auth_user("school_admin", Some(Uuid::new_v4()));
    assert!(!school_admin.is_system_admin());
    assert!(!school_admin.has_permission(permissions::SCHOOLS_MANAGE));
}

#[test]
fn test_permissions_come_from_token() {
    let parent = create_test_auth_user("parent", Some(Uuid::new_v4()));
    assert!(parent.has_permission(permissions::LEAVES_PARENT_DECIDE));
    assert!(!parent.has_permission(permissions::HOSTEL_WRITE));
    assert!(parent.has_any_permission(&[permissions::HOSTEL_WRITE, permissions::NOTICES_READ]));
}

#[test]
fn test_school_admin_cannot_create_peers() {
    assert!(check_can_manage(UserRole::SchoolAdmin, UserRole::SchoolAdmin).is_err());
    assert!(check_can_manage(UserRole::SchoolAdmin, UserRole::Staff).is_ok());
}
