//! Role-based authorization helpers.
//!
//! Permissions cover most checks. Roles are still needed for two things:
//! gating whole routers to the global admin, and deciding which roles a
//! caller may create or manage.

use axum::{
    extract::{FromRequestParts, Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use scholaris_core::AppError;

use crate::middleware::auth::AuthUser;
use crate::modules::users::model::UserRole;
use crate::state::AppState;

/// Router layer that only lets the listed roles through.
///
/// ```rust,ignore
/// let admin_routes = Router::new()
///     .route("/", post(create_school))
///     .route_layer(middleware::from_fn_with_state(state.clone(), require_system_admin));
/// ```
pub async fn require_roles(
    state: AppState,
    req: Request,
    next: Next,
    allowed_roles: &[UserRole],
) -> Result<Response, AppError> {
    let (mut parts, body) = req.into_parts();

    let auth_user = AuthUser::from_request_parts(&mut parts, &state).await?;
    check_any_role(&auth_user, allowed_roles)?;

    Ok(next.run(Request::from_parts(parts, body)).await)
}

pub async fn require_system_admin(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Response {
    match require_roles(state, req, next, &[UserRole::Admin]).await {
        Ok(response) => response,
        Err(err) => err.into_response(),
    }
}

pub fn check_any_role(auth_user: &AuthUser, allowed_roles: &[UserRole]) -> Result<(), AppError> {
    let user_role = auth_user.role()?;

    if !allowed_roles.contains(&user_role) {
        return Err(AppError::forbidden(format!(
            "Access denied. Required roles: {}, but user has role: {}",
            allowed_roles
                .iter()
                .map(UserRole::as_str)
                .collect::<Vec<_>>()
                .join(", "),
            user_role.as_str()
        )));
    }

    Ok(())
}

/// Higher number means more privileges.
pub fn role_hierarchy_level(role: UserRole) -> u8 {
    match role {
        UserRole::Admin => 3,
        UserRole::SchoolAdmin => 2,
        UserRole::Teacher | UserRole::Staff => 1,
        UserRole::Student | UserRole::Parent => 0,
    }
}

/// A caller may only create or manage accounts strictly below its own role.
pub fn check_can_manage(actor: UserRole, target: UserRole) -> Result<(), AppError> {
    if role_hierarchy_level(actor) <= role_hierarchy_level(target) {
        return Err(AppError::forbidden(format!(
            "Role {} cannot manage {} accounts",
            actor.as_str(),
            target.as_str()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_hierarchy() {
        assert!(role_hierarchy_level(UserRole::Admin) > role_hierarchy_level(UserRole::SchoolAdmin));
        assert!(
            role_hierarchy_level(UserRole::SchoolAdmin) > role_hierarchy_level(UserRole::Teacher)
        );
        assert_eq!(
            role_hierarchy_level(UserRole::Teacher),
            role_hierarchy_level(UserRole::Staff)
        );
        assert_eq!(
            role_hierarchy_level(UserRole::Student),
            role_hierarchy_level(UserRole::Parent)
        );
    }

    #[test]
    fn test_check_can_manage() {
        assert!(check_can_manage(UserRole::Admin, UserRole::SchoolAdmin).is_ok());
        assert!(check_can_manage(UserRole::SchoolAdmin, UserRole::Teacher).is_ok());
        assert!(check_can_manage(UserRole::SchoolAdmin, UserRole::Parent).is_ok());
        assert!(check_can_manage(UserRole::SchoolAdmin, UserRole::SchoolAdmin).is_err());
        assert!(check_can_manage(UserRole::Teacher, UserRole::Student).is_ok());
        assert!(check_can_manage(UserRole::Student, UserRole::Parent).is_err());
    }
}
