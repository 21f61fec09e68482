mod common;

use axum::http::StatusCode;
use common::{PASSWORD, TestApp, create_test_school, create_test_user};
use serde_json::json;
use sqlx::PgPool;

#[sqlx::test(migrations = "./migrations")]
async fn test_login_success(pool: PgPool) {
    let school_id = create_test_school(&pool, None).await;
    let user = create_test_user(&pool, "teacher", Some(school_id)).await;
    let app = TestApp::new(pool);

    let (status, body) = app.login(&user.email, PASSWORD).await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["access_token"].is_string());
    assert!(body["refresh_token"].is_string());
    assert_eq!(body["token_type"], "Bearer");
    assert_eq!(body["user"]["role"], "teacher");
    assert!(body["user"].get("password").is_none());
}

#[sqlx::test(migrations = "./migrations")]
async fn test_login_wrong_password(pool: PgPool) {
    let user = create_test_user(&pool, "admin", None).await;
    let app = TestApp::new(pool);

    let (status, body) = app.login(&user.email, "wrongpassword").await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Invalid email or password");
}

#[sqlx::test(migrations = "./migrations")]
async fn test_login_unknown_email_same_error(pool: PgPool) {
    let app = TestApp::new(pool);
    let (status, body) = app.login("nobody@test.com", PASSWORD).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Invalid email or password");
}

#[sqlx::test(migrations = "./migrations")]
async fn test_login_invalid_email_is_unprocessable(pool: PgPool) {
    let app = TestApp::new(pool);
    let (status, _) = app.login("not-an-email", PASSWORD).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_me_returns_permissions(pool: PgPool) {
    let school_id = create_test_school(&pool, None).await;
    let user = create_test_user(&pool, "parent", Some(school_id)).await;
    let app = TestApp::new(pool);
    let token = app.token_for(&user).await;

    let (status, body) = app.get("/api/auth/me", &token).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["id"], user.id.to_string());
    let permissions: Vec<&str> = body["permissions"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|p| p.as_str())
        .collect();
    assert!(permissions.contains(&"leaves:parent_decide"));
}

#[sqlx::test(migrations = "./migrations")]
async fn test_protected_route_requires_token(pool: PgPool) {
    let app = TestApp::new(pool);
    let (status, _) = app.request("GET", "/api/auth/me", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app.get("/api/auth/me", "garbage").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_refresh_token_issues_new_access_token(pool: PgPool) {
    let user = create_test_user(&pool, "admin", None).await;
    let app = TestApp::new(pool);
    let (_, login) = app.login(&user.email, PASSWORD).await;

    let (status, body) = app
        .request(
            "POST",
            "/api/auth/refresh",
            None,
            Some(json!({ "refresh_token": login["refresh_token"] })),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    let access = body["access_token"].as_str().unwrap();
    let (status, _) = app.get("/api/auth/me", access).await;
    assert_eq!(status, StatusCode::OK);

    // An access token is not a refresh token.
    let (status, _) = app
        .request(
            "POST",
            "/api/auth/refresh",
            None,
            Some(json!({ "refresh_token": login["access_token"] })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_change_password(pool: PgPool) {
    let school_id = create_test_school(&pool, None).await;
    let user = create_test_user(&pool, "student", Some(school_id)).await;
    let app = TestApp::new(pool);
    let token = app.token_for(&user).await;

    let (status, _) = app
        .post(
            "/api/auth/change-password",
            &token,
            json!({ "current_password": "wrong-one", "new_password": "brandnew123" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .post(
            "/api/auth/change-password",
            &token,
            json!({ "current_password": PASSWORD, "new_password": "brandnew123" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app.login(&user.email, PASSWORD).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _) = app.login(&user.email, "brandnew123").await;
    assert_eq!(status, StatusCode::OK);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_health_is_public(pool: PgPool) {
    let app = TestApp::new(pool);
    let (status, body) = app.request("GET", "/api/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["database"], true);
}
