#![allow(dead_code)]

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use scholaris::router::init_router;
use scholaris::state::AppState;
use scholaris_core::password::hash_password_with_cost;
use serde_json::{Value, json};
use sqlx::PgPool;
use tempfile::TempDir;
use tower::ServiceExt;
use uuid::Uuid;

pub const PASSWORD: &str = "testpass123";

/// Router plus the temp directory backing uploads and the radio file.
pub struct TestApp {
    pub router: Router,
    pub pool: PgPool,
    pub workdir: TempDir,
}

pub struct TestUser {
    pub id: Uuid,
    pub email: String,
    pub school_id: Option<Uuid>,
}

impl TestApp {
    /// Tally calls go to a closed local port so they fail fast.
    pub fn new(pool: PgPool) -> Self {
        Self::with_tally(pool, "http://127.0.0.1:9")
    }

    pub fn with_tally(pool: PgPool, tally_url: &str) -> Self {
        let workdir = tempfile::tempdir().unwrap();
        let state = AppState::for_tests(pool.clone(), workdir.path(), tally_url);
        Self {
            router: init_router(state),
            pool,
            workdir,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&bytes).into_owned())
            })
        };
        (status, body)
    }

    pub async fn request(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(serde_json::to_vec(&body).unwrap()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        self.send(request).await
    }

    pub async fn get(&self, uri: &str, token: &str) -> (StatusCode, Value) {
        self.request("GET", uri, Some(token), None).await
    }

    pub async fn post(&self, uri: &str, token: &str, body: Value) -> (StatusCode, Value) {
        self.request("POST", uri, Some(token), Some(body)).await
    }

    pub async fn put(&self, uri: &str, token: &str, body: Value) -> (StatusCode, Value) {
        self.request("PUT", uri, Some(token), Some(body)).await
    }

    pub async fn delete(&self, uri: &str, token: &str) -> (StatusCode, Value) {
        self.request("DELETE", uri, Some(token), None).await
    }

    pub async fn login(&self, email: &str, password: &str) -> (StatusCode, Value) {
        self.request(
            "POST",
            "/api/auth/login",
            None,
            Some(json!({ "email": email, "password": password })),
        )
        .await
    }

    pub async fn token_for(&self, user: &TestUser) -> String {
        let (status, body) = self.login(&user.email, PASSWORD).await;
        assert_eq!(status, StatusCode::OK, "login failed: {body}");
        body["access_token"].as_str().unwrap().to_string()
    }
}

pub fn generate_unique_email() -> String {
    format!("test-{}@test.com", Uuid::new_v4())
}

pub fn generate_unique_school_name() -> String {
    format!("Test School {}", Uuid::new_v4())
}

pub async fn create_test_school(pool: &PgPool, coordinates: Option<(f64, f64)>) -> Uuid {
    let (latitude, longitude) = coordinates.unzip();
    sqlx::query_scalar(
        "INSERT INTO schools (name, address, latitude, longitude, geofence_radius_m)
         VALUES ($1, 'Test Address', $2, $3, 200)
         RETURNING id",
    )
    .bind(generate_unique_school_name())
    .bind(latitude)
    .bind(longitude)
    .fetch_one(pool)
    .await
    .unwrap()
}

/// Inserts a user directly; `role` is a `user_role` enum label.
pub async fn create_test_user(pool: &PgPool, role: &str, school_id: Option<Uuid>) -> TestUser {
    let email = generate_unique_email();
    let hashed = hash_password_with_cost(PASSWORD, 4).unwrap();

    let id = sqlx::query_scalar(
        "INSERT INTO users (first_name, last_name, email, password, role, school_id)
         VALUES ('Test', 'User', $1, $2, $3::user_role, $4)
         RETURNING id",
    )
    .bind(&email)
    .bind(hashed)
    .bind(role)
    .bind(school_id)
    .fetch_one(pool)
    .await
    .unwrap();

    TestUser {
        id,
        email,
        school_id,
    }
}

pub async fn create_test_class(pool: &PgPool, school_id: Uuid, name: &str) -> Uuid {
    sqlx::query_scalar("INSERT INTO classes (school_id, name) VALUES ($1, $2) RETURNING id")
        .bind(school_id)
        .bind(name)
        .fetch_one(pool)
        .await
        .unwrap()
}

/// A student in `class_id`, optionally linked to a parent account.
pub async fn create_test_student(
    pool: &PgPool,
    school_id: Uuid,
    class_id: Option<Uuid>,
    parent_id: Option<Uuid>,
) -> TestUser {
    let student = create_test_user(pool, "student", Some(school_id)).await;
    sqlx::query("UPDATE users SET class_id = $2, parent_id = $3 WHERE id = $1")
        .bind(student.id)
        .bind(class_id)
        .bind(parent_id)
        .execute(pool)
        .await
        .unwrap();
    student
}
