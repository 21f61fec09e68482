mod common;

use axum::http::StatusCode;
use common::{TestApp, create_test_school, create_test_student, create_test_user};
use serde_json::{Value, json};
use sqlx::PgPool;
use uuid::Uuid;

async fn room_with_capacity(app: &TestApp, token: &str, capacity: i32) -> Uuid {
    let (status, hostel) = app
        .post("/api/hostel/hostels", token, json!({ "name": "North Wing" }))
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, room) = app
        .post(
            &format!("/api/hostel/hostels/{}/rooms", hostel["id"].as_str().unwrap()),
            token,
            json!({ "room_number": "101", "capacity": capacity }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    room["id"].as_str().unwrap().parse().unwrap()
}

async fn allocate(app: &TestApp, token: &str, room_id: Uuid, student_id: Uuid) -> (StatusCode, Value) {
    app.post(
        "/api/hostel/allocations",
        token,
        json!({ "room_id": room_id, "student_id": student_id }),
    )
    .await
}

#[sqlx::test(migrations = "./migrations")]
async fn test_full_room_rejects_allocation(pool: PgPool) {
    let school_id = create_test_school(&pool, None).await;
    let warden = create_test_user(&pool, "staff", Some(school_id)).await;
    let first = create_test_student(&pool, school_id, None, None).await;
    let second = create_test_student(&pool, school_id, None, None).await;
    let app = TestApp::new(pool);
    let token = app.token_for(&warden).await;
    let room_id = room_with_capacity(&app, &token, 1).await;

    let (status, _) = allocate(&app, &token, room_id, first.id).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = allocate(&app, &token, room_id, second.id).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "Room is full (1/1 beds taken)");
}

#[sqlx::test(migrations = "./migrations")]
async fn test_concurrent_allocations_never_exceed_capacity(pool: PgPool) {
    let school_id = create_test_school(&pool, None).await;
    let warden = create_test_user(&pool, "staff", Some(school_id)).await;
    let mut students = Vec::new();
    for _ in 0..4 {
        students.push(create_test_student(&pool, school_id, None, None).await);
    }
    let app = TestApp::new(pool.clone());
    let token = app.token_for(&warden).await;
    let room_id = room_with_capacity(&app, &token, 2).await;

    let results = allocate_concurrently(&app, &token, room_id, &students).await;
    let created = results
        .iter()
        .filter(|s| **s == StatusCode::CREATED)
        .count();
    assert_eq!(created, 2);
    assert!(
        results
            .iter()
            .all(|s| *s == StatusCode::CREATED || *s == StatusCode::CONFLICT)
    );

    let active: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM hostel_allocations WHERE room_id = $1 AND released_at IS NULL",
    )
    .bind(room_id)
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(active, 2);
}

async fn allocate_concurrently(
    app: &TestApp,
    token: &str,
    room_id: Uuid,
    students: &[common::TestUser],
) -> Vec<StatusCode> {
    let mut handles = Vec::new();
    for student in students {
        let router = app.router.clone();
        let token = token.to_string();
        let student_id = student.id;
        handles.push(tokio::spawn(async move {
            use axum::body::Body;
            use axum::http::Request;
            use tower::ServiceExt;

            let request = Request::builder()
                .method("POST")
                .uri("/api/hostel/allocations")
                .header("authorization", format!("Bearer {}", token))
                .header("content-type", "application/json")
                .body(Body::from(
                    json!({ "room_id": room_id, "student_id": student_id }).to_string(),
                ))
                .unwrap();
            router.oneshot(request).await.unwrap().status()
        }));
    }

    let mut statuses = Vec::new();
    for handle in handles {
        statuses.push(handle.await.unwrap());
    }
    statuses
}

#[sqlx::test(migrations = "./migrations")]
async fn test_student_holds_one_active_bed(pool: PgPool) {
    let school_id = create_test_school(&pool, None).await;
    let warden = create_test_user(&pool, "staff", Some(school_id)).await;
    let student = create_test_student(&pool, school_id, None, None).await;
    let app = TestApp::new(pool);
    let token = app.token_for(&warden).await;
    let room_a = room_with_capacity(&app, &token, 4).await;

    let (status, allocation) = allocate(&app, &token, room_a, student.id).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = allocate(&app, &token, room_a, student.id).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let release_uri = format!(
        "/api/hostel/allocations/{}/release",
        allocation["id"].as_str().unwrap()
    );
    let (status, released) = app.post(&release_uri, &token, json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert!(released["released_at"].is_string());

    let (status, _) = app.post(&release_uri, &token, json!({})).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = allocate(&app, &token, room_a, student.id).await;
    assert_eq!(status, StatusCode::CREATED);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_capacity_cannot_shrink_below_occupancy(pool: PgPool) {
    let school_id = create_test_school(&pool, None).await;
    let warden = create_test_user(&pool, "staff", Some(school_id)).await;
    let a = create_test_student(&pool, school_id, None, None).await;
    let b = create_test_student(&pool, school_id, None, None).await;
    let app = TestApp::new(pool);
    let token = app.token_for(&warden).await;
    let room_id = room_with_capacity(&app, &token, 3).await;

    allocate(&app, &token, room_id, a.id).await;
    allocate(&app, &token, room_id, b.id).await;

    let uri = format!("/api/hostel/rooms/{}", room_id);
    let (status, _) = app.put(&uri, &token, json!({ "capacity": 1 })).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, room) = app.put(&uri, &token, json!({ "capacity": 2 })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(room["capacity"], 2);

    let (status, _) = app.delete(&uri, &token).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_students_cannot_allocate(pool: PgPool) {
    let school_id = create_test_school(&pool, None).await;
    let student = create_test_student(&pool, school_id, None, None).await;
    let app = TestApp::new(pool);
    let token = app.token_for(&student).await;

    let (status, _) = allocate(&app, &token, Uuid::new_v4(), student.id).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}
