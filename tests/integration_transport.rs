mod common;

use axum::http::StatusCode;
use common::{TestApp, create_test_school, create_test_student, create_test_user};
use serde_json::json;
use sqlx::PgPool;

#[sqlx::test(migrations = "./migrations")]
async fn test_bus_seats_and_single_assignment(pool: PgPool) {
    let app = TestApp::new(pool.clone());
    let school_id = create_test_school(&pool, None).await;
    let staff = create_test_user(&pool, "staff", Some(school_id)).await;
    let ada = create_test_student(&pool, school_id, None, None).await;
    let ben = create_test_student(&pool, school_id, None, None).await;
    let token = app.token_for(&staff).await;

    let (status, bus) = app
        .post(
            "/api/transport/buses",
            &token,
            json!({ "registration_number": "LAG-123-XY", "route_name": "Ikeja loop", "capacity": 1 }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{bus}");
    let bus_id = bus["id"].as_str().unwrap().to_string();

    let (status, second) = app
        .post(
            "/api/transport/buses",
            &token,
            json!({ "registration_number": "LAG-456-XY", "capacity": 10 }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let second_id = second["id"].as_str().unwrap().to_string();

    let (status, _) = app
        .post(
            &format!("/api/transport/buses/{bus_id}/students"),
            &token,
            json!({ "student_id": ada.id, "stop_name": "Allen junction" }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = app
        .post(
            &format!("/api/transport/buses/{bus_id}/students"),
            &token,
            json!({ "student_id": ben.id }),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "Bus is full (1/1 seats taken)");

    let (status, body) = app
        .post(
            &format!("/api/transport/buses/{second_id}/students"),
            &token,
            json!({ "student_id": ada.id }),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "Student is already assigned to a bus");

    let (status, _) = app
        .delete(
            &format!("/api/transport/buses/{bus_id}/students/{}", ada.id),
            &token,
        )
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = app
        .post(
            &format!("/api/transport/buses/{bus_id}/students"),
            &token,
            json!({ "student_id": ben.id }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, students) = app
        .get(&format!("/api/transport/buses/{bus_id}/students"), &token)
        .await;
    assert_eq!(students.as_array().unwrap().len(), 1);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_duplicate_registration_and_capacity_shrink(pool: PgPool) {
    let app = TestApp::new(pool.clone());
    let school_id = create_test_school(&pool, None).await;
    let school_admin = create_test_user(&pool, "school_admin", Some(school_id)).await;
    let ada = create_test_student(&pool, school_id, None, None).await;
    let ben = create_test_student(&pool, school_id, None, None).await;
    let token = app.token_for(&school_admin).await;

    let body = json!({ "registration_number": "ABJ-001", "capacity": 4 });
    let (_, bus) = app.post("/api/transport/buses", &token, body.clone()).await;
    let bus_id = bus["id"].as_str().unwrap().to_string();

    let (status, _) = app.post("/api/transport/buses", &token, body).await;
    assert_eq!(status, StatusCode::CONFLICT);

    for student in [&ada, &ben] {
        let (status, _) = app
            .post(
                &format!("/api/transport/buses/{bus_id}/students"),
                &token,
                json!({ "student_id": student.id }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, _) = app
        .put(
            &format!("/api/transport/buses/{bus_id}"),
            &token,
            json!({ "capacity": 1 }),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, bus) = app
        .put(
            &format!("/api/transport/buses/{bus_id}"),
            &token,
            json!({ "capacity": 2 }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(bus["capacity"], 2);
    assert_eq!(bus["assigned"], 2);
}
