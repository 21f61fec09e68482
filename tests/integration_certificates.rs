mod common;

use axum::http::StatusCode;
use common::{TestApp, create_test_school, create_test_student, create_test_user};
use serde_json::{Value, json};
use sqlx::PgPool;

const SERIAL_ALPHABET: &str = "ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

fn assert_serial(serial: &Value, year: &str) {
    let serial = serial.as_str().unwrap();
    let (prefix, code) = serial.split_once('-').unwrap();
    assert_eq!(prefix, year);
    assert_eq!(code.len(), 8, "{serial}");
    assert!(code.chars().all(|c| SERIAL_ALPHABET.contains(c)), "{serial}");
}

#[sqlx::test(migrations = "./migrations")]
async fn test_issued_serials_are_formatted_and_unique(pool: PgPool) {
    let app = TestApp::new(pool.clone());
    let school_id = create_test_school(&pool, None).await;
    let school_admin = create_test_user(&pool, "school_admin", Some(school_id)).await;
    let student = create_test_student(&pool, school_id, None, None).await;
    let token = app.token_for(&school_admin).await;

    let mut serials = Vec::new();
    for title in ["Best in Mathematics", "Perfect Attendance", "Debate Winner"] {
        let (status, certificate) = app
            .post(
                "/api/certificates",
                &token,
                json!({ "student_id": student.id, "title": title, "issued_on": "2024-07-19" }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{certificate}");
        assert_eq!(certificate["issued_on"], "2024-07-19");
        assert_serial(&certificate["serial_number"], "2024");
        serials.push(certificate["serial_number"].as_str().unwrap().to_string());
    }
    serials.sort();
    serials.dedup();
    assert_eq!(serials.len(), 3);

    let (status, listed) = app
        .get(&format!("/api/certificates?student_id={}", student.id), &token)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed.as_array().unwrap().len(), 3);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_issue_requires_student_of_same_school(pool: PgPool) {
    let app = TestApp::new(pool.clone());
    let school_id = create_test_school(&pool, None).await;
    let other_school = create_test_school(&pool, None).await;
    let school_admin = create_test_user(&pool, "school_admin", Some(school_id)).await;
    let outsider = create_test_student(&pool, other_school, None, None).await;
    let teacher = create_test_user(&pool, "teacher", Some(school_id)).await;
    let token = app.token_for(&school_admin).await;

    let (status, body) = app
        .post("/api/certificates", &token, json!({ "student_id": outsider.id, "title": "Award" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Student not found in this school");

    let (status, body) = app
        .post("/api/certificates", &token, json!({ "student_id": teacher.id, "title": "Award" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Student not found in this school");
}

#[sqlx::test(migrations = "./migrations")]
async fn test_students_and_parents_see_only_their_own(pool: PgPool) {
    let app = TestApp::new(pool.clone());
    let school_id = create_test_school(&pool, None).await;
    let school_admin = create_test_user(&pool, "school_admin", Some(school_id)).await;
    let parent = create_test_user(&pool, "parent", Some(school_id)).await;
    let child = create_test_student(&pool, school_id, None, Some(parent.id)).await;
    let classmate = create_test_student(&pool, school_id, None, None).await;
    let admin_token = app.token_for(&school_admin).await;

    let (_, child_cert) = app
        .post("/api/certificates", &admin_token, json!({ "student_id": child.id, "title": "Merit" }))
        .await;
    let (_, classmate_cert) = app
        .post(
            "/api/certificates",
            &admin_token,
            json!({ "student_id": classmate.id, "title": "Merit" }),
        )
        .await;
    let classmate_uri = format!("/api/certificates/{}", classmate_cert["id"].as_str().unwrap());

    let child_token = app.token_for(&child).await;
    let (status, own) = app.get("/api/certificates", &child_token).await;
    assert_eq!(status, StatusCode::OK);
    let own = own.as_array().unwrap();
    assert_eq!(own.len(), 1);
    assert_eq!(own[0]["id"], child_cert["id"]);

    let (status, body) = app.get(&classmate_uri, &child_token).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "You cannot view this student's records");
    let (status, _) = app
        .get(&format!("/api/certificates?student_id={}", classmate.id), &child_token)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let parent_token = app.token_for(&parent).await;
    let (status, body) = app.get("/api/certificates", &parent_token).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "student_id is required");
    let (status, listed) = app
        .get(&format!("/api/certificates?student_id={}", child.id), &parent_token)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed.as_array().unwrap().len(), 1);
    let (status, _) = app.get(&classmate_uri, &parent_token).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_certificates_are_scoped_to_school(pool: PgPool) {
    let app = TestApp::new(pool.clone());
    let school_a = create_test_school(&pool, None).await;
    let school_b = create_test_school(&pool, None).await;
    let admin_a = create_test_user(&pool, "school_admin", Some(school_a)).await;
    let admin_b = create_test_user(&pool, "school_admin", Some(school_b)).await;
    let student = create_test_student(&pool, school_a, None, None).await;

    let token_a = app.token_for(&admin_a).await;
    let (_, certificate) = app
        .post("/api/certificates", &token_a, json!({ "student_id": student.id, "title": "Prize" }))
        .await;
    let uri = format!("/api/certificates/{}", certificate["id"].as_str().unwrap());

    let (status, updated) = app
        .put(&uri, &token_a, json!({ "description": "Inter-house sports" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["title"], "Prize");
    assert_eq!(updated["serial_number"], certificate["serial_number"]);

    let token_b = app.token_for(&admin_b).await;
    let (_, listed) = app.get("/api/certificates", &token_b).await;
    assert!(listed.as_array().unwrap().is_empty());
    let (status, _) = app.get(&uri, &token_b).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = app.delete(&uri, &token_b).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app.delete(&uri, &token_a).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_teacher_cannot_issue_certificates(pool: PgPool) {
    let app = TestApp::new(pool.clone());
    let school_id = create_test_school(&pool, None).await;
    let teacher = create_test_user(&pool, "teacher", Some(school_id)).await;
    let student = create_test_student(&pool, school_id, None, None).await;
    let token = app.token_for(&teacher).await;

    let (status, _) = app
        .post("/api/certificates", &token, json!({ "student_id": student.id, "title": "Star" }))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = app.get("/api/certificates", &token).await;
    assert_eq!(status, StatusCode::OK);
}
