mod common;

use axum::http::StatusCode;
use common::{
    TestApp, create_test_class, create_test_school, create_test_student, create_test_user,
};
use serde_json::json;
use sqlx::PgPool;
use uuid::Uuid;

async fn create_subject(app: &TestApp, token: &str, name: &str, class_id: Uuid) -> String {
    let (status, subject) = app
        .post(
            "/api/subjects",
            token,
            json!({ "name": name, "code": null, "class_id": class_id, "teacher_id": null }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{subject}");
    subject["id"].as_str().unwrap().to_string()
}

async fn add_paper(app: &TestApp, token: &str, exam_id: &str, subject_id: &str, max: f64) -> String {
    let (status, paper) = app
        .post(
            &format!("/api/exams/{exam_id}/papers"),
            token,
            json!({ "subject_id": subject_id, "max_marks": max }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{paper}");
    paper["id"].as_str().unwrap().to_string()
}

#[sqlx::test(migrations = "./migrations")]
async fn test_report_card_counts_missing_papers_as_zero(pool: PgPool) {
    let app = TestApp::new(pool.clone());
    let school_id = create_test_school(&pool, None).await;
    let class_id = create_test_class(&pool, school_id, "SS 2").await;
    let school_admin = create_test_user(&pool, "school_admin", Some(school_id)).await;
    let teacher = create_test_user(&pool, "teacher", Some(school_id)).await;
    let parent = create_test_user(&pool, "parent", Some(school_id)).await;
    let student = create_test_student(&pool, school_id, Some(class_id), Some(parent.id)).await;

    let admin_token = app.token_for(&school_admin).await;
    let maths = create_subject(&app, &admin_token, "Mathematics", class_id).await;
    let english = create_subject(&app, &admin_token, "English", class_id).await;

    let teacher_token = app.token_for(&teacher).await;
    let (status, exam) = app
        .post(
            "/api/exams",
            &teacher_token,
            json!({ "name": "First Term", "class_id": class_id }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{exam}");
    let exam_id = exam["id"].as_str().unwrap().to_string();

    let maths_paper = add_paper(&app, &teacher_token, &exam_id, &maths, 100.0).await;
    add_paper(&app, &teacher_token, &exam_id, &english, 50.0).await;

    let (status, results) = app
        .post(
            &format!("/api/exams/papers/{maths_paper}/results"),
            &teacher_token,
            json!({ "results": [{ "student_id": student.id, "marks": 90.0, "remarks": "Excellent" }] }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{results}");

    let parent_token = app.token_for(&parent).await;
    let (status, report) = app
        .get(
            &format!("/api/exams/{exam_id}/students/{}/report", student.id),
            &parent_token,
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{report}");
    assert_eq!(report["total_marks"], 90.0);
    assert_eq!(report["total_max_marks"], 150.0);
    assert_eq!(report["percentage"], 60.0);
    assert_eq!(report["grade"], "C");

    let subjects = report["subjects"].as_array().unwrap();
    assert_eq!(subjects.len(), 2);
    assert_eq!(subjects[0]["subject_name"], "English");
    assert!(subjects[0]["marks"].is_null());
    assert!(subjects[0]["grade"].is_null());
    assert_eq!(subjects[1]["subject_name"], "Mathematics");
    assert_eq!(subjects[1]["grade"], "A+");
}

#[sqlx::test(migrations = "./migrations")]
async fn test_marks_above_maximum_are_rejected(pool: PgPool) {
    let app = TestApp::new(pool.clone());
    let school_id = create_test_school(&pool, None).await;
    let class_id = create_test_class(&pool, school_id, "SS 1").await;
    let school_admin = create_test_user(&pool, "school_admin", Some(school_id)).await;
    let student = create_test_student(&pool, school_id, Some(class_id), None).await;
    let token = app.token_for(&school_admin).await;

    let subject = create_subject(&app, &token, "Physics", class_id).await;
    let (_, exam) = app
        .post("/api/exams", &token, json!({ "name": "Quiz", "class_id": class_id }))
        .await;
    let exam_id = exam["id"].as_str().unwrap();
    let paper = add_paper(&app, &token, exam_id, &subject, 20.0).await;

    let (status, body) = app
        .post(
            &format!("/api/exams/papers/{paper}/results"),
            &token,
            json!({ "results": [{ "student_id": student.id, "marks": 25.0 }] }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Marks 25 exceed the paper maximum of 20");
}

#[sqlx::test(migrations = "./migrations")]
async fn test_other_parent_cannot_read_report(pool: PgPool) {
    let app = TestApp::new(pool.clone());
    let school_id = create_test_school(&pool, None).await;
    let class_id = create_test_class(&pool, school_id, "SS 3").await;
    let school_admin = create_test_user(&pool, "school_admin", Some(school_id)).await;
    let stranger = create_test_user(&pool, "parent", Some(school_id)).await;
    let student = create_test_student(&pool, school_id, Some(class_id), None).await;

    let token = app.token_for(&school_admin).await;
    let (_, exam) = app
        .post("/api/exams", &token, json!({ "name": "Mock", "class_id": class_id }))
        .await;
    let exam_id = exam["id"].as_str().unwrap();

    let stranger_token = app.token_for(&stranger).await;
    let (status, _) = app
        .get(
            &format!("/api/exams/{exam_id}/students/{}/report", student.id),
            &stranger_token,
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}
