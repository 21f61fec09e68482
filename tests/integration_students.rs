mod common;

use axum::http::StatusCode;
use common::{
    TestApp, create_test_class, create_test_school, create_test_student, create_test_user,
    generate_unique_email,
};
use serde_json::{Value, json};
use sqlx::PgPool;
use uuid::Uuid;

fn new_student(class_id: Option<Uuid>, parent_id: Option<Uuid>) -> Value {
    json!({
        "first_name": "Chidi",
        "last_name": "Okafor",
        "email": generate_unique_email(),
        "password": "password123",
        "class_id": class_id,
        "roll_number": "07",
        "parent_id": parent_id,
    })
}

#[sqlx::test(migrations = "./migrations")]
async fn test_create_and_filter_students(pool: PgPool) {
    let app = TestApp::new(pool.clone());
    let school_id = create_test_school(&pool, None).await;
    let class_a = create_test_class(&pool, school_id, "JSS 1").await;
    let class_b = create_test_class(&pool, school_id, "JSS 2").await;
    let school_admin = create_test_user(&pool, "school_admin", Some(school_id)).await;
    let parent = create_test_user(&pool, "parent", Some(school_id)).await;
    create_test_student(&pool, school_id, Some(class_b), None).await;
    let token = app.token_for(&school_admin).await;

    let (status, student) = app
        .post("/api/students", &token, new_student(Some(class_a), Some(parent.id)))
        .await;
    assert_eq!(status, StatusCode::CREATED, "{student}");
    assert_eq!(student["role"], "student");
    assert_eq!(student["class_id"], class_a.to_string());
    assert_eq!(student["roll_number"], "07");
    assert_eq!(student["parent_id"], parent.id.to_string());

    let (status, all) = app.get("/api/students", &token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(all["meta"]["total"], 2);

    let (_, in_class) = app
        .get(&format!("/api/students?class_id={class_a}"), &token)
        .await;
    assert_eq!(in_class["meta"]["total"], 1);
    assert_eq!(in_class["data"][0]["id"], student["id"]);

    let (_, found) = app.get("/api/students?search=chidi", &token).await;
    assert_eq!(found["meta"]["total"], 1);

    let parent_token = app.token_for(&parent).await;
    let (status, children) = app.get("/api/students/children", &parent_token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(children.as_array().unwrap().len(), 1);
    assert_eq!(children[0]["id"], student["id"]);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_student_placement_must_be_in_school(pool: PgPool) {
    let app = TestApp::new(pool.clone());
    let school_id = create_test_school(&pool, None).await;
    let other_school = create_test_school(&pool, None).await;
    let foreign_class = create_test_class(&pool, other_school, "JSS 1").await;
    let foreign_parent = create_test_user(&pool, "parent", Some(other_school)).await;
    let teacher = create_test_user(&pool, "teacher", Some(school_id)).await;
    let school_admin = create_test_user(&pool, "school_admin", Some(school_id)).await;
    let token = app.token_for(&school_admin).await;

    let (status, body) = app
        .post("/api/students", &token, new_student(Some(foreign_class), None))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Class not found in this school");

    let (status, body) = app
        .post("/api/students", &token, new_student(None, Some(foreign_parent.id)))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Parent not found in this school");

    let (status, body) = app
        .post("/api/students", &token, new_student(None, Some(teacher.id)))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "parent_id must reference a parent account");
}

#[sqlx::test(migrations = "./migrations")]
async fn test_students_are_scoped_to_school(pool: PgPool) {
    let app = TestApp::new(pool.clone());
    let school_a = create_test_school(&pool, None).await;
    let school_b = create_test_school(&pool, None).await;
    let student = create_test_student(&pool, school_a, None, None).await;
    let admin_b = create_test_user(&pool, "school_admin", Some(school_b)).await;
    let token = app.token_for(&admin_b).await;

    let (_, listed) = app.get("/api/students", &token).await;
    assert_eq!(listed["meta"]["total"], 0);

    let uri = format!("/api/students/{}", student.id);
    let (status, _) = app.get(&uri, &token).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = app.put(&uri, &token, json!({ "roll_number": "99" })).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = app.delete(&uri, &token).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_student_endpoints_only_return_students(pool: PgPool) {
    let app = TestApp::new(pool.clone());
    let school_id = create_test_school(&pool, None).await;
    let school_admin = create_test_user(&pool, "school_admin", Some(school_id)).await;
    let teacher = create_test_user(&pool, "teacher", Some(school_id)).await;
    let token = app.token_for(&school_admin).await;

    let (status, _) = app.get(&format!("/api/students/{}", teacher.id), &token).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app.get(&format!("/api/teachers/{}", teacher.id), &token).await;
    assert_eq!(status, StatusCode::OK);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_teacher_crud_and_subject_assignment(pool: PgPool) {
    let app = TestApp::new(pool.clone());
    let school_id = create_test_school(&pool, None).await;
    let other_school = create_test_school(&pool, None).await;
    let class_id = create_test_class(&pool, school_id, "SS 1").await;
    let school_admin = create_test_user(&pool, "school_admin", Some(school_id)).await;
    let token = app.token_for(&school_admin).await;

    let (status, teacher) = app
        .post(
            "/api/teachers",
            &token,
            json!({
                "first_name": "Ngozi",
                "last_name": "Eze",
                "email": generate_unique_email(),
                "password": "password123",
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{teacher}");
    assert_eq!(teacher["role"], "teacher");
    let teacher_id = teacher["id"].as_str().unwrap().to_string();

    let mut subject_ids = Vec::new();
    for name in ["Literature", "Government"] {
        let (_, subject) = app
            .post("/api/subjects", &token, json!({ "name": name, "class_id": class_id }))
            .await;
        subject_ids.push(subject["id"].as_str().unwrap().to_string());
    }

    let (status, assigned) = app
        .post(
            &format!("/api/teachers/{teacher_id}/subjects"),
            &token,
            json!({ "subject_ids": subject_ids }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{assigned}");
    assert_eq!(assigned.as_array().unwrap().len(), 2);

    let (status, subjects) = app
        .get(&format!("/api/teachers/{teacher_id}/subjects"), &token)
        .await;
    assert_eq!(status, StatusCode::OK);
    let names: Vec<&str> = subjects
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Government", "Literature"]);

    let (status, _) = app
        .post(
            &format!("/api/teachers/{teacher_id}/subjects"),
            &token,
            json!({ "subject_ids": [] }),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (_, listed) = app.get("/api/teachers", &token).await;
    assert_eq!(listed["meta"]["total"], 1);

    let admin_b = create_test_user(&pool, "school_admin", Some(other_school)).await;
    let token_b = app.token_for(&admin_b).await;
    let (status, _) = app.get(&format!("/api/teachers/{teacher_id}"), &token_b).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, updated) = app
        .put(&format!("/api/teachers/{teacher_id}"), &token, json!({ "phone": "+2348000000000" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["phone"], "+2348000000000");

    let (status, _) = app.delete(&format!("/api/teachers/{teacher_id}"), &token).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = app.get(&format!("/api/teachers/{teacher_id}"), &token).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_teacher_reads_but_cannot_create_students(pool: PgPool) {
    let app = TestApp::new(pool.clone());
    let school_id = create_test_school(&pool, None).await;
    let teacher = create_test_user(&pool, "teacher", Some(school_id)).await;
    let token = app.token_for(&teacher).await;

    let (status, _) = app.get("/api/students", &token).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = app.post("/api/students", &token, new_student(None, None)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = app.get("/api/students/children", &token).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}
