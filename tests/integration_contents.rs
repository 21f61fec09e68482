mod common;

use axum::http::StatusCode;
use common::{
    TestApp, create_test_class, create_test_school, create_test_student, create_test_user,
};
use serde_json::json;
use sqlx::PgPool;

#[sqlx::test(migrations = "./migrations")]
async fn test_contents_filter_by_kind_and_class(pool: PgPool) {
    let app = TestApp::new(pool.clone());
    let school_id = create_test_school(&pool, None).await;
    let jss1 = create_test_class(&pool, school_id, "JSS 1").await;
    let jss2 = create_test_class(&pool, school_id, "JSS 2").await;
    let teacher = create_test_user(&pool, "teacher", Some(school_id)).await;
    let token = app.token_for(&teacher).await;

    let items = [
        ("homework", "Fractions worksheet", jss1),
        ("homework", "Essay on rivers", jss2),
        ("note", "Fractions summary", jss1),
        ("syllabus", "First term plan", jss1),
    ];
    for (kind, title, class_id) in items {
        let (status, content) = app
            .post(
                "/api/contents",
                &token,
                json!({
                    "kind": kind,
                    "title": title,
                    "class_id": class_id,
                    "attachment_url": "/uploads/notes.pdf",
                    "due_date": "2025-02-01",
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{content}");
        assert_eq!(content["kind"], kind);
        assert_eq!(content["created_by"], teacher.id.to_string());
    }

    let (status, all) = app.get("/api/contents", &token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(all["meta"]["total"], 4);

    let (_, homework) = app.get("/api/contents?kind=homework", &token).await;
    assert_eq!(homework["meta"]["total"], 2);
    assert!(
        homework["data"]
            .as_array()
            .unwrap()
            .iter()
            .all(|c| c["kind"] == "homework")
    );

    let (_, jss1_homework) = app
        .get(&format!("/api/contents?kind=homework&class_id={jss1}"), &token)
        .await;
    assert_eq!(jss1_homework["meta"]["total"], 1);
    assert_eq!(jss1_homework["data"][0]["title"], "Fractions worksheet");
    assert_eq!(jss1_homework["data"][0]["attachment_url"], "/uploads/notes.pdf");

    let (status, _) = app.get("/api/contents?kind=poem", &token).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_content_update_and_delete(pool: PgPool) {
    let app = TestApp::new(pool.clone());
    let school_id = create_test_school(&pool, None).await;
    let teacher = create_test_user(&pool, "teacher", Some(school_id)).await;
    let token = app.token_for(&teacher).await;

    let (_, content) = app
        .post(
            "/api/contents",
            &token,
            json!({ "kind": "assignment", "title": "Lab report", "body": "Write up the titration" }),
        )
        .await;
    let uri = format!("/api/contents/{}", content["id"].as_str().unwrap());

    let (status, updated) = app
        .put(&uri, &token, json!({ "title": "Lab report (final)", "due_date": "2025-03-10" }))
        .await;
    assert_eq!(status, StatusCode::OK, "{updated}");
    assert_eq!(updated["title"], "Lab report (final)");
    assert_eq!(updated["body"], "Write up the titration");
    assert_eq!(updated["due_date"], "2025-03-10");

    let (status, _) = app.delete(&uri, &token).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = app.get(&uri, &token).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_contents_are_scoped_to_school(pool: PgPool) {
    let app = TestApp::new(pool.clone());
    let school_a = create_test_school(&pool, None).await;
    let school_b = create_test_school(&pool, None).await;
    let teacher_a = create_test_user(&pool, "teacher", Some(school_a)).await;
    let teacher_b = create_test_user(&pool, "teacher", Some(school_b)).await;
    let foreign_class = create_test_class(&pool, school_b, "JSS 3").await;

    let token_a = app.token_for(&teacher_a).await;
    let (_, content) = app
        .post("/api/contents", &token_a, json!({ "kind": "note", "title": "Photosynthesis" }))
        .await;
    let uri = format!("/api/contents/{}", content["id"].as_str().unwrap());

    let (status, body) = app
        .post(
            "/api/contents",
            &token_a,
            json!({ "kind": "note", "title": "Stray", "class_id": foreign_class }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Class not found in this school");

    let token_b = app.token_for(&teacher_b).await;
    let (_, listed) = app.get("/api/contents", &token_b).await;
    assert_eq!(listed["meta"]["total"], 0);
    let (status, _) = app.get(&uri, &token_b).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = app.put(&uri, &token_b, json!({ "title": "Mine now" })).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = app.delete(&uri, &token_b).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_students_read_but_cannot_write_contents(pool: PgPool) {
    let app = TestApp::new(pool.clone());
    let school_id = create_test_school(&pool, None).await;
    let student = create_test_student(&pool, school_id, None, None).await;
    let token = app.token_for(&student).await;

    let (status, _) = app.get("/api/contents", &token).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = app
        .post("/api/contents", &token, json!({ "kind": "note", "title": "Cheat sheet" }))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}
