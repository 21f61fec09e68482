mod common;

use axum::http::StatusCode;
use common::{TestApp, create_test_school, create_test_student, create_test_user};
use serde_json::json;
use sqlx::PgPool;

#[sqlx::test(migrations = "./migrations")]
async fn test_issue_and_late_return_charges_fine(pool: PgPool) {
    let app = TestApp::new(pool.clone());
    let school_id = create_test_school(&pool, None).await;
    let librarian = create_test_user(&pool, "staff", Some(school_id)).await;
    let student = create_test_student(&pool, school_id, None, None).await;
    let token = app.token_for(&librarian).await;

    let (status, book) = app
        .post(
            "/api/library/books",
            &token,
            json!({ "title": "Things Fall Apart", "author": "Chinua Achebe", "total_copies": 1 }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{book}");
    assert_eq!(book["available_copies"], 1);
    let book_id = book["id"].as_str().unwrap().to_string();

    let (status, issue) = app
        .post(
            "/api/library/issues",
            &token,
            json!({ "book_id": book_id, "user_id": student.id, "issued_on": "2025-01-01" }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{issue}");
    assert_eq!(issue["due_on"], "2025-01-15");
    let issue_id = issue["id"].as_str().unwrap().to_string();

    let (status, body) = app
        .post(
            "/api/library/issues",
            &token,
            json!({ "book_id": book_id, "user_id": student.id }),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "No copies of this book are available");

    let (status, _) = app.delete(&format!("/api/library/books/{book_id}"), &token).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, returned) = app
        .post(
            &format!("/api/library/issues/{issue_id}/return"),
            &token,
            json!({ "returned_on": "2025-01-18" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{returned}");
    assert_eq!(returned["fine"], 3.0);

    let (status, body) = app
        .post(
            &format!("/api/library/issues/{issue_id}/return"),
            &token,
            json!({ "returned_on": "2025-01-19" }),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "Book has already been returned");

    let (_, book) = app.get(&format!("/api/library/books/{book_id}"), &token).await;
    assert_eq!(book["available_copies"], 1);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_borrower_must_belong_to_school(pool: PgPool) {
    let app = TestApp::new(pool.clone());
    let school_id = create_test_school(&pool, None).await;
    let other_school = create_test_school(&pool, None).await;
    let librarian = create_test_user(&pool, "staff", Some(school_id)).await;
    let outsider = create_test_student(&pool, other_school, None, None).await;
    let token = app.token_for(&librarian).await;

    let (_, book) = app
        .post(
            "/api/library/books",
            &token,
            json!({ "title": "Arrow of God", "total_copies": 2 }),
        )
        .await;

    let (status, body) = app
        .post(
            "/api/library/issues",
            &token,
            json!({ "book_id": book["id"], "user_id": outsider.id }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Borrower not found in this school");
}

#[sqlx::test(migrations = "./migrations")]
async fn test_student_cannot_add_books(pool: PgPool) {
    let app = TestApp::new(pool.clone());
    let school_id = create_test_school(&pool, None).await;
    let student = create_test_student(&pool, school_id, None, None).await;
    let token = app.token_for(&student).await;

    let (status, _) = app
        .post("/api/library/books", &token, json!({ "title": "Mine", "total_copies": 1 }))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}
