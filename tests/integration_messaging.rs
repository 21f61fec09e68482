mod common;

use axum::http::StatusCode;
use common::{
    TestApp, create_test_class, create_test_school, create_test_student, create_test_user,
};
use serde_json::json;
use sqlx::PgPool;

#[sqlx::test(migrations = "./migrations")]
async fn test_conversation_between_teacher_and_parent(pool: PgPool) {
    let app = TestApp::new(pool.clone());
    let school_id = create_test_school(&pool, None).await;
    let teacher = create_test_user(&pool, "teacher", Some(school_id)).await;
    let parent = create_test_user(&pool, "parent", Some(school_id)).await;
    let outsider = create_test_user(&pool, "teacher", Some(school_id)).await;

    let teacher_token = app.token_for(&teacher).await;
    let (status, conversation) = app
        .post(
            "/api/messages/conversations",
            &teacher_token,
            json!({
                "participant_ids": [parent.id],
                "subject": "Homework",
                "body": "Please check the maths homework tonight.",
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{conversation}");
    assert_eq!(conversation["participants"].as_array().unwrap().len(), 2);
    let id = conversation["id"].as_str().unwrap().to_string();

    let parent_token = app.token_for(&parent).await;
    let (_, inbox) = app.get("/api/messages/conversations", &parent_token).await;
    assert_eq!(inbox[0]["unread_count"], 1);

    let (status, _) = app
        .post(
            &format!("/api/messages/conversations/{id}/messages"),
            &parent_token,
            json!({ "body": "Will do, thank you." }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = app
        .request(
            "POST",
            &format!("/api/messages/conversations/{id}/read"),
            Some(&parent_token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (_, inbox) = app.get("/api/messages/conversations", &parent_token).await;
    assert_eq!(inbox[0]["unread_count"], 0);
    assert_eq!(inbox[0]["last_message"], "Will do, thank you.");

    let (status, messages) = app
        .get(&format!("/api/messages/conversations/{id}/messages"), &teacher_token)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(messages["data"].as_array().unwrap().len(), 2);
    assert_eq!(messages["data"][0]["body"], "Please check the maths homework tonight.");

    let outsider_token = app.token_for(&outsider).await;
    let (status, _) = app
        .get(&format!("/api/messages/conversations/{id}"), &outsider_token)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = app
        .post(
            &format!("/api/messages/conversations/{id}/messages"),
            &outsider_token,
            json!({ "body": "Hello?" }),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_participants_must_share_school(pool: PgPool) {
    let app = TestApp::new(pool.clone());
    let school_id = create_test_school(&pool, None).await;
    let other_school = create_test_school(&pool, None).await;
    let teacher = create_test_user(&pool, "teacher", Some(school_id)).await;
    let stranger = create_test_user(&pool, "parent", Some(other_school)).await;
    let token = app.token_for(&teacher).await;

    let (status, body) = app
        .post(
            "/api/messages/conversations",
            &token,
            json!({ "participant_ids": [stranger.id], "body": "Hi" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "All participants must belong to the same school");
}

#[sqlx::test(migrations = "./migrations")]
async fn test_broadcast_to_class_reaches_students_and_parents(pool: PgPool) {
    let app = TestApp::new(pool.clone());
    let school_id = create_test_school(&pool, None).await;
    let class_id = create_test_class(&pool, school_id, "Primary 4").await;
    let other_class = create_test_class(&pool, school_id, "Primary 5").await;
    let teacher = create_test_user(&pool, "teacher", Some(school_id)).await;
    let parent = create_test_user(&pool, "parent", Some(school_id)).await;
    create_test_student(&pool, school_id, Some(class_id), Some(parent.id)).await;
    create_test_student(&pool, school_id, Some(class_id), None).await;
    create_test_student(&pool, school_id, Some(other_class), None).await;
    let token = app.token_for(&teacher).await;

    let (status, result) = app
        .post(
            "/api/messages/broadcast",
            &token,
            json!({ "title": "Excursion", "body": "Bring a packed lunch on Friday.", "class_id": class_id }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{result}");
    assert_eq!(result["recipients"], 3);
    assert_eq!(result["notice"]["title"], "Excursion");

    let parent_token = app.token_for(&parent).await;
    let (_, inbox) = app.get("/api/messages/conversations", &parent_token).await;
    assert_eq!(inbox.as_array().unwrap().len(), 1);
    assert_eq!(inbox[0]["subject"], "Excursion");
}

#[sqlx::test(migrations = "./migrations")]
async fn test_broadcast_needs_matching_audience(pool: PgPool) {
    let app = TestApp::new(pool.clone());
    let school_id = create_test_school(&pool, None).await;
    let class_id = create_test_class(&pool, school_id, "Empty class").await;
    let teacher = create_test_user(&pool, "teacher", Some(school_id)).await;
    let token = app.token_for(&teacher).await;

    let (status, body) = app
        .post(
            "/api/messages/broadcast",
            &token,
            json!({ "title": "Anyone?", "body": "Hello", "class_id": class_id }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "No users match the broadcast audience");
}
