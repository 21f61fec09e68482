mod common;

use axum::http::StatusCode;
use common::{TestApp, create_test_school, create_test_user};
use serde_json::json;
use sqlx::PgPool;

#[sqlx::test(migrations = "./migrations")]
async fn test_audio_program_is_live_with_offset(pool: PgPool) {
    let app = TestApp::new(pool.clone());
    let school_id = create_test_school(&pool, None).await;
    let teacher = create_test_user(&pool, "teacher", Some(school_id)).await;
    let token = app.token_for(&teacher).await;

    let (status, program) = app
        .post(
            "/api/radio/programs",
            &token,
            json!({
                "title": "Morning news",
                "scheduledFor": "2024-01-01T08:00:00Z",
                "durationSeconds": 300,
                "fileUrl": "/uploads/news.mp3",
                "fileType": "audio/mpeg",
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{program}");
    assert!(program["id"].is_string());

    let (status, live) = app
        .get("/api/radio/live?at=2024-01-01T08:02:00Z", &token)
        .await;
    assert_eq!(status, StatusCode::OK, "{live}");
    let live = live.as_array().unwrap();
    assert_eq!(live.len(), 1);
    assert_eq!(live[0]["title"], "Morning news");
    assert_eq!(live[0]["currentOffset"], 120);
    assert_eq!(live[0]["remainingSeconds"], 180);
    assert_eq!(live[0]["playback"]["mode"], "audio");
    assert_eq!(live[0]["playback"]["seekSeconds"], 120);

    let (_, live) = app
        .get("/api/radio/live?at=2024-01-01T08:05:00Z", &token)
        .await;
    assert!(live.as_array().unwrap().is_empty());
}

#[sqlx::test(migrations = "./migrations")]
async fn test_text_program_resumes_mid_chunk(pool: PgPool) {
    let app = TestApp::new(pool.clone());
    let school_id = create_test_school(&pool, None).await;
    let school_admin = create_test_user(&pool, "school_admin", Some(school_id)).await;
    let token = app.token_for(&school_admin).await;

    let content = (1..=100)
        .map(|i| format!("word{i}"))
        .collect::<Vec<_>>()
        .join(" ");
    let (status, _) = app
        .post(
            "/api/radio/programs",
            &token,
            json!({
                "title": "Story time",
                "scheduledFor": "2024-01-01T09:00:00Z",
                "durationSeconds": 600,
                "content": content,
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    // 20 s at 2.5 words per second puts playback at word 50.
    let (_, live) = app
        .get("/api/radio/live?at=2024-01-01T09:00:20Z", &token)
        .await;
    let playback = &live[0]["playback"];
    assert_eq!(playback["mode"], "speech");
    assert_eq!(playback["chunks"].as_array().unwrap().len(), 4);
    assert_eq!(playback["startChunk"], 1);
    assert_eq!(playback["startWord"], 20);

    // Text is exhausted well before the slot ends.
    let (_, live) = app
        .get("/api/radio/live?at=2024-01-01T09:05:00Z", &token)
        .await;
    assert_eq!(live[0]["playback"]["startChunk"], 4);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_program_needs_media(pool: PgPool) {
    let app = TestApp::new(pool.clone());
    let school_id = create_test_school(&pool, None).await;
    let teacher = create_test_user(&pool, "teacher", Some(school_id)).await;
    let token = app.token_for(&teacher).await;

    let (status, _) = app
        .post(
            "/api/radio/programs",
            &token,
            json!({
                "title": "Silence",
                "scheduledFor": "2024-01-01T08:00:00Z",
                "durationSeconds": 60,
            }),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_schedules_are_per_school_and_legacy_ids_load(pool: PgPool) {
    let app = TestApp::new(pool.clone());
    let school_a = create_test_school(&pool, None).await;
    let school_b = create_test_school(&pool, None).await;
    let teacher_a = create_test_user(&pool, "teacher", Some(school_a)).await;
    let teacher_b = create_test_user(&pool, "teacher", Some(school_b)).await;

    let legacy = json!({
        (school_a.to_string()): [{
            "id": 1704096000000u64,
            "title": "Assembly",
            "scheduledFor": "2024-01-01T07:30:00Z",
            "durationSeconds": 900,
            "content": "Good morning everyone",
        }]
    });
    std::fs::write(
        app.workdir.path().join("radio-programs.json"),
        serde_json::to_vec(&legacy).unwrap(),
    )
    .unwrap();

    let token_a = app.token_for(&teacher_a).await;
    let (status, programs) = app.get("/api/radio/programs", &token_a).await;
    assert_eq!(status, StatusCode::OK, "{programs}");
    assert_eq!(programs[0]["id"], "1704096000000");

    let (status, _) = app
        .request(
            "PUT",
            "/api/radio/programs/1704096000000",
            Some(&token_a),
            Some(json!({ "title": "Assembly (extended)", "durationSeconds": 1200 })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let token_b = app.token_for(&teacher_b).await;
    let (_, programs) = app.get("/api/radio/programs", &token_b).await;
    assert!(programs.as_array().unwrap().is_empty());

    let (status, _) = app
        .delete("/api/radio/programs/1704096000000", &token_b)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_oversized_duration_in_file_is_not_live(pool: PgPool) {
    let app = TestApp::new(pool.clone());
    let school_id = create_test_school(&pool, None).await;
    let teacher = create_test_user(&pool, "teacher", Some(school_id)).await;

    let schedule = json!({
        (school_id.to_string()): [{
            "id": "endless",
            "title": "Endless loop",
            "scheduledFor": "2024-01-01T08:00:00Z",
            "durationSeconds": 10_000_000_000_000i64,
            "content": "Still here",
        }]
    });
    std::fs::write(
        app.workdir.path().join("radio-programs.json"),
        serde_json::to_vec(&schedule).unwrap(),
    )
    .unwrap();

    let token = app.token_for(&teacher).await;
    let (status, live) = app
        .get("/api/radio/live?at=2024-01-01T08:02:00Z", &token)
        .await;
    assert_eq!(status, StatusCode::OK, "{live}");
    assert!(live.as_array().unwrap().is_empty());
}

#[sqlx::test(migrations = "./migrations")]
async fn test_update_that_removes_all_media_is_rejected(pool: PgPool) {
    let app = TestApp::new(pool.clone());
    let school_id = create_test_school(&pool, None).await;
    let teacher = create_test_user(&pool, "teacher", Some(school_id)).await;
    let token = app.token_for(&teacher).await;

    let (_, program) = app
        .post(
            "/api/radio/programs",
            &token,
            json!({
                "title": "Poetry hour",
                "scheduledFor": "2024-01-01T10:00:00Z",
                "durationSeconds": 600,
                "content": "Shall I compare thee",
            }),
        )
        .await;
    let id = program["id"].as_str().unwrap();

    let (status, _) = app
        .put(
            &format!("/api/radio/programs/{id}"),
            &token,
            json!({ "content": "   " }),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (_, programs) = app.get("/api/radio/programs", &token).await;
    assert_eq!(programs[0]["content"], "Shall I compare thee");

    let (status, _) = app
        .put("/api/radio/programs/missing", &token, json!({ "title": "Ghost" }))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
