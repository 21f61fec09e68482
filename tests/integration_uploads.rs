mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use common::{TestApp, create_test_school, create_test_user};
use serde_json::Value;
use sqlx::PgPool;

const BOUNDARY: &str = "scholaris-test-boundary";

struct Part<'a> {
    field: &'a str,
    file_name: &'a str,
    mime: &'a str,
    bytes: Vec<u8>,
}

fn part<'a>(field: &'a str, file_name: &'a str, mime: &'a str, bytes: &[u8]) -> Part<'a> {
    Part {
        field,
        file_name,
        mime,
        bytes: bytes.to_vec(),
    }
}

fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
                part.field, part.file_name
            )
            .as_bytes(),
        );
        body.extend_from_slice(format!("Content-Type: {}\r\n\r\n", part.mime).as_bytes());
        body.extend_from_slice(&part.bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

async fn upload(app: &TestApp, uri: &str, token: &str, parts: &[Part<'_>]) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("authorization", format!("Bearer {token}"))
        .header(
            "content-type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(multipart_body(parts)))
        .unwrap();
    app.send(request).await
}

#[sqlx::test(migrations = "./migrations")]
async fn test_single_upload_is_stored_and_served(pool: PgPool) {
    let app = TestApp::new(pool.clone());
    let school_id = create_test_school(&pool, None).await;
    let teacher = create_test_user(&pool, "teacher", Some(school_id)).await;
    let token = app.token_for(&teacher).await;

    let (status, file) = upload(
        &app,
        "/api/upload",
        &token,
        &[part("file", "notes.txt", "text/plain", b"photosynthesis")],
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{file}");
    assert_eq!(file["fileName"], "notes.txt");
    assert_eq!(file["mimeType"], "text/plain");
    assert_eq!(file["size"], 14);
    let url = file["url"].as_str().unwrap();
    assert!(url.starts_with(&format!("/uploads/{school_id}/")));

    let (status, served) = app
        .send(Request::builder().uri(url).body(Body::empty()).unwrap())
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(served, "photosynthesis");
}

#[sqlx::test(migrations = "./migrations")]
async fn test_upload_rejects_disallowed_type(pool: PgPool) {
    let app = TestApp::new(pool.clone());
    let school_id = create_test_school(&pool, None).await;
    let teacher = create_test_user(&pool, "teacher", Some(school_id)).await;
    let token = app.token_for(&teacher).await;

    let (status, _) = upload(
        &app,
        "/api/upload",
        &token,
        &[part("file", "run.sh", "application/x-sh", b"echo hi")],
    )
    .await;
    assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_upload_rejects_oversized_file(pool: PgPool) {
    let app = TestApp::new(pool.clone());
    let school_id = create_test_school(&pool, None).await;
    let teacher = create_test_user(&pool, "teacher", Some(school_id)).await;
    let token = app.token_for(&teacher).await;

    let big = vec![b'a'; 1024 * 1024 + 16];
    let (status, _) = upload(
        &app,
        "/api/upload",
        &token,
        &[part("file", "big.txt", "text/plain", &big)],
    )
    .await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_upload_multiple(pool: PgPool) {
    let app = TestApp::new(pool.clone());
    let school_id = create_test_school(&pool, None).await;
    let staff = create_test_user(&pool, "staff", Some(school_id)).await;
    let token = app.token_for(&staff).await;

    let (status, body) = upload(
        &app,
        "/api/upload-multiple",
        &token,
        &[
            part("files", "a.txt", "text/plain", b"first"),
            part("files", "b.pdf", "application/pdf", b"%PDF-1.4"),
        ],
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["files"].as_array().unwrap().len(), 2);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_upload_multiple_limits_and_batch_validation(pool: PgPool) {
    let app = TestApp::new(pool.clone());
    let school_id = create_test_school(&pool, None).await;
    let staff = create_test_user(&pool, "staff", Some(school_id)).await;
    let token = app.token_for(&staff).await;

    let too_many: Vec<Part> = ["1.txt", "2.txt", "3.txt", "4.txt"]
        .into_iter()
        .map(|name| part("files", name, "text/plain", b"x"))
        .collect();
    let (status, body) = upload(&app, "/api/upload-multiple", &token, &too_many).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "At most 3 files can be uploaded at once");

    // One bad file in the batch means nothing is written.
    let (status, _) = upload(
        &app,
        "/api/upload-multiple",
        &token,
        &[
            part("files", "ok.txt", "text/plain", b"fine"),
            part("files", "bad.exe", "application/x-msdownload", b"MZ"),
        ],
    )
    .await;
    assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
    let school_dir = app.workdir.path().join("uploads").join(school_id.to_string());
    assert!(!school_dir.exists());

    let (status, _) = upload(
        &app,
        "/api/upload-multiple",
        &token,
        &[part("file", "wrong-field.txt", "text/plain", b"x")],
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_upload_requires_auth(pool: PgPool) {
    let app = TestApp::new(pool);
    let request = Request::builder()
        .method("POST")
        .uri("/api/upload")
        .header(
            "content-type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(multipart_body(&[part(
            "file",
            "a.txt",
            "text/plain",
            b"x",
        )])))
        .unwrap();
    let (status, _) = app.send(request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}
