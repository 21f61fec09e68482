mod common;

use axum::http::StatusCode;
use common::{TestApp, create_test_school, create_test_user};
use serde_json::json;
use sqlx::PgPool;

#[sqlx::test(migrations = "./migrations")]
async fn test_stock_moves_through_transactions(pool: PgPool) {
    let school_id = create_test_school(&pool, None).await;
    let storekeeper = create_test_user(&pool, "staff", Some(school_id)).await;
    let app = TestApp::new(pool);
    let token = app.token_for(&storekeeper).await;

    let (status, item) = app
        .post(
            "/api/inventory/items",
            &token,
            json!({ "name": "Chalk box", "unit": "box", "initial_quantity": 10 }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(item["quantity"], 10);
    let uri = format!("/api/inventory/items/{}/transactions", item["id"].as_str().unwrap());

    let (status, movement) = app
        .post(&uri, &token, json!({ "direction": "out", "quantity": 4, "note": "Grade 3" }))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(movement["item"]["quantity"], 6);
    assert_eq!(movement["transaction"]["balance_after"], 6);

    let (status, movement) = app
        .post(&uri, &token, json!({ "direction": "in", "quantity": 5 }))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(movement["item"]["quantity"], 11);

    let (status, ledger) = app.get(&uri, &token).await;
    assert_eq!(status, StatusCode::OK);
    // opening stock, out, in
    assert_eq!(ledger.as_array().unwrap().len(), 3);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_out_never_makes_quantity_negative(pool: PgPool) {
    let school_id = create_test_school(&pool, None).await;
    let storekeeper = create_test_user(&pool, "staff", Some(school_id)).await;
    let app = TestApp::new(pool);
    let token = app.token_for(&storekeeper).await;

    let (_, item) = app
        .post(
            "/api/inventory/items",
            &token,
            json!({ "name": "Markers", "initial_quantity": 3 }),
        )
        .await;
    let item_uri = format!("/api/inventory/items/{}", item["id"].as_str().unwrap());

    let (status, body) = app
        .post(
            &format!("{}/transactions", item_uri),
            &token,
            json!({ "direction": "out", "quantity": 4 }),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "Insufficient stock: 3 available, 4 requested");

    let (_, item) = app.get(&item_uri, &token).await;
    assert_eq!(item["quantity"], 3);

    let (status, item) = app
        .post(
            &format!("{}/transactions", item_uri),
            &token,
            json!({ "direction": "out", "quantity": 3 }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(item["item"]["quantity"], 0);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_zero_quantity_is_invalid(pool: PgPool) {
    let school_id = create_test_school(&pool, None).await;
    let storekeeper = create_test_user(&pool, "staff", Some(school_id)).await;
    let app = TestApp::new(pool);
    let token = app.token_for(&storekeeper).await;

    let (_, item) = app
        .post("/api/inventory/items", &token, json!({ "name": "Paper" }))
        .await;
    assert_eq!(item["quantity"], 0);

    let (status, _) = app
        .post(
            &format!("/api/inventory/items/{}/transactions", item["id"].as_str().unwrap()),
            &token,
            json!({ "direction": "in", "quantity": 0 }),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_items_are_school_scoped(pool: PgPool) {
    let school_a = create_test_school(&pool, None).await;
    let school_b = create_test_school(&pool, None).await;
    let keeper_a = create_test_user(&pool, "staff", Some(school_a)).await;
    let keeper_b = create_test_user(&pool, "staff", Some(school_b)).await;
    let app = TestApp::new(pool);
    let token_a = app.token_for(&keeper_a).await;
    let token_b = app.token_for(&keeper_b).await;

    let (_, item) = app
        .post("/api/inventory/items", &token_a, json!({ "name": "Desks", "initial_quantity": 30 }))
        .await;

    let (status, _) = app
        .post(
            &format!("/api/inventory/items/{}/transactions", item["id"].as_str().unwrap()),
            &token_b,
            json!({ "direction": "out", "quantity": 1 }),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, list) = app.get("/api/inventory/items", &token_b).await;
    assert_eq!(list["meta"]["total"], 0);
}
