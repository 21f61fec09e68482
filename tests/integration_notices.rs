mod common;

use axum::http::StatusCode;
use common::{
    TestApp, create_test_class, create_test_school, create_test_student, create_test_user,
};
use serde_json::{Value, json};
use sqlx::PgPool;

fn titles(page: &Value) -> Vec<String> {
    let mut titles: Vec<String> = page["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|n| n["title"].as_str().unwrap().to_string())
        .collect();
    titles.sort();
    titles
}

#[sqlx::test(migrations = "./migrations")]
async fn test_notice_audience_by_role_and_class(pool: PgPool) {
    let app = TestApp::new(pool.clone());
    let school_id = create_test_school(&pool, None).await;
    let jss1 = create_test_class(&pool, school_id, "JSS 1").await;
    let jss2 = create_test_class(&pool, school_id, "JSS 2").await;
    let school_admin = create_test_user(&pool, "school_admin", Some(school_id)).await;
    let teacher = create_test_user(&pool, "teacher", Some(school_id)).await;
    let parent = create_test_user(&pool, "parent", Some(school_id)).await;
    let jss1_student = create_test_student(&pool, school_id, Some(jss1), Some(parent.id)).await;
    let jss2_student = create_test_student(&pool, school_id, Some(jss2), None).await;
    let admin_token = app.token_for(&school_admin).await;

    let notices = [
        json!({ "title": "Mid-term break", "body": "School closes Friday" }),
        json!({ "title": "Staff meeting", "body": "Monday 3pm", "audience_role": "teacher" }),
        json!({ "title": "JSS 1 excursion", "body": "Bring packed lunch", "audience_class_id": jss1 }),
        json!({ "title": "PTA dues", "body": "Due next week", "audience_role": "parent" }),
    ];
    let mut staff_notice = Value::Null;
    for notice in notices {
        let (status, created) = app.post("/api/notices", &admin_token, notice).await;
        assert_eq!(status, StatusCode::CREATED, "{created}");
        assert_eq!(created["created_by"], school_admin.id.to_string());
        if created["title"] == "Staff meeting" {
            staff_notice = created;
        }
    }

    let (_, all) = app.get("/api/notices", &admin_token).await;
    assert_eq!(all["meta"]["total"], 4);

    let token = app.token_for(&jss1_student).await;
    let (status, seen) = app.get("/api/notices", &token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(titles(&seen), vec!["JSS 1 excursion", "Mid-term break"]);
    assert_eq!(seen["meta"]["total"], 2);

    let token = app.token_for(&jss2_student).await;
    let (_, seen) = app.get("/api/notices", &token).await;
    assert_eq!(titles(&seen), vec!["Mid-term break"]);

    let token = app.token_for(&parent).await;
    let (_, seen) = app.get("/api/notices", &token).await;
    assert_eq!(titles(&seen), vec!["JSS 1 excursion", "Mid-term break", "PTA dues"]);

    let teacher_token = app.token_for(&teacher).await;
    let (_, seen) = app.get("/api/notices", &teacher_token).await;
    assert_eq!(titles(&seen), vec!["Mid-term break", "Staff meeting"]);

    // Teaching a subject in JSS 1 ties the teacher to that class.
    let (status, _) = app
        .post(
            "/api/subjects",
            &admin_token,
            json!({ "name": "Basic Science", "class_id": jss1, "teacher_id": teacher.id }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let (_, seen) = app.get("/api/notices", &teacher_token).await;
    assert_eq!(
        titles(&seen),
        vec!["JSS 1 excursion", "Mid-term break", "Staff meeting"]
    );

    let staff_uri = format!("/api/notices/{}", staff_notice["id"].as_str().unwrap());
    let (status, _) = app.get(&staff_uri, &teacher_token).await;
    assert_eq!(status, StatusCode::OK);
    let student_token = app.token_for(&jss1_student).await;
    let (status, _) = app.get(&staff_uri, &student_token).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_notice_writes_and_school_scope(pool: PgPool) {
    let app = TestApp::new(pool.clone());
    let school_a = create_test_school(&pool, None).await;
    let school_b = create_test_school(&pool, None).await;
    let admin_a = create_test_user(&pool, "school_admin", Some(school_a)).await;
    let admin_b = create_test_user(&pool, "school_admin", Some(school_b)).await;
    let student = create_test_student(&pool, school_a, None, None).await;
    let foreign_class = create_test_class(&pool, school_b, "SS 3").await;
    let token_a = app.token_for(&admin_a).await;

    let (status, body) = app
        .post(
            "/api/notices",
            &token_a,
            json!({ "title": "Lost item", "body": "Blue bag", "audience_class_id": foreign_class }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Class not found in this school");

    let (status, _) = app
        .post("/api/notices", &token_a, json!({ "title": "Sports day", "body": "" }))
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (_, notice) = app
        .post("/api/notices", &token_a, json!({ "title": "Sports day", "body": "Saturday" }))
        .await;
    let uri = format!("/api/notices/{}", notice["id"].as_str().unwrap());

    let (status, updated) = app.put(&uri, &token_a, json!({ "body": "Moved to Sunday" })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["title"], "Sports day");
    assert_eq!(updated["body"], "Moved to Sunday");

    let student_token = app.token_for(&student).await;
    let (status, _) = app
        .post("/api/notices", &student_token, json!({ "title": "Party", "body": "Tonight" }))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = app.delete(&uri, &student_token).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let token_b = app.token_for(&admin_b).await;
    let (_, listed) = app.get("/api/notices", &token_b).await;
    assert_eq!(listed["meta"]["total"], 0);
    let (status, _) = app.get(&uri, &token_b).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = app.put(&uri, &token_b, json!({ "body": "Cancelled" })).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = app.delete(&uri, &token_b).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app.delete(&uri, &token_a).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_newsletters_newest_first(pool: PgPool) {
    let app = TestApp::new(pool.clone());
    let school_id = create_test_school(&pool, None).await;
    let other_school = create_test_school(&pool, None).await;
    let school_admin = create_test_user(&pool, "school_admin", Some(school_id)).await;
    let parent = create_test_user(&pool, "parent", Some(school_id)).await;
    let token = app.token_for(&school_admin).await;

    for (title, published_on) in [
        ("January issue", "2024-01-10"),
        ("March issue", "2024-03-05"),
        ("February issue", "2024-02-07"),
    ] {
        let (status, newsletter) = app
            .post(
                "/api/newsletters",
                &token,
                json!({
                    "title": title,
                    "file_url": "/uploads/newsletter.pdf",
                    "published_on": published_on,
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{newsletter}");
    }

    let parent_token = app.token_for(&parent).await;
    let (status, listed) = app.get("/api/newsletters", &parent_token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed["meta"]["total"], 3);
    let order: Vec<&str> = listed["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|n| n["title"].as_str().unwrap())
        .collect();
    assert_eq!(order, vec!["March issue", "February issue", "January issue"]);

    let uri = format!("/api/newsletters/{}", listed["data"][2]["id"].as_str().unwrap());
    let (status, updated) = app
        .put(&uri, &token, json!({ "summary": "Inter-house sports results" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["summary"], "Inter-house sports results");
    assert_eq!(updated["published_on"], "2024-01-10");

    let (status, _) = app.put(&uri, &parent_token, json!({ "title": "Mine" })).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let other_admin = create_test_user(&pool, "school_admin", Some(other_school)).await;
    let other_token = app.token_for(&other_admin).await;
    let (status, _) = app.get(&uri, &other_token).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app.delete(&uri, &token).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = app.get(&uri, &token).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
