use std::time::Duration;

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use collabhub_server::{api::app_router, build_state, config::Config};
use serde_json::{json, Value};
use tempfile::{tempdir, TempDir};
use tower::ServiceExt;

struct TestApp {
    router: Router,
    db_path: String,
    _dir: TempDir,
}

async fn build_test_app() -> TestApp {
    let tmp = tempdir().unwrap();
    let db_path = tmp.path().join("test.db").to_string_lossy().to_string();

    // Fields are set directly: tests in this file run concurrently and
    // share the process environment.
    let mut config = Config::from_env();
    config.db_path = db_path.clone();
    config.redis_url = None;
    config.notify_webhook_url = None;

    let state = build_state(&config).await.unwrap();
    TestApp {
        router: app_router(state, &config),
        db_path,
        _dir: tmp,
    }
}

fn seed(db_path: &str, sql: &str) {
    let conn = rusqlite::Connection::open(db_path).unwrap();
    conn.execute_batch(sql).unwrap();
}

async fn send(app: &Router, method: Method, uri: &str, user: Option<i64>, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(user_id) = user {
        builder = builder.header("x-user-id", user_id.to_string());
    }
    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

async fn get(app: &Router, uri: &str, user: i64) -> (StatusCode, Value) {
    send(app, Method::GET, uri, Some(user), None).await
}

/// Polls the feed until it reports `expected` events.
async fn wait_for_feed(app: &Router, uri: &str, user: i64, expected: u64) -> Value {
    for _ in 0..100 {
        let (status, body) = get(app, uri, user).await;
        assert_eq!(status, StatusCode::OK);
        if body["count"].as_u64() == Some(expected) {
            return body;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("feed at {} never reached {} events", uri, expected);
}

#[tokio::test]
async fn empty_feed_is_success() {
    let app = build_test_app().await;

    let (status, body) = get(&app.router, "/api/v1/feed", 7).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 0);
    assert_eq!(body["results"], json!([]));
    assert_eq!(body["next"], Value::Null);
    assert_eq!(body["previous"], Value::Null);
}

#[tokio::test]
async fn missing_user_header_is_unauthorized() {
    let app = build_test_app().await;

    let (status, body) = send(&app.router, Method::GET, "/api/v1/feed", None, None).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], 401);
}

#[tokio::test]
async fn invalid_paging_and_types_are_bad_requests() {
    let app = build_test_app().await;

    let (status, body) = get(&app.router, "/api/v1/feed?page_size=51", 7).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], 400);

    let (status, _) = get(&app.router, "/api/v1/feed?page=0", 7).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = get(&app.router, "/api/v1/feed?type=startup_liked", 7).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = get(&app.router, "/api/v1/recommendations?type=unicorns", 7).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = get(&app.router, "/api/v1/recommendations?limit=21", 7).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn reported_action_appears_in_feeds() {
    let app = build_test_app().await;

    let (status, receipt) = send(
        &app.router,
        Method::POST,
        "/api/v1/actions",
        None,
        Some(json!({
            "actor_id": 3,
            "action_type": "startup_created",
            "subject": { "kind": "startup", "id": 10 },
            "description": "Founded Acme",
            "notify": { "user_id": 4, "title": "New startup", "message": "Acme launched" }
        })),
    )
    .await;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(receipt["activityQueued"], true);
    assert_eq!(receipt["notificationQueued"], true);

    let feed = wait_for_feed(&app.router, "/api/v1/feed", 7, 1).await;
    let event = &feed["results"][0];
    assert_eq!(event["actor_id"], 3);
    assert_eq!(event["action_type"], "startup_created");
    assert_eq!(event["subject"], json!({ "kind": "startup", "id": 10 }));

    let (status, activity) = get(&app.router, "/api/v1/users/3/activity", 7).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(activity["count"], 1);

    let (status, state) = get(&app.router, "/api/v1/feed/state", 7).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(state["userId"], 7);
    assert_eq!(state["lastActivityCursor"], event["id"]);
}

#[tokio::test]
async fn private_actions_stay_out_of_feeds() {
    let app = build_test_app().await;

    for (action, public) in [("connection_made", false), ("startup_updated", true)] {
        let (status, _) = send(
            &app.router,
            Method::POST,
            "/api/v1/actions",
            None,
            Some(json!({
                "actor_id": 3,
                "action_type": action,
                "subject": { "kind": "startup", "id": 10 },
                "is_public": public
            })),
        )
        .await;
        assert_eq!(status, StatusCode::ACCEPTED);
    }

    let feed = wait_for_feed(&app.router, "/api/v1/feed", 7, 1).await;
    assert_eq!(feed["results"][0]["action_type"], "startup_updated");
}

#[tokio::test]
async fn followed_startup_updates_reach_founder_feed() {
    let app = build_test_app().await;
    seed(
        &app.db_path,
        "INSERT INTO users (id, name, role, created_at, updated_at)
             VALUES (1, 'Grace', 'founder', '2026-01-01T00:00:00.000000Z', '2026-01-01T00:00:00.000000Z');
         INSERT INTO user_interactions (user_id, subject_kind, subject_id, interaction, created_at)
             VALUES (1, 'startup', 10, 'followed', '2026-01-01T00:00:00.000000Z');",
    );

    for (actor, action, startup) in [
        (3, "startup_updated", 10),
        (3, "startup_updated", 11),
        (1, "startup_created", 12),
    ] {
        let (status, _) = send(
            &app.router,
            Method::POST,
            "/api/v1/actions",
            None,
            Some(json!({
                "actor_id": actor,
                "action_type": action,
                "subject": { "kind": "startup", "id": startup }
            })),
        )
        .await;
        assert_eq!(status, StatusCode::ACCEPTED);
    }
    wait_for_feed(&app.router, "/api/v1/users/3/activity", 1, 2).await;
    wait_for_feed(&app.router, "/api/v1/users/1/activity", 1, 1).await;

    let (status, feed) = get(&app.router, "/api/v1/feed", 1).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(feed["count"], 1);
    assert_eq!(feed["results"][0]["actor_id"], 3);
    assert_eq!(feed["results"][0]["subject"], json!({ "kind": "startup", "id": 10 }));
}

#[tokio::test]
async fn unknown_action_is_bad_request() {
    let app = build_test_app().await;

    let (status, body) = send(
        &app.router,
        Method::POST,
        "/api/v1/actions",
        None,
        Some(json!({
            "actor_id": 3,
            "action_type": "startup_liked",
            "subject": { "kind": "startup", "id": 10 }
        })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains("startup_liked"));
}

#[tokio::test]
async fn recommendations_rank_matching_startups() {
    let app = build_test_app().await;
    seed(
        &app.db_path,
        "INSERT INTO users (id, name, role, tags, created_at, updated_at)
             VALUES (1, 'Ada', 'talent', 'Python,React', '2026-01-01T00:00:00.000000Z', '2026-01-01T00:00:00.000000Z');
         INSERT INTO startups (id, owner_id, name, industry, tags, followed_count, created_at, updated_at)
             VALUES (10, 2, 'Acme', 'Fintech', 'Python,React', 5, '2026-01-01T00:00:00.000000Z', '2026-01-01T00:00:00.000000Z'),
                    (11, 2, 'Beta', 'Health', 'Python', 1, '2026-01-01T00:00:00.000000Z', '2026-01-01T00:00:00.000000Z'),
                    (12, 1, 'Own', 'Fintech', 'Python', 9, '2026-01-01T00:00:00.000000Z', '2026-01-01T00:00:00.000000Z');",
    );

    let (status, body) = get(&app.router, "/api/v1/recommendations", 1).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["type"], "startup");
    let ids: Vec<i64> = body["recommendations"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["id"].as_i64().unwrap())
        .collect();
    assert_eq!(ids, vec![10, 11]);
    assert_eq!(body["recommendations"][0]["name"], "Acme");
    assert!(body["recommendations"][0]["reason"].is_string());

    let (status, _) = send(
        &app.router,
        Method::POST,
        "/api/v1/recommendations/invalidate",
        Some(1),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, limited) = get(&app.router, "/api/v1/recommendations?type=startups&limit=1", 1).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(limited["recommendations"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn health_reports_each_dependency() {
    let app = build_test_app().await;

    let (status, body) = send(&app.router, Method::GET, "/api/v1/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    let names: Vec<&str> = body["checks"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["name"].as_str().unwrap())
        .collect();
    assert!(names.contains(&"database"));
    assert!(names.contains(&"cache"));

    let (status, _) = send(&app.router, Method::GET, "/api/v1/healthz", None, None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(&app.router, Method::GET, "/api/v1/readyz", None, None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn responses_carry_request_id() {
    let app = build_test_app().await;

    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/v1/healthz")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert!(response.headers().contains_key("x-request-id"));
}
