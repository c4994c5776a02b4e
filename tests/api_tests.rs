//! Integration tests for the task endpoint.
//!
//! Requests are sent straight into the router with `tower::ServiceExt::oneshot`,
//! backed by an in-memory database.

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Method, Request, StatusCode, header};
use serde_json::{Value, json};
use std::sync::Arc;
use todo_list::api::{self, ApiState};
use todo_list::db::Database;
use tower::ServiceExt;

/// Helper to create a router over a fresh in-memory database.
fn setup() -> (Router, Arc<Database>) {
    let db = Arc::new(Database::open_in_memory().expect("Failed to create in-memory database"));
    let router = api::router(ApiState::new(Arc::clone(&db), "default_user"));
    (router, db)
}

async fn send(router: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut request = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(json) => {
            request = request.header(header::CONTENT_TYPE, "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };

    let response = router
        .clone()
        .oneshot(request.body(body).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

mod create_tests {
    use super::*;

    #[tokio::test]
    async fn post_creates_pending_task() {
        let (router, _db) = setup();

        let (status, body) = send(
            &router,
            Method::POST,
            "/api/tasks?user=alice",
            Some(json!({"title": "Buy milk"})),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["title"], "Buy milk");
        assert_eq!(body["data"]["status"], "pending");
        assert_eq!(body["data"]["owner"], "default_user");
        assert!(body["data"]["id"].as_i64().unwrap() > 0);
        assert!(body.get("message").is_none());
    }

    #[tokio::test]
    async fn post_with_completed_status_is_kept() {
        let (router, _db) = setup();

        let (_, body) = send(
            &router,
            Method::POST,
            "/api/tasks",
            Some(json!({"title": "Already done", "status": "completed"})),
        )
        .await;

        assert_eq!(body["data"]["status"], "completed");
    }

    #[tokio::test]
    async fn missing_title_is_rejected() {
        let (router, db) = setup();

        for payload in [json!({}), json!({"title": ""}), json!({"title": "   "})] {
            let (status, body) = send(&router, Method::POST, "/api/tasks", Some(payload)).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(body, json!({"success": false, "message": "Task title is required"}));
        }

        assert!(db.list_tasks("default_user").unwrap().is_empty());
    }

    #[tokio::test]
    async fn malformed_body_reads_as_empty() {
        let (router, _db) = setup();

        let response = router
            .clone()
            .oneshot(
                Request::builder()
                    .method(Method::POST)
                    .uri("/api/tasks")
                    .body(Body::from("{not json"))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn unknown_status_is_rejected() {
        let (router, _db) = setup();

        let (status, body) = send(
            &router,
            Method::POST,
            "/api/tasks",
            Some(json!({"title": "x", "status": "archived"})),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
    }
}

mod list_tests {
    use super::*;

    #[tokio::test]
    async fn get_lists_newest_first() {
        let (router, _db) = setup();
        for title in ["first", "second", "third"] {
            send(&router, Method::POST, "/api/tasks", Some(json!({"title": title}))).await;
        }

        let (status, body) = send(&router, Method::GET, "/api/tasks?user=anyone", None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        let titles: Vec<&str> = body["data"]
            .as_array()
            .unwrap()
            .iter()
            .map(|t| t["title"].as_str().unwrap())
            .collect();
        assert_eq!(titles, vec!["third", "second", "first"]);
    }

    #[tokio::test]
    async fn empty_store_lists_nothing() {
        let (router, _db) = setup();

        let (_, body) = send(&router, Method::GET, "/api/tasks", None).await;

        assert_eq!(body, json!({"success": true, "data": []}));
    }

    #[tokio::test]
    async fn other_owners_are_invisible() {
        let (router, db) = setup();
        db.create_task("someone_else", "hidden", Default::default())
            .unwrap();

        let (_, body) = send(&router, Method::GET, "/api/tasks", None).await;

        assert_eq!(body["data"], json!([]));
    }
}

mod update_tests {
    use super::*;

    #[tokio::test]
    async fn put_changes_status() {
        let (router, _db) = setup();
        let (_, created) = send(&router, Method::POST, "/api/tasks", Some(json!({"title": "t"}))).await;
        let id = created["data"]["id"].clone();

        let (status, body) = send(
            &router,
            Method::PUT,
            "/api/tasks",
            Some(json!({"id": id, "status": "completed"})),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["status"], "completed");
        assert_eq!(body["data"]["title"], "t");
    }

    #[tokio::test]
    async fn put_accepts_numeric_string_id() {
        let (router, _db) = setup();
        let (_, created) = send(&router, Method::POST, "/api/tasks", Some(json!({"title": "t"}))).await;
        let id = created["data"]["id"].as_i64().unwrap().to_string();

        let (_, body) = send(
            &router,
            Method::PUT,
            "/api/tasks",
            Some(json!({"id": id, "status": "completed"})),
        )
        .await;

        assert_eq!(body["data"]["status"], "completed");
    }

    #[tokio::test]
    async fn put_unknown_id_succeeds_without_data() {
        let (router, _db) = setup();

        let (status, body) = send(
            &router,
            Method::PUT,
            "/api/tasks",
            Some(json!({"id": 999, "status": "completed"})),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert!(body["data"].is_null());
    }

    #[tokio::test]
    async fn put_validation_errors() {
        let (router, _db) = setup();

        let cases = [
            (json!({"status": "completed"}), "Task ID is required"),
            (json!({"id": "abc", "status": "completed"}), "Task ID must be an integer"),
            (json!({"id": 1}), "Task status is required"),
        ];

        for (payload, message) in cases {
            let (status, body) = send(&router, Method::PUT, "/api/tasks", Some(payload)).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(body["message"], message);
        }
    }
}

mod delete_tests {
    use super::*;

    #[tokio::test]
    async fn delete_removes_task() {
        let (router, _db) = setup();
        let (_, created) = send(&router, Method::POST, "/api/tasks", Some(json!({"title": "t"}))).await;
        let id = created["data"]["id"].as_i64().unwrap();

        let (status, body) =
            send(&router, Method::DELETE, &format!("/api/tasks?id={}", id), None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"success": true, "message": "Task deleted successfully"}));

        let (_, list) = send(&router, Method::GET, "/api/tasks", None).await;
        assert_eq!(list["data"], json!([]));
    }

    #[tokio::test]
    async fn delete_unknown_id_still_succeeds() {
        let (router, _db) = setup();

        let (status, body) = send(&router, Method::DELETE, "/api/tasks?id=42", None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Task deleted successfully");
    }

    #[tokio::test]
    async fn delete_without_id_is_rejected() {
        let (router, _db) = setup();

        let (status, body) = send(&router, Method::DELETE, "/api/tasks", None).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({"success": false, "message": "Task ID is required"}));
    }
}

mod method_tests {
    use super::*;

    #[tokio::test]
    async fn options_is_empty_ok() {
        let (router, _db) = setup();

        let (status, body) = send(&router, Method::OPTIONS, "/api/tasks", None).await;

        assert_eq!(status, StatusCode::OK);
        assert!(body.is_null());
    }

    #[tokio::test]
    async fn other_methods_are_not_allowed() {
        let (router, _db) = setup();

        let (status, body) = send(&router, Method::PATCH, "/api/tasks", None).await;

        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(body, json!({"success": false, "message": "Method not allowed"}));
    }

    #[tokio::test]
    async fn repeated_query_keys_keep_the_last_value() {
        let (router, _db) = setup();
        let (_, created) = send(&router, Method::POST, "/api/tasks", Some(json!({"title": "t"}))).await;
        let id = created["data"]["id"].as_i64().unwrap();

        let (status, body) = send(&router, Method::GET, "/api/tasks?user=a&user=b", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["data"].as_array().unwrap().len(), 1);

        let uri = format!("/api/tasks?id=999&id={}", id);
        let (status, body) = send(&router, Method::DELETE, &uri, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"success": true, "message": "Task deleted successfully"}));

        let (_, list) = send(&router, Method::GET, "/api/tasks", None).await;
        assert_eq!(list["data"], json!([]));
    }
}

mod store_failure_tests {
    use super::*;

    fn break_store(db: &Database) {
        db.with_conn(|conn| Ok(conn.execute("DROP TABLE tasks", [])?))
            .expect("Failed to drop tasks table");
    }

    #[tokio::test]
    async fn list_failure_is_a_500_envelope() {
        let (router, db) = setup();
        break_store(&db);

        let (status, body) = send(&router, Method::GET, "/api/tasks", None).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({"success": false, "message": "no such table: tasks"}));
    }

    #[tokio::test]
    async fn create_failure_is_a_500_envelope() {
        let (router, db) = setup();
        break_store(&db);

        let (status, body) = send(
            &router,
            Method::POST,
            "/api/tasks",
            Some(json!({"title": "Buy milk"})),
        )
        .await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({"success": false, "message": "no such table: tasks"}));
    }
}
