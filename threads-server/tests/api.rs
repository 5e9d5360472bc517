//! Router tests against the in-process store

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use threads_server::http::build_router;
use threads_server::revalidate::Revalidator;
use threads_server::store::MemoryStore;
use threads_server::AppState;

const IMG: &str = "https://img.test/avatar.png";

#[derive(Default)]
struct Recorder(Mutex<Vec<String>>);

#[async_trait]
impl Revalidator for Recorder {
    async fn revalidate(&self, path: &str) {
        self.0.lock().unwrap().push(path.to_owned());
    }
}

struct TestApp {
    router: Router,
    store: MemoryStore,
    revalidated: Arc<Recorder>,
}

impl TestApp {
    fn new() -> Self {
        let store = MemoryStore::new();
        let revalidated = Arc::new(Recorder::default());
        let state = AppState::in_memory(store.clone(), revalidated.clone());
        Self {
            router: build_router(state, false),
            store,
            revalidated,
        }
    }

    async fn send(
        &self,
        method: &str,
        uri: &str,
        user: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut req = Request::builder().method(method).uri(uri);
        if let Some(user) = user {
            req = req.header("x-user-id", user);
        }
        let req = match body {
            Some(body) => req
                .header("content-type", "application/json")
                .body(Body::from(body.to_string())),
            None => req.body(Body::empty()),
        }
        .unwrap();

        let response = self.router.clone().oneshot(req).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    async fn onboard(&self, user: &str, username: &str, name: &str) -> Value {
        let (status, body) = self
            .send(
                "PUT",
                "/users/me",
                Some(user),
                Some(json!({ "username": username, "name": name, "bio": "", "image": IMG })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        body
    }

    async fn post(&self, user: &str, text: &str) -> Value {
        let (status, body) = self
            .send("POST", "/threads", Some(user), Some(json!({ "text": text })))
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body
    }

    fn revalidated(&self) -> Vec<String> {
        self.revalidated.0.lock().unwrap().clone()
    }
}

#[tokio::test]
async fn health_reports_memory_store() {
    let app = TestApp::new();
    let (status, body) = app.send("GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["store"], "memory");
}

#[tokio::test]
async fn onboarding_stores_lowercase_username() {
    let app = TestApp::new();

    let (status, _) = app.send("GET", "/users/me", Some("u1"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    app.onboard("u1", "Alice", "Alice Doe").await;

    let (status, body) = app.send("GET", "/users/me", Some("u1"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["username"], "alice");
    assert_eq!(body["onboarded"], true);
}

#[tokio::test]
async fn invalid_profile_is_400() {
    let app = TestApp::new();
    let (status, body) = app
        .send(
            "PUT",
            "/users/me",
            Some("u1"),
            Some(json!({ "username": "alice", "name": "Al", "image": IMG })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");
}

#[tokio::test]
async fn missing_identity_is_401() {
    let app = TestApp::new();
    let (status, body) = app
        .send("POST", "/threads", None, Some(json!({ "text": "hi" })))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "unauthorized");
}

#[tokio::test]
async fn created_thread_appears_in_feed() {
    let app = TestApp::new();
    app.onboard("u1", "alice", "Alice Doe").await;

    let (_, empty) = app.send("GET", "/feed", None, None).await;
    assert_eq!(empty["notice"], "No Thread Found");

    app.post("u1", "hello world").await;

    let (status, feed) = app.send("GET", "/feed?page=1&per_page=30", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(feed["notice"].is_null());
    let items = feed["feed"]["items"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["text"], "hello world");
    assert_eq!(items[0]["author"]["id"], "u1");
    assert_eq!(items[0]["author"]["username"], "alice");
    assert_eq!(app.revalidated(), ["/"]);
}

#[tokio::test]
async fn feed_excludes_replies_and_pages() {
    let app = TestApp::new();
    app.onboard("u1", "alice", "Alice Doe").await;

    let root = app.post("u1", "root").await;
    app.post("u1", "second").await;
    app.post("u1", "third").await;
    let root_id = root["id"].as_str().unwrap();

    let (status, _) = app
        .send(
            "POST",
            &format!("/threads/{root_id}/replies"),
            Some("u1"),
            Some(json!({ "text": "reply" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, first) = app.send("GET", "/feed?page=1&per_page=2", None, None).await;
    assert_eq!(first["feed"]["total"], 3);
    assert_eq!(first["is_next"], true);
    let texts: Vec<_> = first["feed"]["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["text"].as_str().unwrap().to_owned())
        .collect();
    assert_eq!(texts, ["third", "second"]);

    let (_, last) = app.send("GET", "/feed?page=2&per_page=2", None, None).await;
    assert_eq!(last["is_next"], false);
    assert_eq!(last["feed"]["items"][0]["text"], "root");
    assert_eq!(last["feed"]["items"][0]["reply_count"], 1);
}

#[tokio::test]
async fn reply_is_visible_in_thread() {
    let app = TestApp::new();
    app.onboard("u1", "alice", "Alice Doe").await;
    app.onboard("u2", "bob", "Bob Smith").await;

    let root = app.post("u1", "question").await;
    let root_id = root["id"].as_str().unwrap();

    let (status, reply) = app
        .send(
            "POST",
            &format!("/threads/{root_id}/replies"),
            Some("u2"),
            Some(json!({ "text": "answer" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(reply["parent_id"], root_id);

    let (status, thread) = app.send("GET", &format!("/threads/{root_id}"), None, None).await;
    assert_eq!(status, StatusCode::OK);
    let replies = thread["replies"].as_array().unwrap();
    assert_eq!(replies.len(), 1);
    assert_eq!(replies[0]["text"], "answer");
    assert_eq!(replies[0]["author"]["id"], "u2");
    assert_eq!(app.revalidated(), ["/".to_owned(), format!("/thread/{root_id}")]);
}

#[tokio::test]
async fn reply_to_missing_parent_is_404_and_writes_nothing() {
    let app = TestApp::new();
    app.onboard("u1", "alice", "Alice Doe").await;

    let (status, body) = app
        .send(
            "POST",
            &format!("/threads/{}/replies", Uuid::new_v4()),
            Some("u1"),
            Some(json!({ "text": "anyone?" })),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");
    assert_eq!(app.store.thread_count().await, 0);
    assert!(app.revalidated().is_empty());
}

#[tokio::test]
async fn unknown_thread_is_404_and_bad_id_is_400() {
    let app = TestApp::new();

    let (status, _) = app
        .send("GET", &format!("/threads/{}", Uuid::new_v4()), None, None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app.send("GET", "/threads/not-a-uuid", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn search_excludes_caller() {
    let app = TestApp::new();
    app.onboard("u1", "alice", "Alice Doe").await;
    app.onboard("u2", "bob", "Bob Smith").await;
    app.onboard("u3", "carol", "Carol Doe").await;

    let (status, body) = app
        .send("GET", "/search?q=&page=1&per_page=25&sort=desc", Some("u1"), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    let ids: Vec<_> = body["users"]["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|u| u["external_id"].as_str().unwrap().to_owned())
        .collect();
    assert_eq!(ids.len(), 2);
    assert!(!ids.contains(&"u1".to_owned()));
    assert_eq!(body["is_next"], false);

    let (_, body) = app.send("GET", "/search?q=DOE", Some("u1"), None).await;
    let items = body["users"]["items"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["username"], "carol");
}

#[tokio::test]
async fn search_requires_onboarding() {
    let app = TestApp::new();

    let (status, _) = app.send("GET", "/search", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = app.send("GET", "/search", Some("u9"), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "onboarding_required");
}

#[tokio::test]
async fn bad_sort_is_400() {
    let app = TestApp::new();
    app.onboard("u1", "alice", "Alice Doe").await;

    let (status, _) = app.send("GET", "/search?sort=sideways", Some("u1"), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn profile_page_and_user_threads() {
    let app = TestApp::new();
    app.onboard("u1", "alice", "Alice Doe").await;
    app.onboard("u2", "bob", "Bob Smith").await;
    app.post("u2", "bob was here").await;

    let (status, page) = app.send("GET", "/users/u2", Some("u1"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["user"]["username"], "bob");
    assert_eq!(page["threads"][0]["text"], "bob was here");

    let (status, posts) = app.send("GET", "/users/u2/threads", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(posts["author"]["id"], "u2");
    assert_eq!(posts["threads"].as_array().unwrap().len(), 1);

    let (status, _) = app.send("GET", "/users/nobody", Some("u1"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn thread_in_community_carries_summary() {
    let app = TestApp::new();
    app.onboard("u1", "alice", "Alice Doe").await;

    let (status, community) = app
        .send(
            "PUT",
            "/communities/org_1",
            None,
            Some(json!({ "username": "rustaceans", "name": "Rustaceans", "image": IMG })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(community["external_id"], "org_1");

    let (status, _) = app
        .send(
            "POST",
            "/threads",
            Some("u1"),
            Some(json!({ "text": "hello crabs", "community": "org_1" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, feed) = app.send("GET", "/feed", None, None).await;
    assert_eq!(feed["feed"]["items"][0]["community"]["id"], "org_1");
    assert_eq!(feed["feed"]["items"][0]["community"]["name"], "Rustaceans");

    let (_, community) = app.send("GET", "/communities/org_1", None, None).await;
    assert_eq!(community["threads"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn post_without_profile_is_500() {
    let app = TestApp::new();
    let (status, body) = app
        .send("POST", "/threads", Some("ghost"), Some(json!({ "text": "boo" })))
        .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "internal_error");
    assert_eq!(app.store.thread_count().await, 0);
}
