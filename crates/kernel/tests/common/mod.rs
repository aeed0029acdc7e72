#![allow(clippy::unwrap_used, clippy::expect_used)]
//! Common test utilities for integration tests.
//!
//! Each [`TestApp`] owns a private, migrated in-memory SQLite database and
//! the REAL kernel router, so tests are isolated from each other and can
//! run in parallel.

#![allow(dead_code)]

use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use axum::response::Response;
use http_body_util::BodyExt;
use serde_json::{Value, json};
use sqlx::SqlitePool;
use tempfile::TempDir;
use tower::ServiceExt;

use tally_kernel::models::{CreateCategory, InsertMode};
use tally_kernel::{AppState, Config, db, routes};

/// Test application wrapper using the REAL kernel routes and state.
pub struct TestApp {
    router: Router,
    pub db: SqlitePool,
    pub state: AppState,
}

impl TestApp {
    /// Create a test application over a fresh database.
    pub async fn new() -> Self {
        let db = db::memory_pool().await.expect("Failed to open test database");
        let state = AppState::from_pool(db.clone());
        let router = routes::app(state.clone());
        Self { router, db, state }
    }

    pub async fn request(&self, request: Request<Body>) -> Response {
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request")
    }

    pub async fn get(&self, uri: &str) -> Response {
        self.request(Request::get(uri).body(Body::empty()).unwrap())
            .await
    }

    pub async fn delete(&self, uri: &str) -> Response {
        self.request(
            Request::builder()
                .method(Method::DELETE)
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
    }

    /// Send a JSON body with the given method.
    pub async fn send_json(&self, method: Method, uri: &str, body: Value) -> Response {
        self.request(
            Request::builder()
                .method(method)
                .uri(uri)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
    }

    pub async fn post_json(&self, uri: &str, body: Value) -> Response {
        self.send_json(Method::POST, uri, body).await
    }

    pub async fn patch_json(&self, uri: &str, body: Value) -> Response {
        self.send_json(Method::PATCH, uri, body).await
    }

    /// POST a category and return its id, asserting success.
    pub async fn create_category(&self, name: &str, target: Option<i64>, mode: &str) -> i64 {
        let response = self
            .post_json(
                "/categories",
                json!({ "name": name, "target": target, "mode": mode }),
            )
            .await;
        let status = response.status();
        let body = response_json(response).await;
        assert_eq!(status, StatusCode::CREATED, "create {name}: {body}");
        body["id"].as_i64().unwrap()
    }

    /// Insert a category directly through the service.
    pub async fn insert_category(
        &self,
        name: &str,
        target: Option<i64>,
        mode: InsertMode,
    ) -> tally_kernel::AppResult<i64> {
        self.state
            .categories()
            .insert(CreateCategory {
                name: name.to_string(),
                target,
                mode,
            })
            .await
    }

    /// `(name, set_start, set_end)` for every category, by id.
    pub async fn intervals(&self) -> Vec<(String, i64, i64)> {
        sqlx::query_as("SELECT name, set_start, set_end FROM category ORDER BY id")
            .fetch_all(&self.db)
            .await
            .unwrap()
    }

    /// Create a source and a dataset, returning the dataset id.
    pub async fn create_dataset(&self) -> i64 {
        let source = self
            .post_json("/dataset_sources", json!({ "name": "Checking" }))
            .await;
        let source = response_json(source).await["id"].as_i64().unwrap();

        let dataset = self
            .post_json(&format!("/dataset_source/{source}/datasets"), json!({}))
            .await;
        assert_eq!(dataset.status(), StatusCode::CREATED);
        response_json(dataset).await["id"].as_i64().unwrap()
    }
}

/// State over a migrated database file in `dir`, with a multi-connection pool.
pub async fn file_backed_state(dir: &TempDir) -> AppState {
    let path = dir.path().join("tally.db");
    let config = Config {
        database_url: format!("sqlite://{}", path.display()),
        database_max_connections: 8,
        ..Config::in_memory()
    };
    AppState::new(&config)
        .await
        .expect("Failed to open file-backed database")
}

pub async fn response_json(response: Response) -> Value {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap_or_else(|_| {
        let text = String::from_utf8_lossy(&body);
        panic!("Failed to parse JSON: {text}");
    })
}

/// Build the Root/Food/Rent/Groceries/Utilities tree used across tests.
///
/// Resulting ids are 1..=5 in that order.
pub async fn build_household_tree(app: &TestApp) {
    let root = app.create_category("Root", None, "root").await;
    let food = app.create_category("Food", Some(root), "first").await;
    let rent = app.create_category("Rent", Some(food), "after").await;
    app.create_category("Groceries", Some(food), "first").await;
    app.create_category("Utilities", Some(rent), "before").await;
}
