//! Shared test fixture for in-process router tests.
//!
//! Builds the real router over mock backends and a temporary download
//! directory, so requests exercise the orchestrator and storage without
//! external tools or network access.

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, HeaderMap, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use vidgrab_core::{
    load_config_from_str, testing::MockBackend, DownloadStorage, Orchestrator,
    OrchestratorConfig, RetrievalBackend, StaticCookieSource,
};
use vidgrab_server::{api::create_router, state::AppState};

pub struct TestFixture {
    pub router: Router,
    pub primary: Arc<MockBackend>,
    pub fallback: Arc<MockBackend>,
    pub download_dir: PathBuf,
    pub temp_dir: TempDir,
}

#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

impl TestResponse {
    pub fn json(&self) -> Value {
        serde_json::from_str(&self.body).expect("Response body is not JSON")
    }
}

impl TestFixture {
    pub async fn new() -> Self {
        Self::with_cookies(None).await
    }

    pub async fn with_cookies(cookies: Option<String>) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let download_dir = temp_dir.path().join("downloads");
        let credential_dir = temp_dir.path().join("credentials");
        std::fs::create_dir_all(&credential_dir).expect("Failed to create credential dir");

        let config = load_config_from_str(&format!(
            r#"
[storage]
download_dir = '{}'

[server]
host = "127.0.0.1"
port = 8080

[cookies]
credential_dir = '{}'
"#,
            download_dir.display(),
            credential_dir.display()
        ))
        .expect("Failed to parse test config");

        let primary = Arc::new(MockBackend::new("primary").with_cookie_support());
        let fallback = Arc::new(MockBackend::new("fallback"));

        let storage = Arc::new(DownloadStorage::new(&download_dir));
        storage.ensure_dir().await.expect("Failed to create download dir");
        let cookie_source = Arc::new(StaticCookieSource::new(cookies));

        let orchestrator = Arc::new(Orchestrator::new(
            OrchestratorConfig {
                timeout_secs: 5,
                credential_dir,
                ..Default::default()
            },
            vec![
                Arc::clone(&primary) as Arc<dyn RetrievalBackend>,
                Arc::clone(&fallback) as Arc<dyn RetrievalBackend>,
            ],
            storage.clone(),
            cookie_source.clone(),
        ));

        let state = Arc::new(AppState::new(config, orchestrator, storage, cookie_source));
        let router = create_router(state);

        Self {
            router,
            primary,
            fallback,
            download_dir,
            temp_dir,
        }
    }

    pub async fn get(&self, path: &str) -> TestResponse {
        let request = Request::builder()
            .method("GET")
            .uri(path)
            .body(Body::empty())
            .unwrap();
        self.send(request).await
    }

    pub async fn post_form(&self, path: &str, body: &str) -> TestResponse {
        let request = Request::builder()
            .method("POST")
            .uri(path)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body.to_string()))
            .unwrap();
        self.send(request).await
    }

    pub async fn post_json(&self, path: &str, body: Value) -> TestResponse {
        let request = Request::builder()
            .method("POST")
            .uri(path)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        self.send(request).await
    }

    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to execute request");

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to read body")
            .to_bytes();

        TestResponse {
            status,
            headers,
            body: String::from_utf8_lossy(&bytes).into_owned(),
        }
    }

    /// Put a file straight into the download directory.
    pub fn place_file(&self, name: &str, contents: &[u8]) {
        std::fs::write(self.download_dir.join(name), contents).expect("Failed to write file");
    }

    pub fn download_entries(&self) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(&self.download_dir)
            .expect("Failed to read download dir")
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }
}
