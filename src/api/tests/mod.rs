use super::*;
use crate::extractor::{Extractor, NoOpExtractor};
use crate::store::MemoryStore;
use crate::types::{SourceMetadata, TargetFormat, WorkingName};
use async_trait::async_trait;
use axum::body::Body;
use axum::http::Request;
use axum::http::StatusCode;
use axum::response::Response;
use std::path::Path;
use std::time::Duration;
use tower::ServiceExt;

mod downloads;

/// Writes `<prefix>.m4a` into the memory store, like an extractor that
/// honours the output template but leaves an intermediate container behind
struct StubExtractor {
    store: MemoryStore,
    title: &'static str,
    duration_secs: Option<u64>,
    size: usize,
}

#[async_trait]
impl Extractor for StubExtractor {
    async fn probe(&self, _url: &str) -> crate::Result<SourceMetadata> {
        Ok(SourceMetadata {
            title: self.title.to_string(),
            duration_secs: self.duration_secs,
        })
    }

    async fn fetch(
        &self,
        _url: &str,
        _format: TargetFormat,
        working: &WorkingName,
        _output_dir: &Path,
    ) -> crate::Result<()> {
        self.store.insert(
            format!("{}.m4a", working.prefix),
            vec![7u8; self.size],
        );
        Ok(())
    }

    fn possible_extensions(&self, _format: TargetFormat) -> &'static [&'static str] {
        &["m4a"]
    }

    fn name(&self) -> &'static str {
        "stub"
    }
}

/// Router over a memory store and a stub extractor producing `title`
fn test_app(title: &'static str) -> (Router, Arc<MediaFetcher>, MemoryStore) {
    test_app_with(Config::default(), title)
}

fn test_app_with(config: Config, title: &'static str) -> (Router, Arc<MediaFetcher>, MemoryStore) {
    let store = MemoryStore::new();
    let extractor = StubExtractor {
        store: store.clone(),
        title,
        duration_secs: Some(212),
        size: 2048,
    };
    let fetcher = Arc::new(MediaFetcher::with_components(
        config,
        Arc::new(store.clone()),
        Arc::new(extractor),
    ));
    let app = create_router(fetcher.clone(), fetcher.get_config());
    (app, fetcher, store)
}

fn form_request(body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/download")
        .header("content-type", "application/x-www-form-urlencoded")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get_request(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn json_body(response: Response) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

#[tokio::test]
async fn test_api_server_spawns() {
    let mut config = Config::default();
    // Port 0 = OS assigns a free port
    config.api.bind_address = "127.0.0.1:0".parse().unwrap();
    let fetcher = Arc::new(MediaFetcher::with_components(
        config,
        Arc::new(MemoryStore::new()),
        Arc::new(NoOpExtractor),
    ));

    let api_handle = tokio::spawn({
        let fetcher = fetcher.clone();
        let config = fetcher.get_config();
        async move { start_api_server(fetcher, config).await }
    });

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(!api_handle.is_finished(), "server should still be serving");
    api_handle.abort();
}

#[tokio::test]
async fn test_cors_enabled() {
    let mut config = Config::default();
    config.api.cors_enabled = true;
    config.api.cors_origins = vec!["*".to_string()];
    let (app, _fetcher, _store) = test_app_with(config, "x");

    let request = Request::builder()
        .uri("/health")
        .header("Origin", "http://localhost:3000")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(
        response
            .headers()
            .contains_key("access-control-allow-origin"),
        "CORS header should be present when CORS is enabled"
    );
}

#[tokio::test]
async fn test_cors_disabled() {
    let mut config = Config::default();
    config.api.cors_enabled = false;
    let (app, _fetcher, _store) = test_app_with(config, "x");

    let request = Request::builder()
        .uri("/health")
        .header("Origin", "http://localhost:3000")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert!(
        !response
            .headers()
            .contains_key("access-control-allow-origin")
    );
}

#[tokio::test]
async fn test_swagger_ui_mounted_when_enabled() {
    let mut config = Config::default();
    config.api.swagger_ui = true;
    let (app, _fetcher, _store) = test_app_with(config, "x");

    let response = app
        .oneshot(get_request("/api-docs/openapi.json"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_unknown_route_is_404() {
    let (app, _fetcher, _store) = test_app("x");
    let response = app.oneshot(get_request("/queue")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
