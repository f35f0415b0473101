//! REST API server module
//!
//! Thin HTTP surface over [`MediaFetcher`]: request an acquisition, inspect
//! and retrieve the resulting artifact, and watch lifecycle events.

use crate::{Config, MediaFetcher, Result};
use axum::{
    Router,
    http::HeaderValue,
    routing::{get, post},
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub mod error_response;
pub mod openapi;
pub mod routes;
pub mod state;

pub use openapi::ApiDoc;
pub use state::AppState;

/// Create the API router with all route definitions
///
/// # Routes
///
/// ## Acquisition
/// - `POST /download` - Acquire a source as MP3 or MP4 (form fields `url`, `option`)
/// - `GET /download_file?file=<name>` - Stream an artifact (single-shot by default)
/// - `GET /file_info?file=<name>` - Size and compatibility of an artifact
///
/// ## System
/// - `GET /health` - Health check
/// - `GET /version` - Service version and extractor backend
/// - `GET /openapi.json` - OpenAPI specification
/// - `GET /events` - Server-sent events stream
///
/// Swagger UI is mounted at `/swagger-ui` when `api.swagger_ui` is set, and a
/// CORS layer is added when `api.cors_enabled` is set.
pub fn create_router(fetcher: Arc<MediaFetcher>, config: Arc<Config>) -> Router {
    let state = AppState::new(fetcher, config.clone());

    let mut router = Router::new()
        .route("/download", post(routes::start_download))
        .route("/download_file", get(routes::download_file))
        .route("/file_info", get(routes::file_info))
        .route("/health", get(routes::health_check))
        .route("/version", get(routes::version))
        .route("/openapi.json", get(routes::openapi_spec))
        .route("/events", get(routes::event_stream))
        .with_state(state);

    if config.api.swagger_ui {
        router = router.merge(
            SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()),
        );
    }

    if config.api.cors_enabled {
        router = router.layer(build_cors_layer(&config.api.cors_origins));
    }

    router.layer(TraceLayer::new_for_http())
}

/// Build the CORS layer from the configured origins
///
/// An empty list or `"*"` allows any origin.
fn build_cors_layer(origins: &[String]) -> CorsLayer {
    let allow_any = origins.iter().any(|o| o == "*");

    if allow_any || origins.is_empty() {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let allowed: Vec<HeaderValue> = origins.iter().filter_map(|o| o.parse().ok()).collect();

        CorsLayer::new()
            .allow_origin(AllowOrigin::list(allowed))
            .allow_methods(Any)
            .allow_headers(Any)
    }
}

/// Start the API server on the configured bind address.
///
/// Binds a TCP listener and serves the router until the task is dropped or
/// the listener fails.
///
/// # Errors
///
/// [`crate::Error::Io`] if the address cannot be bound and
/// [`crate::Error::ApiServerError`] if serving fails.
pub async fn start_api_server(fetcher: Arc<MediaFetcher>, config: Arc<Config>) -> Result<()> {
    let bind_address = config.api.bind_address;

    tracing::info!(address = %bind_address, "Starting API server");

    let app = create_router(fetcher, config);

    let listener = TcpListener::bind(bind_address)
        .await
        .map_err(crate::error::Error::Io)?;

    tracing::info!(
        address = %listener.local_addr().unwrap_or(bind_address),
        "API server listening"
    );

    axum::serve(listener, app.into_make_service())
        .await
        .map_err(|e| crate::error::Error::ApiServerError(e.to_string()))?;

    tracing::info!("API server stopped");
    Ok(())
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;
