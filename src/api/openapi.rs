//! OpenAPI documentation and schema generation
//!
//! Defines the OpenAPI specification for the mediafetch REST API using
//! utoipa for compile-time spec generation.

use utoipa::OpenApi;

/// OpenAPI documentation for the mediafetch REST API
///
/// The spec can be accessed via:
/// - `/openapi.json` - JSON format OpenAPI specification
/// - `/swagger-ui` - Interactive Swagger UI documentation (when enabled)
#[derive(OpenApi)]
#[openapi(
    info(
        title = "mediafetch REST API",
        version = "0.1.0",
        description = "Acquire remote media as MP3 or size-bounded MP4 and retrieve each artifact once",
        license(
            name = "MIT OR Apache-2.0"
        )
    ),
    servers(
        (url = "http://localhost:5000", description = "Local development server")
    ),
    paths(
        // Acquisition
        crate::api::routes::start_download,
        crate::api::routes::download_file,
        crate::api::routes::file_info,

        // System
        crate::api::routes::health_check,
        crate::api::routes::version,
        crate::api::routes::openapi_spec,
        crate::api::routes::event_stream,
    ),
    components(schemas(
        crate::types::TargetFormat,
        crate::types::Artifact,
        crate::types::FileInfo,
        crate::types::SweepReport,
        crate::types::Event,

        crate::api::routes::DownloadForm,
        crate::api::routes::DownloadResponse,
        crate::api::routes::FileInfoResponse,

        crate::error::ApiError,
    )),
    tags(
        (name = "downloads", description = "Acquire media and retrieve the resulting artifacts"),
        (name = "system", description = "Health, version, OpenAPI spec and events"),
    )
)]
pub struct ApiDoc;

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spec_lists_every_route() {
        let spec = ApiDoc::openapi();
        for path in [
            "/download",
            "/download_file",
            "/file_info",
            "/health",
            "/version",
            "/openapi.json",
            "/events",
        ] {
            assert!(spec.paths.paths.contains_key(path), "missing path {}", path);
        }
    }

    #[test]
    fn spec_has_error_envelope_schema() {
        let spec = ApiDoc::openapi();
        let components = spec.components.expect("components should be present");
        assert!(components.schemas.contains_key("ApiError"));
        assert!(components.schemas.contains_key("FileInfo"));
    }

    #[test]
    fn spec_serializes_to_json() {
        let json = serde_json::to_value(ApiDoc::openapi()).unwrap();
        assert_eq!(json["info"]["title"], "mediafetch REST API");
    }
}
