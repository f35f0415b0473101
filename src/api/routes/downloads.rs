//! Acquisition and artifact retrieval handlers.

use super::{DownloadForm, DownloadResponse, FileInfoResponse, FileQuery};
use crate::api::AppState;
use crate::api::error_response::client_error;
use crate::types::{AcquisitionRequest, TargetFormat};
use axum::{
    Form, Json,
    body::Body,
    extract::{Query, State, rejection::FormRejection},
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use tokio_util::io::ReaderStream;

/// User-agent fragments that get `Content-Transfer-Encoding: binary`
const MOBILE_AGENTS: &[&str] = &["android", "iphone", "ipad", "mobile"];

/// POST /download - Acquire a source in the requested format
///
/// Blocks until the artifact is finalized or the acquisition fails.
#[utoipa::path(
    post,
    path = "/download",
    tag = "downloads",
    request_body(content = DownloadForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 200, description = "Artifact ready for retrieval", body = DownloadResponse),
        (status = 400, description = "Missing or invalid URL or option", body = crate::error::ApiError),
        (status = 422, description = "Source or artifact violates admission limits", body = crate::error::ApiError),
        (status = 502, description = "Extractor failed", body = crate::error::ApiError),
        (status = 503, description = "Shutting down", body = crate::error::ApiError)
    )
)]
pub async fn start_download(
    State(state): State<AppState>,
    form: Result<Form<DownloadForm>, FormRejection>,
) -> Response {
    // a missing or non-form body is the same client error as missing fields
    let form = match form {
        Ok(Form(form)) => form,
        Err(rejection) => {
            tracing::debug!(error = %rejection, "rejected /download body");
            DownloadForm::default()
        }
    };
    let url = form.url.as_deref().map(str::trim).unwrap_or_default();
    let option = form.option.as_deref().map(str::trim).unwrap_or_default();
    if url.is_empty() || option.is_empty() {
        return client_error(
            StatusCode::BAD_REQUEST,
            "validation_error",
            "Missing URL or option",
        );
    }

    let Some(format) = TargetFormat::from_option(option) else {
        return client_error(StatusCode::BAD_REQUEST, "invalid_format", "Invalid option");
    };

    let request = AcquisitionRequest::new(url, format);
    match state.fetcher.acquire(&request).await {
        Ok(artifact) => (
            StatusCode::OK,
            Json(DownloadResponse {
                status: "success".to_string(),
                filename: artifact.file_name(),
                size_bytes: artifact.size_bytes,
            }),
        )
            .into_response(),
        Err(e) => e.into_response(),
    }
}

/// GET /download_file - Stream an artifact to the client
///
/// With `storage.delete_after_serve` (the default) the artifact is removed
/// from the store as the stream starts, so a second request gets 404.
#[utoipa::path(
    get,
    path = "/download_file",
    tag = "downloads",
    params(FileQuery),
    responses(
        (status = 200, description = "Artifact bytes", content_type = "application/octet-stream"),
        (status = 400, description = "No file specified or invalid file name", body = crate::error::ApiError),
        (status = 404, description = "Artifact not found", body = crate::error::ApiError)
    )
)]
pub async fn download_file(
    State(state): State<AppState>,
    Query(query): Query<FileQuery>,
    headers: HeaderMap,
) -> Response {
    let Some(name) = query.file.as_deref().filter(|f| !f.is_empty()) else {
        return client_error(StatusCode::BAD_REQUEST, "validation_error", "No file specified");
    };

    let served = match state.fetcher.open_for_download(name).await {
        Ok(served) => served,
        Err(e) => return e.into_response(),
    };

    let mut response = Body::from_stream(ReaderStream::new(served.reader)).into_response();
    let response_headers = response.headers_mut();
    response_headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static(served.content_type),
    );
    response_headers.insert(header::CONTENT_LENGTH, HeaderValue::from(served.size_bytes));
    response_headers.insert(
        header::CONTENT_DISPOSITION,
        content_disposition(&served.filename),
    );
    response_headers.insert(
        header::CACHE_CONTROL,
        HeaderValue::from_static("no-cache, no-store, must-revalidate"),
    );
    response_headers.insert(header::PRAGMA, HeaderValue::from_static("no-cache"));
    response_headers.insert(header::EXPIRES, HeaderValue::from_static("0"));

    if is_mobile(&headers) {
        response_headers.insert(
            "content-transfer-encoding",
            HeaderValue::from_static("binary"),
        );
    }

    response
}

/// GET /file_info - Size and compatibility information about an artifact
#[utoipa::path(
    get,
    path = "/file_info",
    tag = "downloads",
    params(FileQuery),
    responses(
        (status = 200, description = "Artifact information", body = FileInfoResponse),
        (status = 400, description = "No file specified or invalid file name", body = crate::error::ApiError),
        (status = 404, description = "Artifact not found", body = crate::error::ApiError)
    )
)]
pub async fn file_info(State(state): State<AppState>, Query(query): Query<FileQuery>) -> Response {
    let Some(name) = query.file.as_deref().filter(|f| !f.is_empty()) else {
        return client_error(StatusCode::BAD_REQUEST, "validation_error", "No file specified");
    };

    match state.fetcher.file_info(name).await {
        Ok(info) => (
            StatusCode::OK,
            Json(FileInfoResponse {
                status: "success".to_string(),
                info,
            }),
        )
            .into_response(),
        Err(e) => e.into_response(),
    }
}

/// `attachment; filename="<name>"`, with an RFC 5987 `filename*` form for
/// names that are not plain ASCII
fn content_disposition(filename: &str) -> HeaderValue {
    let plain = filename.is_ascii() && !filename.contains(['"', '\\']);
    if plain {
        if let Ok(value) = HeaderValue::from_str(&format!("attachment; filename=\"{}\"", filename))
        {
            return value;
        }
    }

    let encoded = urlencoding::encode(filename);
    HeaderValue::from_str(&format!("attachment; filename*=UTF-8''{}", encoded))
        .unwrap_or_else(|_| HeaderValue::from_static("attachment"))
}

fn is_mobile(headers: &HeaderMap) -> bool {
    headers
        .get(header::USER_AGENT)
        .and_then(|ua| ua.to_str().ok())
        .map(|ua| {
            let ua = ua.to_ascii_lowercase();
            MOBILE_AGENTS.iter().any(|agent| ua.contains(agent))
        })
        .unwrap_or(false)
}
