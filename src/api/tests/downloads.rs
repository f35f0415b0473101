use super::*;
use crate::store::ArtifactStore;

const FORM: &str = "url=https%3A%2F%2Fwww.youtube.com%2Fwatch%3Fv%3DdQw4w9WgXcQ&option=mp3";

#[tokio::test]
async fn test_download_then_retrieve_once() {
    let (app, _fetcher, store) = test_app("Test & Song");

    let response = app.clone().oneshot(form_request(FORM)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json["status"], "success");
    assert_eq!(json["filename"], "Test and Song.mp3");
    assert_eq!(json["size_bytes"], 2048);

    let response = app
        .clone()
        .oneshot(get_request("/download_file?file=Test%20and%20Song.mp3"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let headers = response.headers();
    assert_eq!(headers["content-type"], "audio/mpeg");
    assert_eq!(
        headers["content-disposition"],
        "attachment; filename=\"Test and Song.mp3\""
    );
    assert_eq!(headers["cache-control"], "no-cache, no-store, must-revalidate");
    assert_eq!(headers["pragma"], "no-cache");
    assert_eq!(headers["expires"], "0");
    assert!(!headers.contains_key("content-transfer-encoding"));

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(body.len(), 2048);
    assert!(store.contents("Test and Song.mp3").is_none());

    let response = app
        .oneshot(get_request("/download_file?file=Test%20and%20Song.mp3"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(json_body(response).await["status"], "error");
}

#[tokio::test]
async fn test_download_requires_url_and_option() {
    let (app, _fetcher, _store) = test_app("x");

    for body in ["option=mp3", "url=https%3A%2F%2Fyoutu.be%2FdQw4w9WgXcQ", "url=&option=", ""] {
        let response = app.clone().oneshot(form_request(body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "body {:?}", body);

        let json = json_body(response).await;
        assert_eq!(json["status"], "error");
        assert_eq!(json["message"], "Missing URL or option");
    }
}

#[tokio::test]
async fn test_download_without_form_body_is_json_400() {
    let (app, _fetcher, _store) = test_app("x");

    let requests = [
        Request::builder()
            .method("POST")
            .uri("/download")
            .body(Body::empty())
            .unwrap(),
        Request::builder()
            .method("POST")
            .uri("/download")
            .header("content-type", "application/json")
            .body(Body::from(
                r#"{"url":"https://youtu.be/dQw4w9WgXcQ","option":"mp3"}"#,
            ))
            .unwrap(),
    ];

    for request in requests {
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let json = json_body(response).await;
        assert_eq!(json["status"], "error");
        assert_eq!(json["code"], "validation_error");
        assert_eq!(json["message"], "Missing URL or option");
    }
}

#[tokio::test]
async fn test_download_rejects_unknown_option() {
    let (app, _fetcher, _store) = test_app("x");

    let response = app
        .oneshot(form_request(
            "url=https%3A%2F%2Fyoutu.be%2FdQw4w9WgXcQ&option=flac",
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["message"], "Invalid option");
}

#[tokio::test]
async fn test_download_rejects_unsupported_source() {
    let (app, _fetcher, store) = test_app("x");

    let response = app
        .oneshot(form_request("url=https%3A%2F%2Fexample.com%2Fvideo&option=mp4"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["code"], "invalid_source");
    assert!(store.list().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_download_after_shutdown_is_503() {
    let (app, fetcher, _store) = test_app("x");
    fetcher.shutdown().await;

    let response = app.oneshot(form_request(FORM)).await.unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(json_body(response).await["code"], "shutting_down");
}

#[tokio::test]
async fn test_download_file_requires_name() {
    let (app, _fetcher, _store) = test_app("x");

    for uri in ["/download_file", "/download_file?file="] {
        let response = app.clone().oneshot(get_request(uri)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["message"], "No file specified");
    }
}

#[tokio::test]
async fn test_download_file_rejects_paths() {
    let (app, _fetcher, store) = test_app("x");
    store.insert("song.mp3", b"x".to_vec());

    for uri in [
        "/download_file?file=..%2Fsong.mp3",
        "/download_file?file=sub%2Fsong.mp3",
        "/download_file?file=.hidden",
    ] {
        let response = app.clone().oneshot(get_request(uri)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "uri {}", uri);
        assert_eq!(json_body(response).await["code"], "invalid_file_name");
    }
    assert!(store.contents("song.mp3").is_some());
}

#[tokio::test]
async fn test_download_file_mobile_headers() {
    let (app, _fetcher, store) = test_app("x");
    store.insert("clip.mp4", b"video".to_vec());

    let request = Request::builder()
        .uri("/download_file?file=clip.mp4")
        .header(
            "user-agent",
            "Mozilla/5.0 (iPhone; CPU iPhone OS 17_0 like Mac OS X) Mobile/15E148",
        )
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["content-type"], "video/mp4");
    assert_eq!(response.headers()["content-transfer-encoding"], "binary");
}

#[tokio::test]
async fn test_download_file_non_ascii_name() {
    let (app, _fetcher, store) = test_app("x");
    store.insert("Café.mp3", b"x".to_vec());

    let response = app
        .oneshot(get_request("/download_file?file=Caf%C3%A9.mp3"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()["content-disposition"],
        "attachment; filename*=UTF-8''Caf%C3%A9.mp3"
    );
}

#[tokio::test]
async fn test_file_info() {
    let (app, _fetcher, store) = test_app("x");
    store.insert("clip.mp4", vec![0u8; 17 * 1024 * 1024]);

    let response = app
        .clone()
        .oneshot(get_request("/file_info?file=clip.mp4"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = json_body(response).await;
    assert_eq!(json["status"], "success");
    assert_eq!(json["filename"], "clip.mp4");
    assert_eq!(json["extension"], ".mp4");
    assert_eq!(json["size_mb"], 17.0);
    assert_eq!(json["whatsapp_compatible"], false);

    // file_info never consumes the artifact
    assert!(store.contents("clip.mp4").is_some());

    let response = app
        .oneshot(get_request("/file_info?file=missing.mp3"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
