//! End-to-end tests for the upload endpoint: real router, real filesystem.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use finedrop_api::routes::build_router;
use finedrop_api::state::AppState;
use finedrop_core::Config;
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::{tempdir, TempDir};
use tower::ServiceExt;

const BOUNDARY: &str = "X-FINEDROP-TEST-BOUNDARY";

fn test_app(allowed: &[&str], size_limit: Option<u64>) -> (TempDir, Router) {
    let dir = tempdir().unwrap();
    let config = Config {
        server_port: 0,
        environment: "test".to_string(),
        upload_dir: dir.path().to_path_buf(),
        allowed_extensions: allowed.iter().map(|s| s.to_string()).collect(),
        size_limit,
        allow_overwrite: false,
        max_request_body_size: 25 * 1024 * 1024,
    };
    let router = build_router(Arc::new(AppState::new(config)));
    (dir, router)
}

fn raw_upload(name: &str, declared: u64, body: Vec<u8>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(format!("/upload?qqfile={}", name))
        .header(header::CONTENT_TYPE, "application/octet-stream")
        .header(header::CONTENT_LENGTH, declared.to_string())
        .body(Body::from(body))
        .unwrap()
}

fn multipart_upload(filename: &str, data: &[u8]) -> Request<Body> {
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{}\r\nContent-Disposition: form-data; name=\"qqfile\"; filename=\"{}\"\r\n\
             Content-Type: application/octet-stream\r\n\r\n",
            BOUNDARY, filename
        )
        .as_bytes(),
    );
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());

    Request::builder()
        .method("POST")
        .uri("/upload")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_stream_upload_success() {
    let (dir, app) = test_app(&["jpg", "png"], Some(1024 * 1024));

    let response = app
        .oneshot(raw_upload("a.jpg", 500, vec![7u8; 500]))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await, serde_json::json!({"success": true}));

    let stored = dir.path().join("a.jpg");
    assert_eq!(std::fs::metadata(&stored).unwrap().len(), 500);
}

#[tokio::test]
async fn test_stream_upload_too_large() {
    let (_dir, app) = test_app(&["jpg", "png"], Some(1024 * 1024));

    // Declared size is what gets validated; the body itself is irrelevant.
    let response = app
        .oneshot(raw_upload("a.jpg", 2 * 1024 * 1024, Vec::new()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        json_body(response).await,
        serde_json::json!({"error": "File is too large"})
    );
}

#[tokio::test]
async fn test_stream_upload_invalid_extension_message() {
    let (_dir, app) = test_app(&["jpg", "png"], Some(1024 * 1024));

    let response = app
        .oneshot(raw_upload("a.gif", 500, vec![0u8; 500]))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        json_body(response).await,
        serde_json::json!({
            "error": "File has an invalid extension, it should be one of jpg, png."
        })
    );
}

#[tokio::test]
async fn test_stream_upload_extension_case_insensitive() {
    let (dir, app) = test_app(&["jpg"], Some(1024 * 1024));

    let response = app
        .oneshot(raw_upload("PHOTO.JPG", 3, b"abc".to_vec()))
        .await
        .unwrap();

    assert_eq!(json_body(response).await["success"], true);
    assert!(dir.path().join("PHOTO.JPG").is_file());
}

#[tokio::test]
async fn test_stream_upload_empty_file() {
    let (_dir, app) = test_app(&["jpg"], Some(1024 * 1024));

    let response = app
        .oneshot(raw_upload("a.jpg", 0, Vec::new()))
        .await
        .unwrap();

    assert_eq!(
        json_body(response).await,
        serde_json::json!({"error": "File is empty"})
    );
}

#[tokio::test]
async fn test_stream_upload_without_content_length() {
    let (_dir, app) = test_app(&["jpg"], Some(1024 * 1024));

    let request = Request::builder()
        .method("POST")
        .uri("/upload?qqfile=a.jpg")
        .header(header::CONTENT_TYPE, "application/octet-stream")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert!(body.get("error").is_some(), "expected error body: {}", body);
}

#[tokio::test]
async fn test_stream_upload_truncated_body_is_save_failure() {
    let (dir, app) = test_app(&["jpg"], Some(1024 * 1024));

    // Declared 500 bytes, sent 100: the save must fail and clean up.
    let response = app
        .oneshot(raw_upload("a.jpg", 500, vec![1u8; 100]))
        .await
        .unwrap();

    assert_eq!(
        json_body(response).await,
        serde_json::json!({
            "error": "Could not save uploaded file. The upload was cancelled, or server error encountered"
        })
    );
    assert!(!dir.path().join("a.jpg").exists());
}

#[tokio::test]
async fn test_collision_appends_counter() {
    let (dir, app) = test_app(&["jpg"], Some(1024 * 1024));

    for _ in 0..2 {
        let response = app
            .clone()
            .oneshot(raw_upload("a.jpg", 4, b"data".to_vec()))
            .await
            .unwrap();
        assert_eq!(json_body(response).await["success"], true);
    }

    assert!(dir.path().join("a.jpg").is_file());
    assert!(dir.path().join("a_1.jpg").is_file());
}

#[tokio::test]
async fn test_multipart_upload_success() {
    let (dir, app) = test_app(&["png"], Some(1024 * 1024));

    let response = app
        .oneshot(multipart_upload("pic.png", b"png bytes"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await, serde_json::json!({"success": true}));
    assert_eq!(
        std::fs::read(dir.path().join("pic.png")).unwrap(),
        b"png bytes"
    );
}

#[tokio::test]
async fn test_multipart_upload_invalid_extension() {
    let (dir, app) = test_app(&["png"], Some(1024 * 1024));

    let response = app
        .oneshot(multipart_upload("evil.exe", b"mz"))
        .await
        .unwrap();

    assert_eq!(
        json_body(response).await,
        serde_json::json!({
            "error": "File has an invalid extension, it should be one of png."
        })
    );
    assert!(!dir.path().join("evil.exe").exists());
}

#[tokio::test]
async fn test_multipart_missing_field_is_error_with_200() {
    let (_dir, app) = test_app(&[], None);

    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{}\r\nContent-Disposition: form-data; name=\"other\"\r\n\r\nvalue\r\n--{}--\r\n",
            BOUNDARY, BOUNDARY
        )
        .as_bytes(),
    );
    let request = Request::builder()
        .method("POST")
        .uri("/upload")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(json_body(response).await.get("error").is_some());
}

#[tokio::test]
async fn test_unrestricted_policy_accepts_any_extension() {
    let (dir, app) = test_app(&[], None);

    let response = app
        .oneshot(raw_upload("notes.xyz", 5, b"hello".to_vec()))
        .await
        .unwrap();

    assert_eq!(json_body(response).await["success"], true);
    assert!(dir.path().join("notes.xyz").is_file());
}

#[tokio::test]
async fn test_progress_element_describes_contract() {
    let (_dir, app) = test_app(&[], None);

    let request = Request::builder()
        .method("GET")
        .uri("/progress/element")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["progress_param"], "progress");
    assert_eq!(body["progress_header"], "x-progress-id");
}

#[tokio::test]
async fn test_progress_unknown_key_is_empty_object() {
    let (_dir, app) = test_app(&[], None);

    let request = Request::builder()
        .method("GET")
        .uri("/progress/no-such-key")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(json_body(response).await, serde_json::json!({}));
}

#[tokio::test]
async fn test_progress_cancel_unknown_key_reports_false() {
    let (_dir, app) = test_app(&[], None);

    let request = Request::builder()
        .method("POST")
        .uri("/progress/no-such-key/cancel")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(
        json_body(response).await,
        serde_json::json!({"success": false})
    );
}

#[tokio::test]
async fn test_upload_with_progress_key_completes_and_reports_done() {
    let (dir, app) = test_app(&["jpg"], Some(1024 * 1024));

    let request = Request::builder()
        .method("POST")
        .uri("/upload?qqfile=a.jpg&progress=sess-1")
        .header(header::CONTENT_TYPE, "application/octet-stream")
        .header(header::CONTENT_LENGTH, "4")
        .body(Body::from(&b"data"[..]))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(json_body(response).await["success"], true);
    assert!(dir.path().join("a.jpg").is_file());

    let poll = Request::builder()
        .method("GET")
        .uri("/progress/sess-1")
        .body(Body::empty())
        .unwrap();
    let body = json_body(app.oneshot(poll).await.unwrap()).await;
    assert_eq!(body["state"], "done");
    assert_eq!(body["bytes_received"], 4);
}

#[tokio::test]
async fn test_cancel_mid_stream_aborts_save_and_cleans_up() {
    let (dir, app) = test_app(&["jpg"], Some(1024 * 1024));

    // Feed the body through a channel so the upload stays in flight while the
    // cancel request races it.
    let (tx, rx) = futures::channel::mpsc::unbounded::<Result<Vec<u8>, std::io::Error>>();
    let request = Request::builder()
        .method("POST")
        .uri("/upload?qqfile=a.jpg&progress=sess-cancel")
        .header(header::CONTENT_TYPE, "application/octet-stream")
        .header(header::CONTENT_LENGTH, "1000")
        .body(Body::from_stream(rx))
        .unwrap();
    let upload = tokio::spawn(app.clone().oneshot(request));

    tx.unbounded_send(Ok(vec![1u8; 100])).unwrap();

    // Wait until the server has consumed the first chunk.
    let mut started = false;
    for _ in 0..100 {
        let poll = Request::builder()
            .method("GET")
            .uri("/progress/sess-cancel")
            .body(Body::empty())
            .unwrap();
        let body = json_body(app.clone().oneshot(poll).await.unwrap()).await;
        if body["bytes_received"].as_u64().unwrap_or(0) > 0 {
            started = true;
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }
    assert!(started, "upload never started consuming the body");

    let cancel = Request::builder()
        .method("POST")
        .uri("/progress/sess-cancel/cancel")
        .body(Body::empty())
        .unwrap();
    assert_eq!(
        json_body(app.clone().oneshot(cancel).await.unwrap()).await,
        serde_json::json!({"success": true})
    );

    // Cancellation is observed on the next chunk; the save must abort with
    // the fixed error and remove the partial file.
    tx.unbounded_send(Ok(vec![2u8; 100])).unwrap();
    drop(tx);

    let response = upload.await.unwrap().unwrap();
    assert_eq!(
        json_body(response).await,
        serde_json::json!({
            "error": "Could not save uploaded file. The upload was cancelled, or server error encountered"
        })
    );
    assert!(!dir.path().join("a.jpg").exists());
}

#[tokio::test]
async fn test_existing_file_never_overwritten() {
    let (dir, app) = test_app(&["jpg"], None);
    std::fs::write(dir.path().join("a.jpg"), b"original content").unwrap();

    let response = app
        .oneshot(raw_upload("a.jpg", 3, b"new".to_vec()))
        .await
        .unwrap();
    assert_eq!(json_body(response).await["success"], true);

    assert_eq!(
        std::fs::read(dir.path().join("a.jpg")).unwrap(),
        b"original content"
    );
    assert_eq!(std::fs::read(dir.path().join("a_1.jpg")).unwrap(), b"new");
}
