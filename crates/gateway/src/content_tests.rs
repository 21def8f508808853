// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use tempfile::tempdir;
use tower::util::ServiceExt;

async fn send(router: Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
    let response = router.oneshot(request).await.unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes().to_vec();
    (status, body)
}

#[test]
fn resolve_rejects_traversal() {
    let root = Path::new("/data");
    assert_eq!(resolve(root, "a/b.txt"), Some(PathBuf::from("/data/a/b.txt")));
    assert_eq!(resolve(root, "/a/b.txt"), Some(PathBuf::from("/data/a/b.txt")));
    assert_eq!(resolve(root, "../etc/passwd"), None);
    assert_eq!(resolve(root, "a/../../etc"), None);
}

#[tokio::test]
async fn write_then_read_round_trip() {
    let dir = tempdir().unwrap();
    let app = router(dir.path().to_path_buf());

    let (status, _) = send(
        app.clone(),
        Request::put("/content/write?path=artifacts/notes.md")
            .body(Body::from("# Findings"))
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = send(
        app,
        Request::get("/content/file?path=artifacts/notes.md").body(Body::empty()).unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"# Findings");
}

#[tokio::test]
async fn list_is_non_recursive_with_metadata() {
    let dir = tempdir().unwrap();
    std::fs::create_dir(dir.path().join("sub")).unwrap();
    std::fs::write(dir.path().join("a.txt"), "hello").unwrap();
    std::fs::write(dir.path().join("sub/inner.txt"), "x").unwrap();

    let app = router(dir.path().to_path_buf());
    let (status, body) =
        send(app, Request::get("/content/list?path=").body(Body::empty()).unwrap()).await;
    assert_eq!(status, StatusCode::OK);

    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    let items = json["items"].as_array().unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0]["name"], "a.txt");
    assert_eq!(items[0]["isDir"], false);
    assert_eq!(items[0]["size"], 5);
    assert_eq!(items[1]["name"], "sub");
    assert_eq!(items[1]["isDir"], true);
}

#[tokio::test]
async fn missing_file_is_404_and_traversal_is_400() {
    let dir = tempdir().unwrap();
    let app = router(dir.path().to_path_buf());

    let (status, _) =
        send(app.clone(), Request::get("/content/file?path=nope.txt").body(Body::empty()).unwrap())
            .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(
        app,
        Request::get("/content/file?path=..%2Fsecrets").body(Body::empty()).unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn health_is_open() {
    let dir = tempdir().unwrap();
    let app = router(dir.path().to_path_buf());
    let (status, body) = send(app, Request::get("/health").body(Body::empty()).unwrap()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"ok");
}
