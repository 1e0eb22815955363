use shelfscan::application::services::ShelfScanner;

use crate::helpers::{StubExtractor, StubLookup, spawn_app};

fn idle_scanner() -> ShelfScanner {
    ShelfScanner::new(StubExtractor::lines(&[]), std::sync::Arc::new(StubLookup::new()))
}

#[tokio::test]
async fn upload_page_serves_form() {
    let app = spawn_app(idle_scanner()).await;

    let response = reqwest::get(app.page_url("/"))
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), 200);
    assert_eq!(response.headers()["x-content-type-options"], "nosniff");

    let body = response.text().await.expect("Failed to read body");
    assert!(body.contains("<html"));
    assert!(body.contains(r#"<form method="post" enctype="multipart/form-data" action="/upload">"#));
    assert!(body.contains(r#"<input type="file" name="image""#));
    assert!(body.contains(r#"<button type="submit">"#));
}

#[tokio::test]
async fn healthz_returns_ok() {
    let app = spawn_app(idle_scanner()).await;

    let response = reqwest::get(app.page_url("/healthz"))
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), 200);
    assert_eq!(response.text().await.unwrap(), "ok");
}

#[tokio::test]
async fn upload_rejects_get() {
    let app = spawn_app(idle_scanner()).await;

    let response = reqwest::get(app.page_url("/upload"))
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), 405);
}
