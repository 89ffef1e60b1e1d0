//! Image uploads against a stubbed Cloudinary upload API.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::{
    Form, Json, Router,
    extract::{Path, State},
    routing::post,
};
use reqwest::StatusCode;
use serde_json::{Value, json};

use sib_store_integration_tests::{Recorded, TestContext, TestOptions, recorded, serve};

const PIXEL: &str = "data:image/png;base64,iVBORw0KGgo=";

/// A Cloudinary stub that records each form and names uploads in order.
async fn cloudinary_stub() -> (String, Recorded) {
    let log: Recorded = Arc::new(Mutex::new(Vec::new()));
    let app = Router::new()
        .route(
            "/{cloud}/image/upload",
            post(
                |State(log): State<Recorded>,
                 Path(cloud): Path<String>,
                 Form(form): Form<HashMap<String, String>>| async move {
                    let mut log = log.lock().unwrap();
                    let public_id = format!(
                        "{}/img-{}",
                        form.get("folder").map_or("root", String::as_str),
                        log.len() + 1
                    );
                    log.push(json!({ "cloud": cloud, "form": form }));
                    Json(json!({
                        "secure_url": format!("https://res.cloudinary.com/{cloud}/image/upload/{public_id}.png"),
                        "public_id": public_id
                    }))
                },
            ),
        )
        .with_state(Arc::clone(&log));
    (serve(app).await, log)
}

#[tokio::test]
async fn test_single_upload_is_signed_and_returns_url() {
    let (api_url, log) = cloudinary_stub().await;
    let ctx = TestContext::with_options(TestOptions {
        cloudinary_api_url: Some(api_url),
        ..TestOptions::default()
    })
    .await;
    ctx.login().await;

    let (status, body) = ctx
        .post("/api/upload", &json!({ "image": PIXEL, "folder": "products" }))
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["publicId"], "products/img-1");
    assert_eq!(
        body["url"],
        "https://res.cloudinary.com/sib-test/image/upload/products/img-1.png"
    );

    let requests = recorded(&log);
    assert_eq!(requests.len(), 1);
    let sent = &requests[0];
    assert_eq!(sent["cloud"], "sib-test");
    let form = &sent["form"];
    assert_eq!(form["file"], PIXEL);
    assert_eq!(form["folder"], "products");
    assert_eq!(form["api_key"], "123456");
    assert_eq!(form["signature"].as_str().unwrap().len(), 64);
    assert!(form["timestamp"].as_str().unwrap().parse::<i64>().is_ok());
    assert!(form.get("api_secret").is_none());
}

#[tokio::test]
async fn test_multiple_upload_returns_urls_in_order() {
    let (api_url, log) = cloudinary_stub().await;
    let ctx = TestContext::with_options(TestOptions {
        cloudinary_api_url: Some(api_url),
        ..TestOptions::default()
    })
    .await;
    ctx.login().await;

    let (status, body) = ctx
        .post("/api/upload/multiple", &json!({ "images": [PIXEL, PIXEL] }))
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(
        body["urls"],
        json!([
            "https://res.cloudinary.com/sib-test/image/upload/sib-store/img-1.png",
            "https://res.cloudinary.com/sib-test/image/upload/sib-store/img-2.png"
        ])
    );

    // One bad image stops the batch before anything is sent.
    let (status, _) = ctx
        .post(
            "/api/upload/multiple",
            &json!({ "images": [PIXEL, "data:text/plain;base64,aGk="] }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(recorded(&log).len(), 2);
}

#[tokio::test]
async fn test_upload_without_cloudinary_is_unavailable() {
    let ctx = TestContext::new().await;

    let (status, _) = ctx.post("/api/upload", &json!({ "image": PIXEL })).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    ctx.login().await;
    let (status, body): (StatusCode, Value) =
        ctx.post("/api/upload", &json!({ "image": PIXEL })).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"], "سرویس آپلود تصویر پیکربندی نشده است");
}
