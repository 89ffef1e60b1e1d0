//! Chat assistant against a stubbed Claude Messages endpoint.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use std::sync::{Arc, Mutex};

use axum::{Json, Router, extract::State, http::StatusCode as AxumStatus, routing::post};
use reqwest::StatusCode;
use serde_json::{Value, json};

use sib_store_integration_tests::{Recorded, TestContext, TestOptions, recorded, serve};
use sib_store_storefront::services::chat::FALLBACK_REPLY;

/// A Claude stub that records each request and answers with `reply`.
async fn claude_stub(reply: &'static str) -> (String, Recorded) {
    let log: Recorded = Arc::new(Mutex::new(Vec::new()));
    let app = Router::new()
        .route(
            "/v1/messages",
            post(
                move |State(log): State<Recorded>, Json(body): Json<Value>| async move {
                    log.lock().unwrap().push(body);
                    Json(json!({
                        "id": "msg_stub",
                        "model": "claude-test",
                        "stop_reason": "end_turn",
                        "content": [{ "type": "text", "text": reply }],
                        "usage": { "input_tokens": 120, "output_tokens": 18 }
                    }))
                },
            ),
        )
        .with_state(Arc::clone(&log));
    let base = serve(app).await;
    (format!("{base}/v1/messages"), log)
}

#[tokio::test]
async fn test_reply_comes_from_provider_with_store_context() {
    let (endpoint, log) = claude_stub("آیفون ۱۶ پرو از ۹۰ میلیون تومان موجود است.").await;
    let ctx = TestContext::with_options(TestOptions {
        claude_endpoint: Some(endpoint),
        ..TestOptions::default()
    })
    .await;

    ctx.login().await;
    let (_, category) = ctx
        .post("/api/categories", &json!({ "nameEn": "iPhone", "nameFa": "آیفون" }))
        .await;
    let (_, model) = ctx
        .post(
            "/api/models",
            &json!({ "categoryId": category["id"], "nameEn": "iPhone 16 Pro", "nameFa": "آیفون ۱۶ پرو" }),
        )
        .await;
    let (_, color) = ctx
        .post(
            "/api/colors",
            &json!({ "nameEn": "Black Titanium", "nameFa": "مشکی", "hexCode": "#3C3C3D" }),
        )
        .await;
    let (_, storage) = ctx
        .post("/api/storage-options", &json!({ "nameEn": "256GB", "nameFa": "۲۵۶ گیگ" }))
        .await;
    ctx.post(
        "/api/product-prices",
        &json!({
            "modelId": model["id"],
            "colorId": color["id"],
            "storageId": storage["id"],
            "price": 90_000_000
        }),
    )
    .await;

    let (status, body) = ctx
        .post(
            "/api/chat",
            &json!({
                "message": "قیمت آیفون ۱۶ پرو چنده؟",
                "history": [
                    { "role": "user", "content": "سلام" },
                    { "role": "assistant", "content": "سلام، چطور می‌توانم کمک کنم؟" }
                ]
            }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["fallback"], false);
    assert_eq!(body["reply"], "آیفون ۱۶ پرو از ۹۰ میلیون تومان موجود است.");

    let requests = recorded(&log);
    assert_eq!(requests.len(), 1);
    let request = &requests[0];
    assert_eq!(request["model"], "claude-test");
    assert!(request["system"].as_str().unwrap().contains("آیفون ۱۶ پرو"));

    let messages = request["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 3);
    assert_eq!(messages[2]["role"], "user");
    assert_eq!(messages[2]["content"], "قیمت آیفون ۱۶ پرو چنده؟");
}

#[tokio::test]
async fn test_provider_error_falls_back() {
    let app = Router::new().route(
        "/v1/messages",
        post(|| async {
            (
                AxumStatus::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "type": "error",
                    "error": { "type": "api_error", "message": "overloaded" }
                })),
            )
        }),
    );
    let base = serve(app).await;
    let ctx = TestContext::with_options(TestOptions {
        claude_endpoint: Some(format!("{base}/v1/messages")),
        ..TestOptions::default()
    })
    .await;

    let (status, body) = ctx.post("/api/chat", &json!({ "message": "سلام" })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["fallback"], true);
    assert_eq!(body["reply"], FALLBACK_REPLY);
}

#[tokio::test]
async fn test_no_api_key_falls_back() {
    let ctx = TestContext::new().await;
    let (status, body) = ctx.post("/api/chat", &json!({ "message": "hello" })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["reply"], FALLBACK_REPLY);
}
