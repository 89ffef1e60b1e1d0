//! WhatsApp and Apple ID orders, used phone listings and visit tracking.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use reqwest::StatusCode;
use serde_json::json;

use sib_store_integration_tests::TestContext;

#[tokio::test]
async fn test_whatsapp_order_hands_off_to_store_number() {
    let ctx = TestContext::new().await;

    let (status, created) = ctx
        .post(
            "/api/whatsapp-orders",
            &json!({
                "customerName": "نگار",
                "phone": "0935 111 2233",
                "note": "تحویل حضوری"
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{created}");
    assert_eq!(created["order"]["phone"], "09351112233");
    assert_eq!(created["order"]["status"], "new");

    let url = created["whatsappUrl"].as_str().unwrap();
    let parsed = reqwest::Url::parse(url).unwrap();
    assert_eq!(parsed.host_str(), Some("wa.me"));
    assert_eq!(parsed.path(), "/989121234567");
    let text = parsed
        .query_pairs()
        .find(|(key, _)| key == "text")
        .map(|(_, value)| value.into_owned())
        .unwrap();
    assert!(text.contains("نگار"));
    assert!(text.contains("09351112233"));

    // Follow-up is admin only.
    let (status, _) = ctx.get("/api/whatsapp-orders").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    ctx.login().await;
    let id = created["order"]["id"].as_i64().unwrap();
    let (status, updated) = ctx
        .patch(
            &format!("/api/whatsapp-orders/{id}"),
            &json!({ "status": "completed" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["status"], "completed");

    let (_, orders) = ctx.get("/api/whatsapp-orders?status=completed").await;
    assert_eq!(orders.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_apple_id_order_validates_contact_details() {
    let ctx = TestContext::new().await;

    let (status, _) = ctx
        .post(
            "/api/apple-id-orders",
            &json!({ "customerName": "Ali", "phone": "0912", "email": "ali@example.com" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, created) = ctx
        .post(
            "/api/apple-id-orders",
            &json!({ "customerName": "Ali", "phone": "09127654321", "email": "ali@example.com" }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(
        created["whatsappUrl"]
            .as_str()
            .unwrap()
            .starts_with("https://wa.me/989121234567")
    );
}

#[tokio::test]
async fn test_used_phone_listing_lifecycle() {
    let ctx = TestContext::new().await;

    let (status, listing) = ctx
        .post(
            "/api/used-phones",
            &json!({
                "modelName": "iPhone 14 Pro",
                "storage": "256GB",
                "color": "Deep Purple",
                "condition": "Minor scratches",
                "batteryHealth": 86,
                "price": 38_000_000,
                "sellerName": "Hamed",
                "sellerPhone": "09198887766",
                "images": ["https://res.cloudinary.com/sib/image/upload/a.jpg"]
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(listing["isApproved"], false);

    let (_, public) = ctx.get("/api/used-phones").await;
    assert_eq!(public, json!([]));

    ctx.login().await;
    let id = listing["id"].as_i64().unwrap();
    let (status, _) = ctx
        .patch(
            &format!("/api/used-phones/{id}"),
            &json!({ "isApproved": true }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, public) = ctx.get("/api/used-phones").await;
    assert_eq!(public.as_array().unwrap().len(), 1);
    assert_eq!(public[0]["images"][0], "https://res.cloudinary.com/sib/image/upload/a.jpg");

    assert_eq!(
        ctx.delete(&format!("/api/used-phones/{id}")).await,
        StatusCode::NO_CONTENT
    );
    assert_eq!(
        ctx.get(&format!("/api/used-phones/{id}")).await.0,
        StatusCode::NOT_FOUND
    );
}

#[tokio::test]
async fn test_visits_feed_admin_stats() {
    let ctx = TestContext::new().await;

    for path in ["/", "/products/iphone-16-pro", "/"] {
        let (status, _) = ctx
            .post("/api/visits", &json!({ "path": path, "visitorId": "v-1" }))
            .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    ctx.login().await;
    let (status, stats) = ctx.get("/api/visits/stats").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["totalVisits"], 3);
    assert_eq!(stats["uniqueVisitors"], 1);
    assert_eq!(stats["topPages"][0], json!({ "path": "/", "count": 2 }));
}
