//! The storefront chat assistant.

use axum::{Router, extract::State, routing::post};

use crate::error::Result;
use crate::middleware::chat_rate_limiter;
use crate::routes::ApiJson;
use crate::services::chat::{self, ChatInput, ChatReply};
use crate::state::AppState;

/// Create the chat router (rate limited per client IP).
pub fn router() -> Router<AppState> {
    Router::new().route("/chat", post(send_message).layer(chat_rate_limiter()))
}

/// POST /api/chat
///
/// Always 200 for a non-empty message; `fallback` tells the widget that the
/// assistant was unavailable.
async fn send_message(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<ChatInput>,
) -> Result<ApiJson<ChatReply>> {
    let reply = chat::reply(state.pool(), state.cache(), state.claude(), input).await?;
    Ok(ApiJson(reply))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::{Method, StatusCode};
    use secrecy::SecretString;
    use serde_json::json;

    use super::super::test_support::TestApp;
    use crate::claude::ClaudeClient;
    use crate::config::ClaudeConfig;
    use crate::services::chat::FALLBACK_REPLY;

    #[tokio::test]
    async fn test_fallback_without_api_key() {
        let app = TestApp::new().await;
        let (status, body) = app
            .call(
                Method::POST,
                "/api/chat",
                Some(json!({ "message": "قیمت آیفون ۱۶ پرو چنده؟" })),
                None,
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["reply"], FALLBACK_REPLY);
        assert_eq!(body["fallback"], true);
    }

    #[tokio::test]
    async fn test_fallback_when_provider_unreachable() {
        let config = ClaudeConfig {
            api_key: SecretString::from("sk-ant-test"),
            model: "claude-test".to_string(),
        };
        let claude =
            ClaudeClient::with_endpoint(&config, "http://127.0.0.1:9/v1/messages").unwrap();
        let app = TestApp::with_clients(Some(claude), None).await;

        let (status, body) = app
            .call(
                Method::POST,
                "/api/chat",
                Some(json!({
                    "message": "سلام",
                    "history": [{ "role": "assistant", "content": "خوش آمدید" }]
                })),
                None,
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["fallback"], true);
    }

    #[tokio::test]
    async fn test_blank_message_rejected() {
        let app = TestApp::new().await;
        let (status, body) = app
            .call(Method::POST, "/api/chat", Some(json!({ "message": "  " })), None)
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "message is required");
    }
}
