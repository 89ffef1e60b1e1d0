//! The storefront chat assistant.
//!
//! Questions are forwarded to Claude with a Persian system prompt that
//! carries a summary of the catalog. The assistant never fails the request:
//! without an API key, or when the provider errors, the customer gets
//! [`FALLBACK_REPLY`] pointing them at WhatsApp.

use std::fmt::Write as _;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tracing::{debug, instrument, warn};

use crate::claude::{ClaudeClient, ClaudeError, Message, Role};
use crate::db::{CategoryRepository, PriceRepository, ProductModelRepository, RepositoryError};
use crate::models::ValidationError;

use super::catalog::{CacheKey, CacheValue, CatalogCache};

/// Reply sent when the assistant is unavailable.
pub const FALLBACK_REPLY: &str = "متأسفانه در حال حاضر امکان پاسخگویی خودکار وجود ندارد. \
لطفاً برای استعلام قیمت و مشاوره خرید از طریق واتساپ با ما در ارتباط باشید.";

/// Only the most recent turns of the history are forwarded.
pub const MAX_HISTORY_TURNS: usize = 10;

/// Longer messages are truncated to this many characters.
pub const MAX_MESSAGE_CHARS: usize = 2000;

/// Body of `POST /api/chat`.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatInput {
    pub message: String,
    #[serde(default)]
    pub history: Vec<ChatTurn>,
}

/// One earlier turn of the conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: Role,
    pub content: String,
}

/// Response of `POST /api/chat`.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ChatReply {
    pub reply: String,
    /// `true` when the reply is [`FALLBACK_REPLY`].
    pub fallback: bool,
}

impl ChatReply {
    fn fallback() -> Self {
        Self {
            reply: FALLBACK_REPLY.to_string(),
            fallback: true,
        }
    }
}

/// Answer a customer question.
///
/// # Errors
///
/// Returns `ValidationError` if the message is blank. Provider and database
/// failures produce the fallback reply instead.
#[instrument(skip_all, fields(history = input.history.len()))]
pub async fn reply(
    pool: &SqlitePool,
    cache: &CatalogCache,
    claude: Option<&ClaudeClient>,
    input: ChatInput,
) -> Result<ChatReply, ValidationError> {
    let messages = conversation(input)?;

    let Some(claude) = claude else {
        debug!("Chat requested without an API key configured");
        return Ok(ChatReply::fallback());
    };

    let context = match store_context(pool, cache).await {
        Ok(context) => context,
        Err(e) => {
            warn!(error = %e, "Failed to load store context for chat");
            return Ok(ChatReply::fallback());
        }
    };

    let answer = claude
        .chat(messages, Some(system_prompt(&context)))
        .await
        .and_then(|response| {
            let text = response.text();
            if text.trim().is_empty() {
                Err(ClaudeError::EmptyResponse)
            } else {
                Ok(text)
            }
        });

    match answer {
        Ok(reply) => Ok(ChatReply {
            reply,
            fallback: false,
        }),
        Err(e) => {
            warn!(error = %e, "Chat provider failed, sending fallback");
            Ok(ChatReply::fallback())
        }
    }
}

/// Validate the input and turn it into an alternating conversation that
/// starts and ends with a user turn.
///
/// # Errors
///
/// Returns `ValidationError` if the message is blank.
pub fn conversation(input: ChatInput) -> Result<Vec<Message>, ValidationError> {
    let message = input.message.trim();
    if message.is_empty() {
        return Err(ValidationError::new("message is required"));
    }

    let skip = input.history.len().saturating_sub(MAX_HISTORY_TURNS);
    let mut messages: Vec<Message> = Vec::with_capacity(MAX_HISTORY_TURNS + 1);
    for turn in input.history.into_iter().skip(skip) {
        push_turn(&mut messages, turn.role, &turn.content);
    }
    push_turn(&mut messages, Role::User, message);
    Ok(messages)
}

/// Append a turn, merging it into the previous one when the role repeats.
/// Blank turns and a leading assistant turn are dropped.
fn push_turn(messages: &mut Vec<Message>, role: Role, content: &str) {
    let content = truncate(content.trim(), MAX_MESSAGE_CHARS);
    if content.is_empty() || (messages.is_empty() && role == Role::Assistant) {
        return;
    }
    match messages.last_mut() {
        Some(last) if last.role == role => {
            last.content.push_str("\n\n");
            last.content.push_str(&content);
        }
        _ => messages.push(Message { role, content }),
    }
}

fn truncate(value: &str, max_chars: usize) -> String {
    value.chars().take(max_chars).collect()
}

fn system_prompt(context: &str) -> String {
    format!(
        "شما دستیار فروش فروشگاه اینترنتی سیب هستید که محصولات اپل می‌فروشد. \
همیشه به زبان فارسی، کوتاه و مؤدبانه پاسخ دهید. قیمت‌ها به تومان هستند. \
فقط از اطلاعات زیر برای قیمت و موجودی استفاده کنید و قیمتی از خودتان نسازید. \
برای ثبت سفارش یا سؤال‌هایی که پاسخ آن را نمی‌دانید، مشتری را به واتساپ فروشگاه راهنمایی کنید.\n\n\
اطلاعات فروشگاه:\n{context}"
    )
}

/// Persian summary of the catalog: categories and each model's lowest price.
///
/// # Errors
///
/// Returns `RepositoryError` if a query fails.
pub async fn store_context(
    pool: &SqlitePool,
    cache: &CatalogCache,
) -> Result<Arc<str>, RepositoryError> {
    if let Some(CacheValue::ChatContext(context)) = cache.get(&CacheKey::ChatContext).await {
        return Ok(context);
    }

    let generation = cache.generation();
    let categories = CategoryRepository::new(pool).list().await?;
    let models = ProductModelRepository::new(pool).list(None, false).await?;
    let starting = PriceRepository::new(pool).starting_prices().await?;

    let mut text = String::from("دسته‌بندی‌ها: ");
    text.push_str(
        &categories
            .iter()
            .map(|c| c.name_fa.as_str())
            .collect::<Vec<_>>()
            .join("، "),
    );
    text.push_str("\n\nقیمت شروع مدل‌ها:\n");

    let mut priced = 0;
    for model in &models {
        let Some((_, price)) = starting.iter().find(|(id, _)| *id == model.id) else {
            continue;
        };
        let _ = writeln!(
            text,
            "- {} ({}): از {}",
            model.name_fa,
            model.name_en,
            price.display_fa()
        );
        priced += 1;
    }
    if priced == 0 {
        text.push_str("- فعلاً قیمتی ثبت نشده است.\n");
    }

    let context: Arc<str> = Arc::from(text.trim_end());
    cache
        .insert(
            CacheKey::ChatContext,
            CacheValue::ChatContext(Arc::clone(&context)),
            generation,
        )
        .await;
    Ok(context)
}
