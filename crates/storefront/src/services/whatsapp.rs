//! WhatsApp checkout handoff.
//!
//! The store takes no payments. A submitted order is saved and the customer
//! is sent to a `wa.me` link that opens a chat with the store, pre-filled
//! with a Persian summary of the request.

use std::fmt::Write as _;

use sqlx::SqlitePool;

use sib_store_core::text::to_persian_digits;

use crate::db::{
    ColorRepository, PriceRepository, ProductModelRepository, RepositoryError,
    StorageOptionRepository,
};
use crate::models::order::{AppleIdOrder, NewWhatsappOrder, WhatsappOrder};

const WA_ME: &str = "https://wa.me";

/// Build a `wa.me` link for `number` (international digits) with `text`
/// pre-filled.
///
/// ```
/// use sib_store_storefront::services::whatsapp::whatsapp_link;
///
/// assert_eq!(
///     whatsapp_link("989121234567", "سلام & خداحافظ"),
///     "https://wa.me/989121234567?text=%D8%B3%D9%84%D8%A7%D9%85%20%26%20%D8%AE%D8%AF%D8%A7%D8%AD%D8%A7%D9%81%D8%B8"
/// );
/// ```
#[must_use]
pub fn whatsapp_link(number: &str, text: &str) -> String {
    // form encoding writes spaces as '+', which wa.me shows literally
    let encoded: String = url::form_urlencoded::byte_serialize(text.as_bytes())
        .collect::<String>()
        .replace('+', "%20");
    format!("{WA_ME}/{number}?text={encoded}")
}

/// Fill in catalog names and the current price for the referenced items.
///
/// Names are resolved for whichever ids are present; the price only when
/// model, color and storage are all given and an active price row exists.
///
/// # Errors
///
/// Returns `RepositoryError::InvalidReference` if an id does not exist.
pub async fn resolve_catalog(
    pool: &SqlitePool,
    order: &mut NewWhatsappOrder,
) -> Result<(), RepositoryError> {
    if let Some(id) = order.model_id {
        let model = ProductModelRepository::new(pool)
            .get(id)
            .await?
            .ok_or_else(|| RepositoryError::InvalidReference("model not found".to_string()))?;
        order.model_name = Some(model.name_fa);
    }
    if let Some(id) = order.color_id {
        let color = ColorRepository::new(pool)
            .get(id)
            .await?
            .ok_or_else(|| RepositoryError::InvalidReference("color not found".to_string()))?;
        order.color_name = Some(color.name_fa);
    }
    if let Some(id) = order.storage_id {
        let storage = StorageOptionRepository::new(pool)
            .get(id)
            .await?
            .ok_or_else(|| {
                RepositoryError::InvalidReference("storage option not found".to_string())
            })?;
        order.storage_name = Some(storage.name_fa);
    }

    if let (Some(model), Some(color), Some(storage)) =
        (order.model_id, order.color_id, order.storage_id)
    {
        order.price = PriceRepository::new(pool)
            .find_active(model, color, storage)
            .await?
            .map(|row| row.price);
    }
    Ok(())
}

/// Persian summary of a purchase request.
#[must_use]
pub fn order_message(order: &WhatsappOrder) -> String {
    let mut text = String::from("سلام، درخواست خرید دارم:\n");
    let _ = writeln!(
        text,
        "شماره سفارش: {}",
        to_persian_digits(&order.id.as_i64().to_string())
    );
    let _ = writeln!(text, "نام: {}", order.customer_name);
    let _ = writeln!(text, "تلفن: {}", order.phone);
    if let Some(model) = &order.model_name {
        let _ = writeln!(text, "محصول: {model}");
    }
    if let Some(storage) = &order.storage_name {
        let _ = writeln!(text, "حافظه: {storage}");
    }
    if let Some(color) = &order.color_name {
        let _ = writeln!(text, "رنگ: {color}");
    }
    if let Some(price) = order.price {
        let _ = writeln!(text, "قیمت: {}", price.display_fa());
    }
    if let Some(note) = &order.note {
        let _ = writeln!(text, "توضیحات: {note}");
    }
    text.trim_end().to_string()
}

/// Persian summary of an Apple ID request.
#[must_use]
pub fn apple_id_message(order: &AppleIdOrder) -> String {
    let mut text = String::from("سلام، درخواست ساخت اپل آیدی دارم:\n");
    let _ = writeln!(
        text,
        "شماره درخواست: {}",
        to_persian_digits(&order.id.as_i64().to_string())
    );
    let _ = writeln!(text, "نام: {}", order.customer_name);
    let _ = writeln!(text, "تلفن: {}", order.phone);
    if let Some(email) = &order.email {
        let _ = writeln!(text, "ایمیل: {email}");
    }
    if let Some(note) = &order.note {
        let _ = writeln!(text, "توضیحات: {note}");
    }
    text.trim_end().to_string()
}
