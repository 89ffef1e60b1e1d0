//! Order requests handed off to WhatsApp.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use sib_store_core::{
    AppleIdOrderId, ColorId, Email, ModelId, OrderStatus, PhoneNumber, Price, StorageId,
    WhatsappOrderId,
};

use super::{ValidationError, double_option, optional_text, required_text};

/// Maximum note length accepted from customers.
pub const MAX_NOTE_CHARS: usize = 1000;

/// A purchase request for a catalog item.
///
/// The catalog names and price are copied at submission time so the order
/// still reads correctly after the catalog changes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct WhatsappOrder {
    pub id: WhatsappOrderId,
    pub customer_name: String,
    pub phone: PhoneNumber,
    pub model_id: Option<ModelId>,
    pub color_id: Option<ColorId>,
    pub storage_id: Option<StorageId>,
    pub model_name: Option<String>,
    pub color_name: Option<String>,
    pub storage_name: Option<String>,
    pub price: Option<Price>,
    pub note: Option<String>,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
}

/// Customer-submitted order form.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WhatsappOrderInput {
    pub customer_name: String,
    pub phone: String,
    #[serde(default)]
    pub model_id: Option<ModelId>,
    #[serde(default)]
    pub color_id: Option<ColorId>,
    #[serde(default)]
    pub storage_id: Option<StorageId>,
    #[serde(default)]
    pub note: Option<String>,
}

/// A validated order ready to be stored, with catalog names resolved.
#[derive(Debug, Clone)]
pub struct NewWhatsappOrder {
    pub customer_name: String,
    pub phone: PhoneNumber,
    pub model_id: Option<ModelId>,
    pub color_id: Option<ColorId>,
    pub storage_id: Option<StorageId>,
    pub model_name: Option<String>,
    pub color_name: Option<String>,
    pub storage_name: Option<String>,
    pub price: Option<Price>,
    pub note: Option<String>,
}

impl WhatsappOrderInput {
    /// Validate the customer fields. Catalog names are filled in later.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` for a blank name, an invalid phone number or
    /// an overlong note.
    pub fn validated(self) -> Result<NewWhatsappOrder, ValidationError> {
        Ok(NewWhatsappOrder {
            customer_name: required_text("customerName", &self.customer_name)?,
            phone: parse_phone(&self.phone)?,
            model_id: self.model_id,
            color_id: self.color_id,
            storage_id: self.storage_id,
            model_name: None,
            color_name: None,
            storage_name: None,
            price: None,
            note: validate_note(self.note.as_deref())?,
        })
    }
}

/// A request to create or recover an Apple ID.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AppleIdOrder {
    pub id: AppleIdOrderId,
    pub customer_name: String,
    pub phone: PhoneNumber,
    pub email: Option<Email>,
    pub note: Option<String>,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
}

/// Customer-submitted Apple ID request form.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppleIdOrderInput {
    pub customer_name: String,
    pub phone: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub note: Option<String>,
}

/// A validated Apple ID request.
#[derive(Debug, Clone)]
pub struct NewAppleIdOrder {
    pub customer_name: String,
    pub phone: PhoneNumber,
    pub email: Option<Email>,
    pub note: Option<String>,
}

impl AppleIdOrderInput {
    /// Validate the request.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` for a blank name, invalid phone or email,
    /// or an overlong note.
    pub fn validated(self) -> Result<NewAppleIdOrder, ValidationError> {
        let email = optional_text(self.email.as_deref())
            .map(|e| Email::parse(&e))
            .transpose()
            .map_err(|e| ValidationError(format!("email: {e}")))?;

        Ok(NewAppleIdOrder {
            customer_name: required_text("customerName", &self.customer_name)?,
            phone: parse_phone(&self.phone)?,
            email,
            note: validate_note(self.note.as_deref())?,
        })
    }
}

/// Admin update of an order's follow-up state.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderPatch {
    pub status: Option<OrderStatus>,
    #[serde(default, deserialize_with = "double_option")]
    pub note: Option<Option<String>>,
}

impl OrderPatch {
    /// Resolve the patch against the current status and note.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if the new note is too long.
    pub fn apply(
        self,
        status: OrderStatus,
        note: Option<String>,
    ) -> Result<(OrderStatus, Option<String>), ValidationError> {
        let note = match self.note {
            Some(new_note) => validate_note(new_note.as_deref())?,
            None => note,
        };
        Ok((self.status.unwrap_or(status), note))
    }
}

/// Query parameters for admin order lists.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct OrderFilter {
    pub status: Option<OrderStatus>,
}

/// Response to a customer order submission.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderCreated<T> {
    pub order: T,
    /// `wa.me` link that opens a chat with the store, pre-filled with the order.
    pub whatsapp_url: String,
}

fn parse_phone(input: &str) -> Result<PhoneNumber, ValidationError> {
    PhoneNumber::parse(input).map_err(|e| ValidationError(format!("phone: {e}")))
}

fn validate_note(note: Option<&str>) -> Result<Option<String>, ValidationError> {
    let note = optional_text(note);
    if let Some(text) = &note
        && text.chars().count() > MAX_NOTE_CHARS
    {
        return Err(ValidationError(format!(
            "note must be at most {MAX_NOTE_CHARS} characters"
        )));
    }
    Ok(note)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_whatsapp_input_normalizes_phone() {
        let order = WhatsappOrderInput {
            customer_name: " سارا ".to_string(),
            phone: "۰۹۱۲ ۳۴۵ ۶۷۸۹".to_string(),
            model_id: None,
            color_id: None,
            storage_id: None,
            note: Some("   ".to_string()),
        }
        .validated()
        .unwrap();
        assert_eq!(order.customer_name, "سارا");
        assert_eq!(order.phone.as_str(), "09123456789");
        assert_eq!(order.note, None);
    }

    #[test]
    fn test_apple_id_rejects_bad_email() {
        let input = AppleIdOrderInput {
            customer_name: "Ali".to_string(),
            phone: "09121112233".to_string(),
            email: Some("not-an-email".to_string()),
            note: None,
        };
        assert!(input.validated().is_err());
    }

    #[test]
    fn test_patch_keeps_note_when_absent() {
        let patch: OrderPatch = serde_json::from_str(r#"{"status": "contacted"}"#).unwrap();
        let (status, note) = patch
            .apply(OrderStatus::New, Some("call after 5".to_string()))
            .unwrap();
        assert_eq!(status, OrderStatus::Contacted);
        assert_eq!(note.as_deref(), Some("call after 5"));

        let patch: OrderPatch = serde_json::from_str(r#"{"note": null}"#).unwrap();
        let (status, note) = patch.apply(OrderStatus::Completed, Some("x".to_string())).unwrap();
        assert_eq!(status, OrderStatus::Completed);
        assert_eq!(note, None);
    }

    #[test]
    fn test_note_length_limit() {
        let long = "ا".repeat(MAX_NOTE_CHARS + 1);
        assert!(validate_note(Some(&long)).is_err());
        assert!(validate_note(Some(&"ا".repeat(MAX_NOTE_CHARS))).is_ok());
    }
}
