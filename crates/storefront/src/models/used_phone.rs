//! Second-hand phone listings.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use sib_store_core::{PhoneNumber, Price, UsedPhoneId};

use super::{ValidationError, double_option, optional_text, required_text};

/// Maximum number of photos attached to a listing.
pub const MAX_IMAGES: usize = 10;

/// A used phone listing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UsedPhone {
    pub id: UsedPhoneId,
    pub model_name: String,
    pub storage: String,
    pub color: String,
    pub condition: String,
    /// Battery health percentage (0-100), when the seller reported it.
    pub battery_health: Option<i64>,
    pub price: Price,
    pub description: String,
    pub images: Vec<String>,
    pub seller_name: String,
    pub seller_phone: PhoneNumber,
    pub is_approved: bool,
    pub is_sold: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields for submitting or replacing a listing.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsedPhoneInput {
    pub model_name: String,
    pub storage: String,
    pub color: String,
    pub condition: String,
    #[serde(default)]
    pub battery_health: Option<i64>,
    pub price: i64,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub images: Vec<String>,
    pub seller_name: String,
    pub seller_phone: String,
    /// Only honoured for admins; public submissions always start unapproved.
    #[serde(default)]
    pub is_approved: Option<bool>,
    #[serde(default)]
    pub is_sold: bool,
}

impl UsedPhoneInput {
    /// Trim text, normalize the seller phone and check ranges.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` for blank required fields, a non-positive
    /// price, battery health outside 0-100, an invalid phone number, or
    /// image entries that are not http(s) URLs.
    pub fn validated(self) -> Result<Self, ValidationError> {
        Price::new(self.price).map_err(|e| ValidationError(e.to_string()))?;

        if let Some(health) = self.battery_health
            && !(0..=100).contains(&health)
        {
            return Err(ValidationError::new("batteryHealth must be between 0 and 100"));
        }

        if self.images.len() > MAX_IMAGES {
            return Err(ValidationError(format!(
                "at most {MAX_IMAGES} images are allowed"
            )));
        }
        let images = self
            .images
            .iter()
            .map(|image| validate_image_url(image))
            .collect::<Result<Vec<_>, _>>()?;

        let seller_phone = PhoneNumber::parse(&self.seller_phone)
            .map_err(|e| ValidationError(format!("sellerPhone: {e}")))?;

        Ok(Self {
            model_name: required_text("modelName", &self.model_name)?,
            storage: required_text("storage", &self.storage)?,
            color: required_text("color", &self.color)?,
            condition: required_text("condition", &self.condition)?,
            battery_health: self.battery_health,
            price: self.price,
            description: optional_text(Some(&self.description)).unwrap_or_default(),
            images,
            seller_name: required_text("sellerName", &self.seller_name)?,
            seller_phone: seller_phone.into_inner(),
            is_approved: self.is_approved,
            is_sold: self.is_sold,
        })
    }
}

fn validate_image_url(image: &str) -> Result<String, ValidationError> {
    let trimmed = image.trim();
    match url::Url::parse(trimmed) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => Ok(trimmed.to_owned()),
        _ => Err(ValidationError(format!("invalid image URL: {trimmed}"))),
    }
}

/// Partial listing update (admin).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsedPhonePatch {
    pub model_name: Option<String>,
    pub storage: Option<String>,
    pub color: Option<String>,
    pub condition: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub battery_health: Option<Option<i64>>,
    pub price: Option<i64>,
    pub description: Option<String>,
    pub images: Option<Vec<String>>,
    pub seller_name: Option<String>,
    pub seller_phone: Option<String>,
    pub is_approved: Option<bool>,
    pub is_sold: Option<bool>,
}

impl UsedPhonePatch {
    /// Merge onto an existing listing and validate the result.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if the merged listing is invalid.
    pub fn apply(self, existing: UsedPhone) -> Result<UsedPhoneInput, ValidationError> {
        UsedPhoneInput {
            model_name: self.model_name.unwrap_or(existing.model_name),
            storage: self.storage.unwrap_or(existing.storage),
            color: self.color.unwrap_or(existing.color),
            condition: self.condition.unwrap_or(existing.condition),
            battery_health: self.battery_health.unwrap_or(existing.battery_health),
            price: self.price.unwrap_or_else(|| existing.price.toman()),
            description: self.description.unwrap_or(existing.description),
            images: self.images.unwrap_or(existing.images),
            seller_name: self.seller_name.unwrap_or(existing.seller_name),
            seller_phone: self
                .seller_phone
                .unwrap_or_else(|| existing.seller_phone.into_inner()),
            is_approved: Some(self.is_approved.unwrap_or(existing.is_approved)),
            is_sold: self.is_sold.unwrap_or(existing.is_sold),
        }
        .validated()
    }
}

/// Query parameters for the listing endpoint.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsedPhoneFilter {
    /// Include unapproved and sold listings (admin only).
    #[serde(default)]
    pub all: bool,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn input() -> UsedPhoneInput {
        UsedPhoneInput {
            model_name: " iPhone 13 ".to_string(),
            storage: "128GB".to_string(),
            color: "Midnight".to_string(),
            condition: "در حد نو".to_string(),
            battery_health: Some(87),
            price: 32_000_000,
            description: String::new(),
            images: vec!["https://res.cloudinary.com/demo/image/upload/a.jpg".to_string()],
            seller_name: "Reza".to_string(),
            seller_phone: "+98 912 000 1122".to_string(),
            is_approved: None,
            is_sold: false,
        }
    }

    #[test]
    fn test_validated_normalizes() {
        let valid = input().validated().unwrap();
        assert_eq!(valid.model_name, "iPhone 13");
        assert_eq!(valid.seller_phone, "09120001122");
    }

    #[test]
    fn test_rejects_out_of_range_battery() {
        let bad = UsedPhoneInput {
            battery_health: Some(120),
            ..input()
        };
        assert!(bad.validated().is_err());
    }

    #[test]
    fn test_rejects_bad_images_and_phone() {
        let bad = UsedPhoneInput {
            images: vec!["javascript:alert(1)".to_string()],
            ..input()
        };
        assert!(bad.validated().is_err());

        let bad = UsedPhoneInput {
            seller_phone: "021 5555 1234".to_string(),
            ..input()
        };
        assert!(bad.validated().is_err());
    }
}
