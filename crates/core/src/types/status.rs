//! Status enums for customer requests.

use serde::{Deserialize, Serialize};

/// Lifecycle of a WhatsApp or Apple ID order request.
///
/// Orders are handed off to WhatsApp, so the status only tracks how far the
/// shop has followed up on the conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "sqlite", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlite", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Submitted by the customer, nobody has replied yet.
    #[default]
    New,
    /// The shop has reached out on WhatsApp.
    Contacted,
    /// The sale went through.
    Completed,
    /// The customer or the shop called it off.
    Cancelled,
}

impl OrderStatus {
    /// Persian label for admin screens and WhatsApp messages.
    #[must_use]
    pub const fn label_fa(&self) -> &'static str {
        match self {
            Self::New => "جدید",
            Self::Contacted => "تماس گرفته شد",
            Self::Completed => "تکمیل شده",
            Self::Cancelled => "لغو شده",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::New => write!(f, "new"),
            Self::Contacted => write!(f, "contacted"),
            Self::Completed => write!(f, "completed"),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "new" => Ok(Self::New),
            "contacted" => Ok(Self::Contacted),
            "completed" => Ok(Self::Completed),
            "cancelled" => Ok(Self::Cancelled),
            _ => Err(format!("invalid order status: {s}")),
        }
    }
}
