//! Business logic that spans repositories or talks to third parties.
//!
//! # Services
//!
//! - `auth` - Admin credential verification and password hashing
//! - `catalog` - Product-details resolution and the catalog read cache
//! - `chat` - Chat assistant with a Persian fallback
//! - `price_import` - Bulk CSV price import
//! - `whatsapp` - `wa.me` checkout handoff links

pub mod auth;
pub mod catalog;
pub mod chat;
pub mod price_import;
pub mod whatsapp;
