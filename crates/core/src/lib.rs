//! Sib Store Core - Shared types library.
//!
//! This crate provides common types used across all Sib Store components:
//! - `storefront` - JSON API for the catalog, checkout handoff and admin panel
//! - `cli` - Command-line tools for migrations, seeding and price imports
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no database
//! access, no HTTP clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for IDs, prices, phone numbers, emails and statuses
//! - [`text`] - Persian/English text normalization used for name matching

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod text;
pub mod types;

pub use types::*;
