//! Alias dictionaries for matching spreadsheet cells to catalog entries.
//!
//! Each function maps a cell to a canonical key. Catalog names are run
//! through the same function when the lookup tables are built, so a cell
//! matches when both sides reduce to the same key. There is no fuzzy or
//! partial matching.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::{Captures, Regex};

use sib_store_core::text::normalize;

/// English color names and the canonical Persian name the catalog uses.
const COLOR_ALIASES: &[(&str, &str)] = &[
    ("black", "مشکی"),
    ("black titanium", "مشکی"),
    ("jet black", "مشکی"),
    ("space black", "مشکی"),
    ("midnight", "نیمه شب"),
    ("white", "سفید"),
    ("white titanium", "سفید"),
    ("starlight", "استارلایت"),
    ("silver", "نقره ای"),
    ("gray", "خاکستری"),
    ("grey", "خاکستری"),
    ("space gray", "خاکستری"),
    ("space grey", "خاکستری"),
    ("gold", "طلایی"),
    ("rose gold", "رزگلد"),
    ("desert", "صحرایی"),
    ("desert titanium", "صحرایی"),
    ("natural", "طبیعی"),
    ("natural titanium", "طبیعی"),
    ("blue", "آبی"),
    ("blue titanium", "آبی"),
    ("deep blue", "آبی تیره"),
    ("sky blue", "آبی آسمانی"),
    ("mist blue", "آبی مه آلود"),
    ("ultramarine", "لاجوردی"),
    ("teal", "سبز آبی"),
    ("green", "سبز"),
    ("sage", "مریمی"),
    ("pink", "صورتی"),
    ("red", "قرمز"),
    ("product red", "قرمز"),
    ("yellow", "زرد"),
    ("orange", "نارنجی"),
    ("cosmic orange", "نارنجی"),
    ("purple", "بنفش"),
    ("lavender", "اسطوخودوسی"),
];

/// Persian model tokens and their English counterparts.
const MODEL_TOKENS: &[(&str, &str)] = &[
    ("آیفون", "iphone"),
    ("ایفون", "iphone"),
    ("آیپد", "ipad"),
    ("ایپد", "ipad"),
    ("آی", "i"),
    ("فون", "phone"),
    ("پد", "pad"),
    ("مک", "mac"),
    ("بوک", "book"),
    ("مکبوک", "macbook"),
    ("ایمک", "imac"),
    ("آیمک", "imac"),
    ("اپل", "apple"),
    ("واچ", "watch"),
    ("ایرپاد", "airpods"),
    ("ایرپادز", "airpods"),
    ("ایرپادس", "airpods"),
    ("airpod", "airpods"),
    ("پرو", "pro"),
    ("مکس", "max"),
    ("پرومکس", "promax"),
    ("پلاس", "plus"),
    ("مینی", "mini"),
    ("ایر", "air"),
    ("الترا", "ultra"),
    ("اولترا", "ultra"),
    ("سری", "series"),
    ("اس", "s"),
    ("ای", "e"),
];

/// Connectivity variants, applied before spaces are removed.
const CONNECTIVITY: &[(&str, &str)] = &[
    ("wi fi", "wifi"),
    ("وای فای", "wifi"),
    ("وایفای", "wifi"),
    ("سلولار", "cellular"),
    ("سیم کارت خور", "cellular"),
    ("سیمکارت خور", "cellular"),
    ("lte", "cellular"),
];

static COLORS: LazyLock<HashMap<&'static str, &'static str>> =
    LazyLock::new(|| COLOR_ALIASES.iter().copied().collect());

static MODELS: LazyLock<HashMap<&'static str, &'static str>> =
    LazyLock::new(|| MODEL_TOKENS.iter().copied().collect());

#[allow(clippy::expect_used)]
static CAPACITY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(\d+)(ترابایت|ترا|terabytes|terabyte|tb|گیگابایت|گیگ|gigabytes|gigabyte|gig|gb)",
    )
    .expect("capacity pattern is valid")
});

/// Canonical key for a color cell: the Persian name when the English alias
/// is known, otherwise the normalized text.
///
/// ```
/// use sib_store_storefront::services::price_import::color_key;
///
/// assert_eq!(color_key("White"), "سفید");
/// assert_eq!(color_key("Desert Titanium"), "صحرایی");
/// assert_eq!(color_key("سفید"), "سفید");
/// ```
#[must_use]
pub fn color_key(input: &str) -> String {
    let key = normalize(input);
    match COLORS.get(key.as_str()) {
        Some(persian) => normalize(persian),
        None => key,
    }
}

/// Canonical key for a model name: Persian tokens translated to English,
/// hyphens read as spaces, spaces removed.
///
/// ```
/// use sib_store_storefront::services::price_import::model_key;
///
/// assert_eq!(model_key("آیفون ۱۶ پرو مکس"), "iphone16promax");
/// assert_eq!(model_key("iPhone-16 Pro Max"), "iphone16promax");
/// ```
#[must_use]
pub fn model_key(input: &str) -> String {
    normalize(&input.replace(['-', '_'], " "))
        .split(' ')
        .map(|token| MODELS.get(token).copied().unwrap_or(token))
        .collect()
}

/// Canonical key for a storage cell: capacities become `<n>gb`/`<n>tb`,
/// connectivity words become `wifi`/`cellular`, spaces are removed.
///
/// ```
/// use sib_store_storefront::services::price_import::storage_key;
///
/// assert_eq!(storage_key("256 گیگ"), "256gb");
/// assert_eq!(storage_key("256GB"), "256gb");
/// assert_eq!(storage_key("۱ ترابایت"), "1tb");
/// ```
#[must_use]
pub fn storage_key(input: &str) -> String {
    let mut key = normalize(&input.replace('-', " "));
    for (alias, canonical) in CONNECTIVITY {
        key = key.replace(alias, canonical);
    }
    let key = key.replace(' ', "");

    CAPACITY
        .replace_all(&key, |caps: &Captures<'_>| {
            let amount = caps.get(1).map_or("", |m| m.as_str());
            let unit = caps.get(2).map_or("", |m| m.as_str());
            if unit.starts_with('t') || unit.starts_with('ت') {
                format!("{amount}tb")
            } else {
                format!("{amount}gb")
            }
        })
        .into_owned()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_color_aliases() {
        assert_eq!(color_key("  BLACK "), "مشکی");
        assert_eq!(color_key("Silver"), "نقره ای");
        assert_eq!(color_key("نقره\u{200c}اي"), "نقره ای");
        assert_eq!(color_key("Midnight Green"), "midnight green");
    }

    #[test]
    fn test_model_tokens() {
        assert_eq!(model_key("آی فون 15"), "iphone15");
        assert_eq!(model_key("مک بوک ایر M3"), "macbookairm3");
        assert_eq!(model_key("اپل واچ سری ۱۰"), "applewatchseries10");
        assert_eq!(model_key("iPad Pro"), model_key("آیپد پرو"));
    }

    #[test]
    fn test_storage_variants() {
        assert_eq!(storage_key("128 گیگابایت"), "128gb");
        assert_eq!(storage_key("1TB"), "1tb");
        assert_eq!(storage_key("256GB Wi-Fi"), "256gbwifi");
        assert_eq!(storage_key("۲۵۶ گیگ وای‌فای"), "256gbwifi");
        assert_eq!(storage_key("16GB/512GB"), "16gb/512gb");
        assert_eq!(storage_key("512 گیگ سلولار"), "512gbcellular");
    }
}
