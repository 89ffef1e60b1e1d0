//! Persian/English text normalization.
//!
//! Names arrive from admins, spreadsheets and URLs in many shapes: Arabic
//! keyboard letter forms, Persian or Arabic-Indic digits, zero-width
//! non-joiners, stray casing. [`normalize`] folds all of these into one
//! comparable form so that lookups can stay exact.

/// Zero-width non-joiner, used inside Persian compound words.
const ZWNJ: char = '\u{200c}';

/// Convert Persian (`۰-۹`) and Arabic-Indic (`٠-٩`) digits to ASCII.
#[must_use]
pub fn to_ascii_digits(input: &str) -> String {
    input.chars().map(ascii_digit).collect()
}

/// Convert ASCII digits to Persian digits for display.
#[must_use]
pub fn to_persian_digits(input: &str) -> String {
    input
        .chars()
        .map(|c| match c.to_digit(10) {
            Some(d) => char::from_u32('۰' as u32 + d).unwrap_or(c),
            None => c,
        })
        .collect()
}

fn ascii_digit(c: char) -> char {
    let offset = match c {
        '۰'..='۹' => c as u32 - '۰' as u32,
        '٠'..='٩' => c as u32 - '٠' as u32,
        _ => return c,
    };
    char::from_digit(offset, 10).unwrap_or(c)
}

/// Normalize a name for case-insensitive exact comparison.
///
/// - trims and lowercases,
/// - maps Arabic `ي`/`ى`/`ك`/`ة` to their Persian forms,
/// - replaces ZWNJ, tabs and other whitespace with a single space,
/// - converts Persian/Arabic-Indic digits to ASCII.
///
/// ```
/// use sib_store_core::text::normalize;
///
/// assert_eq!(normalize("  iPhone 16  Pro "), "iphone 16 pro");
/// assert_eq!(normalize("نقره\u{200c}اي"), "نقره ای");
/// assert_eq!(normalize("۲۵۶ گیگ"), "256 گیگ");
/// ```
#[must_use]
pub fn normalize(input: &str) -> String {
    let mapped: String = input
        .chars()
        .map(|c| match c {
            'ي' | 'ى' => 'ی',
            'ك' => 'ک',
            'ة' => 'ه',
            ZWNJ => ' ',
            other => ascii_digit(other),
        })
        .flat_map(char::to_lowercase)
        .collect();

    mapped.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Normalize and remove every space, for keys where spacing is irrelevant
/// (`"256 GB"` and `"256gb"` compare equal).
#[must_use]
pub fn compact(input: &str) -> String {
    normalize(input).replace(' ', "")
}
