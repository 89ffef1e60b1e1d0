//! Prices in Iranian toman.
//!
//! The store prices everything in whole toman, so a price is a positive
//! integer rather than a decimal amount with a currency code.

use core::fmt;

use serde::{Deserialize, Serialize};

use crate::text::{to_ascii_digits, to_persian_digits};

/// Errors that can occur when constructing a [`Price`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PriceError {
    /// The input is empty after stripping separators and units.
    #[error("price is empty")]
    Empty,
    /// The input contains characters other than digits and separators.
    #[error("price is not a number: {0}")]
    NotANumber(String),
    /// Zero or negative amount.
    #[error("price must be greater than zero")]
    NotPositive,
}

/// A price in whole toman.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct Price(i64);

impl Price {
    /// Create a price, rejecting zero and negative amounts.
    ///
    /// # Errors
    ///
    /// Returns `PriceError::NotPositive` if `toman <= 0`.
    pub const fn new(toman: i64) -> Result<Self, PriceError> {
        if toman <= 0 {
            return Err(PriceError::NotPositive);
        }
        Ok(Self(toman))
    }

    /// Parse a price typed by a human or exported from a spreadsheet.
    ///
    /// Accepts Persian digits, `,`/`٬`/`،` thousands separators, spaces, and a
    /// trailing `تومان` or `toman` unit.
    ///
    /// ```
    /// use sib_store_core::Price;
    ///
    /// assert_eq!(Price::parse("۵۹,۹۰۰,۰۰۰ تومان").unwrap().toman(), 59_900_000);
    /// assert!(Price::parse("call us").is_err());
    /// ```
    ///
    /// # Errors
    ///
    /// Returns an error if nothing numeric remains or the amount is not positive.
    pub fn parse(input: &str) -> Result<Self, PriceError> {
        let ascii = to_ascii_digits(input).to_lowercase();
        let without_unit = ascii
            .trim()
            .trim_end_matches("تومان")
            .trim_end_matches("toman")
            .trim();

        let digits: String = without_unit
            .chars()
            .filter(|c| !matches!(c, ',' | '٬' | '،' | '_' | '\'') && !c.is_whitespace())
            .collect();

        if digits.is_empty() {
            return Err(PriceError::Empty);
        }

        // Spreadsheet exports sometimes render integers as "59900000.00".
        let integral = match digits.split_once('.') {
            Some((whole, fraction)) if fraction.chars().all(|c| c == '0') => whole,
            _ => digits.as_str(),
        };

        let toman = integral
            .parse::<i64>()
            .map_err(|_| PriceError::NotANumber(input.trim().to_owned()))?;

        Self::new(toman)
    }

    /// The amount in toman.
    #[must_use]
    pub const fn toman(self) -> i64 {
        self.0
    }

    /// Format with thousands separators and Persian digits, e.g. `۵۹٬۹۰۰٬۰۰۰ تومان`.
    #[must_use]
    pub fn display_fa(self) -> String {
        format!("{} تومان", to_persian_digits(&group_thousands(self.0, '٬')))
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} toman", group_thousands(self.0, ','))
    }
}

impl TryFrom<i64> for Price {
    type Error = PriceError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Price> for i64 {
    fn from(price: Price) -> Self {
        price.0
    }
}

fn group_thousands(value: i64, separator: char) -> String {
    let digits = value.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(separator);
        }
        grouped.push(c);
    }
    if value < 0 {
        grouped.insert(0, '-');
    }
    grouped
}
