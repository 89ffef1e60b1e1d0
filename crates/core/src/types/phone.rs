//! Iranian mobile phone number type.

use core::fmt;

use serde::{Deserialize, Serialize};

use crate::text::to_ascii_digits;

/// Errors that can occur when parsing a [`PhoneNumber`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PhoneError {
    /// The input string is empty.
    #[error("phone number cannot be empty")]
    Empty,
    /// The input contains characters other than digits, `+`, spaces and dashes.
    #[error("phone number contains invalid characters")]
    InvalidCharacters,
    /// The number is not an Iranian mobile number (`09xxxxxxxxx`).
    #[error("phone number must be an Iranian mobile number like 09121234567")]
    NotMobile,
}

/// An Iranian mobile phone number, stored in national format (`09xxxxxxxxx`).
///
/// ## Accepted input
///
/// - `09121234567`, `9121234567`
/// - `+989121234567`, `00989121234567`, `989121234567`
/// - Persian or Arabic-Indic digits, spaces, dashes and parentheses
///
/// ```
/// use sib_store_core::PhoneNumber;
///
/// let phone = PhoneNumber::parse("+98 912 123 4567").unwrap();
/// assert_eq!(phone.as_str(), "09121234567");
/// assert_eq!(phone.international(), "989121234567");
///
/// assert!(PhoneNumber::parse("۰۹۱۲۱۲۳۴۵۶۷").is_ok());
/// assert!(PhoneNumber::parse("02112345678").is_err()); // landline
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(try_from = "String", into = "String")]
pub struct PhoneNumber(String);

impl PhoneNumber {
    /// Parse and normalize a phone number.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is empty, has invalid characters, or is
    /// not a ten-digit mobile number starting with 9 after the country prefix.
    pub fn parse(input: &str) -> Result<Self, PhoneError> {
        let ascii = to_ascii_digits(input.trim());
        if ascii.is_empty() {
            return Err(PhoneError::Empty);
        }

        if !ascii
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '+' | ' ' | '-' | '(' | ')'))
        {
            return Err(PhoneError::InvalidCharacters);
        }

        let digits: String = ascii.chars().filter(char::is_ascii_digit).collect();

        let subscriber = digits
            .strip_prefix("0098")
            .or_else(|| digits.strip_prefix("98").filter(|rest| rest.len() == 10))
            .or_else(|| digits.strip_prefix('0'))
            .unwrap_or(&digits);

        if subscriber.len() != 10 || !subscriber.starts_with('9') {
            return Err(PhoneError::NotMobile);
        }

        Ok(Self(format!("0{subscriber}")))
    }

    /// Returns the number in national format (`09xxxxxxxxx`).
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the number in international format without `+` (`989xxxxxxxxx`),
    /// as expected by `wa.me` links.
    #[must_use]
    pub fn international(&self) -> String {
        format!("98{}", self.0.trim_start_matches('0'))
    }

    /// Consumes the `PhoneNumber` and returns its inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for PhoneNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for PhoneNumber {
    type Err = PhoneError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for PhoneNumber {
    type Error = PhoneError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<PhoneNumber> for String {
    fn from(phone: PhoneNumber) -> Self {
        phone.0
    }
}

impl AsRef<str> for PhoneNumber {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_national() {
        assert_eq!(
            PhoneNumber::parse("09121234567").unwrap().as_str(),
            "09121234567"
        );
        assert_eq!(
            PhoneNumber::parse("9121234567").unwrap().as_str(),
            "09121234567"
        );
    }

    #[test]
    fn test_parse_international_prefixes() {
        for input in ["+989121234567", "00989121234567", "989121234567"] {
            assert_eq!(PhoneNumber::parse(input).unwrap().as_str(), "09121234567");
        }
    }

    #[test]
    fn test_parse_persian_digits_and_separators() {
        let phone = PhoneNumber::parse("۰۹۱۲-۱۲۳ ۴۵۶۷").unwrap();
        assert_eq!(phone.as_str(), "09121234567");
    }

    #[test]
    fn test_parse_rejects() {
        assert_eq!(PhoneNumber::parse(""), Err(PhoneError::Empty));
        assert_eq!(
            PhoneNumber::parse("0912abc4567"),
            Err(PhoneError::InvalidCharacters)
        );
        assert_eq!(PhoneNumber::parse("02188776655"), Err(PhoneError::NotMobile));
        assert_eq!(PhoneNumber::parse("0912123"), Err(PhoneError::NotMobile));
    }

    #[test]
    fn test_international() {
        let phone = PhoneNumber::parse("09351112233").unwrap();
        assert_eq!(phone.international(), "989351112233");
    }

    #[test]
    fn test_serde_validates() {
        let phone: PhoneNumber = serde_json::from_str("\"+98 935 111 2233\"").unwrap();
        assert_eq!(serde_json::to_string(&phone).unwrap(), "\"09351112233\"");
        assert!(serde_json::from_str::<PhoneNumber>("\"12345\"").is_err());
    }
}
