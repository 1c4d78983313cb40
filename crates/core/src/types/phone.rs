//! Phone number type.
//!
//! Customers are identified by phone number, so every phone entering the
//! system is normalized to one canonical `+<digits>` (E.164) form before it
//! is used as a lookup key, cache key or SMS destination.

use core::fmt;

use serde::{Deserialize, Deserializer, Serialize};

/// Errors that can occur when parsing a [`Phone`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PhoneError {
    /// Nothing left after removing formatting characters.
    #[error("phone number cannot be empty")]
    Empty,
    /// A character that is neither a digit nor allowed formatting.
    #[error("phone number contains invalid character '{0}'")]
    InvalidCharacter(char),
    /// Too few or too many digits for an international number.
    #[error("phone number must have between {min} and {max} digits (got {len})")]
    InvalidLength {
        /// Digits found.
        len: usize,
        /// Minimum digits.
        min: usize,
        /// Maximum digits.
        max: usize,
    },
    /// A national number (leading `0`) with no default country code to apply.
    #[error("phone number must include a country code")]
    MissingCountryCode,
}

/// A normalized international phone number, always `+` followed by digits.
///
/// ```
/// use petal_core::Phone;
///
/// let a = Phone::parse("+966 (50) 123-4567").unwrap();
/// let b = Phone::parse("00966501234567").unwrap();
/// assert_eq!(a, b);
/// assert_eq!(a.as_str(), "+966501234567");
/// assert_eq!(a.digits(), "966501234567");
/// ```
#[derive(Debug, Clone, Serialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct Phone(String);

impl Phone {
    /// Minimum number of digits (country code included).
    pub const MIN_DIGITS: usize = 8;
    /// Maximum number of digits allowed by E.164.
    pub const MAX_DIGITS: usize = 15;

    /// Parse a phone number that carries its own country code.
    ///
    /// # Errors
    ///
    /// Returns a [`PhoneError`] when the input cannot be normalized.
    pub fn parse(input: &str) -> Result<Self, PhoneError> {
        Self::parse_with_country(input, None)
    }

    /// Parse a phone number, applying `default_country_code` to national
    /// numbers written with a single leading `0`.
    ///
    /// The country code may be given with or without a leading `+`.
    ///
    /// # Errors
    ///
    /// Returns a [`PhoneError`] when the input cannot be normalized.
    pub fn parse_with_country(
        input: &str,
        default_country_code: Option<&str>,
    ) -> Result<Self, PhoneError> {
        let mut has_plus = false;
        let mut digits = String::with_capacity(input.len());

        for (index, c) in input.trim().chars().enumerate() {
            match c {
                '0'..='9' => digits.push(c),
                '+' if index == 0 => has_plus = true,
                ' ' | '-' | '.' | '(' | ')' | '\t' => {}
                other => return Err(PhoneError::InvalidCharacter(other)),
            }
        }

        if digits.is_empty() {
            return Err(PhoneError::Empty);
        }

        let international = if has_plus {
            digits
        } else if let Some(rest) = digits.strip_prefix("00") {
            rest.to_owned()
        } else if let Some(national) = digits.strip_prefix('0') {
            let country = default_country_code
                .map(|cc| cc.trim().trim_start_matches('+'))
                .filter(|cc| !cc.is_empty() && cc.chars().all(|c| c.is_ascii_digit()))
                .ok_or(PhoneError::MissingCountryCode)?;
            format!("{country}{national}")
        } else {
            digits
        };

        if international.starts_with('0') {
            return Err(PhoneError::MissingCountryCode);
        }

        let len = international.len();
        if !(Self::MIN_DIGITS..=Self::MAX_DIGITS).contains(&len) {
            return Err(PhoneError::InvalidLength {
                len,
                min: Self::MIN_DIGITS,
                max: Self::MAX_DIGITS,
            });
        }

        Ok(Self(format!("+{international}")))
    }

    /// The normalized number including the leading `+`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The normalized number without the leading `+`.
    #[must_use]
    pub fn digits(&self) -> &str {
        self.0.trim_start_matches('+')
    }
}

impl fmt::Display for Phone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for Phone {
    type Err = PhoneError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl AsRef<str> for Phone {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl<'de> Deserialize<'de> for Phone {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for Phone {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <String as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for Phone {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        // Stored values were normalized on the way in
        let s = <String as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        Ok(Self(s))
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for Phone {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <String as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_formatting_variants_normalize_to_same_number() {
        let inputs = [
            "+966501234567",
            "+966 50 123 4567",
            "+966-50-123-4567",
            "+966 (50) 123.4567",
            "00966501234567",
            "966501234567",
            "  +966501234567  ",
        ];
        for input in inputs {
            assert_eq!(
                Phone::parse(input).unwrap().as_str(),
                "+966501234567",
                "input {input:?}"
            );
        }
    }

    #[test]
    fn test_national_number_uses_default_country() {
        let phone = Phone::parse_with_country("050 123 4567", Some("+966")).unwrap();
        assert_eq!(phone.as_str(), "+966501234567");

        let phone = Phone::parse_with_country("0501234567", Some("966")).unwrap();
        assert_eq!(phone.digits(), "966501234567");
    }

    #[test]
    fn test_national_number_without_default_country() {
        assert_eq!(
            Phone::parse("0501234567"),
            Err(PhoneError::MissingCountryCode)
        );
    }

    #[test]
    fn test_rejects_invalid_input() {
        assert_eq!(Phone::parse(""), Err(PhoneError::Empty));
        assert_eq!(Phone::parse(" - ( ) "), Err(PhoneError::Empty));
        assert_eq!(
            Phone::parse("+96650x234567"),
            Err(PhoneError::InvalidCharacter('x'))
        );
        assert_eq!(
            Phone::parse("96+6501234567"),
            Err(PhoneError::InvalidCharacter('+'))
        );
        assert!(matches!(
            Phone::parse("+12345"),
            Err(PhoneError::InvalidLength { len: 5, .. })
        ));
        assert!(matches!(
            Phone::parse("+1234567890123456"),
            Err(PhoneError::InvalidLength { len: 16, .. })
        ));
    }

    #[test]
    fn test_deserialize_normalizes() {
        let phone: Phone = serde_json::from_str("\"+1 (415) 555-0100\"").unwrap();
        assert_eq!(phone.as_str(), "+14155550100");
        assert_eq!(serde_json::to_string(&phone).unwrap(), "\"+14155550100\"");
    }
}
