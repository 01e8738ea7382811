//! Phone number type used for code-based sign in.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`PhoneNumber`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PhoneError {
    /// The input string is empty.
    #[error("phone number cannot be empty")]
    Empty,
    /// The input contains something other than digits and separators.
    #[error("phone number contains invalid character '{0}'")]
    InvalidCharacter(char),
    /// Too few or too many digits.
    #[error("phone number must have between {min} and {max} digits (got {got})")]
    InvalidLength {
        /// Minimum allowed digit count.
        min: usize,
        /// Maximum allowed digit count.
        max: usize,
        /// Digit count of the input.
        got: usize,
    },
}

/// A normalized phone number.
///
/// Separators (spaces, dashes, dots and parentheses) are stripped on parse. A
/// single leading `+` is kept. What remains must be 7 to 15 digits, the
/// E.164 upper bound.
///
/// ## Examples
///
/// ```
/// use nightcap_core::PhoneNumber;
///
/// let phone = PhoneNumber::parse("+972 (54) 123-4567").unwrap();
/// assert_eq!(phone.as_str(), "+972541234567");
///
/// assert!(PhoneNumber::parse("").is_err());
/// assert!(PhoneNumber::parse("12-34").is_err());
/// assert!(PhoneNumber::parse("054-CALL-NOW").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(try_from = "String", into = "String")]
pub struct PhoneNumber(String);

impl PhoneNumber {
    /// Minimum number of digits.
    pub const MIN_DIGITS: usize = 7;
    /// Maximum number of digits (E.164).
    pub const MAX_DIGITS: usize = 15;

    /// Parse and normalize a `PhoneNumber`.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is empty, contains characters other than
    /// digits, separators and a leading `+`, or has the wrong number of digits.
    pub fn parse(s: &str) -> Result<Self, PhoneError> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(PhoneError::Empty);
        }

        let (plus, rest) = trimmed
            .strip_prefix('+')
            .map_or((false, trimmed), |rest| (true, rest));

        let mut digits = String::with_capacity(rest.len() + 1);
        if plus {
            digits.push('+');
        }

        for c in rest.chars() {
            match c {
                '0'..='9' => digits.push(c),
                ' ' | '-' | '.' | '(' | ')' => {}
                other => return Err(PhoneError::InvalidCharacter(other)),
            }
        }

        let count = digits.len() - usize::from(plus);
        if !(Self::MIN_DIGITS..=Self::MAX_DIGITS).contains(&count) {
            return Err(PhoneError::InvalidLength {
                min: Self::MIN_DIGITS,
                max: Self::MAX_DIGITS,
                got: count,
            });
        }

        Ok(Self(digits))
    }

    /// Returns the normalized number as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Number with all but the last four digits masked, for logs.
    #[must_use]
    pub fn masked(&self) -> String {
        let visible = self.0.len().saturating_sub(4);
        self.0
            .chars()
            .enumerate()
            .map(|(i, c)| if i < visible && c != '+' { '*' } else { c })
            .collect()
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
    fn test_parse_strips_separators() {
        let phone = PhoneNumber::parse("054-123 45.67").unwrap();
        assert_eq!(phone.as_str(), "0541234567");
    }

    #[test]
    fn test_parse_keeps_leading_plus() {
        let phone = PhoneNumber::parse(" +1 (555) 010-9999 ").unwrap();
        assert_eq!(phone.as_str(), "+15550109999");
    }

    #[test]
    fn test_parse_empty() {
        assert_eq!(PhoneNumber::parse("   "), Err(PhoneError::Empty));
    }

    #[test]
    fn test_parse_invalid_character() {
        assert_eq!(
            PhoneNumber::parse("054x1234567"),
            Err(PhoneError::InvalidCharacter('x'))
        );
        // A plus sign is only allowed in front
        assert_eq!(
            PhoneNumber::parse("054+1234567"),
            Err(PhoneError::InvalidCharacter('+'))
        );
    }

    #[test]
    fn test_parse_length_bounds() {
        assert!(matches!(
            PhoneNumber::parse("123456"),
            Err(PhoneError::InvalidLength { got: 6, .. })
        ));
        assert!(PhoneNumber::parse("1234567").is_ok());
        assert!(PhoneNumber::parse("123456789012345").is_ok());
        assert!(matches!(
            PhoneNumber::parse("1234567890123456"),
            Err(PhoneError::InvalidLength { got: 16, .. })
        ));
    }

    #[test]
    fn test_masked() {
        let phone = PhoneNumber::parse("+972541234567").unwrap();
        assert_eq!(phone.masked(), "+********4567");
    }

    #[test]
    fn test_deserialize_validates() {
        let ok: PhoneNumber = serde_json::from_str("\"050 765 4321\"").unwrap();
        assert_eq!(ok.as_str(), "0507654321");
        assert!(serde_json::from_str::<PhoneNumber>("\"call me\"").is_err());
    }
}
