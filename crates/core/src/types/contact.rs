//! Contact details submitted through lead and order forms.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing an [`Email`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum EmailError {
    /// The input string is empty.
    #[error("email cannot be empty")]
    Empty,
    /// The input string is too long.
    #[error("email must be at most {max} characters")]
    TooLong {
        /// Maximum allowed length.
        max: usize,
    },
    /// The input does not contain exactly one @ symbol.
    #[error("email must contain a single @ symbol")]
    MissingAtSymbol,
    /// The local part (before @) is empty.
    #[error("email local part cannot be empty")]
    EmptyLocalPart,
    /// The domain has no dot or an empty label.
    #[error("email domain is invalid")]
    InvalidDomain,
}

/// A trimmed, lowercased email address.
///
/// ```
/// use promtech_core::Email;
///
/// assert_eq!(Email::parse(" Sales@Example.RU ").unwrap().as_str(), "sales@example.ru");
/// assert!(Email::parse("no-at-symbol").is_err());
/// assert!(Email::parse("user@localhost").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct Email(String);

impl Email {
    /// Maximum length of an email address (RFC 5321).
    pub const MAX_LENGTH: usize = 254;

    /// Parse an `Email` from user input.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is empty, too long, lacks a single `@`,
    /// has an empty local part, or has a domain without a dot.
    pub fn parse(s: &str) -> Result<Self, EmailError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(EmailError::Empty);
        }

        if s.len() > Self::MAX_LENGTH {
            return Err(EmailError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }

        let mut parts = s.split('@');
        let (Some(local), Some(domain), None) = (parts.next(), parts.next(), parts.next()) else {
            return Err(EmailError::MissingAtSymbol);
        };

        if local.is_empty() {
            return Err(EmailError::EmptyLocalPart);
        }

        if !domain.contains('.') || domain.split('.').any(str::is_empty) {
            return Err(EmailError::InvalidDomain);
        }

        Ok(Self(s.to_lowercase()))
    }

    /// Returns the email address as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Errors that can occur when parsing a [`Phone`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PhoneError {
    /// The input has no digits at all.
    #[error("phone number cannot be empty")]
    Empty,
    /// The input contains characters other than digits and separators.
    #[error("phone number contains invalid character '{0}'")]
    InvalidCharacter(char),
    /// The digit count is outside the accepted range.
    #[error("phone number must have between {min} and {max} digits")]
    InvalidLength {
        /// Minimum digit count.
        min: usize,
        /// Maximum digit count.
        max: usize,
    },
}

/// A phone number normalised to `+<digits>`.
///
/// Russian numbers written as `8 (XXX) ...` or with ten digits are normalised
/// to the `+7` prefix.
///
/// ```
/// use promtech_core::Phone;
///
/// assert_eq!(Phone::parse("8 (912) 345-67-89").unwrap().as_str(), "+79123456789");
/// assert_eq!(Phone::parse("912 345 67 89").unwrap().as_str(), "+79123456789");
/// assert!(Phone::parse("call me").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct Phone(String);

impl Phone {
    const MIN_DIGITS: usize = 10;
    const MAX_DIGITS: usize = 15;

    /// Parse a `Phone` from user input.
    ///
    /// Spaces, dashes, dots and parentheses are ignored; a leading `+` is
    /// allowed.
    ///
    /// # Errors
    ///
    /// Returns an error on foreign characters or an implausible digit count.
    pub fn parse(s: &str) -> Result<Self, PhoneError> {
        let mut digits = String::with_capacity(s.len());
        for (i, c) in s.trim().chars().enumerate() {
            match c {
                '0'..='9' => digits.push(c),
                ' ' | '-' | '(' | ')' | '.' => {}
                '+' if i == 0 => {}
                other => return Err(PhoneError::InvalidCharacter(other)),
            }
        }

        if digits.is_empty() {
            return Err(PhoneError::Empty);
        }

        let normalized = match (digits.len(), digits.strip_prefix('8')) {
            (10, _) => format!("7{digits}"),
            (11, Some(rest)) => format!("7{rest}"),
            _ => digits,
        };

        if !(Self::MIN_DIGITS..=Self::MAX_DIGITS).contains(&normalized.len()) {
            return Err(PhoneError::InvalidLength {
                min: Self::MIN_DIGITS,
                max: Self::MAX_DIGITS,
            });
        }

        Ok(Self(format!("+{normalized}")))
    }

    /// Returns the normalised number as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Phone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_email_rejects_malformed() {
        assert_eq!(Email::parse("   "), Err(EmailError::Empty));
        assert_eq!(Email::parse("a@b@c.ru"), Err(EmailError::MissingAtSymbol));
        assert_eq!(Email::parse("@mail.ru"), Err(EmailError::EmptyLocalPart));
        assert_eq!(Email::parse("user@mail."), Err(EmailError::InvalidDomain));
        assert_eq!(
            Email::parse(&format!("{}@mail.ru", "a".repeat(260))),
            Err(EmailError::TooLong { max: 254 })
        );
    }

    #[test]
    fn test_phone_normalizes_russian_formats() {
        for input in ["+7 912 345-67-89", "8(912)3456789", "79123456789"] {
            assert_eq!(Phone::parse(input).unwrap().as_str(), "+79123456789");
        }
    }

    #[test]
    fn test_phone_keeps_international_numbers() {
        assert_eq!(
            Phone::parse("+49 30 123456789").unwrap().as_str(),
            "+4930123456789"
        );
    }

    #[test]
    fn test_phone_rejects_garbage() {
        assert_eq!(Phone::parse(""), Err(PhoneError::Empty));
        assert_eq!(Phone::parse("12-34"), Err(PhoneError::InvalidLength { min: 10, max: 15 }));
        assert_eq!(Phone::parse("+7 912 abc"), Err(PhoneError::InvalidCharacter('a')));
        assert_eq!(Phone::parse("7+9123456789"), Err(PhoneError::InvalidCharacter('+')));
    }
}
