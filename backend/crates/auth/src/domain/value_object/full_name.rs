//! Full Name Value Object
//!
//! 表示用の氏名。自由記述だが、前後の空白を除去し長さを制限する。

use std::fmt;
use thiserror::Error;

/// Maximum length for full name (in characters)
pub const FULL_NAME_MAX_LENGTH: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FullNameError {
    #[error("Full name cannot be empty")]
    Empty,

    #[error("Full name must be at most 100 characters")]
    TooLong,

    #[error("Full name contains invalid control characters")]
    InvalidCharacter,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FullName(String);

impl FullName {
    pub fn new(input: impl AsRef<str>) -> Result<Self, FullNameError> {
        let value = input.as_ref().trim();

        if value.is_empty() {
            return Err(FullNameError::Empty);
        }
        if value.chars().count() > FULL_NAME_MAX_LENGTH {
            return Err(FullNameError::TooLong);
        }
        if value.chars().any(char::is_control) {
            return Err(FullNameError::InvalidCharacter);
        }

        Ok(Self(value.to_string()))
    }

    /// Create from database value (assumed already validated)
    pub fn from_db(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FullName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
