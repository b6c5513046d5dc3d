//! User Name Value Object
//!
//! ユーザー名は、ユーザーを識別するための**公開ハンドル**。
//! 画面表示とメンション、重複チェックに使用される。
//!
//! ## 設計方針
//! - NFKC正規化 → 前後の空白除去 → 小文字化 の順で処理
//! - 正規形（小文字）のみを保存し、一意性もこれで判定する
//!
//! ## 不変条件
//! - 長さ: 3〜20文字（正規化後、コードポイント数）
//! - 空白・制御文字を含まない

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use unicode_normalization::UnicodeNormalization;

// ============================================================================
// Constants
// ============================================================================

/// Minimum length for user name (in characters)
pub const USER_NAME_MIN_LENGTH: usize = 3;

/// Maximum length for user name (in characters)
pub const USER_NAME_MAX_LENGTH: usize = 20;

// ============================================================================
// Error Types
// ============================================================================

/// Error returned when user name validation fails
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UserNameError {
    #[error("Username cannot be empty")]
    Empty,

    #[error("Username must be between 3 and 20 characters (got {length})")]
    InvalidLength { length: usize },

    #[error("Username cannot contain whitespace")]
    ContainsWhitespace,

    #[error("Username contains invalid control characters")]
    InvalidCharacter,
}

// ============================================================================
// UserName Value Object
// ============================================================================

/// Validated, normalized (lowercase) user name
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UserName(String);

impl UserName {
    /// Create a new UserName from raw input
    pub fn new(input: impl AsRef<str>) -> Result<Self, UserNameError> {
        let canonical = Self::normalize(input.as_ref());
        Self::validate(&canonical)?;
        Ok(Self(canonical))
    }

    /// Create from database value (assumed already validated)
    pub fn from_db(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[inline]
    pub fn into_inner(self) -> String {
        self.0
    }

    fn normalize(input: &str) -> String {
        input.nfkc().collect::<String>().trim().to_lowercase()
    }

    fn validate(canonical: &str) -> Result<(), UserNameError> {
        if canonical.is_empty() {
            return Err(UserNameError::Empty);
        }

        let length = canonical.chars().count();
        if !(USER_NAME_MIN_LENGTH..=USER_NAME_MAX_LENGTH).contains(&length) {
            return Err(UserNameError::InvalidLength { length });
        }

        if canonical.chars().any(char::is_whitespace) {
            return Err(UserNameError::ContainsWhitespace);
        }

        if canonical.chars().any(char::is_control) {
            return Err(UserNameError::InvalidCharacter);
        }

        Ok(())
    }
}

impl fmt::Debug for UserName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("UserName").field(&self.0).finish()
    }
}

impl fmt::Display for UserName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for UserName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for UserName {
    type Error = UserNameError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<UserName> for String {
    fn from(name: UserName) -> Self {
        name.0
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    mod normalization {
        use super::*;

        #[test]
        fn test_trim_and_lowercase() {
            let name = UserName::new("  AlIcE_123  ").unwrap();
            assert_eq!(name.as_str(), "alice_123");
        }

        #[test]
        fn test_nfkc_normalization() {
            // Full-width 'Ａ' (U+FF21) normalizes to ASCII, then lowercases
            let name = UserName::new("Ａlice").unwrap();
            assert_eq!(name.as_str(), "alice");
        }

        #[test]
        fn test_idempotent() {
            let first = UserName::new("  AlIcE  ").unwrap();
            let second = UserName::new(first.as_str()).unwrap();
            assert_eq!(first, second);
        }
    }

    mod length_validation {
        use super::*;

        #[test]
        fn test_empty_fails() {
            assert_eq!(UserName::new(""), Err(UserNameError::Empty));
            assert_eq!(UserName::new("   "), Err(UserNameError::Empty));
        }

        #[test]
        fn test_bounds() {
            assert_eq!(
                UserName::new("ab"),
                Err(UserNameError::InvalidLength { length: 2 })
            );
            assert!(UserName::new("abc").is_ok());
            assert!(UserName::new("a".repeat(20)).is_ok());
            assert_eq!(
                UserName::new("a".repeat(21)),
                Err(UserNameError::InvalidLength { length: 21 })
            );
        }

        #[test]
        fn test_counts_code_points() {
            // 3 code points, 9 bytes
            assert!(UserName::new("たなか").is_ok());
        }
    }

    mod character_validation {
        use super::*;

        #[test]
        fn test_inner_whitespace_fails() {
            assert_eq!(
                UserName::new("alice tanaka"),
                Err(UserNameError::ContainsWhitespace)
            );
        }

        #[test]
        fn test_control_character_fails() {
            assert_eq!(
                UserName::new("ali\u{0000}ce"),
                Err(UserNameError::InvalidCharacter)
            );
        }
    }

    #[test]
    fn test_serde_roundtrip_validates() {
        let json = serde_json::to_string(&UserName::new("Alice").unwrap()).unwrap();
        assert_eq!(json, r#""alice""#);
        assert!(serde_json::from_str::<UserName>(r#""a""#).is_err());
    }
}
