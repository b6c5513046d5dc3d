//! Email Value Object
//!
//! Represents a validated email address, plus the institutional
//! domain allow-list that registration checks it against.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

/// Maximum email length (per RFC 5321)
const EMAIL_MAX_LENGTH: usize = 254;

/// Allow-list shipped with the service.
///
/// Entries beginning with `.` are suffixes (`.ac.jp` covers every Japanese
/// university); the rest are registrable domains that also cover subdomains.
pub const DEFAULT_INSTITUTIONAL_DOMAINS: &[&str] = &[
    ".ac.jp",
    ".edu",
    ".edu.au",
    ".edu.cn",
    ".edu.sg",
    // 主要大学
    "u-tokyo.ac.jp",
    "kyoto-u.ac.jp",
    "osaka-u.ac.jp",
    "tohoku.ac.jp",
    "nagoya-u.ac.jp",
    "kyushu-u.ac.jp",
    "hokudai.ac.jp",
    "titech.ac.jp",
    "waseda.jp",
    "keio.jp",
    "rikkyo.ac.jp",
    "meiji.ac.jp",
    "chuo-u.ac.jp",
    "hosei.ac.jp",
    "aoyama.ac.jp",
    "sophia.ac.jp",
    "icu.ac.jp",
];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EmailError {
    #[error("Email cannot be empty")]
    Empty,

    #[error("Email must be at most 254 characters")]
    TooLong,

    #[error("Invalid email format")]
    InvalidFormat,
}

/// Email address value object
///
/// Trimmed and lowercased on construction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Email(String);

impl Email {
    /// Create a new email with validation
    pub fn new(email: impl AsRef<str>) -> Result<Self, EmailError> {
        let email = email.as_ref().trim().to_lowercase();

        if email.is_empty() {
            return Err(EmailError::Empty);
        }

        if email.len() > EMAIL_MAX_LENGTH {
            return Err(EmailError::TooLong);
        }

        if split_address(&email).is_none() {
            return Err(EmailError::InvalidFormat);
        }

        Ok(Self(email))
    }

    /// Create from database value (assumed already validated)
    pub fn from_db(email: impl Into<String>) -> Self {
        Self(email.into())
    }

    /// Get the email as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Convert to string for database storage
    pub fn into_db(self) -> String {
        self.0
    }
}

/// Split into (local, domain) if the address has exactly one `@`,
/// a non-empty local part, and a syntactically valid host name.
fn split_address(email: &str) -> Option<(&str, &str)> {
    let (local, domain) = email.split_once('@')?;

    if local.is_empty() || local.len() > 64 || local.chars().any(char::is_whitespace) {
        return None;
    }

    is_valid_domain(domain).then_some((local, domain))
}

fn is_valid_domain(domain: &str) -> bool {
    if domain.is_empty() || !domain.contains('.') {
        return false;
    }

    // Also rejects a second '@', '/', and anything else that is not a host name
    if !domain
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-')
    {
        return false;
    }

    if domain.starts_with('.') || domain.ends_with('.') {
        return false;
    }
    if domain.starts_with('-') || domain.ends_with('-') {
        return false;
    }

    !domain.contains("..")
}

impl FromStr for Email {
    type Err = EmailError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Email::new(s)
    }
}

impl std::fmt::Display for Email {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for Email {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// ============================================================================
// Institutional domain allow-list
// ============================================================================

/// Institutional email predicate
///
/// An address is institutional iff the domain after its single `@` ends with
/// a listed entry. The match is a plain suffix, so `keio.jp` also admits
/// `notkeio.jp`. A listed domain in the local part (or after a `/`) never matches.
/// Comparison is case-sensitive: pass an [`Email`] or an already lowercased string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstitutionalDomains {
    entries: Vec<String>,
}

impl InstitutionalDomains {
    /// Build from configured entries. Blank entries are ignored.
    pub fn new<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            entries: entries
                .into_iter()
                .map(|e| e.as_ref().trim().to_string())
                .filter(|e| !e.is_empty() && e != ".")
                .collect(),
        }
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn is_institutional(&self, email: &str) -> bool {
        let Some((_, domain)) = split_address(email) else {
            return false;
        };

        self.entries
            .iter()
            .any(|entry| domain.ends_with(entry.as_str()))
    }
}

impl Default for InstitutionalDomains {
    fn default() -> Self {
        Self::new(DEFAULT_INSTITUTIONAL_DOMAINS)
    }
}
