//! Application Configuration
//!
//! Configuration for the Auth application layer. Built once by the binary;
//! this crate never reads the environment itself.

use std::fmt;
use std::time::Duration;

use platform::password::HashCost;

use crate::domain::value_object::email::InstitutionalDomains;

/// Default token lifetime (7 days)
pub const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(7 * 24 * 3600);

/// Auth application configuration
#[derive(Clone)]
pub struct AuthConfig {
    /// HMAC key for signing bearer tokens
    pub token_secret: String,
    /// Lifetime of issued tokens
    pub token_ttl: Duration,
    /// Argon2id work factor for new password hashes
    pub hash_cost: HashCost,
    /// Password pepper (optional, application-wide secret)
    pub password_pepper: Option<Vec<u8>>,
    /// Institutional email allow-list
    pub allowed_email_domains: InstitutionalDomains,
}

impl AuthConfig {
    /// Defaults for everything except the signing key
    pub fn new(token_secret: impl Into<String>) -> Self {
        Self {
            token_secret: token_secret.into(),
            token_ttl: DEFAULT_TOKEN_TTL,
            hash_cost: HashCost::default(),
            password_pepper: None,
            allowed_email_domains: InstitutionalDomains::default(),
        }
    }

    pub fn with_token_ttl(mut self, ttl: Duration) -> Self {
        self.token_ttl = ttl;
        self
    }

    pub fn with_hash_cost(mut self, cost: HashCost) -> Self {
        self.hash_cost = cost;
        self
    }

    pub fn with_pepper(mut self, pepper: Option<Vec<u8>>) -> Self {
        self.password_pepper = pepper;
        self
    }

    pub fn with_allowed_email_domains(mut self, domains: InstitutionalDomains) -> Self {
        self.allowed_email_domains = domains;
        self
    }
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("token_secret", &"[REDACTED]")
            .field("token_ttl", &self.token_ttl)
            .field("hash_cost", &self.hash_cost)
            .field(
                "password_pepper",
                &self.password_pepper.as_ref().map(|_| "[REDACTED]"),
            )
            .field(
                "allowed_email_domains",
                &self.allowed_email_domains.entries().len(),
            )
            .finish()
    }
}
