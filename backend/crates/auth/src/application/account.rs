//! Account Services
//!
//! Shared collaborators for the account use cases, built once from
//! `AuthConfig` and held behind an `Arc` by the router.

use std::sync::Arc;

use platform::password::PasswordHasher;

use crate::application::config::AuthConfig;
use crate::application::token::{IssuedToken, TokenService};
use crate::domain::entity::user::UserSummary;
use crate::domain::value_object::email::InstitutionalDomains;
use crate::domain::value_object::user_password::{RawPassword, UserPassword};
use crate::error::{AuthError, AuthResult};

/// Plaintext of the decoy hash; never a valid account password
pub(crate) const DECOY_PASSWORD: &str = "decoy-password-not-an-account";

/// Token service, password hasher and email allow-list
#[derive(Debug)]
pub struct AuthServices {
    pub tokens: TokenService,
    pub hasher: Arc<PasswordHasher>,
    pub domains: InstitutionalDomains,
    /// Hashed at the configured cost. Login verifies against it when the
    /// email is unknown, so both branches pay one Argon2 verification.
    pub(crate) decoy_password: UserPassword,
}

impl AuthServices {
    /// Fails if the signing secret is missing or the hash cost is rejected
    pub fn from_config(config: &AuthConfig) -> AuthResult<Self> {
        let tokens = TokenService::new(&config.token_secret, config.token_ttl)?;
        let hasher = PasswordHasher::new(config.hash_cost, config.password_pepper.clone())?;
        let decoy_password =
            UserPassword::from_raw(&RawPassword::for_login(DECOY_PASSWORD.to_string()), &hasher)?;

        Ok(Self {
            tokens,
            hasher: Arc::new(hasher),
            domains: config.allowed_email_domains.clone(),
            decoy_password,
        })
    }
}

/// Result of a successful register or login
#[derive(Debug, Clone)]
pub struct AuthSuccess {
    pub token: IssuedToken,
    pub user: UserSummary,
}

/// Run CPU-bound work (password hashing) off the async workers
pub(crate) async fn run_blocking<F, T>(f: F) -> AuthResult<T>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| AuthError::Internal(format!("Blocking task failed: {}", e)))
}

/// Reject a missing or blank required field
pub(crate) fn require<'a>(
    field: &'static str,
    value: Option<&'a str>,
    message: &'static str,
) -> AuthResult<&'a str> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(AuthError::validation(field, message)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use platform::password::HashCost;

    #[test]
    fn test_from_config_requires_secret() {
        let err = AuthServices::from_config(&AuthConfig::new("")).unwrap_err();
        assert!(matches!(err, AuthError::Internal(_)));
    }

    #[test]
    fn test_from_config() {
        let config = AuthConfig::new("secret").with_hash_cost(HashCost::insecure_fast());
        let services = AuthServices::from_config(&config).unwrap();
        assert_eq!(services.hasher.cost(), HashCost::insecure_fast());
        assert!(services.domains.is_institutional("a@keio.jp"));
    }

    #[test]
    fn test_decoy_hash_uses_configured_cost() {
        let config = AuthConfig::new("secret").with_hash_cost(HashCost::insecure_fast());
        let services = AuthServices::from_config(&config).unwrap();

        let phc = services.decoy_password.as_phc_string();
        assert!(phc.starts_with("$argon2id$"));
        assert!(phc.contains("m=256,t=1,p=1"));
        assert!(!services.decoy_password.verify(
            &RawPassword::for_login("password123".to_string()),
            &services.hasher
        ));
    }

    #[test]
    fn test_require() {
        assert_eq!(require("email", Some("a"), "required").unwrap(), "a");
        assert!(require("email", Some("  "), "required").is_err());
        assert!(matches!(
            require("email", None, "required"),
            Err(AuthError::Validation { field: "email", .. })
        ));
    }

    #[tokio::test]
    async fn test_run_blocking() {
        assert_eq!(run_blocking(|| 2 + 2).await.unwrap(), 4);
    }
}
