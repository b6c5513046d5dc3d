//! Login Use Case
//!
//! Email + password login. Unknown email and wrong password produce the
//! same `InvalidCredentials` error.

use std::sync::Arc;

use chrono::Utc;

use crate::application::account::{AuthServices, AuthSuccess, require, run_blocking};
use crate::domain::repository::UserRepository;
use crate::domain::value_object::{email::Email, user_password::RawPassword};
use crate::error::{AuthError, AuthResult};

/// Login input
#[derive(Default)]
pub struct LoginInput {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Login use case
pub struct LoginUseCase<R>
where
    R: UserRepository,
{
    repo: Arc<R>,
    services: Arc<AuthServices>,
}

impl<R> LoginUseCase<R>
where
    R: UserRepository,
{
    pub fn new(repo: Arc<R>, services: Arc<AuthServices>) -> Self {
        Self { repo, services }
    }

    pub async fn execute(&self, input: LoginInput) -> AuthResult<AuthSuccess> {
        let email = require("email", input.email.as_deref(), "Email is required")?;
        let password = require("password", input.password.as_deref(), "Password is required")?;

        // A malformed address cannot belong to any account
        let email = Email::new(email).map_err(|_| AuthError::InvalidCredentials)?;

        let raw_password = RawPassword::for_login(password.to_string());
        let hasher = Arc::clone(&self.services.hasher);

        let Some(mut user) = self.repo.find_by_email(&email).await? else {
            // Same Argon2 work as a known account
            let decoy = self.services.decoy_password.clone();
            run_blocking(move || decoy.verify(&raw_password, &hasher)).await?;
            return Err(AuthError::InvalidCredentials);
        };

        if !user.can_login() {
            return Err(AuthError::AccountDeactivated);
        }

        let stored = user.password.clone();
        let verified = run_blocking(move || stored.verify(&raw_password, &hasher)).await?;

        if !verified {
            return Err(AuthError::InvalidCredentials);
        }

        let now = Utc::now();
        self.repo.update_last_login(&user.user_id, now).await?;
        user.last_login_at = Some(now);

        let token = self.services.tokens.issue(&user.user_id, user.email.as_str())?;

        tracing::info!(user_id = %user.user_id, "User logged in");

        Ok(AuthSuccess {
            token,
            user: user.summary(),
        })
    }
}
