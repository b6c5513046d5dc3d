//! Identity Resolution
//!
//! Bearer token → verified claims → live, active user → `IdentityContext`.
//! Shared by the mandatory and optional auth middleware.

use std::sync::Arc;

use crate::application::account::AuthServices;
use crate::domain::repository::UserRepository;
use crate::domain::value_object::user_id::UserId;
use crate::error::{AuthError, AuthResult};

/// Message when a verified token no longer maps to an active user
pub const USER_NOT_FOUND_MESSAGE: &str = "Invalid token - user not found";

/// Identity attached to an authenticated request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityContext {
    pub user_id: UserId,
    pub email: String,
    pub username: String,
    pub full_name: String,
}

pub struct IdentityResolver<R>
where
    R: UserRepository,
{
    repo: Arc<R>,
    services: Arc<AuthServices>,
}

impl<R> IdentityResolver<R>
where
    R: UserRepository,
{
    pub fn new(repo: Arc<R>, services: Arc<AuthServices>) -> Self {
        Self { repo, services }
    }

    /// Claims are only read after signature and expiry checks pass.
    pub async fn resolve(&self, token: &str) -> AuthResult<IdentityContext> {
        let verified = self.services.tokens.verify(token)?;

        let user = self
            .repo
            .find_by_id(&verified.user_id)
            .await?
            .filter(|user| user.can_login())
            .ok_or(AuthError::Unauthenticated(USER_NOT_FOUND_MESSAGE))?;

        Ok(IdentityContext {
            user_id: user.user_id,
            email: user.email.into_db(),
            username: user.user_name.into_inner(),
            full_name: user.full_name.as_str().to_string(),
        })
    }
}
