//! Get Profile Use Case

use std::sync::Arc;

use crate::application::resolve_identity::IdentityContext;
use crate::domain::entity::user::UserProfile;
use crate::domain::repository::UserRepository;
use crate::error::{AuthError, AuthResult};

pub struct GetProfileUseCase<R>
where
    R: UserRepository,
{
    repo: Arc<R>,
}

impl<R> GetProfileUseCase<R>
where
    R: UserRepository,
{
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    /// `NotFound` if the record vanished after the identity was resolved
    pub async fn execute(&self, identity: &IdentityContext) -> AuthResult<UserProfile> {
        let user = self
            .repo
            .find_by_id(&identity.user_id)
            .await?
            .ok_or(AuthError::NotFound)?;

        Ok(user.profile())
    }
}
