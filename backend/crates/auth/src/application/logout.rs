//! Logout Use Case
//!
//! Bearer tokens are stateless, so logout only records the event.
//! The client discards its token; the token itself stays valid until `exp`.

use crate::application::resolve_identity::IdentityContext;

#[derive(Debug, Default, Clone, Copy)]
pub struct LogoutUseCase;

impl LogoutUseCase {
    pub fn new() -> Self {
        Self
    }

    pub fn execute(&self, identity: &IdentityContext) {
        tracing::info!(
            user_id = %identity.user_id,
            user_name = %identity.username,
            "User logged out"
        );
    }
}
