//! Repository Traits
//!
//! Interfaces for data persistence. Implementation is in infrastructure layer.
//! Each method is a single atomic operation against the store.

use chrono::{DateTime, Utc};

use crate::domain::entity::user::{NewUser, User};
use crate::domain::value_object::{email::Email, user_id::UserId, user_name::UserName};
use crate::error::AuthResult;

/// User repository trait
#[trait_variant::make(UserRepository: Send)]
pub trait LocalUserRepository {
    /// Find a user holding either the email or the username
    async fn find_by_email_or_username(
        &self,
        email: &Email,
        user_name: &UserName,
    ) -> AuthResult<Option<User>>;

    /// Find user by (normalized) email
    async fn find_by_email(&self, email: &Email) -> AuthResult<Option<User>>;

    /// Find user by ID
    async fn find_by_id(&self, user_id: &UserId) -> AuthResult<Option<User>>;

    /// Insert a new user
    ///
    /// A uniqueness violation on email or username is
    /// `AuthError::UserAlreadyExists`, never a generic store error.
    async fn insert(&self, user: &NewUser) -> AuthResult<User>;

    /// Record a successful authentication
    async fn update_last_login(&self, user_id: &UserId, at: DateTime<Utc>) -> AuthResult<()>;

    /// Activate or deactivate an account. Returns false if the user does not exist.
    async fn set_active(&self, user_id: &UserId, is_active: bool) -> AuthResult<bool>;
}
