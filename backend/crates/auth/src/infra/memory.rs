//! In-Memory User Repository
//!
//! Process-local store with the same uniqueness rules as the `users` table.
//! Backs the crate's scenario tests and database-less local runs.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::domain::entity::user::{NewUser, User};
use crate::domain::repository::UserRepository;
use crate::domain::value_object::{email::Email, user_id::UserId, user_name::UserName};
use crate::error::{AuthError, AuthResult};

#[derive(Default)]
struct Tables {
    users: HashMap<UserId, User>,
    by_email: HashMap<String, UserId>,
    by_username: HashMap<String, UserId>,
}

#[derive(Default)]
pub struct InMemoryUserRepository {
    tables: RwLock<Tables>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.tables.read().await.users.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl UserRepository for InMemoryUserRepository {
    async fn find_by_email_or_username(
        &self,
        email: &Email,
        user_name: &UserName,
    ) -> AuthResult<Option<User>> {
        let tables = self.tables.read().await;
        let id = tables
            .by_email
            .get(email.as_str())
            .or_else(|| tables.by_username.get(user_name.as_str()));

        Ok(id.and_then(|id| tables.users.get(id)).cloned())
    }

    async fn find_by_email(&self, email: &Email) -> AuthResult<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables
            .by_email
            .get(email.as_str())
            .and_then(|id| tables.users.get(id))
            .cloned())
    }

    async fn find_by_id(&self, user_id: &UserId) -> AuthResult<Option<User>> {
        Ok(self.tables.read().await.users.get(user_id).cloned())
    }

    async fn insert(&self, user: &NewUser) -> AuthResult<User> {
        let mut tables = self.tables.write().await;

        if tables.by_email.contains_key(user.email.as_str())
            || tables.by_username.contains_key(user.user_name.as_str())
            || tables.users.contains_key(&user.user_id)
        {
            return Err(AuthError::UserAlreadyExists);
        }

        let record = user.clone().into_user();
        tables
            .by_email
            .insert(record.email.as_str().to_string(), record.user_id);
        tables
            .by_username
            .insert(record.user_name.as_str().to_string(), record.user_id);
        tables.users.insert(record.user_id, record.clone());

        Ok(record)
    }

    async fn update_last_login(&self, user_id: &UserId, at: DateTime<Utc>) -> AuthResult<()> {
        if let Some(user) = self.tables.write().await.users.get_mut(user_id) {
            user.last_login_at = Some(at);
            user.updated_at = at;
        }
        Ok(())
    }

    async fn set_active(&self, user_id: &UserId, is_active: bool) -> AuthResult<bool> {
        let mut tables = self.tables.write().await;
        match tables.users.get_mut(user_id) {
            Some(user) => {
                user.is_active = is_active;
                user.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
