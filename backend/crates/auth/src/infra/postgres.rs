//! PostgreSQL Repository Implementations

use std::time::Duration;

use chrono::{DateTime, Utc};
use kernel::error::conversions::is_unique_violation;
use platform::rate_limit::{RateLimitConfig, RateLimitError, RateLimitResult, RateLimitStore};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::entity::user::{AcademicInfo, NewUser, User};
use crate::domain::repository::UserRepository;
use crate::domain::value_object::{
    email::Email, full_name::FullName, user_id::UserId, user_name::UserName,
    user_password::UserPassword,
};
use crate::error::{AuthError, AuthResult};

/// Columns selected for every user lookup
const USER_COLUMNS: &str = r#"
    user_id,
    email,
    username,
    full_name,
    password_hash,
    university,
    year,
    department,
    bio,
    profile_image,
    is_active,
    last_login_at,
    created_at,
    updated_at
"#;

/// PostgreSQL-backed user repository
#[derive(Clone)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

// ============================================================================
// User Repository Implementation
// ============================================================================

impl UserRepository for PgUserRepository {
    async fn find_by_email_or_username(
        &self,
        email: &Email,
        user_name: &UserName,
    ) -> AuthResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1 OR username = $2 LIMIT 1"
        ))
        .bind(email.as_str())
        .bind(user_name.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(UserRow::into_user).transpose()
    }

    async fn find_by_email(&self, email: &Email) -> AuthResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(UserRow::into_user).transpose()
    }

    async fn find_by_id(&self, user_id: &UserId) -> AuthResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE user_id = $1"
        ))
        .bind(user_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(UserRow::into_user).transpose()
    }

    async fn insert(&self, user: &NewUser) -> AuthResult<User> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            r#"
            INSERT INTO users (
                user_id,
                email,
                username,
                full_name,
                password_hash,
                university,
                year,
                department,
                is_active,
                created_at,
                updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, TRUE, $9, $9)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(user.user_id.as_uuid())
        .bind(user.email.as_str())
        .bind(user.user_name.as_str())
        .bind(user.full_name.as_str())
        .bind(user.password.as_phc_string())
        .bind(user.academic.university.as_deref())
        .bind(user.academic.year)
        .bind(user.academic.department.as_deref())
        .bind(user.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AuthError::UserAlreadyExists
            } else {
                AuthError::Store(e)
            }
        })?;

        row.into_user()
    }

    async fn update_last_login(&self, user_id: &UserId, at: DateTime<Utc>) -> AuthResult<()> {
        sqlx::query("UPDATE users SET last_login_at = $2, updated_at = $2 WHERE user_id = $1")
            .bind(user_id.as_uuid())
            .bind(at)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn set_active(&self, user_id: &UserId, is_active: bool) -> AuthResult<bool> {
        let affected = sqlx::query(
            "UPDATE users SET is_active = $2, updated_at = NOW() WHERE user_id = $1",
        )
        .bind(user_id.as_uuid())
        .bind(is_active)
        .execute(&self.pool)
        .await?
        .rows_affected();

        if affected > 0 {
            tracing::info!(user_id = %user_id, is_active, "User activity flag changed");
        }

        Ok(affected > 0)
    }
}

// ============================================================================
// Rate Limit Store Implementation
// ============================================================================

/// Counters shared by every API instance using the same database
///
/// Windows are aligned to multiples of the window length since the epoch.
#[derive(Clone)]
pub struct PgRateLimitStore {
    pool: PgPool,
}

impl PgRateLimitStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl RateLimitStore for PgRateLimitStore {
    async fn check_and_increment(
        &self,
        key: &str,
        config: &RateLimitConfig,
    ) -> Result<RateLimitResult, RateLimitError> {
        let window_ms = config.window_ms().max(1);
        let now_ms = Utc::now().timestamp_millis();
        let window_start = (now_ms / window_ms) * window_ms;

        let row = sqlx::query_as::<_, (i32,)>(
            r#"
            INSERT INTO auth_rate_limits (rate_limit_key, window_start_ms, window_ms, request_count)
            VALUES ($1, $2, $3, 1)
            ON CONFLICT (rate_limit_key, window_start_ms)
            DO UPDATE SET request_count = auth_rate_limits.request_count + 1
            RETURNING request_count
            "#,
        )
        .bind(key)
        .bind(window_start)
        .bind(window_ms)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| RateLimitError::Store(e.to_string()))?;

        let count = u32::try_from(row.0).unwrap_or(0);
        let reset_in_ms = window_start.saturating_add(window_ms).saturating_sub(now_ms).max(0);

        Ok(RateLimitResult {
            allowed: count <= config.max_requests,
            limit: config.max_requests,
            remaining: config.max_requests.saturating_sub(count),
            retry_after: Duration::from_millis(reset_in_ms as u64),
        })
    }

    async fn purge_expired(&self) -> Result<u64, RateLimitError> {
        let now_ms = Utc::now().timestamp_millis();

        let deleted =
            sqlx::query("DELETE FROM auth_rate_limits WHERE window_start_ms + window_ms <= $1")
                .bind(now_ms)
                .execute(&self.pool)
                .await
                .map_err(|e| RateLimitError::Store(e.to_string()))?
                .rows_affected();

        Ok(deleted)
    }
}

// ============================================================================
// Row types
// ============================================================================

#[derive(sqlx::FromRow)]
struct UserRow {
    user_id: Uuid,
    email: String,
    username: String,
    full_name: String,
    password_hash: String,
    university: Option<String>,
    year: Option<i32>,
    department: Option<String>,
    bio: Option<String>,
    profile_image: Option<String>,
    is_active: bool,
    last_login_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl UserRow {
    fn into_user(self) -> AuthResult<User> {
        Ok(User {
            user_id: UserId::from_uuid(self.user_id),
            email: Email::from_db(self.email),
            user_name: UserName::from_db(self.username),
            full_name: FullName::from_db(self.full_name),
            password: UserPassword::from_phc_string(self.password_hash)?,
            academic: AcademicInfo {
                university: self.university,
                year: self.year,
                department: self.department,
            },
            bio: self.bio,
            profile_image: self.profile_image,
            is_active: self.is_active,
            last_login_at: self.last_login_at,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}
