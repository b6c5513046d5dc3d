//! API DTOs (Data Transfer Objects)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::application::{AuthSuccess, IdentityContext};
use crate::domain::entity::user::{UserProfile, UserSummary};

// ============================================================================
// Register
// ============================================================================

/// Register request. Missing fields are reported by the use case, not by serde.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RegisterRequest {
    pub email: Option<String>,
    pub password: Option<String>,
    pub username: Option<String>,
    pub full_name: Option<String>,
    pub university: Option<String>,
    pub year: Option<i32>,
    pub department: Option<String>,
}

// ============================================================================
// Login
// ============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

// ============================================================================
// Responses
// ============================================================================

/// Public user projection
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummaryDto {
    pub id: String,
    pub email: String,
    pub username: String,
    pub full_name: String,
    pub university: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<UserSummary> for UserSummaryDto {
    fn from(user: UserSummary) -> Self {
        Self {
            id: user.user_id.to_string(),
            email: user.email,
            username: user.user_name,
            full_name: user.full_name,
            university: user.university,
            created_at: user.created_at,
        }
    }
}

/// Register / login response
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub success: bool,
    pub message: &'static str,
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub user: UserSummaryDto,
}

impl AuthResponse {
    pub fn new(message: &'static str, success: AuthSuccess) -> Self {
        Self {
            success: true,
            message,
            token: success.token.token,
            expires_at: success.token.expires_at,
            user: success.user.into(),
        }
    }
}

/// Full profile
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileDto {
    pub id: String,
    pub email: String,
    pub username: String,
    pub full_name: String,
    pub university: Option<String>,
    pub year: Option<i32>,
    pub department: Option<String>,
    pub bio: Option<String>,
    pub profile_image: Option<String>,
    pub created_at: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
}

impl From<UserProfile> for ProfileDto {
    fn from(profile: UserProfile) -> Self {
        Self {
            id: profile.user_id.to_string(),
            email: profile.email,
            username: profile.user_name,
            full_name: profile.full_name,
            university: profile.university,
            year: profile.year,
            department: profile.department,
            bio: profile.bio,
            profile_image: profile.profile_image,
            created_at: profile.created_at,
            last_login: profile.last_login_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ProfileResponse {
    pub success: bool,
    pub user: ProfileDto,
}

#[derive(Debug, Clone, Serialize)]
pub struct LogoutResponse {
    pub success: bool,
    pub message: &'static str,
}

// ============================================================================
// Session Status
// ============================================================================

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionUserDto {
    pub id: String,
    pub email: String,
    pub username: String,
    pub full_name: String,
}

impl From<IdentityContext> for SessionUserDto {
    fn from(identity: IdentityContext) -> Self {
        Self {
            id: identity.user_id.to_string(),
            email: identity.email,
            username: identity.username,
            full_name: identity.full_name,
        }
    }
}

/// Session status response
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStatusResponse {
    pub authenticated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<SessionUserDto>,
}
