//! User Entity
//!
//! Account record plus the projections that may leave the service.
//! The password hash never appears in a projection.

use chrono::{DateTime, Utc};

use crate::domain::value_object::{
    email::Email, full_name::FullName, user_id::UserId, user_name::UserName,
    user_password::UserPassword,
};

/// Optional fields collected at registration
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AcademicInfo {
    pub university: Option<String>,
    /// Year of study
    pub year: Option<i32>,
    pub department: Option<String>,
}

/// User entity
#[derive(Debug, Clone)]
pub struct User {
    /// Internal UUID identifier
    pub user_id: UserId,
    /// Institutional email (unique, lowercase)
    pub email: Email,
    /// User name (unique, lowercase)
    pub user_name: UserName,
    pub full_name: FullName,
    pub password: UserPassword,
    pub academic: AcademicInfo,
    pub bio: Option<String>,
    pub profile_image: Option<String>,
    /// When false, every authentication attempt fails
    pub is_active: bool,
    /// Last successful login time
    pub last_login_at: Option<DateTime<Utc>>,
    /// Created timestamp
    pub created_at: DateTime<Utc>,
    /// Updated timestamp
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Check if user can login
    pub fn can_login(&self) -> bool {
        self.is_active
    }

    pub fn summary(&self) -> UserSummary {
        UserSummary {
            user_id: self.user_id,
            email: self.email.as_str().to_string(),
            user_name: self.user_name.as_str().to_string(),
            full_name: self.full_name.as_str().to_string(),
            university: self.academic.university.clone(),
            created_at: self.created_at,
        }
    }

    pub fn profile(&self) -> UserProfile {
        UserProfile {
            user_id: self.user_id,
            email: self.email.as_str().to_string(),
            user_name: self.user_name.as_str().to_string(),
            full_name: self.full_name.as_str().to_string(),
            university: self.academic.university.clone(),
            year: self.academic.year,
            department: self.academic.department.clone(),
            bio: self.bio.clone(),
            profile_image: self.profile_image.clone(),
            created_at: self.created_at,
            last_login_at: self.last_login_at,
        }
    }
}

/// A validated registration, ready for insertion
#[derive(Debug, Clone)]
pub struct NewUser {
    pub user_id: UserId,
    pub email: Email,
    pub user_name: UserName,
    pub full_name: FullName,
    pub password: UserPassword,
    pub academic: AcademicInfo,
    pub created_at: DateTime<Utc>,
}

impl NewUser {
    pub fn new(
        email: Email,
        user_name: UserName,
        full_name: FullName,
        password: UserPassword,
        academic: AcademicInfo,
    ) -> Self {
        Self {
            user_id: UserId::new(),
            email,
            user_name,
            full_name,
            password,
            academic,
            created_at: Utc::now(),
        }
    }

    /// The record as stored: active, never logged in
    pub fn into_user(self) -> User {
        User {
            user_id: self.user_id,
            email: self.email,
            user_name: self.user_name,
            full_name: self.full_name,
            password: self.password,
            academic: self.academic,
            bio: None,
            profile_image: None,
            is_active: true,
            last_login_at: None,
            created_at: self.created_at,
            updated_at: self.created_at,
        }
    }
}

/// Public projection returned after register/login
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserSummary {
    pub user_id: UserId,
    pub email: String,
    pub user_name: String,
    pub full_name: String,
    pub university: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Full profile of the authenticated user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserProfile {
    pub user_id: UserId,
    pub email: String,
    pub user_name: String,
    pub full_name: String,
    pub university: Option<String>,
    pub year: Option<i32>,
    pub department: Option<String>,
    pub bio: Option<String>,
    pub profile_image: Option<String>,
    pub created_at: DateTime<Utc>,
    pub last_login_at: Option<DateTime<Utc>>,
}
