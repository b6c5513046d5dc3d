//! Register Use Case
//!
//! Creates an account for an institutional email and signs the user in.

use std::sync::Arc;

use chrono::Utc;

use crate::application::account::{AuthServices, AuthSuccess, require, run_blocking};
use crate::domain::entity::user::{AcademicInfo, NewUser};
use crate::domain::repository::UserRepository;
use crate::domain::value_object::{
    email::{Email, EmailError},
    full_name::FullName,
    user_name::{UserName, UserNameError},
    user_password::{RawPassword, UserPassword},
};
use crate::error::{AuthError, AuthResult};

/// Upper bound for free-text academic fields
const ACADEMIC_FIELD_MAX_LENGTH: usize = 100;

/// Valid range for year of study
const YEAR_RANGE: std::ops::RangeInclusive<i32> = 1..=10;

/// Register input
#[derive(Default)]
pub struct RegisterInput {
    pub email: Option<String>,
    pub password: Option<String>,
    pub username: Option<String>,
    pub full_name: Option<String>,
    pub university: Option<String>,
    pub year: Option<i32>,
    pub department: Option<String>,
}

/// Register use case
pub struct RegisterUseCase<R>
where
    R: UserRepository,
{
    repo: Arc<R>,
    services: Arc<AuthServices>,
}

impl<R> RegisterUseCase<R>
where
    R: UserRepository,
{
    pub fn new(repo: Arc<R>, services: Arc<AuthServices>) -> Self {
        Self { repo, services }
    }

    pub async fn execute(&self, input: RegisterInput) -> AuthResult<AuthSuccess> {
        let email = require("email", input.email.as_deref(), "Email is required")?;
        let password = require("password", input.password.as_deref(), "Password is required")?;
        let username = require("username", input.username.as_deref(), "Username is required")?;
        let full_name = require("fullName", input.full_name.as_deref(), "Full name is required")?;

        let email = Email::new(email).map_err(|e| match e {
            EmailError::Empty => AuthError::validation("email", "Email is required"),
            EmailError::TooLong | EmailError::InvalidFormat => AuthError::InvalidEmailDomain,
        })?;
        if !self.services.domains.is_institutional(email.as_str()) {
            return Err(AuthError::InvalidEmailDomain);
        }

        let raw_password = RawPassword::new(password.to_string())?;

        let user_name = UserName::new(username).map_err(|e| match e {
            UserNameError::Empty | UserNameError::InvalidLength { .. } => AuthError::validation(
                "username",
                "Username must be between 3 and 20 characters",
            ),
            other => AuthError::validation("username", other.to_string()),
        })?;

        let full_name =
            FullName::new(full_name).map_err(|e| AuthError::validation("fullName", e.to_string()))?;

        let academic = AcademicInfo {
            university: optional_text("university", input.university)?,
            year: validate_year(input.year)?,
            department: optional_text("department", input.department)?,
        };

        if self
            .repo
            .find_by_email_or_username(&email, &user_name)
            .await?
            .is_some()
        {
            return Err(AuthError::UserAlreadyExists);
        }

        let hasher = Arc::clone(&self.services.hasher);
        let password = run_blocking(move || UserPassword::from_raw(&raw_password, &hasher)).await??;

        let new_user = NewUser::new(email, user_name, full_name, password, academic);
        let mut user = self.repo.insert(&new_user).await?;

        let token = self.services.tokens.issue(&user.user_id, user.email.as_str())?;

        let now = Utc::now();
        self.repo.update_last_login(&user.user_id, now).await?;
        user.last_login_at = Some(now);

        tracing::info!(
            user_id = %user.user_id,
            user_name = %user.user_name,
            "User registered"
        );

        Ok(AuthSuccess {
            token,
            user: user.summary(),
        })
    }
}

/// Trim, map blank to `None`, bound the length
fn optional_text(field: &'static str, value: Option<String>) -> AuthResult<Option<String>> {
    let Some(value) = value else {
        return Ok(None);
    };
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    if trimmed.chars().count() > ACADEMIC_FIELD_MAX_LENGTH {
        return Err(AuthError::validation(
            field,
            format!("{} must be at most {} characters", field, ACADEMIC_FIELD_MAX_LENGTH),
        ));
    }
    Ok(Some(trimmed.to_string()))
}

fn validate_year(year: Option<i32>) -> AuthResult<Option<i32>> {
    match year {
        Some(y) if !YEAR_RANGE.contains(&y) => Err(AuthError::validation(
            "year",
            "Year must be between 1 and 10",
        )),
        other => Ok(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_optional_text() {
        assert_eq!(optional_text("university", None).unwrap(), None);
        assert_eq!(optional_text("university", Some("   ".into())).unwrap(), None);
        assert_eq!(
            optional_text("university", Some("  Keio  ".into())).unwrap(),
            Some("Keio".to_string())
        );
        assert!(matches!(
            optional_text("department", Some("x".repeat(101))),
            Err(AuthError::Validation { field: "department", .. })
        ));
    }

    #[test]
    fn test_validate_year() {
        assert_eq!(validate_year(None).unwrap(), None);
        assert_eq!(validate_year(Some(1)).unwrap(), Some(1));
        assert_eq!(validate_year(Some(10)).unwrap(), Some(10));
        assert!(validate_year(Some(0)).is_err());
        assert!(validate_year(Some(11)).is_err());
    }
}
