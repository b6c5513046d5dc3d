//! HTTP Handlers

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;

use crate::application::{
    AuthServices, GetProfileUseCase, LoginInput, LoginUseCase, LogoutUseCase, RegisterInput,
    RegisterUseCase,
};
use crate::domain::repository::UserRepository;
use crate::error::{AuthError, AuthResult};
use crate::presentation::dto::{
    AuthResponse, LoginRequest, LogoutResponse, ProfileResponse, RegisterRequest,
    SessionStatusResponse,
};
use crate::presentation::middleware::{CurrentUser, OptionalUser};

/// Shared state for auth handlers
pub struct AuthAppState<R>
where
    R: UserRepository + Send + Sync + 'static,
{
    pub repo: Arc<R>,
    pub services: Arc<AuthServices>,
}

// Manual impl: derive would require `R: Clone`
impl<R> Clone for AuthAppState<R>
where
    R: UserRepository + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            repo: Arc::clone(&self.repo),
            services: Arc::clone(&self.services),
        }
    }
}

/// Body rejections become the same 400 shape as other validation errors
fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> AuthResult<T> {
    payload
        .map(|Json(body)| body)
        .map_err(|e| AuthError::validation("body", e.body_text()))
}

// ============================================================================
// Register
// ============================================================================

/// POST /api/auth/register
pub async fn register<R>(
    State(state): State<AuthAppState<R>>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> AuthResult<(StatusCode, Json<AuthResponse>)>
where
    R: UserRepository + Send + Sync + 'static,
{
    let req = json_body(payload)?;
    let use_case = RegisterUseCase::new(state.repo.clone(), state.services.clone());

    let output = use_case
        .execute(RegisterInput {
            email: req.email,
            password: req.password,
            username: req.username,
            full_name: req.full_name,
            university: req.university,
            year: req.year,
            department: req.department,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse::new("User registered successfully", output)),
    ))
}

// ============================================================================
// Login
// ============================================================================

/// POST /api/auth/login
pub async fn login<R>(
    State(state): State<AuthAppState<R>>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> AuthResult<Json<AuthResponse>>
where
    R: UserRepository + Send + Sync + 'static,
{
    let req = json_body(payload)?;
    let use_case = LoginUseCase::new(state.repo.clone(), state.services.clone());

    let output = use_case
        .execute(LoginInput {
            email: req.email,
            password: req.password,
        })
        .await?;

    Ok(Json(AuthResponse::new("Login successful", output)))
}

// ============================================================================
// Profile / Logout / Session
// ============================================================================

/// GET /api/auth/profile
pub async fn profile<R>(
    State(state): State<AuthAppState<R>>,
    CurrentUser(identity): CurrentUser,
) -> AuthResult<Json<ProfileResponse>>
where
    R: UserRepository + Send + Sync + 'static,
{
    let profile = GetProfileUseCase::new(state.repo.clone())
        .execute(&identity)
        .await?;

    Ok(Json(ProfileResponse {
        success: true,
        user: profile.into(),
    }))
}

/// POST /api/auth/logout
///
/// The token is not revoked; the client is expected to discard it.
pub async fn logout(CurrentUser(identity): CurrentUser) -> Json<LogoutResponse> {
    LogoutUseCase::new().execute(&identity);

    Json(LogoutResponse {
        success: true,
        message: "Logout successful",
    })
}

/// GET /api/auth/session
pub async fn session_status(OptionalUser(identity): OptionalUser) -> Json<SessionStatusResponse> {
    Json(SessionStatusResponse {
        authenticated: identity.is_some(),
        user: identity.map(Into::into),
    })
}
