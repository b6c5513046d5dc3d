//! Auth Router

use std::sync::Arc;

use axum::{
    Router,
    middleware::from_fn_with_state,
    routing::{get, post},
};
use platform::rate_limit::{LimiterClass, RateLimitStore, RateLimiterBank};

use crate::application::AuthServices;
use crate::domain::repository::UserRepository;
use crate::presentation::handlers::{self, AuthAppState};
use crate::presentation::middleware::{optional_auth, require_auth};
use crate::presentation::rate_limit::{RateLimitGate, rate_limit_gate};

/// Create the Auth router for any user store and rate-limit store
///
/// Mount under `/api/auth`.
pub fn auth_router<R, S>(
    repo: Arc<R>,
    services: Arc<AuthServices>,
    limiter: Arc<RateLimiterBank<S>>,
) -> Router
where
    R: UserRepository + Send + Sync + 'static,
    S: RateLimitStore + Send + Sync + 'static,
{
    let state = AuthAppState { repo, services };

    let registration_gate = RateLimitGate::new(limiter.clone(), LimiterClass::Registration);
    let login_gate = RateLimitGate::new(limiter, LimiterClass::Login);

    Router::new()
        .route(
            "/register",
            post(handlers::register::<R>)
                .layer(from_fn_with_state(registration_gate, rate_limit_gate::<S>)),
        )
        .route(
            "/login",
            post(handlers::login::<R>).layer(from_fn_with_state(login_gate, rate_limit_gate::<S>)),
        )
        .route(
            "/profile",
            get(handlers::profile::<R>).layer(from_fn_with_state(state.clone(), require_auth::<R>)),
        )
        .route(
            "/logout",
            post(handlers::logout).layer(from_fn_with_state(state.clone(), require_auth::<R>)),
        )
        .route(
            "/session",
            get(handlers::session_status)
                .layer(from_fn_with_state(state.clone(), optional_auth::<R>)),
        )
        .with_state(state)
}
