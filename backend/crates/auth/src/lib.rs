//! Auth (Authentication) Backend Module
//!
//! Clean Architecture structure:
//! - `domain/` - Entities, value objects, repository traits
//! - `application/` - Use cases, token service, identity resolution
//! - `infra/` - PostgreSQL and in-memory store implementations
//! - `presentation/` - HTTP handlers, DTOs, middleware, router
//!
//! ## Features
//! - Registration restricted to institutional email domains
//! - Email + password login
//! - Stateless HS256 bearer tokens (logout is advisory)
//! - Mandatory and optional identity resolution middleware
//! - Per-class rate limiting on login and registration
//!
//! ## Security Model
//! - Passwords hashed with Argon2id, hashing runs on the blocking pool
//! - Token signature and expiry are checked before any claim is read
//! - Deactivated accounts cannot log in and their tokens stop resolving
//! - Unknown email and wrong password are indistinguishable to clients

pub mod application;
pub mod domain;
pub mod error;
pub mod infra;
pub mod presentation;

mod tests;

// Re-exports for convenience
pub use application::{AuthConfig, AuthServices};
pub use error::{AuthError, AuthResult};
pub use infra::{InMemoryUserRepository, PgRateLimitStore, PgUserRepository};
pub use presentation::router::auth_router;

// Re-export kernel error types for unified error handling
pub use kernel::error::{
    app_error::{AppError, AppResult},
    kind::ErrorKind,
};

pub mod models {
    pub use crate::domain::entity::*;
    pub use crate::domain::value_object::*;
    pub use crate::presentation::dto::*;
}

pub mod middleware {
    pub use crate::presentation::middleware::*;
}
