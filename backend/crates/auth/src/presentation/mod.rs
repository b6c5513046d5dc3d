//! Presentation Layer
//!
//! HTTP handlers, DTOs, router, and middleware.

pub mod dto;
pub mod handlers;
pub mod middleware;
pub mod rate_limit;
pub mod router;

pub use handlers::AuthAppState;
pub use middleware::{CurrentUser, OptionalUser, optional_auth, require_auth};
pub use rate_limit::{RateLimitGate, rate_limit_gate};
pub use router::auth_router;
