//! Application Layer
//!
//! Use cases and application services.

pub mod account;
pub mod config;
pub mod get_profile;
pub mod login;
pub mod logout;
pub mod register;
pub mod resolve_identity;
pub mod token;

// Re-exports
pub use account::{AuthServices, AuthSuccess};
pub use config::AuthConfig;
pub use get_profile::GetProfileUseCase;
pub use login::{LoginInput, LoginUseCase};
pub use logout::LogoutUseCase;
pub use register::{RegisterInput, RegisterUseCase};
pub use resolve_identity::{IdentityContext, IdentityResolver};
pub use token::{IssuedToken, TokenError, TokenService, VerifiedToken};
