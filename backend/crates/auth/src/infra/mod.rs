//! Infrastructure Layer
//!
//! Store implementations for the domain repository traits.

pub mod memory;
pub mod postgres;

pub use memory::InMemoryUserRepository;
pub use postgres::{PgRateLimitStore, PgUserRepository};
