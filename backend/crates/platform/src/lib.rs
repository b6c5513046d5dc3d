//! Platform Crate - Technical Infrastructure
//!
//! This crate provides shared technical foundations:
//! - Cryptographic utilities (SHA-256)
//! - Password hashing (Argon2id with configurable cost)
//! - Client identification from request headers
//! - Rate limiting: counter stores and the per-endpoint limiter bank

pub mod client;
pub mod crypto;
pub mod password;
pub mod rate_limit;
