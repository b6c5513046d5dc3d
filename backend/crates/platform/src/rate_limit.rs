//! Rate Limiting Infrastructure
//!
//! Fixed-window request counting per (limiter class, client key).
//!
//! - [`RateLimitStore`]: counter backend (in-process [`InMemoryRateLimitStore`],
//!   PostgreSQL lives in the auth crate's infra layer)
//! - [`RateLimiterBank`]: the four named limiters sharing one store

use std::time::Duration;

use dashmap::DashMap;
use thiserror::Error;
use tokio::time::Instant;

/// Rate limit configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitConfig {
    /// Maximum requests allowed in the window
    pub max_requests: u32,
    /// Time window duration
    pub window: Duration,
    /// Admit everything without counting (development mode)
    pub bypass: bool,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: 10,
            window: Duration::from_secs(60),
            bypass: false,
        }
    }
}

impl RateLimitConfig {
    pub fn new(max_requests: u32, window_secs: u64) -> Self {
        Self {
            max_requests,
            window: Duration::from_secs(window_secs),
            bypass: false,
        }
    }

    pub fn bypassed(mut self, bypass: bool) -> Self {
        self.bypass = bypass;
        self
    }

    pub fn window_ms(&self) -> i64 {
        i64::try_from(self.window.as_millis()).unwrap_or(i64::MAX)
    }
}

/// Rate limit check result
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitResult {
    pub allowed: bool,
    /// Configured maximum for the window
    pub limit: u32,
    /// Requests left in the current window
    pub remaining: u32,
    /// Time until the current window resets
    pub retry_after: Duration,
}

impl RateLimitResult {
    /// Result for a request that was admitted without being counted.
    pub fn unmetered(config: &RateLimitConfig) -> Self {
        Self {
            allowed: true,
            limit: config.max_requests,
            remaining: config.max_requests,
            retry_after: Duration::ZERO,
        }
    }
}

#[derive(Debug, Error)]
pub enum RateLimitError {
    #[error("Rate limit store unavailable: {0}")]
    Store(String),
}

/// Trait for rate limit storage backends
#[trait_variant::make(RateLimitStore: Send)]
pub trait LocalRateLimitStore {
    /// Count one request against `key` and report whether it is admitted.
    ///
    /// Check and increment must be atomic per key: of N concurrent calls
    /// on a fresh window with limit L, exactly min(N, L) are admitted.
    async fn check_and_increment(
        &self,
        key: &str,
        config: &RateLimitConfig,
    ) -> Result<RateLimitResult, RateLimitError>;

    /// Drop counters whose window has elapsed. Returns the number removed.
    async fn purge_expired(&self) -> Result<u64, RateLimitError>;
}

// ============================================================================
// In-memory store
// ============================================================================

const FAR_FUTURE: Duration = Duration::from_secs(30 * 365 * 24 * 3600);

#[derive(Debug, Clone, Copy)]
struct WindowCounter {
    started: Instant,
    window: Duration,
    count: u32,
}

impl WindowCounter {
    fn start(now: Instant, window: Duration) -> Self {
        Self {
            started: now,
            window,
            count: 0,
        }
    }

    /// Saturates to a far-future instant when the window is too large to add
    fn resets_at(&self) -> Instant {
        self.started
            .checked_add(self.window)
            .or_else(|| self.started.checked_add(FAR_FUTURE))
            .unwrap_or(self.started)
    }
}

/// Process-local counters
///
/// Each key's check-and-increment runs under the DashMap shard lock for that key.
/// Uses `tokio::time::Instant`, so tests can drive windows with a paused clock.
#[derive(Debug, Default)]
pub struct InMemoryRateLimitStore {
    counters: DashMap<String, WindowCounter>,
}

impl InMemoryRateLimitStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live counters (including expired ones not yet purged)
    pub fn len(&self) -> usize {
        self.counters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counters.is_empty()
    }
}

impl RateLimitStore for InMemoryRateLimitStore {
    async fn check_and_increment(
        &self,
        key: &str,
        config: &RateLimitConfig,
    ) -> Result<RateLimitResult, RateLimitError> {
        let now = Instant::now();

        let mut entry = self
            .counters
            .entry(key.to_owned())
            .or_insert_with(|| WindowCounter::start(now, config.window));
        let counter = entry.value_mut();

        if now >= counter.resets_at() || counter.window != config.window {
            *counter = WindowCounter::start(now, config.window);
        }

        counter.count = counter.count.saturating_add(1);

        Ok(RateLimitResult {
            allowed: counter.count <= config.max_requests,
            limit: config.max_requests,
            remaining: config.max_requests.saturating_sub(counter.count),
            retry_after: counter.resets_at().saturating_duration_since(now),
        })
    }

    async fn purge_expired(&self) -> Result<u64, RateLimitError> {
        let now = Instant::now();
        let before = self.counters.len();
        self.counters.retain(|_, counter| now < counter.resets_at());
        Ok(before.saturating_sub(self.counters.len()) as u64)
    }
}

// ============================================================================
// Limiter classes
// ============================================================================

/// What identifies a client for a limiter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyScope {
    /// Client IP only
    Origin,
    /// Client IP plus a digest of the User-Agent
    OriginAndAgent,
}

/// Named limiters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LimiterClass {
    /// Login attempts: 5 per 15 minutes per IP + User-Agent
    Login,
    /// Account creation: 3 per hour per IP
    Registration,
    /// Password reset requests: 3 per hour per IP
    PasswordReset,
    /// All API traffic: 100 per 15 minutes per IP
    General,
}

impl LimiterClass {
    pub const fn as_str(&self) -> &'static str {
        match self {
            LimiterClass::Login => "login",
            LimiterClass::Registration => "registration",
            LimiterClass::PasswordReset => "password_reset",
            LimiterClass::General => "general",
        }
    }

    pub const fn key_scope(&self) -> KeyScope {
        match self {
            LimiterClass::Login => KeyScope::OriginAndAgent,
            _ => KeyScope::Origin,
        }
    }

    /// Message returned to clients when this limiter rejects a request
    pub const fn rejection_message(&self) -> &'static str {
        match self {
            LimiterClass::Login => "Too many authentication attempts, please try again later",
            LimiterClass::Registration => "Too many registration attempts, please try again later",
            LimiterClass::PasswordReset => {
                "Too many password reset attempts, please try again later"
            }
            LimiterClass::General => "Too many requests, please slow down and try again later",
        }
    }

    pub fn default_config(&self) -> RateLimitConfig {
        match self {
            LimiterClass::Login => RateLimitConfig::new(5, 15 * 60),
            LimiterClass::Registration => RateLimitConfig::new(3, 60 * 60),
            LimiterClass::PasswordReset => RateLimitConfig::new(3, 60 * 60),
            LimiterClass::General => RateLimitConfig::new(100, 15 * 60),
        }
    }
}

/// Per-class limits, plus how client addresses are derived
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitSettings {
    pub login: RateLimitConfig,
    pub registration: RateLimitConfig,
    pub password_reset: RateLimitConfig,
    pub general: RateLimitConfig,
    /// Reverse proxies in front of the server whose X-Forwarded-For entries
    /// are trusted. Zero keys on the socket peer address.
    pub trusted_proxy_hops: usize,
}

impl Default for RateLimitSettings {
    fn default() -> Self {
        Self {
            login: LimiterClass::Login.default_config(),
            registration: LimiterClass::Registration.default_config(),
            password_reset: LimiterClass::PasswordReset.default_config(),
            general: LimiterClass::General.default_config(),
            trusted_proxy_hops: 0,
        }
    }
}

impl RateLimitSettings {
    /// Defaults, with the general limiter bypassed in development.
    pub fn for_environment(development: bool) -> Self {
        let mut settings = Self::default();
        settings.general = settings.general.bypassed(development);
        settings
    }

    pub fn get(&self, class: LimiterClass) -> &RateLimitConfig {
        match class {
            LimiterClass::Login => &self.login,
            LimiterClass::Registration => &self.registration,
            LimiterClass::PasswordReset => &self.password_reset,
            LimiterClass::General => &self.general,
        }
    }
}

// ============================================================================
// Bank
// ============================================================================

/// The named limiters over one shared counter store
///
/// Keys are namespaced by class, so a login attempt never consumes
/// registration budget for the same client.
#[derive(Debug)]
pub struct RateLimiterBank<S = InMemoryRateLimitStore> {
    store: S,
    settings: RateLimitSettings,
}

impl<S> RateLimiterBank<S> {
    pub fn new(store: S, settings: RateLimitSettings) -> Self {
        Self { store, settings }
    }

    pub fn settings(&self) -> &RateLimitSettings {
        &self.settings
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}

impl<S: RateLimitStore> RateLimiterBank<S> {
    /// Count a request from `client_key` against `class`.
    ///
    /// Store failures admit the request and are logged.
    pub async fn admit(&self, class: LimiterClass, client_key: &str) -> RateLimitResult {
        let config = self.settings.get(class);
        if config.bypass {
            return RateLimitResult::unmetered(config);
        }

        let key = format!("{}:{}", class.as_str(), client_key);
        match self.store.check_and_increment(&key, config).await {
            Ok(result) => {
                if !result.allowed {
                    tracing::warn!(
                        limiter = class.as_str(),
                        retry_after_secs = result.retry_after.as_secs(),
                        "Rate limit exceeded"
                    );
                }
                result
            }
            Err(e) => {
                tracing::error!(
                    error = %e,
                    limiter = class.as_str(),
                    "Rate limit store failed, admitting request"
                );
                RateLimitResult::unmetered(config)
            }
        }
    }

    pub async fn purge_expired(&self) -> Result<u64, RateLimitError> {
        self.store.purge_expired().await
    }
}
