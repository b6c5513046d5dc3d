//! Server Configuration
//!
//! Read once at startup from the process environment (after `.env` is loaded).
//! Library crates receive fully built config structs and never touch the environment.

use std::time::Duration;

use anyhow::{Context, bail};
use auth::AuthConfig;
use auth::models::email::InstitutionalDomains;
use platform::password::HashCost;
use platform::rate_limit::{LimiterClass, RateLimitConfig, RateLimitSettings};

const DEFAULT_PORT: u16 = 8000;
const DEFAULT_FRONTEND_URL: &str = "http://localhost:3000";
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 20;
const DEFAULT_DB_ACQUIRE_TIMEOUT_MS: u64 = 2000;
const MAX_RATE_LIMIT_WINDOW_SECS: u64 = 86_400;

/// Where rate-limit counters live
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitBackend {
    /// Per-process counters
    Memory,
    /// Shared across instances through the `auth_rate_limits` table
    Postgres,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub database_url: String,
    pub port: u16,
    pub development: bool,
    pub frontend_origins: Vec<String>,
    pub db_max_connections: u32,
    pub db_acquire_timeout: Duration,
    pub auth: AuthConfig,
    pub rate_limit_backend: RateLimitBackend,
    pub rate_limits: RateLimitSettings,
}

impl ServerConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; unset and blank values are treated alike.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let database_url = get("DATABASE_URL").context("DATABASE_URL must be set")?;
        // No fallback signing key
        let token_secret = get("JWT_SECRET").context("JWT_SECRET must be set")?;

        let development = get("APP_ENV")
            .is_some_and(|env| env.trim().eq_ignore_ascii_case("development"));

        let token_ttl = match get("JWT_EXPIRES_IN") {
            Some(raw) => parse_duration(&raw).context("Invalid JWT_EXPIRES_IN")?,
            None => auth::application::config::DEFAULT_TOKEN_TTL,
        };

        let hash_cost = HashCost {
            memory_kib: parse_or("PASSWORD_HASH_MEMORY_KIB", &get, HashCost::OWASP_BASELINE.memory_kib)?,
            iterations: parse_or("PASSWORD_HASH_ITERATIONS", &get, HashCost::OWASP_BASELINE.iterations)?,
            parallelism: parse_or(
                "PASSWORD_HASH_PARALLELISM",
                &get,
                HashCost::OWASP_BASELINE.parallelism,
            )?,
        };
        if !development && !hash_cost.meets_baseline() {
            bail!(
                "Password hash cost {:?} is below the production baseline; set APP_ENV=development to allow it",
                hash_cost
            );
        }

        let mut auth = AuthConfig::new(token_secret)
            .with_token_ttl(token_ttl)
            .with_hash_cost(hash_cost)
            .with_pepper(get("PASSWORD_PEPPER").map(String::into_bytes));
        if let Some(domains) = get("ALLOWED_EMAIL_DOMAINS") {
            let domains = InstitutionalDomains::new(domains.split(','));
            if domains.entries().is_empty() {
                bail!("ALLOWED_EMAIL_DOMAINS contains no domains");
            }
            auth = auth.with_allowed_email_domains(domains);
        }

        let rate_limit_backend = match get("RATE_LIMIT_BACKEND").as_deref().map(str::trim) {
            None | Some("memory") => RateLimitBackend::Memory,
            Some("postgres") => RateLimitBackend::Postgres,
            Some(other) => bail!("Unknown RATE_LIMIT_BACKEND: {}", other),
        };

        let mut rate_limits = RateLimitSettings::for_environment(development);
        for class in [
            LimiterClass::Login,
            LimiterClass::Registration,
            LimiterClass::PasswordReset,
            LimiterClass::General,
        ] {
            let prefix = format!("RATE_LIMIT_{}", class.as_str().to_ascii_uppercase());
            let current = rate_limits.get(class).clone();
            let configured = RateLimitConfig::new(
                parse_or(&format!("{}_MAX", prefix), &get, current.max_requests)?,
                parse_or(&format!("{}_WINDOW_SECS", prefix), &get, current.window.as_secs())?,
            )
            .bypassed(current.bypass);
            if configured.max_requests == 0 || configured.window.is_zero() {
                bail!("{} limits must be positive", prefix);
            }
            if configured.window.as_secs() > MAX_RATE_LIMIT_WINDOW_SECS {
                bail!(
                    "{}_WINDOW_SECS must be at most {} seconds",
                    prefix,
                    MAX_RATE_LIMIT_WINDOW_SECS
                );
            }
            set_limit(&mut rate_limits, class, configured);
        }
        // Only set behind reverse proxies that append to X-Forwarded-For
        rate_limits.trusted_proxy_hops = parse_or("TRUST_PROXY_HOPS", &get, 0)?;

        let frontend_origins = get("FRONTEND_URL")
            .unwrap_or_else(|| DEFAULT_FRONTEND_URL.to_string())
            .split(',')
            .map(str::trim)
            .filter(|origin| !origin.is_empty())
            .map(str::to_string)
            .collect();

        Ok(Self {
            database_url,
            port: parse_or("PORT", &get, DEFAULT_PORT)?,
            development,
            frontend_origins,
            db_max_connections: parse_or("DB_MAX_CONNECTIONS", &get, DEFAULT_DB_MAX_CONNECTIONS)?,
            db_acquire_timeout: Duration::from_millis(parse_or(
                "DB_ACQUIRE_TIMEOUT_MS",
                &get,
                DEFAULT_DB_ACQUIRE_TIMEOUT_MS,
            )?),
            auth,
            rate_limit_backend,
            rate_limits,
        })
    }
}

fn set_limit(settings: &mut RateLimitSettings, class: LimiterClass, config: RateLimitConfig) {
    match class {
        LimiterClass::Login => settings.login = config,
        LimiterClass::Registration => settings.registration = config,
        LimiterClass::PasswordReset => settings.password_reset = config,
        LimiterClass::General => settings.general = config,
    }
}

fn parse_or<T, G>(key: &str, get: &G, default: T) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid {}: {}", key, e)),
        None => Ok(default),
    }
}

/// `<n>s`, `<n>m`, `<n>h`, `<n>d`, or bare seconds
pub fn parse_duration(raw: &str) -> anyhow::Result<Duration> {
    let raw = raw.trim();
    let (digits, unit_secs) = match raw.char_indices().last() {
        Some((i, 's')) => (&raw[..i], 1),
        Some((i, 'm')) => (&raw[..i], 60),
        Some((i, 'h')) => (&raw[..i], 3600),
        Some((i, 'd')) => (&raw[..i], 86_400),
        _ => (raw, 1),
    };

    let value: u64 = digits
        .trim()
        .parse()
        .with_context(|| format!("Invalid duration: {:?}", raw))?;
    let secs = value
        .checked_mul(unit_secs)
        .with_context(|| format!("Duration out of range: {:?}", raw))?;
    if secs == 0 {
        bail!("Duration must be positive: {:?}", raw);
    }

    Ok(Duration::from_secs(secs))
}
