//! Rate Limit Middleware
//!
//! Admission gate in front of a route: counts the request against one
//! limiter class and answers 429 once the client's window is exhausted.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{ConnectInfo, Request, State};
use axum::http::{HeaderMap, HeaderName, HeaderValue};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use platform::client::ClientOrigin;
use platform::rate_limit::{LimiterClass, RateLimitResult, RateLimitStore, RateLimiterBank};

use crate::error::AuthError;

static RATELIMIT_LIMIT: HeaderName = HeaderName::from_static("ratelimit-limit");
static RATELIMIT_REMAINING: HeaderName = HeaderName::from_static("ratelimit-remaining");
static RATELIMIT_RESET: HeaderName = HeaderName::from_static("ratelimit-reset");

/// Middleware state: the shared bank plus the class this gate enforces
pub struct RateLimitGate<S> {
    pub bank: Arc<RateLimiterBank<S>>,
    pub class: LimiterClass,
}

impl<S> RateLimitGate<S> {
    pub fn new(bank: Arc<RateLimiterBank<S>>, class: LimiterClass) -> Self {
        Self { bank, class }
    }
}

impl<S> Clone for RateLimitGate<S> {
    fn clone(&self) -> Self {
        Self {
            bank: Arc::clone(&self.bank),
            class: self.class,
        }
    }
}

/// Use with `axum::middleware::from_fn_with_state(gate, rate_limit_gate::<S>)`
pub async fn rate_limit_gate<S>(
    State(gate): State<RateLimitGate<S>>,
    req: Request,
    next: Next,
) -> Response
where
    S: RateLimitStore + Send + Sync + 'static,
{
    // Absent when the server is not run with connect info (e.g. in tests)
    let direct_ip = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|info| info.0.ip());
    let trusted_proxy_hops = gate.bank.settings().trusted_proxy_hops;
    let client_key = ClientOrigin::from_headers(req.headers(), direct_ip, trusted_proxy_hops)
        .rate_limit_key(gate.class.key_scope());

    let result = gate.bank.admit(gate.class, &client_key).await;
    let metered = !gate.bank.settings().get(gate.class).bypass;

    let mut response = if result.allowed {
        next.run(req).await
    } else {
        AuthError::RateLimited {
            message: gate.class.rejection_message(),
            retry_after: result.retry_after,
        }
        .into_response()
    };

    if metered {
        insert_rate_limit_headers(response.headers_mut(), &result);
    }
    response
}

fn insert_rate_limit_headers(headers: &mut HeaderMap, result: &RateLimitResult) {
    headers.insert(RATELIMIT_LIMIT.clone(), HeaderValue::from(result.limit));
    headers.insert(RATELIMIT_REMAINING.clone(), HeaderValue::from(result.remaining));
    headers.insert(
        RATELIMIT_RESET.clone(),
        HeaderValue::from(ceil_secs(result.retry_after)),
    );
}

fn ceil_secs(d: Duration) -> u64 {
    d.as_secs() + u64::from(d.subsec_nanos() > 0)
}
