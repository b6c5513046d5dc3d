//! Client identification utilities
//!
//! Common functions for identifying clients via HTTP headers.

use axum::http::{HeaderMap, header};
use std::net::IpAddr;

use crate::crypto::sha256_hex_prefix;
use crate::rate_limit::KeyScope;

/// Key used when the client address cannot be determined.
pub const UNKNOWN_ORIGIN: &str = "unknown";

/// Where a request came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientOrigin {
    /// Client IP address (socket peer, or a trusted proxy's X-Forwarded-For entry)
    pub ip: Option<IpAddr>,
    /// Original User-Agent string
    pub user_agent: Option<String>,
}

impl ClientOrigin {
    pub fn from_headers(
        headers: &HeaderMap,
        direct_ip: Option<IpAddr>,
        trusted_proxy_hops: usize,
    ) -> Self {
        Self {
            ip: extract_client_ip(headers, direct_ip, trusted_proxy_hops),
            user_agent: extract_user_agent(headers).map(str::to_owned),
        }
    }

    /// Rate limit key for this client
    ///
    /// The User-Agent is hashed so keys stay short and carry no raw header text.
    pub fn rate_limit_key(&self, scope: KeyScope) -> String {
        let origin = self
            .ip
            .map(|ip| ip.to_string())
            .unwrap_or_else(|| UNKNOWN_ORIGIN.to_string());

        match scope {
            KeyScope::Origin => origin,
            KeyScope::OriginAndAgent => {
                let agent = self
                    .user_agent
                    .as_deref()
                    .map(|ua| sha256_hex_prefix(ua.as_bytes(), 8))
                    .unwrap_or_else(|| "-".to_string());
                format!("{}|{}", origin, agent)
            }
        }
    }
}

/// User-Agent header value, if present and valid ASCII
pub fn extract_user_agent(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
}

/// Extract client IP address for admission decisions
///
/// With `trusted_proxy_hops == 0` the socket peer is the client and
/// X-Forwarded-For is ignored. Otherwise each trusted proxy appends one entry,
/// so the client is the entry `trusted_proxy_hops` positions from the right
/// (the leftmost entry when the chain is shorter).
///
/// ## Arguments
/// * `headers` - HTTP request headers
/// * `direct_ip` - Socket peer address
/// * `trusted_proxy_hops` - Number of reverse proxies in front of the server
///
/// ## Returns
/// The client IP address, or None if not determinable
pub fn extract_client_ip(
    headers: &HeaderMap,
    direct_ip: Option<IpAddr>,
    trusted_proxy_hops: usize,
) -> Option<IpAddr> {
    if trusted_proxy_hops == 0 {
        return direct_ip;
    }

    // Repeated header lines form one list, in order
    let forwarded: Vec<&str> = headers
        .get_all("x-forwarded-for")
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .collect();

    let index = forwarded.len().saturating_sub(trusted_proxy_hops);
    forwarded
        .get(index)
        .and_then(|entry| entry.parse::<IpAddr>().ok())
        .or(direct_ip)
}
