//! Rate limiting middleware using governor and `tower_governor`.
//!
//! - `auth_rate_limiter`: strict limits for `/api/auth` (~10/min)
//! - `api_rate_limiter`: relaxed limits for `/api/cart` (~100/min)
//!
//! Clients are keyed by peer address unless `CARTWHEEL_TRUST_PROXY` is set.

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use axum::extract::ConnectInfo;
use axum::http::Request;
use governor::clock::QuantaInstant;
use governor::middleware::NoOpMiddleware;
use tower_governor::{GovernorError, GovernorLayer, governor::GovernorConfigBuilder};

/// Per-client key: the peer address, or the proxy's client address when
/// `trust_proxy_headers` is set.
///
/// Set `trust_proxy_headers` only behind a reverse proxy that overwrites
/// `X-Forwarded-For` and `X-Real-IP`. Otherwise clients choose their own key.
#[derive(Clone, Copy)]
pub struct ClientIpKeyExtractor {
    pub trust_proxy_headers: bool,
}

fn header_ip<T>(req: &Request<T>, name: &str) -> Option<IpAddr> {
    req.headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.split(',').next())
        .and_then(|s| s.trim().parse::<IpAddr>().ok())
}

fn peer_ip<T>(req: &Request<T>) -> Option<IpAddr> {
    req.extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip())
}

impl tower_governor::key_extractor::KeyExtractor for ClientIpKeyExtractor {
    type Key = IpAddr;

    fn extract<T>(&self, req: &Request<T>) -> Result<Self::Key, GovernorError> {
        let forwarded = self
            .trust_proxy_headers
            .then(|| header_ip(req, "x-forwarded-for").or_else(|| header_ip(req, "x-real-ip")))
            .flatten();

        forwarded
            .or_else(|| peer_ip(req))
            .ok_or(GovernorError::UnableToExtractKey)
    }
}

/// Rate limiter layer type for Axum.
pub type RateLimiterLayer =
    GovernorLayer<ClientIpKeyExtractor, NoOpMiddleware<QuantaInstant>, axum::body::Body>;

/// Create rate limiter for auth endpoints: ~10 requests per minute per IP.
///
/// Configuration: 1 request every 6 seconds (replenish), burst of 5.
///
/// # Panics
///
/// Panics if governor rejects the quota.
#[must_use]
pub fn auth_rate_limiter(trust_proxy_headers: bool) -> RateLimiterLayer {
    let config = GovernorConfigBuilder::default()
        .key_extractor(ClientIpKeyExtractor {
            trust_proxy_headers,
        })
        .per_second(6)
        .burst_size(5)
        .finish()
        .expect("Failed to build auth rate limiter config");
    GovernorLayer::new(Arc::new(config))
}

/// Create rate limiter for cart endpoints: ~100 requests per minute per IP.
///
/// Configuration: 1 request per second (replenish), burst of 50.
///
/// # Panics
///
/// Panics if governor rejects the quota.
#[must_use]
pub fn api_rate_limiter(trust_proxy_headers: bool) -> RateLimiterLayer {
    let config = GovernorConfigBuilder::default()
        .key_extractor(ClientIpKeyExtractor {
            trust_proxy_headers,
        })
        .per_second(1)
        .burst_size(50)
        .finish()
        .expect("Failed to build API rate limiter config");
    GovernorLayer::new(Arc::new(config))
}
