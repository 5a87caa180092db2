/// Per-client rate limiting
///
/// Token bucket per client address, kept in process memory. Each bucket holds
/// `max_requests` tokens and refills at `max_requests / window_secs` tokens per
/// second, so a client gets `max_requests` requests per window with bursts up
/// to the full budget.
///
/// The client is the peer address from `ConnectInfo`. The first
/// `X-Forwarded-For` entry replaces it only when that peer is one of the
/// configured `trusted_proxies`; anyone else could rotate the header to get
/// a fresh bucket per request.
///
/// # Headers
///
/// Every response carries:
/// - `X-RateLimit-Limit`: requests allowed per window
/// - `X-RateLimit-Remaining`: tokens left in the caller's bucket
///
/// Rejections are `429` with `Retry-After` in seconds.

use crate::{app::AppState, config::RateLimitConfig, error::ApiError};
use axum::{
    extract::{ConnectInfo, Request, State},
    http::{HeaderMap, HeaderValue},
    middleware::Next,
    response::Response,
};
use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::sync::Mutex;
use std::time::Instant;

/// Bucket count above which refilled (full) buckets are dropped
const SWEEP_THRESHOLD: usize = 10_000;

/// Token bucket state for one client
#[derive(Debug, Clone)]
struct TokenBucket {
    tokens: f64,
    last_refill: Instant,
}

impl TokenBucket {
    fn new(capacity: u32, now: Instant) -> Self {
        TokenBucket {
            tokens: capacity as f64,
            last_refill: now,
        }
    }

    /// Refills tokens based on elapsed time
    fn refill(&mut self, rate: f64, capacity: u32, now: Instant) {
        let elapsed = now.saturating_duration_since(self.last_refill).as_secs_f64();
        self.tokens = (self.tokens + elapsed * rate).min(capacity as f64);
        self.last_refill = now;
    }

    fn try_consume(&mut self) -> bool {
        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            true
        } else {
            false
        }
    }

    /// Seconds until one token is available
    fn seconds_until_available(&self, rate: f64) -> u64 {
        let deficit = 1.0 - self.tokens;
        if deficit <= 0.0 || rate <= 0.0 {
            0
        } else {
            (deficit / rate).ceil() as u64
        }
    }

    fn is_full(&self, capacity: u32) -> bool {
        self.tokens >= capacity as f64
    }
}

/// Outcome of one rate limit check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateDecision {
    Allowed { remaining: u32 },
    Limited { retry_after: u64 },
}

/// In-memory token buckets keyed by client address
#[derive(Debug)]
pub struct RateLimiter {
    capacity: u32,
    refill_rate: f64,
    trusted_proxies: Vec<IpAddr>,
    buckets: Mutex<HashMap<Option<IpAddr>, TokenBucket>>,
}

impl RateLimiter {
    pub fn new(config: &RateLimitConfig) -> Self {
        let capacity = config.max_requests.max(1);
        let window = config.window_secs.max(1) as f64;

        Self {
            capacity,
            refill_rate: capacity as f64 / window,
            trusted_proxies: config.trusted_proxies.clone(),
            buckets: Mutex::new(HashMap::new()),
        }
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    /// Identifies the client behind a request
    pub fn client_of(&self, request: &Request) -> Option<IpAddr> {
        let peer = request
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip());

        match peer {
            Some(ip) if self.trusted_proxies.contains(&ip) => {
                forwarded_for(request.headers()).or(peer)
            }
            _ => peer,
        }
    }

    /// Takes one token from `client`'s bucket
    pub fn check(&self, client: Option<IpAddr>) -> RateDecision {
        self.check_at(client, Instant::now())
    }

    fn check_at(&self, client: Option<IpAddr>, now: Instant) -> RateDecision {
        let mut buckets = self
            .buckets
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        if buckets.len() > SWEEP_THRESHOLD {
            let (rate, capacity) = (self.refill_rate, self.capacity);
            buckets.retain(|_, bucket| {
                bucket.refill(rate, capacity, now);
                !bucket.is_full(capacity)
            });
        }

        let bucket = buckets
            .entry(client)
            .or_insert_with(|| TokenBucket::new(self.capacity, now));
        bucket.refill(self.refill_rate, self.capacity, now);

        if bucket.try_consume() {
            RateDecision::Allowed {
                remaining: bucket.tokens.floor() as u32,
            }
        } else {
            RateDecision::Limited {
                retry_after: bucket.seconds_until_available(self.refill_rate).max(1),
            }
        }
    }
}

fn forwarded_for(headers: &HeaderMap) -> Option<IpAddr> {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .and_then(|v| v.trim().parse().ok())
}

/// Rate limiting middleware
///
/// # Errors
///
/// - 429 Too Many Requests: bucket empty
pub async fn rate_limit_layer(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let limiter = &state.rate_limiter;
    let client = limiter.client_of(&request);

    let remaining = match limiter.check(client) {
        RateDecision::Allowed { remaining } => remaining,
        RateDecision::Limited { retry_after } => {
            tracing::warn!(client = ?client, retry_after, "Rate limit exceeded");
            return Err(ApiError::RateLimitExceeded { retry_after });
        }
    };

    let mut response = next.run(request).await;

    let headers = response.headers_mut();
    headers.insert("x-ratelimit-limit", HeaderValue::from(limiter.capacity()));
    headers.insert("x-ratelimit-remaining", HeaderValue::from(remaining));

    Ok(response)
}
