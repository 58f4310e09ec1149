//! Rate-limited transport wrapper.
//!
//! Wraps any Transport with a hard request quota using the governor crate,
//! on top of the randomized spacing the fetchers already apply.

use async_trait::async_trait;
use governor::{Quota, RateLimiter};
use std::num::NonZeroU32;
use std::sync::Arc;

use crate::error::TransportResult;
use crate::traits::{FetchRequest, FetchResponse, Transport};

type DefaultRateLimiter = RateLimiter<
    governor::state::NotKeyed,
    governor::state::InMemoryState,
    governor::clock::DefaultClock,
>;

/// A transport that waits for a permit before every request.
pub struct RateLimitedTransport<T: Transport> {
    inner: T,
    limiter: Arc<DefaultRateLimiter>,
}

impl<T: Transport> RateLimitedTransport<T> {
    /// Allow at most `per_minute` requests per minute (no burst).
    pub fn per_minute(inner: T, per_minute: NonZeroU32) -> Self {
        Self::with_quota(inner, Quota::per_minute(per_minute).allow_burst(NonZeroU32::MIN))
    }

    pub fn with_quota(inner: T, quota: Quota) -> Self {
        Self {
            inner,
            limiter: Arc::new(RateLimiter::direct(quota)),
        }
    }

    pub fn inner(&self) -> &T {
        &self.inner
    }
}

#[async_trait]
impl<T: Transport> Transport for RateLimitedTransport<T> {
    async fn get(&self, request: &FetchRequest) -> TransportResult<FetchResponse> {
        self.limiter.until_ready().await;
        self.inner.get(request).await
    }
}

/// Extension trait for easy rate limiting.
pub trait TransportExt: Transport + Sized {
    fn rate_limited(self, per_minute: NonZeroU32) -> RateLimitedTransport<Self> {
        RateLimitedTransport::per_minute(self, per_minute)
    }
}

impl<T: Transport + Sized> TransportExt for T {}
